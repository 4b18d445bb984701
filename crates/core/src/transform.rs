//! Content transforms
//!
//! A transform takes decoded text and returns new text. The pipeline only
//! sees the [`Transform`] trait, so the business rule can be swapped without
//! touching the runner.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A deterministic text transform
pub trait Transform: Send + Sync {
    /// Short name used in logs and reports
    fn name(&self) -> &str;

    /// Apply the transform
    fn apply(&self, input: &str) -> String;
}

/// Uppercases every alphabetic character
#[derive(Debug, Clone, Copy, Default)]
pub struct Uppercase;

impl Transform for Uppercase {
    fn name(&self) -> &str {
        "uppercase"
    }

    fn apply(&self, input: &str) -> String {
        input.to_uppercase()
    }
}

/// Lowercases every alphabetic character
#[derive(Debug, Clone, Copy, Default)]
pub struct Lowercase;

impl Transform for Lowercase {
    fn name(&self) -> &str {
        "lowercase"
    }

    fn apply(&self, input: &str) -> String {
        input.to_lowercase()
    }
}

/// Copies text unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Transform for Identity {
    fn name(&self) -> &str {
        "identity"
    }

    fn apply(&self, input: &str) -> String {
        input.to_string()
    }
}

/// Built-in transforms selectable from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    #[default]
    Uppercase,
    Lowercase,
    Identity,
}

impl TransformKind {
    /// Build the transform for this kind
    pub fn build(self) -> Arc<dyn Transform> {
        match self {
            TransformKind::Uppercase => Arc::new(Uppercase),
            TransformKind::Lowercase => Arc::new(Lowercase),
            TransformKind::Identity => Arc::new(Identity),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            TransformKind::Uppercase => "uppercase",
            TransformKind::Lowercase => "lowercase",
            TransformKind::Identity => "identity",
        }
    }
}

impl FromStr for TransformKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uppercase" | "upper" => Ok(TransformKind::Uppercase),
            "lowercase" | "lower" => Ok(TransformKind::Lowercase),
            "identity" | "copy" => Ok(TransformKind::Identity),
            other => Err(Error::Config(format!("Unknown transform: {other}"))),
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uppercase_basic() {
        assert_eq!(Uppercase.apply("hello"), "HELLO");
        assert_eq!(Uppercase.apply("MiXeD 123!"), "MIXED 123!");
    }

    #[test]
    fn test_uppercase_leaves_non_alphabetic() {
        let input = "0123 -_=+ \n\t{}[] 🙂";
        assert_eq!(Uppercase.apply(input), input);
    }

    #[test]
    fn test_uppercase_unicode() {
        assert_eq!(Uppercase.apply("grüße"), "GRÜSSE");
        assert_eq!(Uppercase.apply("éclair"), "ÉCLAIR");
    }

    #[test]
    fn test_uppercase_idempotent() {
        for input in ["", "hello", "MiXeD 123!", "grüße", "line1\nline2", "ǆ"] {
            let once = Uppercase.apply(input);
            assert_eq!(Uppercase.apply(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_lowercase_and_identity() {
        assert_eq!(Lowercase.apply("MiXeD"), "mixed");
        assert_eq!(Identity.apply("MiXeD"), "MiXeD");
    }

    #[test]
    fn test_transform_kind_parse() {
        assert_eq!("uppercase".parse::<TransformKind>().unwrap(), TransformKind::Uppercase);
        assert_eq!("LOWER".parse::<TransformKind>().unwrap(), TransformKind::Lowercase);
        assert_eq!("copy".parse::<TransformKind>().unwrap(), TransformKind::Identity);
        assert!("rot13".parse::<TransformKind>().is_err());
    }

    #[test]
    fn test_transform_kind_build() {
        assert_eq!(TransformKind::default().build().name(), "uppercase");
        assert_eq!(TransformKind::Identity.build().apply("aB"), "aB");
    }
}
