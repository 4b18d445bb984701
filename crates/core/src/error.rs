//! Error types for fp-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for fp-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for fp-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key outside the inbox prefix
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Object does not exist (or was deleted after listing)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transient store failure on list/get/put
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Payload is not valid UTF-8
    #[error("Decode error: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Glob pattern error
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// General error
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::InvalidUrl(_) | Error::Pattern(_) => 2, // UsageError
            Error::TomlParse(_) | Error::InvalidKey(_) => 2,                  // UsageError
            Error::StoreUnavailable(_) => 3,                                  // StoreError
            Error::NotFound(_) => 5,                                          // NotFound
            _ => 1,                                                           // GeneralError
        }
    }

    /// Whether this error only affects a single item of a batch
    pub const fn is_item_local(&self) -> bool {
        matches!(
            self,
            Error::Decode(_) | Error::NotFound(_) | Error::StoreUnavailable(_) | Error::InvalidKey(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_exit_codes() {
        assert_eq!(Error::Config("test".into()).exit_code(), 2);
        assert_eq!(Error::InvalidKey("test".into()).exit_code(), 2);
        assert_eq!(Error::StoreUnavailable("test".into()).exit_code(), 3);
        assert_eq!(Error::NotFound("test".into()).exit_code(), 5);
        assert_eq!(Error::General("test".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = Error::NotFound("uploaded/a.txt".into());
        assert_eq!(err.to_string(), "Not found: uploaded/a.txt");

        let err = Error::StoreUnavailable("connection reset".into());
        assert_eq!(err.to_string(), "Store unavailable: connection reset");
    }

    #[test]
    fn test_decode_error_is_item_local() {
        let err = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        let err = Error::from(err);
        assert!(err.is_item_local());
        assert!(!Error::Config("bad".into()).is_item_local());
    }
}
