//! Key mapping between the inbox and outbox prefixes
//!
//! An inbox key `uploaded/notes/a.txt` maps to `processed/notes/a.txt`.
//! Only the leading occurrence of the inbox prefix is replaced, so a key
//! like `uploaded/uploaded/x.txt` maps to `processed/uploaded/x.txt`.

use crate::error::{Error, Result};

/// Where an inbox key should be published
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Publish under this outbox key
    Key(String),
    /// Not a data item (the empty-folder marker)
    Skip,
}

impl Destination {
    /// Get the destination key, if any
    pub fn key(&self) -> Option<&str> {
        match self {
            Destination::Key(k) => Some(k),
            Destination::Skip => None,
        }
    }
}

/// Derive the outbox key for an inbox key
///
/// Returns `Destination::Skip` for the marker key equal to `inbox_prefix`,
/// and `Error::InvalidKey` for keys outside the inbox.
pub fn derive_destination(key: &str, inbox_prefix: &str, outbox_prefix: &str) -> Result<Destination> {
    if key == inbox_prefix {
        return Ok(Destination::Skip);
    }

    match key.strip_prefix(inbox_prefix) {
        Some(rest) => Ok(Destination::Key(format!("{outbox_prefix}{rest}"))),
        None => Err(Error::InvalidKey(format!(
            "'{key}' is not under inbox prefix '{inbox_prefix}'"
        ))),
    }
}

/// Name shown to users for a key under `prefix`
///
/// Strips the prefix once. Returns `None` for the marker and for keys
/// outside the prefix.
pub fn display_name<'a>(key: &'a str, prefix: &str) -> Option<&'a str> {
    match key.strip_prefix(prefix) {
        Some("") | None => None,
        Some(rest) => Some(rest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INBOX: &str = "uploaded/";
    const OUTBOX: &str = "processed/";

    #[test]
    fn test_derive_simple_key() {
        let dest = derive_destination("uploaded/a.txt", INBOX, OUTBOX).unwrap();
        assert_eq!(dest, Destination::Key("processed/a.txt".to_string()));
    }

    #[test]
    fn test_derive_nested_key() {
        let dest = derive_destination("uploaded/2024/q1/report.txt", INBOX, OUTBOX).unwrap();
        assert_eq!(dest.key(), Some("processed/2024/q1/report.txt"));
    }

    #[test]
    fn test_derive_marker_is_skipped() {
        let dest = derive_destination("uploaded/", INBOX, OUTBOX).unwrap();
        assert_eq!(dest, Destination::Skip);
        assert!(dest.key().is_none());
    }

    #[test]
    fn test_derive_replaces_leading_prefix_only() {
        // A global replace would produce "processed/processed/x.txt"
        let dest = derive_destination("uploaded/uploaded/x.txt", INBOX, OUTBOX).unwrap();
        assert_eq!(dest.key(), Some("processed/uploaded/x.txt"));

        let dest = derive_destination("uploaded/a/uploaded/b.txt", INBOX, OUTBOX).unwrap();
        assert_eq!(dest.key(), Some("processed/a/uploaded/b.txt"));
    }

    #[test]
    fn test_derive_rejects_foreign_key() {
        let result = derive_destination("processed/a.txt", INBOX, OUTBOX);
        assert!(matches!(result, Err(Error::InvalidKey(_))));

        // Prefix occurs later in the key but not at the start
        let result = derive_destination("x/uploaded/a.txt", INBOX, OUTBOX);
        assert!(matches!(result, Err(Error::InvalidKey(_))));
    }

    #[test]
    fn test_derive_keeps_remainder() {
        for rest in ["a", "a b.txt", "deep/er/file", "ünïcode.txt", "uploaded"] {
            let key = format!("{INBOX}{rest}");
            let dest = derive_destination(&key, INBOX, OUTBOX).unwrap();
            let dest = dest.key().unwrap();
            assert!(dest.starts_with(OUTBOX));
            assert_eq!(&dest[OUTBOX.len()..], rest);
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("processed/a.txt", OUTBOX), Some("a.txt"));
        assert_eq!(
            display_name("processed/processed/a.txt", OUTBOX),
            Some("processed/a.txt")
        );
        assert_eq!(display_name("processed/", OUTBOX), None);
        assert_eq!(display_name("uploaded/a.txt", OUTBOX), None);
    }
}
