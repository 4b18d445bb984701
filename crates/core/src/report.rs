//! Batch report types
//!
//! The report is the only channel through which item failures surface.

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Why a single item failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureReason {
    /// Payload is not valid UTF-8
    DecodeError,
    /// Transient store failure on get or put
    StoreError,
    /// Source was deleted between listing and fetch
    NotFound,
    /// Key is not under the inbox prefix
    InvalidKey,
}

impl FailureReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            FailureReason::DecodeError => "decode-error",
            FailureReason::StoreError => "store-error",
            FailureReason::NotFound => "not-found",
            FailureReason::InvalidKey => "invalid-key",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&Error> for FailureReason {
    fn from(err: &Error) -> Self {
        match err {
            Error::Decode(_) => FailureReason::DecodeError,
            Error::NotFound(_) => FailureReason::NotFound,
            Error::InvalidKey(_) => FailureReason::InvalidKey,
            _ => FailureReason::StoreError,
        }
    }
}

/// Outcome of processing one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemOutcome {
    Succeeded {
        source: String,
        destination: String,
        bytes: u64,
    },
    Failed {
        source: String,
        reason: FailureReason,
        message: String,
    },
}

impl ItemOutcome {
    /// Record a failure from an item-local error
    pub fn failed(source: impl Into<String>, err: &Error) -> Self {
        ItemOutcome::Failed {
            source: source.into(),
            reason: FailureReason::from(err),
            message: err.to_string(),
        }
    }

    /// Source key of this item
    pub fn source(&self) -> &str {
        match self {
            ItemOutcome::Succeeded { source, .. } | ItemOutcome::Failed { source, .. } => source,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Succeeded { .. })
    }
}

/// Aggregated outcome of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,

    /// Total bytes published to the outbox
    pub bytes_written: u64,

    /// Whether the run stopped scheduling items early
    pub cancelled: bool,

    pub started_at: Timestamp,
    pub finished_at: Timestamp,

    /// Per-item outcomes, sorted by source key (skipped items are not listed)
    pub items: Vec<ItemOutcome>,
}

impl BatchReport {
    /// Start an empty report
    pub fn begin() -> Self {
        let now = Timestamp::now();
        Self {
            succeeded: 0,
            failed: 0,
            skipped: 0,
            bytes_written: 0,
            cancelled: false,
            started_at: now,
            finished_at: now,
            items: Vec::new(),
        }
    }

    /// Add one item outcome
    pub fn record(&mut self, outcome: ItemOutcome) {
        match &outcome {
            ItemOutcome::Succeeded { bytes, .. } => {
                self.succeeded += 1;
                self.bytes_written += bytes;
            }
            ItemOutcome::Failed { .. } => self.failed += 1,
        }
        self.items.push(outcome);
    }

    /// Count a skipped key
    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    /// Seal the report: sort items and stamp the finish time
    pub fn finish(mut self) -> Self {
        self.items.sort_by(|a, b| a.source().cmp(b.source()));
        self.finished_at = Timestamp::now();
        self
    }

    /// Whether any item failed
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    /// Number of keys considered (processed or skipped)
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    /// Iterate over failed items
    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items.iter().filter(|i| !i.is_success())
    }

    /// Look up the outcome for a source key
    pub fn outcome(&self, source: &str) -> Option<&ItemOutcome> {
        self.items.iter().find(|i| i.source() == source)
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed, {} skipped ({} written)",
            self.succeeded,
            self.failed,
            self.skipped,
            humansize::format_size(self.bytes_written, humansize::BINARY)
        )?;
        if self.cancelled {
            write!(f, " [cancelled]")?;
        }
        Ok(())
    }
}
