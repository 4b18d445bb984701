//! Pipeline runner
//!
//! Enumerates the inbox, then for each key independently: derive the outbox
//! key, fetch, decode as UTF-8, transform, and publish. Item failures are
//! recorded in the [`BatchReport`] and never abort the run; only a failed
//! inbox enumeration fails [`Pipeline::run`] as a whole.
//!
//! There are two entry points sharing the same per-item logic:
//! - [`Pipeline::run`] processes everything currently pending
//! - [`Pipeline::run_keys`] processes exactly the keys given (event-triggered runs)

use std::collections::HashSet;
use std::sync::Arc;

use futures::{future, stream, StreamExt};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::key::{derive_destination, Destination};
use crate::report::{BatchReport, FailureReason, ItemOutcome};
use crate::traits::{list_all, ObjectStore};
use crate::transform::Transform;

/// What happened to one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStep {
    /// Not a data item (marker key or filtered out)
    Skipped { source: String },
    /// Processed, successfully or not
    Finished(ItemOutcome),
}

/// What a run would do with one key, without touching the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum PlannedItem {
    Process { source: String, destination: String },
    Skip { source: String },
    Reject { source: String, reason: FailureReason },
}

impl PlannedItem {
    pub fn source(&self) -> &str {
        match self {
            Self::Process { source, .. } | Self::Skip { source } | Self::Reject { source, .. } => {
                source
            }
        }
    }
}

/// Where a key goes before any I/O happens
enum Route {
    Publish(String),
    Skip(&'static str),
    Reject(Error),
}

/// Callback invoked once per key as results arrive
pub type ProgressFn = Arc<dyn Fn(&ItemStep) + Send + Sync>;

/// Batch transform pipeline from the inbox prefix to the outbox prefix
pub struct Pipeline {
    store: Arc<dyn ObjectStore>,
    config: PipelineConfig,
    transform: Arc<dyn Transform>,
    include: Option<glob::Pattern>,
    shutdown: Option<watch::Receiver<bool>>,
    progress: Option<ProgressFn>,
}

impl Pipeline {
    /// Create a pipeline over `store`
    ///
    /// Validates the configuration and builds the configured transform.
    pub fn new(store: Arc<dyn ObjectStore>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let include = config
            .include
            .as_deref()
            .map(glob::Pattern::new)
            .transpose()?;
        let transform = config.transform.build();

        Ok(Self {
            store,
            config,
            transform,
            include,
            shutdown: None,
            progress: None,
        })
    }

    /// Replace the content transform
    pub fn with_transform(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transform = transform;
        self
    }

    /// Stop scheduling new items once `shutdown` reads `true`
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Observe each item as it completes
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Enumerate every key under the inbox prefix, following pagination
    pub async fn list_pending(&self) -> Result<Vec<String>> {
        list_all(self.store.as_ref(), &self.config.inbox_prefix).await
    }

    /// Process everything currently pending in the inbox
    pub async fn run(&self) -> Result<BatchReport> {
        let keys = self.list_pending().await.inspect_err(|e| {
            error!(prefix = %self.config.inbox_prefix, error = %e, "Failed to enumerate inbox");
        })?;
        Ok(self.run_keys(keys).await)
    }

    /// Process exactly the given keys without enumerating the inbox
    ///
    /// Duplicate keys are processed once.
    pub async fn run_keys(&self, keys: Vec<String>) -> BatchReport {
        let keys = unique(keys);
        let total = keys.len();

        info!(
            keys = total,
            concurrency = self.config.concurrency,
            transform = self.transform.name(),
            "Starting pipeline run"
        );

        let mut report = BatchReport::begin();
        let shutdown = self.shutdown.clone();
        let mut steps = stream::iter(keys)
            .take_while(move |_| future::ready(!is_cancelled(shutdown.as_ref())))
            .map(|key| self.process(key))
            .buffer_unordered(self.config.concurrency);

        let mut handled = 0usize;
        while let Some(step) = steps.next().await {
            handled += 1;
            if let Some(progress) = &self.progress {
                progress(&step);
            }
            match step {
                ItemStep::Skipped { .. } => report.skip(),
                ItemStep::Finished(outcome) => report.record(outcome),
            }
        }

        if handled < total {
            warn!(handled, total, "Run cancelled before all keys were scheduled");
            report.cancelled = true;
        }

        let report = report.finish();
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            bytes = report.bytes_written,
            "Pipeline run finished"
        );
        report
    }

    /// Describe what `run_keys` would do with `keys`
    ///
    /// Applies the same deduplication, key mapping and include filter as a
    /// real run, in the same order, without reading or writing objects.
    pub fn plan(&self, keys: Vec<String>) -> Vec<PlannedItem> {
        unique(keys)
            .into_iter()
            .map(|source| match self.route(&source) {
                Route::Publish(destination) => PlannedItem::Process {
                    source,
                    destination,
                },
                Route::Skip(_) => PlannedItem::Skip { source },
                Route::Reject(e) => PlannedItem::Reject {
                    source,
                    reason: FailureReason::from(&e),
                },
            })
            .collect()
    }

    fn route(&self, key: &str) -> Route {
        match derive_destination(key, &self.config.inbox_prefix, &self.config.outbox_prefix) {
            Ok(Destination::Key(_)) if !self.is_included(key) => {
                Route::Skip("Key does not match include pattern")
            }
            Ok(Destination::Key(d)) => Route::Publish(d),
            Ok(Destination::Skip) => Route::Skip("Skipping prefix marker"),
            Err(e) => Route::Reject(e),
        }
    }

    /// Run one key through map, fetch, transform, publish
    async fn process(&self, key: String) -> ItemStep {
        let destination = match self.route(&key) {
            Route::Publish(d) => d,
            Route::Skip(why) => {
                debug!(key = %key, "{why}");
                return ItemStep::Skipped { source: key };
            }
            Route::Reject(e) => {
                warn!(key = %key, error = %e, "Rejected key");
                return ItemStep::Finished(ItemOutcome::failed(key, &e));
            }
        };

        match self.transfer(&key, &destination).await {
            Ok(bytes) => {
                debug!(key = %key, destination = %destination, bytes, "Published");
                ItemStep::Finished(ItemOutcome::Succeeded {
                    source: key,
                    destination,
                    bytes,
                })
            }
            Err(e) => {
                let outcome = ItemOutcome::failed(key, &e);
                if let ItemOutcome::Failed { source, reason, .. } = &outcome {
                    warn!(key = %source, reason = %reason, error = %e, "Item failed");
                }
                ItemStep::Finished(outcome)
            }
        }
    }

    async fn transfer(&self, key: &str, destination: &str) -> Result<u64> {
        let raw = self.store.get(key).await?;
        let text = String::from_utf8(raw)?;
        let output = self.transform.apply(&text).into_bytes();
        let bytes = output.len() as u64;
        self.store
            .put(destination, output, &content_type_for(destination))
            .await?;
        Ok(bytes)
    }

    fn is_included(&self, key: &str) -> bool {
        let Some(pattern) = &self.include else {
            return true;
        };
        key.strip_prefix(&self.config.inbox_prefix)
            .is_some_and(|name| pattern.matches(name))
    }
}

/// Drop repeated keys, keeping first occurrences in order
fn unique(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

fn is_cancelled(shutdown: Option<&watch::Receiver<bool>>) -> bool {
    shutdown.is_some_and(|rx| *rx.borrow())
}

/// Content type for a published object: a `text/*` type guessed from the
/// key's extension, falling back to `text/plain`, always UTF-8
pub fn content_type_for(key: &str) -> String {
    let essence = mime_guess::from_path(key)
        .iter()
        .find(|m| m.type_().as_str() == "text")
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| "text/plain".to_string());
    format!("{essence}; charset=utf-8")
}
