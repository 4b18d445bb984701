//! fp-core: Core library for the file-processor pipeline
//!
//! This crate provides the pipeline that moves text objects from an inbox
//! prefix to an outbox prefix of an object store, including:
//! - Key mapping between the two prefixes
//! - Pluggable content transforms
//! - The batch runner and its report
//! - The ObjectStore capability trait and an in-memory implementation
//! - Configuration management
//!
//! This crate is designed to be independent of any specific S3 SDK,
//! allowing for easy testing and other backends.

pub mod config;
pub mod error;
pub mod event;
pub mod key;
pub mod listing;
pub mod memory;
pub mod pipeline;
pub mod report;
pub mod traits;
pub mod transform;

pub use config::{Config, ConfigManager, PipelineConfig, StoreConfig};
pub use error::{Error, Result};
pub use event::{parse_event, EventKey};
pub use key::{derive_destination, display_name, Destination};
pub use listing::{list_outbox, ListedObject};
pub use memory::MemoryStore;
pub use pipeline::{ItemStep, Pipeline, PlannedItem, ProgressFn};
pub use report::{BatchReport, FailureReason, ItemOutcome};
pub use traits::{list_all, ListPage, ObjectStore};
pub use transform::{Transform, TransformKind, Uppercase};
