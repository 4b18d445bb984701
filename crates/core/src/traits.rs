//! ObjectStore trait definition
//!
//! This trait is the narrow capability the pipeline needs from a store:
//! list keys under a prefix, fetch an object, and store an object.
//! It keeps the pipeline decoupled from any specific SDK.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One page of a prefix listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPage {
    /// Keys on this page, all under the requested prefix
    pub keys: Vec<String>,

    /// Token for the next page, `None` once the listing is exhausted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation_token: Option<String>,
}

impl ListPage {
    /// Create a final page (no continuation)
    pub fn last(keys: Vec<String>) -> Self {
        Self {
            keys,
            continuation_token: None,
        }
    }

    /// Create a page that continues with the given token
    pub fn with_next(keys: Vec<String>, token: impl Into<String>) -> Self {
        Self {
            keys,
            continuation_token: Some(token.into()),
        }
    }

    /// Whether more pages follow this one
    pub fn has_more(&self) -> bool {
        self.continuation_token.is_some()
    }
}

/// Trait for the store operations used by the pipeline
///
/// This trait is implemented by the S3 adapter and the in-memory store,
/// and can be mocked for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List one page of keys under `prefix`
    ///
    /// Never returns keys outside `prefix`. Pass the previous page's
    /// continuation token to fetch the next page.
    async fn list(&self, prefix: &str, continuation_token: Option<String>) -> Result<ListPage>;

    /// Get object content as bytes
    ///
    /// Fails with `Error::NotFound` if the key no longer exists and
    /// `Error::StoreUnavailable` on transient failure.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Store an object, replacing any existing object under `key`
    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()>;
}

/// Drain every page of a listing under `prefix`
pub async fn list_all(store: &dyn ObjectStore, prefix: &str) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    let mut continuation_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = store.list(prefix, continuation_token.take()).await?;
        pages += 1;
        keys.extend(page.keys.into_iter().filter(|k| k.starts_with(prefix)));

        match page.continuation_token {
            Some(token) => continuation_token = Some(token),
            None => break,
        }
    }

    tracing::debug!(prefix, pages, keys = keys.len(), "Listing drained");
    Ok(keys)
}
