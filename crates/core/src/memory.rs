//! In-memory object store
//!
//! Keeps objects in a sorted map and paginates listings like a real store.
//! Individual keys can be made to fail on `get` or `put`, and the listing
//! itself can be made to fail, to exercise the pipeline's error paths.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::traits::{ListPage, ObjectStore};

/// A stored object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Default)]
struct Faults {
    get: HashSet<String>,
    put: HashSet<String>,
    list: bool,
}

#[derive(Debug, Default)]
struct Stats {
    list_calls: usize,
    get_calls: usize,
    put_calls: usize,
}

/// In-memory store for tests and embedding
///
/// Clones share the same underlying objects.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    objects: Arc<RwLock<BTreeMap<String, StoredObject>>>,
    faults: Arc<RwLock<Faults>>,
    stats: Arc<RwLock<Stats>>,
    page_size: usize,
}

impl MemoryStore {
    /// Create an empty store returning up to 1000 keys per page
    pub fn new() -> Self {
        Self::with_page_size(1000)
    }

    /// Create an empty store with a custom page size
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            objects: Arc::default(),
            faults: Arc::default(),
            stats: Arc::default(),
            page_size: page_size.max(1),
        }
    }

    /// Insert an object directly, bypassing fault injection
    pub fn insert(&self, key: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.objects.write().insert(
            key.into(),
            StoredObject {
                data: data.into(),
                content_type: "application/octet-stream".to_string(),
            },
        );
    }

    /// Remove an object
    pub fn remove(&self, key: &str) -> Option<StoredObject> {
        self.objects.write().remove(key)
    }

    /// Read an object directly
    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().get(key).cloned()
    }

    /// Read an object's bytes directly
    pub fn bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().get(key).map(|o| o.data.clone())
    }

    /// All objects under `prefix`, in key order
    pub fn snapshot(&self, prefix: &str) -> BTreeMap<String, Vec<u8>> {
        self.objects
            .read()
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.data.clone()))
            .collect()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Make `get` fail with `StoreUnavailable` for this key
    pub fn fail_get(&self, key: impl Into<String>) {
        self.faults.write().get.insert(key.into());
    }

    /// Make `put` fail with `StoreUnavailable` for this key
    pub fn fail_put(&self, key: impl Into<String>) {
        self.faults.write().put.insert(key.into());
    }

    /// Make every `list` call fail
    pub fn fail_list(&self, fail: bool) {
        self.faults.write().list = fail;
    }

    /// Clear all injected faults
    pub fn clear_faults(&self) {
        *self.faults.write() = Faults::default();
    }

    /// Number of `list` calls served
    pub fn list_calls(&self) -> usize {
        self.stats.read().list_calls
    }

    /// Number of `get` calls served
    pub fn get_calls(&self) -> usize {
        self.stats.read().get_calls
    }

    /// Number of `put` calls served
    pub fn put_calls(&self) -> usize {
        self.stats.read().put_calls
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list(&self, prefix: &str, continuation_token: Option<String>) -> Result<ListPage> {
        self.stats.write().list_calls += 1;
        if self.faults.read().list {
            return Err(Error::StoreUnavailable("simulated list failure".into()));
        }

        // The token is the last key of the previous page
        let objects = self.objects.read();
        let mut keys: Vec<String> = objects
            .range(prefix.to_string()..)
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix))
            .filter(|k| continuation_token.as_ref().is_none_or(|t| k.as_str() > t.as_str()))
            .take(self.page_size + 1)
            .cloned()
            .collect();

        if keys.len() > self.page_size {
            keys.truncate(self.page_size);
            let token = keys.last().cloned().unwrap_or_default();
            Ok(ListPage::with_next(keys, token))
        } else {
            Ok(ListPage::last(keys))
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.stats.write().get_calls += 1;
        if self.faults.read().get.contains(key) {
            return Err(Error::StoreUnavailable(format!("simulated get failure: {key}")));
        }

        self.objects
            .read()
            .get(key)
            .map(|o| o.data.clone())
            .ok_or_else(|| Error::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        self.stats.write().put_calls += 1;
        if self.faults.read().put.contains(key) {
            return Err(Error::StoreUnavailable(format!("simulated put failure: {key}")));
        }

        self.objects.write().insert(
            key.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::list_all;

    #[tokio::test]
    async fn test_put_and_get() {
        let store = MemoryStore::new();
        store
            .put("processed/a.txt", b"HELLO".to_vec(), "text/plain")
            .await
            .unwrap();

        assert_eq!(store.get("processed/a.txt").await.unwrap(), b"HELLO");
        assert_eq!(store.object("processed/a.txt").unwrap().content_type, "text/plain");
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let store = MemoryStore::new();
        store.insert("k", "old");
        store.put("k", b"new".to_vec(), "text/plain").await.unwrap();
        assert_eq!(store.bytes("k").unwrap(), b"new");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryStore::new();
        let result = store.get("uploaded/missing.txt").await;
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_paginates() {
        let store = MemoryStore::with_page_size(2);
        for i in 0..5 {
            store.insert(format!("uploaded/{i}.txt"), "x");
        }
        store.insert("processed/0.txt", "X");

        let first = store.list("uploaded/", None).await.unwrap();
        assert_eq!(first.keys, vec!["uploaded/0.txt", "uploaded/1.txt"]);
        assert!(first.has_more());

        let second = store
            .list("uploaded/", first.continuation_token)
            .await
            .unwrap();
        assert_eq!(second.keys, vec!["uploaded/2.txt", "uploaded/3.txt"]);

        let third = store
            .list("uploaded/", second.continuation_token)
            .await
            .unwrap();
        assert_eq!(third.keys, vec!["uploaded/4.txt"]);
        assert!(!third.has_more());
    }

    #[tokio::test]
    async fn test_list_exact_page_boundary() {
        let store = MemoryStore::with_page_size(2);
        store.insert("uploaded/a", "x");
        store.insert("uploaded/b", "x");

        let page = store.list("uploaded/", None).await.unwrap();
        assert_eq!(page.keys.len(), 2);
        assert!(!page.has_more());
    }

    #[tokio::test]
    async fn test_list_all_over_pages() {
        let store = MemoryStore::with_page_size(3);
        for i in 0..10 {
            store.insert(format!("uploaded/{i:02}"), "x");
        }
        let keys = list_all(&store, "uploaded/").await.unwrap();
        assert_eq!(keys.len(), 10);
        assert_eq!(store.list_calls(), 4);
    }

    #[tokio::test]
    async fn test_fault_injection() {
        let store = MemoryStore::new();
        store.insert("uploaded/a.txt", "a");
        store.fail_get("uploaded/a.txt");
        store.fail_put("processed/a.txt");
        store.fail_list(true);

        assert!(matches!(
            store.get("uploaded/a.txt").await,
            Err(Error::StoreUnavailable(_))
        ));
        assert!(matches!(
            store.put("processed/a.txt", vec![], "text/plain").await,
            Err(Error::StoreUnavailable(_))
        ));
        assert!(store.list("uploaded/", None).await.is_err());

        store.clear_faults();
        assert_eq!(store.get("uploaded/a.txt").await.unwrap(), b"a");
    }

    #[test]
    fn test_snapshot_by_prefix() {
        let store = MemoryStore::new();
        store.insert("processed/a", "A");
        store.insert("processed/b", "B");
        store.insert("uploaded/a", "a");

        let snap = store.snapshot("processed/");
        assert_eq!(snap.len(), 2);
        assert_eq!(snap["processed/a"], b"A");
    }
}
