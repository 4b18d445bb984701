//! Outbox listing view
//!
//! Lists the names of processed objects: every key under the outbox prefix
//! with the prefix stripped, leaving out the empty-folder marker.

use crate::error::Result;
use crate::key::display_name;
use crate::traits::{list_all, ObjectStore};

/// A processed object as shown to users
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ListedObject {
    /// Name relative to the outbox prefix
    pub name: String,
    /// Full object key
    pub key: String,
}

/// List processed objects under `outbox_prefix`
pub async fn list_outbox(store: &dyn ObjectStore, outbox_prefix: &str) -> Result<Vec<ListedObject>> {
    let keys = list_all(store, outbox_prefix).await?;
    Ok(keys
        .iter()
        .filter_map(|key| {
            display_name(key, outbox_prefix).map(|name| ListedObject {
                name: name.to_string(),
                key: key.clone(),
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn test_list_outbox_skips_marker() {
        let store = MemoryStore::with_page_size(2);
        store.insert("processed/", "");
        store.insert("processed/a.txt", "A");
        store.insert("processed/sub/b.txt", "B");
        store.insert("uploaded/c.txt", "c");

        let listed = list_outbox(&store, "processed/").await.unwrap();
        let names: Vec<&str> = listed.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "sub/b.txt"]);
        assert_eq!(listed[1].key, "processed/sub/b.txt");
    }

    #[tokio::test]
    async fn test_list_outbox_empty() {
        let store = MemoryStore::new();
        assert!(list_outbox(&store, "processed/").await.unwrap().is_empty());
    }
}
