//! Object-created event parsing
//!
//! Event-triggered runs receive an S3 event notification document and
//! process only the keys it names. Keys in these documents are
//! URL-encoded, with `+` standing for a space.

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(rename = "Records", default)]
    records: Vec<Record>,
}

#[derive(Debug, Deserialize)]
struct Record {
    #[serde(rename = "eventName", default)]
    event_name: Option<String>,
    s3: S3Entity,
}

#[derive(Debug, Deserialize)]
struct S3Entity {
    bucket: Option<BucketEntity>,
    object: ObjectEntity,
}

#[derive(Debug, Deserialize)]
struct BucketEntity {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ObjectEntity {
    key: String,
}

/// A key named by an event, with the bucket it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventKey {
    pub bucket: Option<String>,
    pub key: String,
}

/// Parse an event notification and return the object keys it names
///
/// Records for removal events are ignored. A record whose key cannot be
/// decoded is skipped; the remaining records are still returned.
pub fn parse_event(json: &str) -> Result<Vec<EventKey>> {
    let notification: Notification = serde_json::from_str(json)?;
    let mut keys = Vec::with_capacity(notification.records.len());

    for record in notification.records {
        if record
            .event_name
            .as_deref()
            .is_some_and(|name| name.starts_with("ObjectRemoved"))
        {
            continue;
        }
        let key = match decode_key(&record.s3.object.key) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping event record with undecodable key");
                continue;
            }
        };
        keys.push(EventKey {
            bucket: record.s3.bucket.map(|b| b.name),
            key,
        });
    }

    Ok(keys)
}

/// Decode a URL-encoded event key
pub fn decode_key(raw: &str) -> Result<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|k| k.into_owned())
        .map_err(|e| Error::InvalidKey(format!("cannot decode '{raw}': {e}")))
}
