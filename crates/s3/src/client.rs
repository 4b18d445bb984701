//! S3 store implementation
//!
//! Wraps aws-sdk-s3 and implements the ObjectStore trait from fp-core.

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_smithy_types::timeout::TimeoutConfig;

use fp_core::{Error, ListPage, ObjectStore, Result, StoreConfig};

/// S3 bucket exposed through the store capability
pub struct S3Store {
    inner: aws_sdk_s3::Client,
    bucket: String,
    page_size: i32,
}

impl S3Store {
    /// Create a new store from connection settings
    ///
    /// Credentials come from the default AWS provider chain. Each call is
    /// bounded by the configured connect and operation timeouts, so a stuck
    /// endpoint surfaces as `Error::StoreUnavailable`.
    pub async fn new(config: &StoreConfig, page_size: i32) -> Result<Self> {
        config.validate()?;

        let timeouts = TimeoutConfig::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .operation_timeout(Duration::from_millis(config.operation_timeout_ms))
            .build();

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .timeout_config(timeouts);

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(config.force_path_style)
            .build();

        tracing::debug!(
            bucket = %config.bucket,
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            "Created S3 store"
        );

        Ok(Self {
            inner: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            page_size,
        })
    }

    /// Get the underlying aws-sdk-s3 client
    pub fn inner(&self) -> &aws_sdk_s3::Client {
        &self.inner
    }

    /// Bucket this store reads and writes
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list(&self, prefix: &str, continuation_token: Option<String>) -> Result<ListPage> {
        let response = self
            .inner
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(self.page_size)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_bucket()) {
                    Error::NotFound(format!("Bucket not found: {}", self.bucket))
                } else {
                    classify(&self.bucket, DisplayErrorContext(&e).to_string())
                }
            })?;

        let keys = response
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();

        Ok(build_page(
            prefix,
            keys,
            response.is_truncated().unwrap_or(false),
            response.next_continuation_token().map(str::to_string),
        ))
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let response = self
            .inner
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    Error::NotFound(key.to_string())
                } else {
                    classify(key, DisplayErrorContext(&e).to_string())
                }
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| Error::StoreUnavailable(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(data)
    }

    async fn put(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        self.inner
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| publish_error(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}

/// Map an SDK error message to a store error
fn classify(subject: &str, err_str: String) -> Error {
    if err_str.contains("NoSuchKey") || err_str.contains("NotFound") {
        Error::NotFound(subject.to_string())
    } else if err_str.contains("NoSuchBucket") {
        Error::NotFound(format!("Bucket not found: {subject}"))
    } else {
        Error::StoreUnavailable(err_str)
    }
}

/// Map a PutObject failure to a store error, whatever the service reported
fn publish_error(err_str: String) -> Error {
    Error::StoreUnavailable(err_str)
}

/// Build a page from a ListObjectsV2 response
///
/// Keys outside `prefix` are dropped. A token is only kept when the
/// response is truncated.
fn build_page(prefix: &str, keys: Vec<String>, truncated: bool, token: Option<String>) -> ListPage {
    let keys = keys.into_iter().filter(|k| k.starts_with(prefix)).collect();
    match token {
        Some(token) if truncated => ListPage::with_next(keys, token),
        _ => ListPage::last(keys),
    }
}
