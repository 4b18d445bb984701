//! Configuration management
//!
//! This module handles loading, saving, and validating the file-processor
//! configuration file. The file is stored in TOML format at
//! ~/.config/file-processor/config.toml, or under `$FP_CONFIG_DIR` when set.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transform::TransformKind;

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "FP_CONFIG_DIR";

/// Default inbox prefix
pub const DEFAULT_INBOX_PREFIX: &str = "uploaded/";

/// Default outbox prefix
pub const DEFAULT_OUTBOX_PREFIX: &str = "processed/";

/// Default bucket name
pub const DEFAULT_BUCKET: &str = "file-processor-bucket";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Store connection settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Pipeline settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Settings for the object store connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Bucket holding both the inbox and the outbox
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Custom endpoint URL for S3-compatible stores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Region
    #[serde(default = "default_region")]
    pub region: String,

    /// Use path-style bucket addressing
    #[serde(default = "default_true")]
    pub force_path_style: bool,

    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,

    /// Per-operation timeout in milliseconds
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_ms: u64,
}

/// Settings for a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Prefix holding pending objects
    #[serde(default = "default_inbox_prefix")]
    pub inbox_prefix: String,

    /// Prefix receiving transformed objects
    #[serde(default = "default_outbox_prefix")]
    pub outbox_prefix: String,

    /// Maximum number of items processed at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Keys requested per listing page
    #[serde(default = "default_page_size")]
    pub page_size: i32,

    /// Transform applied to each payload
    #[serde(default)]
    pub transform: TransformKind,

    /// Glob matched against the key name after the inbox prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_true() -> bool {
    true
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_operation_timeout() -> u64 {
    30000
}

fn default_inbox_prefix() -> String {
    DEFAULT_INBOX_PREFIX.to_string()
}

fn default_outbox_prefix() -> String {
    DEFAULT_OUTBOX_PREFIX.to_string()
}

fn default_concurrency() -> usize {
    4
}

fn default_page_size() -> i32 {
    1000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            endpoint: None,
            region: default_region(),
            force_path_style: true,
            connect_timeout_ms: default_connect_timeout(),
            operation_timeout_ms: default_operation_timeout(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            inbox_prefix: default_inbox_prefix(),
            outbox_prefix: default_outbox_prefix(),
            concurrency: default_concurrency(),
            page_size: default_page_size(),
            transform: TransformKind::default(),
            include: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            store: StoreConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Check the store settings
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::Config("Bucket name cannot be empty".into()));
        }
        if let Some(endpoint) = &self.endpoint {
            url::Url::parse(endpoint)?;
        }
        if self.operation_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(Error::Config("Timeouts must be greater than zero".into()));
        }
        Ok(())
    }
}

impl PipelineConfig {
    /// Check the pipeline settings
    ///
    /// The prefixes must be non-empty and disjoint: if one contained the
    /// other, published results would be picked up again as inbox items.
    pub fn validate(&self) -> Result<()> {
        if self.inbox_prefix.is_empty() || self.outbox_prefix.is_empty() {
            return Err(Error::Config("Prefixes cannot be empty".into()));
        }
        if self.inbox_prefix.starts_with(&self.outbox_prefix)
            || self.outbox_prefix.starts_with(&self.inbox_prefix)
        {
            return Err(Error::Config(format!(
                "Inbox prefix '{}' and outbox prefix '{}' overlap",
                self.inbox_prefix, self.outbox_prefix
            )));
        }
        if self.concurrency == 0 {
            return Err(Error::Config("Concurrency must be at least 1".into()));
        }
        if self.page_size <= 0 {
            return Err(Error::Config("Page size must be positive".into()));
        }
        if let Some(pattern) = &self.include {
            glob::Pattern::new(pattern)?;
        }
        Ok(())
    }
}

impl Config {
    /// Check the whole configuration
    pub fn validate(&self) -> Result<()> {
        self.store.validate()?;
        self.pipeline.validate()
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("file-processor"),
        };
        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&content)?;

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade fproc.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }
}
