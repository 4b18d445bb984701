//! CLI command definitions and execution
//!
//! This module contains all CLI commands and the shared configuration
//! loading. Every command receives the effective [`Config`]: the config
//! file (or defaults) with command-line and environment overrides applied.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fp_core::{Config, ConfigManager, TransformKind};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod config;
mod ls;
mod run;

/// fproc - inbox to outbox text processor
///
/// Transforms text objects under the inbox prefix of a bucket and publishes
/// the results under the outbox prefix.
#[derive(Parser, Debug)]
#[command(name = "fproc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Path to the configuration file
    #[arg(long, global = true, env = "FP_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings that override the configuration file
#[derive(Args, Debug, Default, Clone)]
pub struct Overrides {
    /// Bucket holding the inbox and outbox
    #[arg(long, global = true, env = "FP_BUCKET")]
    pub bucket: Option<String>,

    /// Custom S3 endpoint URL
    #[arg(long, global = true, env = "FP_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Region
    #[arg(long, global = true, env = "FP_REGION")]
    pub region: Option<String>,

    /// Prefix holding pending objects
    #[arg(long, global = true, env = "FP_INBOX_PREFIX")]
    pub inbox_prefix: Option<String>,

    /// Prefix receiving processed objects
    #[arg(long, global = true, env = "FP_OUTBOX_PREFIX")]
    pub outbox_prefix: Option<String>,

    /// Maximum number of objects processed at once
    #[arg(long, global = true, env = "FP_CONCURRENCY")]
    pub concurrency: Option<usize>,

    /// Transform to apply: uppercase, lowercase, identity
    #[arg(long, global = true, env = "FP_TRANSFORM")]
    pub transform: Option<TransformKind>,

    /// Only process keys whose name matches this glob
    #[arg(long, global = true, env = "FP_INCLUDE")]
    pub include: Option<String>,
}

impl Overrides {
    /// Apply overrides on top of a loaded configuration
    pub fn apply(&self, config: &mut Config) {
        if let Some(bucket) = &self.bucket {
            config.store.bucket = bucket.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.store.endpoint = Some(endpoint.clone());
        }
        if let Some(region) = &self.region {
            config.store.region = region.clone();
        }
        if let Some(prefix) = &self.inbox_prefix {
            config.pipeline.inbox_prefix = prefix.clone();
        }
        if let Some(prefix) = &self.outbox_prefix {
            config.pipeline.outbox_prefix = prefix.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.pipeline.concurrency = concurrency;
        }
        if let Some(transform) = self.transform {
            config.pipeline.transform = transform;
        }
        if let Some(include) = &self.include {
            config.pipeline.include = Some(include.clone());
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process pending inbox objects
    Run(run::RunArgs),

    /// List processed objects
    Ls(ls::LsArgs),

    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    };

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => match ConfigManager::new() {
            Ok(manager) => manager,
            Err(e) => {
                Formatter::new(output_config).error(&e.to_string());
                return ExitCode::from_error(&e);
            }
        },
    };

    let config = match cli.command {
        Commands::Config(cmd) => {
            return config::execute(cmd, &manager, &cli.overrides, output_config);
        }
        _ => match load_config(&manager, &cli.overrides) {
            Ok(config) => config,
            Err(e) => {
                Formatter::new(output_config).error(&format!("Invalid configuration: {e}"));
                return ExitCode::from_error(&e);
            }
        },
    };

    match cli.command {
        Commands::Run(args) => run::execute(args, config, output_config).await,
        Commands::Ls(args) => ls::execute(args, config, output_config).await,
        Commands::Config(_) => ExitCode::Success,
    }
}

/// Load the config file, apply overrides and validate the result
pub fn load_config(manager: &ConfigManager, overrides: &Overrides) -> fp_core::Result<Config> {
    let mut config = manager.load()?;
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}
