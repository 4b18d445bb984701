//! config command - Inspect or create the configuration file

use clap::Subcommand;
use fp_core::{Config, ConfigManager};
use serde::Serialize;

use super::{load_config, Overrides};
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration (file, environment and flags combined)
    Show,

    /// Print the configuration file path
    Path,

    /// Write the effective configuration to the configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Serialize)]
struct PathOutput {
    path: String,
    exists: bool,
}

/// Execute a config subcommand
pub fn execute(
    cmd: ConfigCommands,
    manager: &ConfigManager,
    overrides: &Overrides,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match cmd {
        ConfigCommands::Path => {
            let path = manager.config_path();
            if formatter.is_json() {
                formatter.json(&PathOutput {
                    path: path.display().to_string(),
                    exists: path.exists(),
                });
            } else {
                formatter.println(&path.display().to_string());
            }
            ExitCode::Success
        }
        ConfigCommands::Show => match load_config(manager, overrides) {
            Ok(config) => show(&config, &formatter),
            Err(e) => {
                formatter.error(&format!("Invalid configuration: {e}"));
                ExitCode::from_error(&e)
            }
        },
        ConfigCommands::Init { force } => {
            let path = manager.config_path();
            if path.exists() && !force {
                formatter.error(&format!(
                    "Configuration file already exists at {} (use --force to overwrite)",
                    path.display()
                ));
                return ExitCode::UsageError;
            }

            let config = match load_config(manager, overrides) {
                Ok(config) => config,
                Err(e) => {
                    formatter.error(&format!("Invalid configuration: {e}"));
                    return ExitCode::from_error(&e);
                }
            };

            match manager.save(&config) {
                Ok(()) => {
                    formatter.success(&format!("Wrote {}", path.display()));
                    ExitCode::Success
                }
                Err(e) => {
                    formatter.error(&format!("Failed to write configuration: {e}"));
                    ExitCode::from_error(&e)
                }
            }
        }
    }
}

fn show(config: &Config, formatter: &Formatter) -> ExitCode {
    if formatter.is_json() {
        formatter.json(config);
        return ExitCode::Success;
    }

    match toml::to_string_pretty(config) {
        Ok(text) => {
            formatter.println(text.trim_end());
            ExitCode::Success
        }
        Err(e) => {
            formatter.error(&format!("Failed to render configuration: {e}"));
            ExitCode::GeneralError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn quiet() -> OutputConfig {
        OutputConfig {
            quiet: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_init_writes_effective_config() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("nested/config.toml"));
        let overrides = Overrides {
            bucket: Some("docs".into()),
            ..Default::default()
        };

        let code = execute(
            ConfigCommands::Init { force: false },
            &manager,
            &overrides,
            quiet(),
        );
        assert_eq!(code, ExitCode::Success);

        let saved = manager.load().unwrap();
        assert_eq!(saved.store.bucket, "docs");
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("config.toml"));
        manager.save(&Config::default()).unwrap();

        let code = execute(
            ConfigCommands::Init { force: false },
            &manager,
            &Overrides::default(),
            quiet(),
        );
        assert_eq!(code, ExitCode::UsageError);

        let code = execute(
            ConfigCommands::Init { force: true },
            &manager,
            &Overrides::default(),
            quiet(),
        );
        assert_eq!(code, ExitCode::Success);
    }

    #[test]
    fn test_show_rejects_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp_dir.path().join("config.toml"));
        let overrides = Overrides {
            concurrency: Some(0),
            ..Default::default()
        };
        let code = execute(ConfigCommands::Show, &manager, &overrides, quiet());
        assert_eq!(code, ExitCode::UsageError);
    }
}
