//! run command - Process pending inbox objects
//!
//! Without arguments, processes every key currently under the inbox prefix.
//! With `--key` or `--event`, processes exactly the named keys.

use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};
use fp_core::{parse_event, BatchReport, Config, ItemOutcome, ItemStep, Pipeline, PlannedItem};
use fp_s3::S3Store;
use tokio::sync::watch;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig, ProgressBar};

/// Process pending inbox objects
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Process only this inbox key (repeatable)
    #[arg(long = "key", value_name = "KEY")]
    pub keys: Vec<String>,

    /// Process the keys named by an S3 event notification file ('-' for stdin)
    #[arg(long, value_name = "FILE", conflicts_with = "keys")]
    pub event: Option<String>,

    /// Show what would be processed without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the run command
pub async fn execute(args: RunArgs, config: Config, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config.clone());

    let explicit = match explicit_keys(&args, &config.store.bucket, &formatter) {
        Ok(keys) => keys,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            return ExitCode::UsageError;
        }
    };

    let store = match S3Store::new(&config.store, config.pipeline.page_size).await {
        Ok(store) => store,
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let pipeline = match Pipeline::new(Arc::new(store), config.pipeline.clone()) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            formatter.error(&format!("Invalid pipeline configuration: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    if args.dry_run {
        return dry_run(&pipeline, explicit, &formatter).await;
    }

    let progress = match &explicit {
        Some(keys) => ProgressBar::new(&output_config, keys.len() as u64),
        None => ProgressBar::spinner(&output_config, "processing inbox"),
    };
    let ticker = progress.clone();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight items");
            let _ = shutdown_tx.send(true);
        }
    });

    let pipeline = pipeline
        .with_shutdown(shutdown_rx)
        .with_progress(Arc::new(move |step: &ItemStep| {
            let label = match step {
                ItemStep::Skipped { source } => source.as_str(),
                ItemStep::Finished(outcome) => outcome.source(),
            };
            ticker.tick_item(label);
        }));

    let result = match explicit {
        Some(keys) => Ok(pipeline.run_keys(keys).await),
        None => pipeline.run().await,
    };
    interrupt.abort();
    progress.finish_and_clear();

    match result {
        Ok(report) => print_report(&report, &formatter),
        Err(e) => {
            formatter.error(&format!("Failed to list inbox: {e}"));
            ExitCode::from_error(&e)
        }
    }
}

/// Keys given on the command line or through an event, `None` for a full run
fn explicit_keys(
    args: &RunArgs,
    bucket: &str,
    formatter: &Formatter,
) -> anyhow::Result<Option<Vec<String>>> {
    if !args.keys.is_empty() {
        return Ok(Some(args.keys.clone()));
    }

    let Some(source) = &args.event else {
        return Ok(None);
    };

    let document = if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read event from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read event file '{source}'"))?
    };

    let mut keys = Vec::new();
    for entry in parse_event(&document).context("Invalid event document")? {
        match entry.bucket.as_deref() {
            Some(other) if other != bucket => {
                formatter.warning(&format!(
                    "Ignoring '{}' from bucket '{other}' (configured bucket is '{bucket}')",
                    entry.key
                ));
            }
            _ => keys.push(entry.key),
        }
    }

    Ok(Some(keys))
}

async fn dry_run(pipeline: &Pipeline, explicit: Option<Vec<String>>, formatter: &Formatter) -> ExitCode {
    let keys = match explicit {
        Some(keys) => keys,
        None => match pipeline.list_pending().await {
            Ok(keys) => keys,
            Err(e) => {
                formatter.error(&format!("Failed to list inbox: {e}"));
                return ExitCode::from_error(&e);
            }
        },
    };

    let plan = pipeline.plan(keys);

    if formatter.is_json() {
        formatter.json(&plan);
    } else if !plan.is_empty() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL_CONDENSED)
            .set_header(vec!["Source", "Destination", "Action"]);
        for item in &plan {
            table.add_row(plan_row(item));
        }
        formatter.println(&table.to_string());
    } else {
        formatter.println("Inbox is empty");
    }

    ExitCode::Success
}

/// Table cells for one planned item: source, destination, action
fn plan_row(item: &PlannedItem) -> Vec<String> {
    let (destination, action) = match item {
        PlannedItem::Process { destination, .. } => (destination.clone(), "process".to_string()),
        PlannedItem::Skip { .. } => ("-".to_string(), "skip".to_string()),
        PlannedItem::Reject { reason, .. } => ("-".to_string(), format!("reject ({reason})")),
    };
    vec![item.source().to_string(), destination, action]
}

fn print_report(report: &BatchReport, formatter: &Formatter) -> ExitCode {
    if formatter.is_json() {
        formatter.json(report);
    } else {
        // Failures are always shown; per-item successes only when not quiet
        let verbose = !formatter.is_quiet();
        for item in &report.items {
            match item {
                ItemOutcome::Succeeded {
                    source,
                    destination,
                    ..
                } if verbose => formatter.println(&format!("{source} -> {destination}")),
                ItemOutcome::Succeeded { .. } => {}
                ItemOutcome::Failed {
                    source,
                    reason,
                    message,
                } => formatter.error(&format!("{source}: {reason} ({message})")),
            }
        }

        let elapsed = report
            .finished_at
            .since(report.started_at)
            .map(|span| format!(" in {span:#}"))
            .unwrap_or_default();
        let summary = format!("{report}{elapsed}");
        if report.has_failures() || report.cancelled {
            formatter.warning(&summary);
        } else {
            formatter.success(&summary);
        }
    }

    exit_code_for(report)
}

/// Exit code for a finished run
fn exit_code_for(report: &BatchReport) -> ExitCode {
    if report.cancelled {
        ExitCode::Interrupted
    } else if report.has_failures() {
        ExitCode::PartialFailure
    } else {
        ExitCode::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fp_core::{Error, ItemOutcome};

    fn report_with(outcomes: Vec<ItemOutcome>) -> BatchReport {
        let mut report = BatchReport::begin();
        for outcome in outcomes {
            report.record(outcome);
        }
        report.finish()
    }

    #[test]
    fn test_exit_code_for_clean_run() {
        let report = report_with(vec![ItemOutcome::Succeeded {
            source: "uploaded/a.txt".into(),
            destination: "processed/a.txt".into(),
            bytes: 1,
        }]);
        assert_eq!(exit_code_for(&report), ExitCode::Success);
    }

    #[test]
    fn test_exit_code_for_partial_failure() {
        let report = report_with(vec![ItemOutcome::failed(
            "uploaded/a.txt",
            &Error::StoreUnavailable("down".into()),
        )]);
        assert_eq!(exit_code_for(&report), ExitCode::PartialFailure);
    }

    #[test]
    fn test_exit_code_for_cancelled() {
        let mut report = report_with(vec![]);
        report.cancelled = true;
        assert_eq!(exit_code_for(&report), ExitCode::Interrupted);
    }

    #[test]
    fn test_plan_row() {
        let process = PlannedItem::Process {
            source: "uploaded/a.txt".into(),
            destination: "processed/a.txt".into(),
        };
        assert_eq!(
            plan_row(&process),
            vec!["uploaded/a.txt", "processed/a.txt", "process"]
        );

        let reject = PlannedItem::Reject {
            source: "other/a.txt".into(),
            reason: fp_core::FailureReason::InvalidKey,
        };
        assert_eq!(plan_row(&reject), vec!["other/a.txt", "-", "reject (invalid-key)"]);
    }

    #[test]
    fn test_explicit_keys_from_event_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("event.json");
        std::fs::write(
            &path,
            r#"{"Records":[
                {"s3":{"bucket":{"name":"docs"},"object":{"key":"uploaded/a.txt"}}},
                {"s3":{"bucket":{"name":"elsewhere"},"object":{"key":"uploaded/b.txt"}}}
            ]}"#,
        )
        .unwrap();

        let args = RunArgs {
            keys: vec![],
            event: Some(path.to_string_lossy().to_string()),
            dry_run: false,
        };
        let formatter = Formatter::new(OutputConfig {
            quiet: true,
            ..Default::default()
        });
        let keys = explicit_keys(&args, "docs", &formatter).unwrap();
        assert_eq!(keys, Some(vec!["uploaded/a.txt".to_string()]));
    }

    #[test]
    fn test_explicit_keys_none_for_full_run() {
        let args = RunArgs {
            keys: vec![],
            event: None,
            dry_run: false,
        };
        let keys = explicit_keys(&args, "docs", &Formatter::default()).unwrap();
        assert!(keys.is_none());
    }

    #[test]
    fn test_explicit_keys_missing_event_file() {
        let args = RunArgs {
            keys: vec![],
            event: Some("/nonexistent/event.json".into()),
            dry_run: false,
        };
        let err = explicit_keys(&args, "docs", &Formatter::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to read event file"));
    }
}
