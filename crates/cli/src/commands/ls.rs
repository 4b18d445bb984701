//! ls command - List processed objects
//!
//! Prints the names of objects under the outbox prefix, one per line, with
//! the prefix stripped. `--inbox` lists what is still waiting instead.

use clap::Args;
use fp_core::{display_name, list_all, list_outbox, Config, ListedObject};
use fp_s3::S3Store;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// List processed objects
#[derive(Args, Debug)]
pub struct LsArgs {
    /// List pending inbox objects instead of processed ones
    #[arg(long)]
    pub inbox: bool,

    /// Show full object keys
    #[arg(short, long)]
    pub long: bool,

    /// Print the total after the listing
    #[arg(long)]
    pub summarize: bool,
}

/// Output structure for ls command (JSON format)
#[derive(Debug, Serialize)]
struct LsOutput {
    prefix: String,
    items: Vec<ListedObject>,
    total: usize,
}

/// Execute the ls command
pub async fn execute(args: LsArgs, config: Config, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let store = match S3Store::new(&config.store, config.pipeline.page_size).await {
        Ok(store) => store,
        Err(e) => {
            formatter.error(&format!("Failed to create S3 client: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let prefix = if args.inbox {
        config.pipeline.inbox_prefix.clone()
    } else {
        config.pipeline.outbox_prefix.clone()
    };

    let listed = if args.inbox {
        list_all(&store, &prefix).await.map(|keys| named(keys, &prefix))
    } else {
        list_outbox(&store, &prefix).await
    };

    let items = match listed {
        Ok(items) => items,
        Err(e) => {
            formatter.error(&format!("Failed to list '{prefix}': {e}"));
            return ExitCode::from_error(&e);
        }
    };

    if formatter.is_json() {
        let total = items.len();
        formatter.json(&LsOutput {
            prefix,
            items,
            total,
        });
    } else {
        for item in &items {
            if args.long {
                formatter.println(&item.key);
            } else {
                formatter.println(&item.name);
            }
        }
        if args.summarize {
            formatter.println(&format!("\nTotal: {} objects under {prefix}", items.len()));
        }
    }

    ExitCode::Success
}

/// Attach display names to raw keys, dropping the folder marker
fn named(keys: Vec<String>, prefix: &str) -> Vec<ListedObject> {
    keys.into_iter()
        .filter_map(|key| {
            let name = display_name(&key, prefix)?.to_string();
            Some(ListedObject { name, key })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_strips_prefix_and_marker() {
        let items = named(
            vec![
                "uploaded/".into(),
                "uploaded/a.txt".into(),
                "uploaded/nested/b.txt".into(),
            ],
            "uploaded/",
        );
        let names: Vec<_> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "nested/b.txt"]);
        assert_eq!(items[0].key, "uploaded/a.txt");
    }

    #[test]
    fn test_output_json_shape() {
        let output = LsOutput {
            prefix: "processed/".into(),
            items: vec![ListedObject {
                name: "a.txt".into(),
                key: "processed/a.txt".into(),
            }],
            total: 1,
        };
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["total"], 1);
        assert_eq!(json["items"][0]["name"], "a.txt");
    }
}
