//! Progress display for pipeline runs
//!
//! One tick per key. A bar is shown when the number of keys is known up
//! front (explicit key lists), a counting spinner otherwise.

use super::OutputConfig;

/// Progress bar wrapper
///
/// In quiet or JSON mode, progress is suppressed.
#[derive(Debug, Clone)]
pub struct ProgressBar {
    bar: Option<indicatif::ProgressBar>,
}

impl ProgressBar {
    /// Create a progress bar over `total` keys
    pub fn new(config: &OutputConfig, total: u64) -> Self {
        let bar = if hidden(config) {
            None
        } else {
            let bar = indicatif::ProgressBar::new(total);
            if let Ok(template) = indicatif::ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(template.progress_chars("#>-"));
            }
            Some(bar)
        };

        Self { bar }
    }

    /// Create a spinner counting keys as they complete
    pub fn spinner(config: &OutputConfig, message: &str) -> Self {
        let bar = if hidden(config) {
            None
        } else {
            let bar = indicatif::ProgressBar::new_spinner();
            if let Ok(template) =
                indicatif::ProgressStyle::default_spinner().template("{spinner:.green} {pos} {msg}")
            {
                bar.set_style(template);
            }
            bar.set_message(message.to_string());
            bar.enable_steady_tick(std::time::Duration::from_millis(100));
            Some(bar)
        };

        Self { bar }
    }

    /// Advance by one key
    pub fn tick_item(&self, label: &str) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
            bar.set_message(label.to_string());
        }
    }

    /// Finish and clear the progress bar
    pub fn finish_and_clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

fn hidden(config: &OutputConfig) -> bool {
    config.quiet || config.json || config.no_progress
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_quiet_mode() {
        let config = OutputConfig {
            quiet: true,
            ..Default::default()
        };
        assert!(ProgressBar::new(&config, 100).bar.is_none());
    }

    #[test]
    fn test_progress_bar_json_mode() {
        let config = OutputConfig {
            json: true,
            ..Default::default()
        };
        assert!(ProgressBar::spinner(&config, "processing").bar.is_none());
    }

    #[test]
    fn test_progress_bar_normal() {
        let bar = ProgressBar::new(&OutputConfig::default(), 3);
        assert!(bar.bar.is_some());
        bar.tick_item("uploaded/a.txt");
        bar.finish_and_clear();
    }
}
