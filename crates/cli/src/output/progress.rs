//! Transfer progress on stderr

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use super::OutputConfig;

const BAR_TEMPLATE: &str = "{spinner:.green} {msg} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg} {bytes}";

/// Progress indicator for one download or upload
///
/// Hidden in quiet and JSON modes and with `--no-progress`.
#[derive(Debug)]
pub struct TransferProgress {
    bar: Option<ProgressBar>,
}

impl TransferProgress {
    /// Byte bar when the object length is known, spinner otherwise
    pub fn download(config: &OutputConfig, key: &str, total: Option<u64>) -> Self {
        if hidden(config) {
            return Self { bar: None };
        }
        let bar = match total {
            Some(total) => ProgressBar::new(total).with_style(style(BAR_TEMPLATE)),
            None => spinning(ProgressBar::new_spinner().with_style(style(SPINNER_TEMPLATE))),
        };
        bar.set_message(format!("Downloading {key}"));
        Self { bar: Some(bar) }
    }

    /// Spinner shown while a single PutObject is in flight
    pub fn upload(config: &OutputConfig, key: &str) -> Self {
        if hidden(config) {
            return Self { bar: None };
        }
        let bar = spinning(
            ProgressBar::new_spinner().with_style(style("{spinner:.green} {msg}")),
        );
        bar.set_message(format!("Uploading {key}"));
        Self { bar: Some(bar) }
    }

    pub fn advance(&self, bytes: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(bytes);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

fn hidden(config: &OutputConfig) -> bool {
    config.quiet || config.json || config.no_progress
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

fn spinning(bar: ProgressBar) -> ProgressBar {
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_when_quiet_json_or_disabled() {
        for config in [
            OutputConfig {
                quiet: true,
                ..Default::default()
            },
            OutputConfig {
                json: true,
                ..Default::default()
            },
            OutputConfig {
                no_progress: true,
                ..Default::default()
            },
        ] {
            assert!(!TransferProgress::download(&config, "a.txt", Some(10)).bar.is_some());
            assert!(!TransferProgress::upload(&config, "a.txt").bar.is_some());
        }
    }

    #[test]
    fn test_download_bar_counts_bytes() {
        let progress = TransferProgress::download(&OutputConfig::default(), "a.txt", Some(10));
        assert!(progress.bar.is_some());
        progress.advance(10);
        progress.finish();
    }

    #[test]
    fn test_download_without_length_spins() {
        let progress = TransferProgress::download(&OutputConfig::default(), "a.txt", None);
        assert!(progress.bar.is_some());
        progress.advance(3);
        progress.finish();
    }
}
