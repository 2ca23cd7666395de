//! Output formatter for human-readable and JSON output
//!
//! Ensures consistent output formatting across the session and executors.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use super::OutputConfig;

type Sink = Mutex<Box<dyn Write + Send>>;

/// Formatter for CLI output
///
/// Handles both human-readable and JSON output formats based on configuration.
/// When JSON mode is enabled, each listing or outcome is one JSON document on
/// its own line.
pub struct Formatter {
    config: OutputConfig,
    out: Sink,
    err: Sink,
}

impl Formatter {
    /// Create a new formatter writing to stdout and stderr
    pub fn new(config: OutputConfig) -> Self {
        Self::with_writers(
            config,
            Box::new(std::io::stdout()),
            Box::new(std::io::stderr()),
        )
    }

    /// Create a formatter writing to the given streams
    pub fn with_writers(
        config: OutputConfig,
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            config,
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }

    pub fn config(&self) -> &OutputConfig {
        &self.config
    }

    /// Check if JSON output mode is enabled
    pub fn is_json(&self) -> bool {
        self.config.json
    }

    /// Check if colors are enabled
    pub fn colors_enabled(&self) -> bool {
        !self.config.no_color && !self.config.json
    }

    /// Output a value
    ///
    /// In JSON mode, serializes the value to a single JSON line.
    /// In human mode, uses the Display implementation.
    pub fn output<T: Serialize + std::fmt::Display>(&self, value: &T) {
        if self.config.quiet {
            return;
        }

        if self.config.json {
            self.json(value);
        } else {
            self.write_out(&value.to_string());
        }
    }

    /// Output an error message
    ///
    /// Errors are always printed, even in quiet mode.
    pub fn error(&self, message: &str) {
        if self.config.json {
            let error = serde_json::json!({ "error": message });
            self.write_err(&error.to_string());
        } else if self.colors_enabled() {
            self.write_err(&format!("{} {message}", console::style("✗").red()));
        } else {
            self.write_err(&format!("✗ {message}"));
        }
    }

    /// Output JSON directly on one line
    pub fn json<T: Serialize>(&self, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.write_out(&json),
            Err(e) => self.write_err(&format!("Error serializing output: {e}")),
        }
    }

    /// Print a line of text (respects quiet mode and JSON mode)
    pub fn println(&self, message: &str) {
        if self.config.quiet || self.config.json {
            return;
        }
        self.write_out(message);
    }

    fn write_out(&self, line: &str) {
        write_line(&self.out, line);
    }

    fn write_err(&self, line: &str) {
        write_line(&self.err, line);
    }
}

fn write_line(sink: &Sink, line: &str) {
    write_text(sink, &format!("{line}\n"));
}

fn write_text(sink: &Sink, text: &str) {
    let mut writer = sink.lock().unwrap_or_else(PoisonError::into_inner);
    // A closed stdout (e.g. `bkt b | head`) is not worth failing the session over
    if let Err(e) = writer
        .write_all(text.as_bytes())
        .and_then(|()| writer.flush())
    {
        tracing::debug!("failed to write output: {e}");
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(OutputConfig::default())
    }
}

impl std::fmt::Debug for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
