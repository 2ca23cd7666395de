//! Output formatting utilities
//!
//! The interactive protocol lives on stdout; errors and progress go to
//! stderr. Both streams are owned by the `Formatter` so tests can capture
//! them.

#[cfg(test)]
pub(crate) mod capture;
mod formatter;
mod progress;

pub use formatter::Formatter;
pub use progress::TransferProgress;

/// Output configuration derived from CLI flags
#[derive(Debug, Clone, Default)]
pub struct OutputConfig {
    /// Emit listings and outcomes as JSON lines
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
    /// Disable progress bar
    pub no_progress: bool,
    /// Suppress non-error output
    pub quiet: bool,
}
