//! Exit code definitions for the bkt CLI
//!
//! Scripts driving bkt through stdin rely on these values; changing one is a
//! breaking change.

use bkt_core::Error;

/// Exit codes for the bkt CLI application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Session ended normally
    Success = 0,

    /// General/unspecified error, including a missing bucket argument
    GeneralError = 1,

    /// Configuration error: missing credentials, bad endpoint, bad config file
    ConfigError = 2,

    /// Store unreachable or failing: timeout, connection reset, 5xx
    StoreUnavailable = 3,

    /// Authentication or permission failure
    AuthError = 4,

    /// Bucket does not exist
    NotFound = 5,
}

impl ExitCode {
    /// Convert exit code to i32 for use with std::process::exit
    #[inline]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// Create exit code from i32 value
    ///
    /// Returns None if the value doesn't correspond to a known exit code.
    pub const fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::GeneralError),
            2 => Some(Self::ConfigError),
            3 => Some(Self::StoreUnavailable),
            4 => Some(Self::AuthError),
            5 => Some(Self::NotFound),
            _ => None,
        }
    }

    /// Exit code for a fatal error
    pub const fn from_error(error: &Error) -> Self {
        match Self::from_i32(error.exit_code()) {
            Some(Self::Success) | None => Self::GeneralError,
            Some(code) => code,
        }
    }
}
