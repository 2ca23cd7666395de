//! Error types for bkt-core
//!
//! Provides a unified error type that can be converted to appropriate exit codes.

use thiserror::Error;

/// Result type alias for bkt-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for bkt-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed configuration (credentials, region, config file)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote store could not serve the request (transport, throttling, 5xx)
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Credentials were rejected by the store
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Bucket or object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Local filesystem failure while reading or writing a transfer
    #[error("Local IO error: {0}")]
    LocalIo(#[from] std::io::Error),

    /// User supplied a key or path that cannot be used
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// URL parsing error
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Get the appropriate exit code for this error
    pub const fn exit_code(&self) -> i32 {
        match self {
            Error::Config(_) | Error::TomlParse(_) | Error::InvalidUrl(_) => 2, // ConfigError
            Error::StoreUnavailable(_) => 3, // StoreUnavailable
            Error::Auth(_) => 4,             // AuthError
            Error::NotFound(_) => 5,         // NotFound
            _ => 1,                          // GeneralError
        }
    }
}
