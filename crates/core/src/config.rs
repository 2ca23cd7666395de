//! Configuration management
//!
//! Two kinds of configuration feed a session:
//! - `StoreConfig`: credentials, region and bucket, resolved from the process
//!   environment (optionally seeded from a `.env` file) once at startup.
//! - `SessionSettings`: presentation and command-set options, read from the
//!   TOML file at ~/.config/bkt/config.toml and overridden by CLI flags.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Region used when neither the environment nor the config file names one
pub const DEFAULT_REGION: &str = "eu-west-1";

/// Upper bound on a single store operation
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const ENV_ACCESS_KEY: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_ENDPOINT: &str = "AWS_ENDPOINT_URL";

/// How object sizes are shown in a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    /// Raw byte count
    #[default]
    Bytes,
    /// Binary megabytes (divisor 1,048,576)
    Mib,
    /// Scaled binary units (KiB, MiB, GiB...)
    Human,
}

impl FromStr for SizeUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bytes" | "b" => Ok(Self::Bytes),
            "mib" | "mb" => Ok(Self::Mib),
            "human" => Ok(Self::Human),
            _ => Err(format!(
                "unknown size unit '{s}', expected bytes, mib or human"
            )),
        }
    }
}

/// What the session does when the bucket turns out to be empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnEmpty {
    /// Report "no objects" and keep prompting
    #[default]
    Continue,
    /// Report "no objects" and end the session successfully
    Exit,
}

impl FromStr for OnEmpty {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "continue" => Ok(Self::Continue),
            "exit" => Ok(Self::Exit),
            _ => Err(format!("unknown policy '{s}', expected continue or exit")),
        }
    }
}

/// A command that can be enabled or disabled for a session
///
/// `exit` is always available and therefore not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
    List,
    Download,
    Upload,
    Delete,
}

impl CommandKind {
    pub const ALL: [CommandKind; 4] = [
        CommandKind::List,
        CommandKind::Delete,
        CommandKind::Download,
        CommandKind::Upload,
    ];

    /// The word typed at the prompt to select this command
    pub const fn word(self) -> &'static str {
        match self {
            CommandKind::List => "list",
            CommandKind::Download => "download",
            CommandKind::Upload => "upload",
            CommandKind::Delete => "delete",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.word())
    }
}

impl FromStr for CommandKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let word = s.trim().to_ascii_lowercase();
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.word() == word)
            .ok_or_else(|| {
                format!("unknown command '{s}', expected list, download, upload or delete")
            })
    }
}

/// Connection settings for the single bucket a session works on
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub bucket: String,
    /// Custom endpoint for S3-compatible services
    pub endpoint: Option<String>,
    /// Per-operation timeout applied to every store call
    pub timeout: Duration,
}

impl StoreConfig {
    /// Resolve the store configuration from the process environment
    ///
    /// A `.env` file in the working directory is read first if present;
    /// variables already set in the environment take precedence over it.
    pub fn from_env(bucket: impl Into<String>, defaults: &StoreDefaults) -> Result<Self> {
        Self::from_env_file(Path::new("."), bucket, defaults, |name| {
            std::env::var(name).ok()
        })
    }

    /// Resolve the store configuration from `env`, falling back to the
    /// `.env` file directly inside `dir`. Parent directories are not searched.
    pub fn from_env_file<F>(
        dir: &Path,
        bucket: impl Into<String>,
        defaults: &StoreDefaults,
        env: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_vars = read_dotenv(&dir.join(".env"))?;
        Self::from_lookup(bucket, defaults, |name| {
            env(name).or_else(|| file_vars.get(name).cloned())
        })
    }

    /// Resolve the store configuration from an arbitrary variable source
    pub fn from_lookup<F>(
        bucket: impl Into<String>,
        defaults: &StoreDefaults,
        lookup: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let access_key = non_empty(ENV_ACCESS_KEY)
            .ok_or_else(|| Error::Config(format!("{ENV_ACCESS_KEY} is not set")))?;
        let secret_key = non_empty(ENV_SECRET_KEY)
            .ok_or_else(|| Error::Config(format!("{ENV_SECRET_KEY} is not set")))?;
        let region = non_empty(ENV_REGION)
            .or_else(|| defaults.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let endpoint = non_empty(ENV_ENDPOINT).or_else(|| defaults.endpoint.clone());
        let timeout =
            Duration::from_secs(defaults.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        let config = Self {
            access_key,
            secret_key,
            region,
            bucket: bucket.into(),
            endpoint,
            timeout,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the values that cannot be left to the store to reject
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::Config("bucket name cannot be empty".into()));
        }
        if self.region.trim().is_empty() {
            return Err(Error::Config("region cannot be empty".into()));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be at least one second".into()));
        }
        if let Some(endpoint) = &self.endpoint {
            let url = url::Url::parse(endpoint)?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "endpoint must use http or https: {endpoint}"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn read_dotenv(path: &Path) -> Result<HashMap<String, String>> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => {
            tracing::debug!("no .env file found, using process environment only");
            return Ok(HashMap::new());
        }
        Err(e) => return Err(Error::Config(format!("failed to load .env file: {e}"))),
    };

    let mut vars = HashMap::new();
    for entry in entries {
        let (name, value) = entry
            .map_err(|e| Error::Config(format!("failed to parse {}: {e}", path.display())))?;
        vars.insert(name, value);
    }
    tracing::debug!(path = %path.display(), count = vars.len(), "loaded environment file");
    Ok(vars)
}

/// Settings that shape one interactive session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub size_unit: SizeUnit,
    pub on_empty: OnEmpty,
    /// Commands offered at the prompt, in prompt order
    pub commands: Vec<CommandKind>,
    /// Render listings as a table instead of one line per object
    pub table: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            size_unit: SizeUnit::default(),
            on_empty: OnEmpty::default(),
            commands: CommandKind::ALL.to_vec(),
            table: false,
        }
    }
}

impl SessionSettings {
    /// Build settings from the `[session]` section of the config file
    pub fn from_file(section: &SessionSection) -> Self {
        let defaults = Self::default();
        Self {
            size_unit: section.size_unit.unwrap_or(defaults.size_unit),
            on_empty: section.on_empty.unwrap_or(defaults.on_empty),
            commands: section.commands.clone().unwrap_or(defaults.commands),
            table: section.table.unwrap_or(defaults.table),
        }
    }

    pub fn is_enabled(&self, kind: CommandKind) -> bool {
        self.commands.contains(&kind)
    }
}

/// Main configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Schema version for migration support
    pub schema_version: u32,

    #[serde(default)]
    pub session: SessionSection,

    #[serde(default)]
    pub store: StoreDefaults,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            session: SessionSection::default(),
            store: StoreDefaults::default(),
        }
    }
}

/// `[session]` section: defaults for `SessionSettings`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_unit: Option<SizeUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_empty: Option<OnEmpty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<Vec<CommandKind>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<bool>,
}

/// `[store]` section: fallbacks for values the environment does not provide
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Configuration manager handles locating and loading the config file
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join("bkt").join("config.toml");
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    pub fn load(&self) -> Result<FileConfig> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(FileConfig::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let config: FileConfig = toml::from_str(&content)?;

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade bkt.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }
}
