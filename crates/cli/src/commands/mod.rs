//! CLI definition and startup
//!
//! Parses flags, resolves configuration (flags, then environment, then the
//! config file), builds the store client and hands over to the session loop.

use std::path::PathBuf;

use bkt_core::{
    CommandKind, ConfigManager, FileConfig, OnEmpty, Result, SessionSettings, SizeUnit,
    StoreConfig,
};
use bkt_s3::S3Client;
use clap::{CommandFactory, Parser};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};
use crate::session::{LineReader, Session};

pub mod download;
pub mod ls;
pub mod rm;
pub mod upload;

/// bkt - interactive shell for one object-store bucket
///
/// Lists the bucket, then reads commands from stdin until `exit`.
/// Credentials come from AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY
/// (optionally via a .env file in the working directory).
#[derive(Parser, Debug)]
#[command(name = "bkt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Bucket to work on
    pub bucket: Option<String>,

    /// Region (overrides AWS_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Endpoint URL of an S3-compatible service (overrides AWS_ENDPOINT_URL)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Unit used for object sizes in listings: bytes, mib or human
    #[arg(long)]
    pub size_unit: Option<SizeUnit>,

    /// What to do when the bucket is empty: continue or exit
    #[arg(long)]
    pub on_empty: Option<OnEmpty>,

    /// Commands offered at the prompt
    #[arg(long, value_delimiter = ',')]
    pub commands: Option<Vec<CommandKind>>,

    /// Render listings as a table
    #[arg(long, default_value = "false")]
    pub table: bool,

    /// Timeout for each store request, in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Config file to use instead of the default location
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output listings and outcomes as JSON lines
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub debug: bool,
}

/// Run the CLI and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let Some(bucket) = cli.bucket.clone() else {
        eprintln!("{}", Cli::command().render_usage());
        return ExitCode::GeneralError;
    };

    let formatter = Formatter::new(OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        no_progress: cli.no_progress,
        quiet: cli.quiet,
    });

    let (store_config, settings) = match resolve_config(&cli, &bucket) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!("configuration failed: {e}");
            formatter.error(&e.to_string());
            return ExitCode::from_error(&e);
        }
    };
    tracing::debug!(?store_config, ?settings, "configuration resolved");

    let client = match S3Client::new(&store_config).await {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("failed to create store client: {e}");
            formatter.error(&format!("Failed to create store client: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    let session = Session::new(&client, bucket, settings, formatter);
    let end = session.run(&mut LineReader::stdin()).await;
    end.exit_code()
}

fn resolve_config(cli: &Cli, bucket: &str) -> Result<(StoreConfig, SessionSettings)> {
    let file = load_file_config(cli.config.clone())?;

    let mut store = StoreConfig::from_env(bucket, &file.store)?;
    if let Some(region) = &cli.region {
        store.region = region.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        store.endpoint = Some(endpoint.clone());
    }
    if let Some(secs) = cli.timeout_secs {
        store.timeout = std::time::Duration::from_secs(secs);
    }
    store.validate()?;

    Ok((store, session_settings(cli, &file)))
}

fn load_file_config(path: Option<PathBuf>) -> Result<FileConfig> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path),
        None => match ConfigManager::new() {
            Ok(manager) => manager,
            Err(e) => {
                tracing::debug!("skipping config file: {e}");
                return Ok(FileConfig::default());
            }
        },
    };
    manager.load()
}

fn session_settings(cli: &Cli, file: &FileConfig) -> SessionSettings {
    let mut settings = SessionSettings::from_file(&file.session);
    if let Some(unit) = cli.size_unit {
        settings.size_unit = unit;
    }
    if let Some(on_empty) = cli.on_empty {
        settings.on_empty = on_empty;
    }
    if let Some(commands) = &cli.commands {
        settings.commands = commands.clone();
    }
    settings.table |= cli.table;
    settings
}
