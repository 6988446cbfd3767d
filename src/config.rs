use crate::error::AppError;
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "sender-sweep.toml";
const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_POLL_INTERVAL_MS: u64 = 300;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

#[derive(Parser, Debug, Default)]
#[command(name = "sender-sweep")]
#[command(about = "Desktop panel for scanning and purging bulk mail senders", long_about = None)]
pub struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base URL of the scan backend
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Delay between progress polls, in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// What to do when a backend request fails
    #[arg(long, value_enum)]
    pub on_error: Option<OnError>,

    /// Consecutive failed polls tolerated with --on-error retry
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Delay before retrying a failed poll, in milliseconds
    #[arg(long)]
    pub retry_delay_ms: Option<u64>,

    /// Directory exported CSV files are written to
    #[arg(long)]
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    #[default]
    Fail,
    Retry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    backend_url: Option<String>,
    poll_interval_ms: Option<u64>,
    on_error: Option<OnError>,
    max_retries: Option<u32>,
    retry_delay_ms: Option<u64>,
    export_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailurePolicy {
    FailFast,
    Retry { max_retries: u32, delay: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub failure: FailurePolicy,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            failure: FailurePolicy::FailFast,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub backend_url: Url,
    pub poll: PollConfig,
    pub export_dir: PathBuf,
}

/// Parses a base URL and makes sure relative endpoint paths join under it.
pub fn base_url(raw: &str) -> Result<Url, AppError> {
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(AppError::Url(format!("{raw} cannot be used as a base URL")));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn read_file_config(path: &Path) -> Result<FileConfig, AppError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))?;
    Ok(toml::from_str(&raw)?)
}

/// Defaults, then the config file, then command-line flags.
pub fn load_settings(cli: &Cli) -> Result<Settings, AppError> {
    let file = match &cli.config {
        Some(path) => read_file_config(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            read_file_config(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => FileConfig::default(),
    };

    let backend_url = cli
        .backend_url
        .clone()
        .or(file.backend_url)
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
    let interval = cli
        .poll_interval_ms
        .or(file.poll_interval_ms)
        .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

    let failure = match cli.on_error.or(file.on_error).unwrap_or_default() {
        OnError::Fail => FailurePolicy::FailFast,
        OnError::Retry => FailurePolicy::Retry {
            max_retries: cli
                .max_retries
                .or(file.max_retries)
                .unwrap_or(DEFAULT_MAX_RETRIES),
            delay: Duration::from_millis(
                cli.retry_delay_ms
                    .or(file.retry_delay_ms)
                    .unwrap_or(DEFAULT_RETRY_DELAY_MS),
            ),
        },
    };

    let export_dir = cli
        .export_dir
        .clone()
        .or(file.export_dir)
        .unwrap_or_else(|| PathBuf::from("."));

    Ok(Settings {
        backend_url: base_url(&backend_url)?,
        poll: PollConfig {
            interval: Duration::from_millis(interval),
            failure,
        },
        export_dir,
    })
}
