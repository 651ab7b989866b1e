use crate::api::{parse_base_url, BASE_URL};
use crate::error::{AppError, Result};
use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Backend proxy for the World Air Quality Index API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// WAQI API token
    #[arg(long, env = "AQICN", hide_env_values = true)]
    pub api_key: String,

    /// Address to bind the HTTP server to
    #[arg(long, env = "AQI_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// Base URL of the WAQI API
    #[arg(long, env = "AQI_PROVIDER_URL", default_value = BASE_URL)]
    pub provider_url: String,

    /// Timeout for each provider request, in seconds
    #[arg(long, env = "AQI_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Also write logs to a daily-rolling file in this directory
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

/// How log lines are rendered.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Pretty,
    /// One JSON object per line
    Json,
}

/// Validated runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub addr: SocketAddr,
    pub provider_url: String,
    pub timeout: Duration,
    pub log_format: LogFormat,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Loads `.env` (if present), then parses flags and environment variables.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_cli(Cli::parse())
    }

    /// Validates parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for a blank API token, a zero timeout, or a
    /// provider URL that is not an absolute http(s) URL.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let api_key = cli.api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(AppError::Config("AQICN API token must not be empty".into()));
        }

        if cli.timeout_secs == 0 {
            return Err(AppError::Config(
                "provider timeout must be at least one second".into(),
            ));
        }

        parse_base_url(&cli.provider_url)?;

        Ok(Self {
            api_key,
            addr: SocketAddr::new(cli.host, cli.port),
            provider_url: cli.provider_url,
            timeout: Duration::from_secs(cli.timeout_secs),
            log_format: cli.log_format,
            log_dir: cli.log_dir,
        })
    }
}
