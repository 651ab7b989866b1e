mod api;
mod cli;
mod error;
mod models;
mod server;

use api::WaqiClient;
use cli::{Config, LogFormat};
use colored::*;
use error::Result;
use server::AppState;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration comes first: it decides how logging is set up
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            return Err(e);
        },
    };

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_logging(&config);

    info!("Initializing AQI proxy...");

    let provider = WaqiClient::new(config.api_key.clone(), &config.provider_url, config.timeout)
        .map_err(|e| {
            error!("Failed to create provider client: {:?}", e);
            e
        })?;
    info!(
        provider = %config.provider_url,
        timeout_secs = config.timeout.as_secs(),
        "Provider client ready"
    );

    let listener = TcpListener::bind(config.addr).await.map_err(|e| {
        error!("Failed to bind {}: {}", config.addr, e);
        e
    })?;

    println!(
        "{} {}",
        "AQI proxy running on".cyan().bold(),
        format!("http://{}", listener.local_addr()?).green()
    );

    server::serve(listener, server::router(AppState { provider })).await
}

/// Installs the global subscriber: stdout in the configured format, plus a
/// daily-rolling file when a log directory is configured.
fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "aqi-proxy.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        },
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }

    guard
}
