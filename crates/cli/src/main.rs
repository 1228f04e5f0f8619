use std::process::ExitCode;

use anyhow::{Context, Result};
use clientlens_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing::Level;

fn init_logging(config: &AppConfig) -> Result<()> {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(anyhow::Error::msg).context("failed to install tracing subscriber")
}

fn main() -> Result<ExitCode> {
    // Commands report config errors themselves; logging falls back to defaults.
    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    init_logging(&config)?;

    Ok(clientlens_cli::run())
}
