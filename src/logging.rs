use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::domain::DataAppError;

const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Expands `~` and environment variables in a user supplied path.
pub fn expand_path(path: &Path) -> Result<PathBuf, DataAppError> {
    let raw = path.to_string_lossy();
    let expanded =
        shellexpand::full(&raw).map_err(|e| DataAppError::LoggingFailed(e.to_string()))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// The viewer owns the terminal, so its log lines are appended to a file.
pub fn init_file_logging(path: &Path) -> Result<PathBuf, DataAppError> {
    let path = expand_path(path)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| DataAppError::LoggingFailed(format!("{}: {e}", path.display())))?;

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| DataAppError::LoggingFailed(e.to_string()))?;
    Ok(path)
}

pub fn init_stderr_logging() -> Result<(), DataAppError> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| DataAppError::LoggingFailed(e.to_string()))
}
