//! Logging setup for Vigil.
//!
//! The notification core never surfaces transport or audio failures to the
//! user directly; everything it swallows ends up here, so the log file is
//! the side channel the error-handling design leans on. Two outputs: JSON
//! lines to a daily-rolling file under `~/.vigil/logs/` and a compact
//! human-readable stream on stderr.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::error::{Result, VigilError};

/// Keeps the non-blocking file writer flushing.
///
/// Hold this for the lifetime of the application; dropping it flushes any
/// pending log entries.
pub struct LogGuard {
    _file_guard: WorkerGuard,
}

/// Initialize logging. Call once at startup.
///
/// `log_dir` overrides the default `~/.vigil/logs/`; `verbose` raises the
/// default level from INFO to DEBUG (`RUST_LOG` overrides both).
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };
    std::fs::create_dir_all(&log_dir).map_err(|e| VigilError::DirectoryCreation {
        path: log_dir.clone(),
        source: e,
    })?;

    let (file_writer, file_guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, "vigil.log"));

    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vigil={default_level}")));

    let file_layer = fmt::layer()
        .json()
        .with_writer(file_writer)
        .with_ansi(false);

    let console_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(verbose)
        .with_line_number(verbose);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    tracing::debug!(log_dir = %log_dir.display(), verbose, "logging initialized");

    Ok(LogGuard {
        _file_guard: file_guard,
    })
}

/// Get the default log directory path (`~/.vigil/logs/`).
pub fn default_log_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| VigilError::Internal {
        message: "Could not determine home directory".into(),
    })?;
    Ok(home.join(".vigil").join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_log_dir() {
        // SAFETY: test context; no other test in this crate reads HOME
        // concurrently.
        unsafe { std::env::set_var("HOME", "/tmp/test-home") };
        let dir = default_log_dir().unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/test-home/.vigil/logs"));
    }

    #[test]
    fn test_init_logging_creates_log_dir() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");

        // Sole test in this crate installing the global subscriber.
        let guard = init_logging(Some(log_dir.clone()), true);
        assert!(guard.is_ok());
        assert!(log_dir.is_dir());
    }
}
