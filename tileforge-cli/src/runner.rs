//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and the tokio
//! runtime so command handlers stay small.

use crate::error::CliError;
use std::future::Future;
use std::path::{Path, PathBuf};
use tileforge::config::{config_file_path, ConfigFile};
use tileforge::logging::{init_logging_at, LoggingGuard};
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    config: ConfigFile,
}

impl CliRunner {
    /// Load config (`--config` or ~/.tileforge/config.ini) and start logging.
    ///
    /// `verbose` enables debug output even if the config file does not.
    pub fn new(config_path: Option<&Path>, verbose: bool) -> Result<Self, CliError> {
        let config = load_config(config_path)?;
        let verbose = verbose || config.logging.verbose;

        let logging_guard = init_logging_at(&config.logging.file, verbose)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("tileforge v{}", tileforge::VERSION);
        info!("tileforge CLI: {} command", command);
    }

    /// Drive `future` to completion on a fresh multi-threaded runtime.
    pub fn block_on<F, T>(&self, future: F) -> Result<T, CliError>
    where
        F: Future<Output = Result<T, CliError>>,
    {
        let runtime = tokio::runtime::Runtime::new().map_err(CliError::Serve)?;
        runtime.block_on(future)
    }
}

/// Resolve the config file path from an optional override.
pub fn resolve_config_path(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path)
}

fn load_config(config_path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let path = resolve_config_path(config_path);
    Ok(ConfigFile::load_from(&path)?)
}

/// Wait for Ctrl-C or, on Unix, SIGTERM.
///
/// A handler that cannot be installed is logged and treated as an
/// immediate shutdown request.
pub async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => info!("Interrupt received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}
