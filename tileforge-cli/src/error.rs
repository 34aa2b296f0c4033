//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use tileforge::config::ConfigFileError;
use tileforge::coord::CoordError;
use tileforge::index::IndexError;
use tileforge::renderd::RenderdError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to reach renderd at startup
    Renderd(RenderdError),
    /// Failed to build the spatial index
    Index(IndexError),
    /// Invalid tile coordinates
    Tile(CoordError),
    /// HTTP server error
    Serve(std::io::Error),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Renderd(_) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. renderd not running: check its service status");
                eprintln!("  2. Wrong socket: set [renderd] socket in config.ini or use --renderd");
                eprintln!("  3. Permissions: the socket must be readable by this user");
            }
            CliError::Serve(_) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. Port in use: choose another with --port");
                eprintln!("  2. Privileged port: ports below 1024 need extra permissions");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Renderd(e) => write!(f, "Cannot reach renderd: {}", e),
            CliError::Index(e) => write!(f, "Failed to build spatial index: {}", e),
            CliError::Tile(e) => write!(f, "Invalid tile: {}", e),
            CliError::Serve(e) => write!(f, "HTTP server error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Renderd(e) => Some(e),
            CliError::Index(e) => Some(e),
            CliError::Tile(e) => Some(e),
            CliError::Serve(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<IndexError> for CliError {
    fn from(e: IndexError) -> Self {
        CliError::Index(e)
    }
}

impl From<RenderdError> for CliError {
    fn from(e: RenderdError) -> Self {
        CliError::Renderd(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Tile(e)
    }
}
