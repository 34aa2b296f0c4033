//! Logging setup for the tile server.
//!
//! Provides structured logging with file output and console output:
//! - Writes to the configured log file (cleared on start)
//! - Also prints to stdout
//! - Configurable via RUST_LOG environment variable

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Filter directive used when RUST_LOG is not set.
///
/// Verbose mode keeps the HTTP stack's connection chatter at info.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug,hyper=info,hyper_util=info,h2=info"
    } else {
        "info"
    }
}

/// Initialize logging.
///
/// Creates the log directory if needed, clears the previous log file and
/// sets up output to both file and stdout.
///
/// # Arguments
///
/// * `log_dir` - Directory for log files
/// * `log_file` - Log filename (e.g., "tileforge.log")
/// * `verbose` - Log at debug level unless RUST_LOG says otherwise
///
/// # Errors
///
/// Returns error if the log directory cannot be created or the log file
/// cannot be cleared
pub fn init_logging(log_dir: &Path, log_file: &str, verbose: bool) -> Result<LoggingGuard, io::Error> {
    fs::create_dir_all(log_dir)?;
    fs::write(log_dir.join(log_file), "")?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE);

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_ansi(true)
        .compact();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Initialize logging from a full log file path.
pub fn init_logging_at(path: &Path, verbose: bool) -> Result<LoggingGuard, io::Error> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid log file path: {}", path.display()),
            )
        })?;
    init_logging(dir, file, verbose)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter() {
        assert_eq!(default_filter(false), "info");
        assert!(default_filter(true).starts_with("debug,"));
        assert!(EnvFilter::try_new(default_filter(true)).is_ok());
    }

    #[test]
    fn test_rejects_path_without_file_name() {
        // Fails before touching the global subscriber.
        let err = init_logging_at(Path::new("/"), false).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_guard_structure() {
        use tracing_appender::non_blocking::NonBlocking;

        let (non_blocking, guard) = NonBlocking::new(std::io::sink());
        drop(non_blocking);

        let _logging_guard = LoggingGuard { _file_guard: guard };
    }

    // Actual log output needs an integration test: the global subscriber
    // can only be installed once per process.
}
