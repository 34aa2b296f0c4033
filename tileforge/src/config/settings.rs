//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// HTTP listener settings
    pub server: ServerSettings,
    /// Metatile store settings
    pub metatiles: MetatileSettings,
    /// renderd connection settings
    pub renderd: RenderdSettings,
    /// In-process renderer settings
    pub renderer: RendererSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    /// Listen host
    pub host: String,
    /// Listen port
    pub port: u16,
    /// Directory served for non-tile paths
    pub static_dir: PathBuf,
    /// HTTPS port, used only when both `tls_cert` and `tls_key` are set
    pub tls_port: u16,
    /// PEM certificate chain
    pub tls_cert: Option<PathBuf>,
    /// PEM private key
    pub tls_key: Option<PathBuf>,
}

impl ServerSettings {
    /// Certificate and key paths, when HTTPS is enabled.
    pub fn tls_paths(&self) -> Option<(&Path, &Path)> {
        match (&self.tls_cert, &self.tls_key) {
            (Some(cert), Some(key)) => Some((cert.as_path(), key.as_path())),
            _ => None,
        }
    }
}

/// Metatile store configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MetatileSettings {
    /// Root of the metatile tree
    pub directory: PathBuf,
    /// Map name, also the first directory below `directory`
    pub map: String,
    /// Age after which tiles are re-rendered in the background.
    /// `None` disables staleness checks.
    pub tile_expiration: Option<Duration>,
}

/// renderd configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderdSettings {
    /// `host:port` or Unix socket path; `None` disables rendering
    pub socket: Option<String>,
    /// Deadline for one render request; `None` waits indefinitely
    pub timeout: Option<Duration>,
}

/// In-process renderer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererSettings {
    /// OSM PBF extract to index
    pub osm_file: Option<PathBuf>,
    /// Deepest indexed zoom level
    pub max_zoom: u32,
    /// Zoom level from which minor ways are indexed
    pub detail_zoom: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
    /// Enable debug output
    pub verbose: bool,
}
