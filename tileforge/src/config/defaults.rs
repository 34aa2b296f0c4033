//! Default values and constants for all configuration settings.

use std::path::PathBuf;
use std::time::Duration;

use super::file::config_directory;
use super::settings::*;
use crate::index::{DEFAULT_DETAIL_ZOOM, DEFAULT_MAX_ZOOM};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TLS_PORT: u16 = 8443;
pub const DEFAULT_STATIC_DIR: &str = "./static/";
pub const DEFAULT_METATILE_DIR: &str = "./data";
pub const DEFAULT_MAP_NAME: &str = "ajt";

/// Default renderd deadline in seconds.
pub const DEFAULT_RENDERD_TIMEOUT_SECS: u64 = 60;

/// Default log file name inside the config directory.
pub const DEFAULT_LOG_FILE: &str = "tileforge.log";

/// Default log file path (~/.tileforge/tileforge.log).
pub fn default_log_file() -> PathBuf {
    config_directory().join(DEFAULT_LOG_FILE)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: DEFAULT_HOST.to_string(),
                port: DEFAULT_PORT,
                static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
                tls_port: DEFAULT_TLS_PORT,
                tls_cert: None,
                tls_key: None,
            },
            metatiles: MetatileSettings {
                directory: PathBuf::from(DEFAULT_METATILE_DIR),
                map: DEFAULT_MAP_NAME.to_string(),
                tile_expiration: None,
            },
            renderd: RenderdSettings {
                socket: None,
                timeout: Some(Duration::from_secs(DEFAULT_RENDERD_TIMEOUT_SECS)),
            },
            renderer: RendererSettings {
                osm_file: None,
                max_zoom: DEFAULT_MAX_ZOOM,
                detail_zoom: DEFAULT_DETAIL_ZOOM,
            },
            logging: LoggingSettings {
                file: default_log_file(),
                verbose: false,
            },
        }
    }
}
