//! INI configuration for the tile server.
//!
//! # Example
//!
//! ```
//! use tileforge::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.server.port, 8080);
//! assert_eq!(config.metatiles.map, "ajt");
//! ```

mod defaults;
mod duration;
mod file;
mod parser;
mod settings;
mod writer;

pub use defaults::*;
pub use duration::{format_duration, parse_duration, DurationParseError};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use parser::{validate_map_name, validate_zoom};
pub use settings::{
    ConfigFile, LoggingSettings, MetatileSettings, RenderdSettings, RendererSettings,
    ServerSettings,
};
