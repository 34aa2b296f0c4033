//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;

use super::duration::parse_duration;
use super::file::ConfigFileError;
use super::settings::ConfigFile;
use crate::coord::MAX_ZOOM;
use crate::renderd::MAX_MAP_NAME_LEN;

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

const ZOOM_RANGE_REASON: &str = "must be a zoom level between 0 and 30";
const MAP_NAME_REASON: &str = "must be between 1 and 43 bytes long";

fn parse_zoom(section: &str, key: &str, v: &str) -> Result<u32, ConfigFileError> {
    match v.trim().parse::<u32>() {
        Ok(z) if z <= MAX_ZOOM => Ok(z),
        _ => Err(invalid(section, key, v, ZOOM_RANGE_REASON)),
    }
}

/// Check a `[renderer]` zoom level given outside the config file.
pub fn validate_zoom(key: &str, zoom: u32) -> Result<u32, ConfigFileError> {
    if zoom > MAX_ZOOM {
        return Err(invalid("renderer", key, &zoom.to_string(), ZOOM_RANGE_REASON));
    }
    Ok(zoom)
}

/// Check a map name given outside the config file.
///
/// renderd frames carry at most 43 bytes of map name.
pub fn validate_map_name(name: &str) -> Result<&str, ConfigFileError> {
    if name.is_empty() || name.len() > MAX_MAP_NAME_LEN {
        return Err(invalid("metatiles", "map", name, MAP_NAME_REASON));
    }
    Ok(name)
}

fn optional_path(v: &str) -> Option<PathBuf> {
    let v = v.trim();
    (!v.is_empty()).then(|| expand_tilde(v))
}

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [server] section
    if let Some(section) = ini.section(Some("server")) {
        if let Some(v) = section.get("host") {
            let v = v.trim();
            if !v.is_empty() {
                config.server.host = v.to_string();
            }
        }
        if let Some(v) = section.get("port") {
            config.server.port = v
                .trim()
                .parse()
                .map_err(|_| invalid("server", "port", v, "must be a port number (1-65535)"))?;
        }
        if let Some(v) = section.get("static_dir") {
            let v = v.trim();
            if !v.is_empty() {
                config.server.static_dir = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("tls_port") {
            config.server.tls_port = v
                .trim()
                .parse()
                .map_err(|_| invalid("server", "tls_port", v, "must be a port number (1-65535)"))?;
        }
        if let Some(v) = section.get("tls_cert") {
            config.server.tls_cert = optional_path(v);
        }
        if let Some(v) = section.get("tls_key") {
            config.server.tls_key = optional_path(v);
        }
    }

    // [metatiles] section
    if let Some(section) = ini.section(Some("metatiles")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.metatiles.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("map") {
            let v = v.trim();
            config.metatiles.map = validate_map_name(v)?.to_string();
        }
        if let Some(v) = section.get("tile_expiration") {
            config.metatiles.tile_expiration = parse_duration(v)
                .map_err(|e| invalid("metatiles", "tile_expiration", v, &e.to_string()))?;
        }
    }

    // [renderd] section
    if let Some(section) = ini.section(Some("renderd")) {
        if let Some(v) = section.get("socket") {
            let v = v.trim();
            config.renderd.socket = (!v.is_empty()).then(|| v.to_string());
        }
        if let Some(v) = section.get("timeout") {
            config.renderd.timeout = parse_duration(v)
                .map_err(|e| invalid("renderd", "timeout", v, &e.to_string()))?;
        }
    }

    // [renderer] section
    if let Some(section) = ini.section(Some("renderer")) {
        if let Some(v) = section.get("osm_file") {
            let v = v.trim();
            config.renderer.osm_file = (!v.is_empty()).then(|| expand_tilde(v));
        }
        if let Some(v) = section.get("max_zoom") {
            config.renderer.max_zoom = parse_zoom("renderer", "max_zoom", v)?;
        }
        if let Some(v) = section.get("detail_zoom") {
            config.renderer.detail_zoom = parse_zoom("renderer", "detail_zoom", v)?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("verbose") {
            config.logging.verbose = parse_bool(v)
                .ok_or_else(|| invalid("logging", "verbose", v, "must be true or false"))?;
        }
    }

    Ok(config)
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
