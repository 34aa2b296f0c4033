//! INI serialization logic for converting `ConfigFile` → INI string.

use std::path::Path;

use super::duration::format_duration;
use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let socket = config.renderd.socket.as_deref().unwrap_or("");
    let tls_cert = optional_path(config.server.tls_cert.as_deref());
    let tls_key = optional_path(config.server.tls_key.as_deref());
    let osm_file = optional_path(config.renderer.osm_file.as_deref());

    format!(
        r#"[server]
; HTTP listening host and port
host = {}
port = {}
; Directory served for every path outside /tile/
static_dir = {}
; HTTPS listener, enabled only when both tls_cert and tls_key are set
tls_port = {}
; PEM certificate chain and private key
tls_cert = {}
tls_key = {}

[metatiles]
; Root of the mod_tile metatile tree
directory = {}
; Map name (at most 43 bytes), also the subdirectory below the root
map = {}
; Age after which a tile is re-rendered in the background (e.g. 168h).
; 0 disables expiration.
tile_expiration = {}

[renderd]
; host:port or Unix socket path of renderd. Empty disables rendering.
socket = {}
; Deadline for one render request (e.g. 30s). 0 or negative waits forever.
timeout = {}

[renderer]
; OSM PBF extract used by `tileforge render`
osm_file = {}
; Deepest zoom level stored in the spatial index
max_zoom = {}
; Zoom level from which minor (non-highway) ways are indexed
detail_zoom = {}

[logging]
; Log file path (default: ~/.tileforge/tileforge.log)
file = {}
; Debug output
verbose = {}
"#,
        config.server.host,
        config.server.port,
        path_to_string(&config.server.static_dir),
        config.server.tls_port,
        tls_cert,
        tls_key,
        path_to_string(&config.metatiles.directory),
        config.metatiles.map,
        format_duration(config.metatiles.tile_expiration),
        socket,
        format_duration(config.renderd.timeout),
        osm_file,
        config.renderer.max_zoom,
        config.renderer.detail_zoom,
        path_to_string(&config.logging.file),
        config.logging.verbose,
    )
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn optional_path(path: Option<&Path>) -> String {
    path.map(path_to_string).unwrap_or_default()
}
