//! Helpers shared by the serving commands.

use crate::error::CliError;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use tileforge::config::{validate_map_name, MetatileSettings, ServerSettings};
use tileforge::server::TlsListener;

/// Listener overrides accepted by every serving command.
#[derive(Debug, Default, Clone)]
pub struct ListenArgs {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<PathBuf>,
    pub tls_port: Option<u16>,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
}

impl ListenArgs {
    /// Resolve the listen address: CLI > config.
    pub fn address(&self, settings: &ServerSettings) -> Result<SocketAddr, CliError> {
        let host = self.host.as_deref().unwrap_or(&settings.host);
        let port = self.port.unwrap_or(settings.port);
        resolve_listen_addr(host, port)
    }

    /// Resolve the HTTPS listener: CLI > config. `None` unless both a
    /// certificate and a key are known.
    pub fn tls_listener(&self, settings: &ServerSettings) -> Result<Option<TlsListener>, CliError> {
        let cert = self.tls_cert.clone().or_else(|| settings.tls_cert.clone());
        let key = self.tls_key.clone().or_else(|| settings.tls_key.clone());
        let (Some(cert), Some(key)) = (cert, key) else {
            return Ok(None);
        };

        let host = self.host.as_deref().unwrap_or(&settings.host);
        let port = self.tls_port.unwrap_or(settings.tls_port);
        Ok(Some(TlsListener {
            addr: resolve_listen_addr(host, port)?,
            cert,
            key,
        }))
    }

    pub fn static_dir(&self, settings: &ServerSettings) -> PathBuf {
        self.static_dir
            .clone()
            .unwrap_or_else(|| settings.static_dir.clone())
    }
}

/// Resolve the map name (CLI > config) and check it fits a renderd frame.
pub fn resolve_map(map: Option<String>, settings: &MetatileSettings) -> Result<String, CliError> {
    let map = map.unwrap_or_else(|| settings.map.clone());
    validate_map_name(&map)?;
    Ok(map)
}

/// Resolve `host:port` to the first matching socket address.
pub fn resolve_listen_addr(host: &str, port: u16) -> Result<SocketAddr, CliError> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| CliError::Config(format!("Cannot resolve listen address {}:{}: {}", host, port, e)))?
        .next()
        .ok_or_else(|| CliError::Config(format!("No address found for {}:{}", host, port)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tileforge::config::ConfigFile;

    #[test]
    fn test_resolve_listen_addr_ip() {
        let addr = resolve_listen_addr("127.0.0.1", 8080).unwrap();
        assert_eq!(addr, "127.0.0.1:8080".parse().unwrap());
    }

    #[test]
    fn test_listen_args_fall_back_to_config() {
        let config = ConfigFile::default();
        let args = ListenArgs::default();
        let addr = args.address(&config.server).unwrap();
        assert_eq!(addr.port(), config.server.port);
        assert_eq!(args.static_dir(&config.server), config.server.static_dir);
    }

    #[test]
    fn test_tls_disabled_without_key() {
        let config = ConfigFile::default();
        let args = ListenArgs {
            tls_cert: Some(PathBuf::from("/etc/tileforge/cert.pem")),
            ..Default::default()
        };
        assert_eq!(args.tls_listener(&config.server).unwrap(), None);
    }

    #[test]
    fn test_tls_listener_merges_cli_and_config() {
        let mut config = ConfigFile::default();
        config.server.tls_key = Some(PathBuf::from("/etc/tileforge/key.pem"));
        let args = ListenArgs {
            host: Some("127.0.0.1".to_string()),
            tls_cert: Some(PathBuf::from("/etc/tileforge/cert.pem")),
            ..Default::default()
        };

        let tls = args.tls_listener(&config.server).unwrap().unwrap();
        assert_eq!(tls.addr, "127.0.0.1:8443".parse().unwrap());
        assert_eq!(tls.cert, PathBuf::from("/etc/tileforge/cert.pem"));
        assert_eq!(tls.key, PathBuf::from("/etc/tileforge/key.pem"));
    }

    #[test]
    fn test_resolve_map_prefers_override() {
        let config = ConfigFile::default();
        assert_eq!(resolve_map(None, &config.metatiles).unwrap(), config.metatiles.map);
        assert_eq!(resolve_map(Some("osm".to_string()), &config.metatiles).unwrap(), "osm");
    }

    #[test]
    fn test_resolve_map_rejects_oversized_override() {
        let config = ConfigFile::default();
        let err = resolve_map(Some("m".repeat(44)), &config.metatiles).unwrap_err();
        assert!(matches!(err, CliError::Config(ref msg) if msg.contains("metatiles.map")));
        assert!(resolve_map(Some(String::new()), &config.metatiles).is_err());
    }

    #[test]
    fn test_listen_args_override_config() {
        let config = ConfigFile::default();
        let args = ListenArgs {
            host: Some("127.0.0.1".to_string()),
            port: Some(9000),
            static_dir: Some(PathBuf::from("/srv/www")),
            ..Default::default()
        };
        assert_eq!(
            args.address(&config.server).unwrap(),
            "127.0.0.1:9000".parse().unwrap()
        );
        assert_eq!(args.static_dir(&config.server), PathBuf::from("/srv/www"));
    }
}
