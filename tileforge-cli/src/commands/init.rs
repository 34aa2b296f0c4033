//! Init command - write a commented config file with default values.

use std::path::Path;

use tileforge::config::ConfigFile;

use crate::error::CliError;
use crate::runner::resolve_config_path;

/// Run the init command.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn run(config_path: Option<&Path>, force: bool) -> Result<(), CliError> {
    let path = resolve_config_path(config_path);

    if path.exists() && !force {
        println!("Config file already exists: {}", path.display());
        println!("Use --force to overwrite it with defaults.");
        return Ok(());
    }

    ConfigFile::default().save_to(&path)?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");

        run(Some(&path), false).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, ConfigFile::default());
    }

    #[test]
    fn test_init_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[server]\nport = 9999\n").unwrap();

        run(Some(&path), false).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded.server.port, 9999);
    }

    #[test]
    fn test_init_force_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[server]\nport = 9999\n").unwrap();

        run(Some(&path), true).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded.server.port, ConfigFile::default().server.port);
    }
}
