//! Locate command - show where a tile lives in the metatile store.

use std::path::PathBuf;

use tileforge::coord::Tile;
use tileforge::metatile::{read_container_entry, resolve_path};

use super::common::resolve_map;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the locate command.
pub struct LocateArgs {
    pub z: u32,
    pub x: u32,
    pub y: u32,
    pub data_dir: Option<PathBuf>,
    pub map: Option<String>,
}

/// Run the locate command.
pub fn run(runner: CliRunner, args: LocateArgs) -> Result<(), CliError> {
    let config = runner.config();
    let tile = Tile::new(args.x, args.y, args.z)?;
    let data_dir = args
        .data_dir
        .unwrap_or_else(|| config.metatiles.directory.clone());
    let map = resolve_map(args.map, &config.metatiles)?;

    let location = resolve_path(&data_dir, &map, &tile);

    println!("Tile:      {}/{}/{}", tile.z, tile.x, tile.y);
    println!("Index:     {}", tile.index());
    println!("Metatile:  {}", location.path.display());
    println!("Slot:      {}", location.offset);

    match read_container_entry(&location.path, location.offset) {
        Ok(entry) => {
            println!("Offset:    {}", entry.offset);
            println!("Length:    {} bytes", entry.length);
        }
        Err(e) if e.is_not_found() => println!("Status:    not rendered"),
        Err(e) => println!("Status:    unreadable ({})", e),
    }

    Ok(())
}
