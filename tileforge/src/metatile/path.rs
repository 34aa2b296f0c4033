//! Metatile path hashing.
//!
//! The directory scheme matches mod_tile so that metatiles written by an
//! external renderd are found without any translation.

use crate::coord::Tile;
use std::path::{Path, PathBuf};

/// Tiles per metatile side.
pub const METATILE: u32 = 8;

/// Location of a tile inside the metatile store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetatileLocation {
    /// Metatile container file
    pub path: PathBuf,
    /// Index of the tile inside the container
    pub offset: u32,
}

/// Resolve the metatile holding `tile`.
///
/// # Example
///
/// ```
/// use std::path::{Path, PathBuf};
/// use tileforge::coord::Tile;
/// use tileforge::metatile::resolve_path;
///
/// let location = resolve_path(Path::new("/data"), "ajt", &Tile { x: 3, y: 2, z: 4 });
/// assert_eq!(location.path, PathBuf::from("/data/ajt/4/0/0/0/0/0.meta"));
/// assert_eq!(location.offset, 26);
/// ```
pub fn resolve_path(base_dir: &Path, map_name: &str, tile: &Tile) -> MetatileLocation {
    let mask = METATILE - 1;
    let offset = (tile.x & mask) * METATILE + (tile.y & mask);
    let hash = hash_components(tile.x & !mask, tile.y & !mask);

    let path = base_dir
        .join(map_name)
        .join(tile.z.to_string())
        .join(hash[4].to_string())
        .join(hash[3].to_string())
        .join(hash[2].to_string())
        .join(hash[1].to_string())
        .join(format!("{}.meta", hash[0]));

    MetatileLocation { path, offset }
}

/// Interleave the nibbles of x and y, least significant first.
fn hash_components(mut x: u32, mut y: u32) -> [u8; 5] {
    let mut hash = [0u8; 5];
    for byte in hash.iter_mut() {
        *byte = (((x & 0x0f) << 4) | (y & 0x0f)) as u8;
        x >>= 4;
        y >>= 4;
    }
    hash
}
