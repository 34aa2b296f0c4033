//! Read-only, memory-mapped access to a built spatial index.

use super::builder::SpatialIndex;
use super::error::IndexError;
use super::record::{read_map_object, MapObject, MapObjectOffset};
use crate::coord::Tile;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// A frozen [`SpatialIndex`] with its record store mapped into memory.
///
/// Shared between request handlers without locking; the map is released
/// when the store is dropped.
#[derive(Debug)]
pub struct TileIndexStore {
    index: SpatialIndex,
    mmap: Mmap,
}

impl TileIndexStore {
    /// Map the record store of `index`.
    pub fn open(index: SpatialIndex) -> Result<Self, IndexError> {
        let map_err = |source| IndexError::Mmap {
            path: index.path.clone(),
            source,
        };
        let file = File::open(&index.path).map_err(map_err)?;
        // The store is written once by the builder and never modified
        // while mapped.
        let mmap = unsafe { Mmap::map(&file) }.map_err(map_err)?;
        Ok(Self { index, mmap })
    }

    pub fn path(&self) -> &Path {
        &self.index.path
    }

    pub fn max_zoom(&self) -> u32 {
        self.index.max_zoom
    }

    pub fn max_points(&self) -> usize {
        self.index.max_points
    }

    /// Tile whose entry serves `tile`: itself, or its ancestor at the
    /// indexed depth when `tile` is deeper.
    pub fn index_tile(&self, tile: &Tile) -> Tile {
        tile.ancestor_at(self.index.max_zoom)
    }

    /// Candidate record offsets for `tile`, `None` when nothing is indexed.
    pub fn lookup(&self, tile: &Tile) -> Option<&[MapObjectOffset]> {
        self.index
            .tiles
            .get(&self.index_tile(tile).index())
            .map(Vec::as_slice)
    }

    /// Decode the record at `offset` into `out`.
    pub fn materialize(&self, offset: MapObjectOffset, out: &mut MapObject) -> Result<(), IndexError> {
        read_map_object(&self.mmap, offset, out)
    }

    /// Scratch object sized for the largest record in the store.
    pub fn new_buffer(&self) -> MapObject {
        MapObject::with_capacity(self.index.max_points)
    }
}
