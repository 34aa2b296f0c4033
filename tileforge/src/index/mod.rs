//! Spatial index over way geometries.
//!
//! Ways are appended once to a record file and indexed by every tile
//! their bounding box covers, up to a maximum zoom. At serving time the
//! record file is memory-mapped and records are decoded in place.

mod builder;
mod error;
mod record;
mod store;

pub use builder::{is_important_way, SpatialIndex, SpatialIndexBuilder, Way, WayRecord};
pub use error::IndexError;
pub use record::{
    encoded_len, read_map_object, write_map_object, MapObject, MapObjectOffset, POINT_SIZE,
    RECORD_HEADER_SIZE,
};
pub use store::TileIndexStore;

/// Zoom level from which minor ways are indexed.
pub const DEFAULT_DETAIL_ZOOM: u32 = 11;

/// Default indexed depth.
pub const DEFAULT_MAX_ZOOM: u32 = 15;
