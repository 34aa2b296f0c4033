//! Coordinate type definitions

use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Supported zoom levels.
///
/// The flattened tile index of the deepest tile at `MAX_ZOOM` is below
/// `(4^(MAX_ZOOM + 1) - 1) / 3`, which fits comfortably in a `u64`.
pub const MIN_ZOOM: u32 = 0;
pub const MAX_ZOOM: u32 = 30;

/// Tile coordinates in the slippy map pyramid.
///
/// `x` grows eastwards, `y` grows southwards, both in `0..2^z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile {
    /// X coordinate (west to east)
    pub x: u32,
    /// Y coordinate (north to south)
    pub y: u32,
    /// Zoom level
    pub z: u32,
}

impl Tile {
    /// Create a tile, validating the zoom level and the x/y range.
    pub fn new(x: u32, y: u32, z: u32) -> Result<Self, CoordError> {
        if z > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(z));
        }
        let side = tiles_per_side(z);
        if u64::from(x) >= side || u64::from(y) >= side {
            return Err(CoordError::InvalidTile { x, y, z });
        }
        Ok(Self { x, y, z })
    }

    /// The tile one zoom level up that contains this tile, `None` at zoom 0.
    #[inline]
    pub fn parent(&self) -> Option<Tile> {
        if self.z == 0 {
            return None;
        }
        Some(Tile {
            x: self.x / 2,
            y: self.y / 2,
            z: self.z - 1,
        })
    }

    /// The ancestor of this tile at zoom `depth`.
    ///
    /// Returns the tile itself when it is already at or above `depth`.
    #[inline]
    pub fn ancestor_at(&self, depth: u32) -> Tile {
        if self.z <= depth {
            return *self;
        }
        let shift = self.z - depth;
        Tile {
            x: self.x >> shift,
            y: self.y >> shift,
            z: depth,
        }
    }

    /// Flattened quadtree index shared by all zoom levels.
    ///
    /// Counts every tile of the levels above `z` (`Σ 4^i` for `i < z`) and
    /// adds the row-major position `y * 2^z + x` inside level `z`.
    #[inline]
    pub fn index(&self) -> u64 {
        debug_assert!(self.z <= MAX_ZOOM);
        let level_prefix = ((1u64 << (2 * self.z)) - 1) / 3;
        let level_pos = u64::from(self.y) * tiles_per_side(self.z) + u64::from(self.x);
        level_prefix + level_pos
    }
}

/// Number of tiles along one side of the square grid at zoom `z`.
#[inline]
pub fn tiles_per_side(z: u32) -> u64 {
    1u64 << z
}

/// Geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

impl Point {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Axis-aligned lon/lat rectangle, edges inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing all `points`, `None` for an empty sequence.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => BoundingBox::new(p, p),
                Some(b) => BoundingBox {
                    min: Point::new(b.min.lon.min(p.lon), b.min.lat.min(p.lat)),
                    max: Point::new(b.max.lon.max(p.lon), b.max.lat.max(p.lat)),
                },
            })
        })
    }

    #[inline]
    pub fn contains(&self, point: Point) -> bool {
        point.lat >= self.min.lat
            && point.lat <= self.max.lat
            && point.lon >= self.min.lon
            && point.lon <= self.max.lon
    }

    #[inline]
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.min.lat <= other.max.lat
            && self.max.lat >= other.min.lat
            && self.min.lon <= other.max.lon
            && self.max.lon >= other.min.lon
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min.lon + self.max.lon) / 2.0,
            (self.min.lat + self.max.lat) / 2.0,
        )
    }
}

/// Position on a tile canvas, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pixel {
    pub x: f32,
    pub y: f32,
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude is outside the Web Mercator range
    #[error("Invalid latitude: {0} (must be between -85.05112878 and 85.05112878)")]
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),
    /// Zoom level is outside valid range
    #[error("Invalid zoom level: {0} (must be between 0 and 30)")]
    InvalidZoom(u32),
    /// x or y is not inside the grid of its zoom level
    #[error("Tile {x}/{y} does not exist at zoom {z}")]
    InvalidTile { x: u32, y: u32, z: u32 },
}
