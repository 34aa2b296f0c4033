//! Coordinate conversion module
//!
//! Web Mercator conversions between geographic coordinates, slippy map
//! tiles and pixel positions on a tile canvas.

mod types;

pub use types::{
    tiles_per_side, BoundingBox, CoordError, Pixel, Point, Tile, MAX_LAT, MAX_LON, MAX_ZOOM,
    MIN_LAT, MIN_LON, MIN_ZOOM,
};

use std::f64::consts::PI;

/// Geographic extent of a tile.
pub fn tile_bounds(tile: &Tile) -> BoundingBox {
    let (lat_a, lon_min) = tile_to_lat_lon(tile);
    let (lat_b, lon_max) = tile_to_lat_lon(&Tile {
        x: tile.x + 1,
        y: tile.y + 1,
        z: tile.z,
    });
    BoundingBox::new(
        Point::new(lon_min.min(lon_max), lat_a.min(lat_b)),
        Point::new(lon_min.max(lon_max), lat_a.max(lat_b)),
    )
}

/// Converts tile coordinates back to geographic coordinates.
///
/// Returns the latitude/longitude of the tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &Tile) -> (f64, f64) {
    let n = tiles_per_side(tile.z) as f64;

    let lon = tile.x as f64 / n * 360.0 - 180.0;

    let y = tile.y as f64 / n;
    let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
    let lat = lat_rad * 180.0 / PI;

    (lat, lon)
}

/// Tile x/y containing a position at `zoom`.
///
/// Positions outside the projectable area are clamped onto the edge
/// tiles instead of failing.
#[inline]
pub fn deg2num(lat: f64, lon: f64, zoom: u32) -> (u32, u32) {
    let lat = lat.clamp(MIN_LAT, MAX_LAT);
    let lon = lon.clamp(MIN_LON, MAX_LON);
    let n = tiles_per_side(zoom) as f64;
    let last = (tiles_per_side(zoom) - 1) as f64;

    let lat_rad = lat.to_radians();
    let x = ((lon + 180.0) / 360.0 * n).floor().clamp(0.0, last);
    let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n)
        .floor()
        .clamp(0.0, last);

    (x as u32, y as u32)
}

/// Converts geographic coordinates to a tile, rejecting invalid input.
pub fn to_tile(lat: f64, lon: f64, zoom: u32) -> Result<Tile, CoordError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(CoordError::InvalidZoom(zoom));
    }
    let (x, y) = deg2num(lat, lon, zoom);
    Ok(Tile { x, y, z: zoom })
}

/// Projects a position onto the pixel grid of `tile`.
///
/// The result is relative to the tile's top-left corner; positions
/// outside the tile land outside `0..size`.
#[inline]
pub fn point_to_pixel(point: Point, tile: &Tile, size: u32) -> Pixel {
    let world = tiles_per_side(tile.z) as f64 * size as f64;
    let lat_rad = point.lat.clamp(MIN_LAT, MAX_LAT).to_radians();

    let gx = (point.lon + 180.0) / 360.0 * world;
    let gy = (1.0 - lat_rad.tan().asinh() / PI) / 2.0 * world;

    Pixel {
        x: (gx - tile.x as f64 * size as f64) as f32,
        y: (gy - tile.y as f64 * size as f64) as f32,
    }
}

/// Every tile at zoom `min_z..=max_z` whose extent overlaps `bbox`.
pub fn covering_tiles(bbox: &BoundingBox, min_z: u32, max_z: u32) -> CoveringTiles {
    CoveringTiles::new(*bbox, min_z, max_z)
}

/// Iterator over the tiles covering a bounding box.
///
/// Yields level by level from `min_z` upwards, row-major within a level.
#[derive(Debug, Clone)]
pub struct CoveringTiles {
    bbox: BoundingBox,
    max_z: u32,
    z: u32,
    x_range: (u32, u32),
    y_range: (u32, u32),
    x: u32,
    y: u32,
    done: bool,
}

impl CoveringTiles {
    fn new(bbox: BoundingBox, min_z: u32, max_z: u32) -> Self {
        let mut iter = Self {
            bbox,
            max_z,
            z: min_z,
            x_range: (0, 0),
            y_range: (0, 0),
            x: 0,
            y: 0,
            done: min_z > max_z,
        };
        if !iter.done {
            iter.enter_level(min_z);
        }
        iter
    }

    fn enter_level(&mut self, z: u32) {
        // North-west corner has the smallest x and y.
        let (min_x, min_y) = deg2num(self.bbox.max.lat, self.bbox.min.lon, z);
        let (max_x, max_y) = deg2num(self.bbox.min.lat, self.bbox.max.lon, z);
        self.z = z;
        self.x_range = (min_x, max_x);
        self.y_range = (min_y, max_y);
        self.x = min_x;
        self.y = min_y;
    }
}

impl Iterator for CoveringTiles {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let tile = Tile {
            x: self.x,
            y: self.y,
            z: self.z,
        };

        if self.x < self.x_range.1 {
            self.x += 1;
        } else if self.y < self.y_range.1 {
            self.x = self.x_range.0;
            self.y += 1;
        } else if self.z < self.max_z {
            self.enter_level(self.z + 1);
        } else {
            self.done = true;
        }

        Some(tile)
    }
}
