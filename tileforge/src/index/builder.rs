//! One-shot construction of the spatial index.

use super::error::IndexError;
use super::record::{write_map_object, MapObjectOffset};
use super::DEFAULT_DETAIL_ZOOM;
use crate::coord::{covering_tiles, BoundingBox, Point, MAX_ZOOM};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Highway classes shown at every zoom level.
const IMPORTANT_HIGHWAYS: &[&str] = &[
    "motorway",
    "trunk",
    "primary",
    "secondary",
    "tertiary",
    "motorway_link",
    "trunk_link",
    "primary_link",
    "secondary_link",
    "tertiary_link",
];

/// A way as seen by the index builder.
pub trait WayRecord {
    /// Node positions in way order.
    fn points(&self) -> &[Point];

    /// Value of the tag `key`, if present.
    fn tag(&self, key: &str) -> Option<&str>;
}

/// Owned way with a flat tag list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Way {
    pub points: Vec<Point>,
    pub tags: Vec<(String, String)>,
}

impl Way {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }
}

impl WayRecord for Way {
    fn points(&self) -> &[Point] {
        &self.points
    }

    fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Whether a way is drawn at coarse zoom levels.
pub fn is_important_way<W: WayRecord + ?Sized>(way: &W) -> bool {
    way.tag("highway")
        .is_some_and(|value| IMPORTANT_HIGHWAYS.contains(&value))
}

/// Frozen result of an index build.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    /// Flattened tile index to record offsets
    pub tiles: HashMap<u64, Vec<MapObjectOffset>>,
    /// Record store the offsets point into
    pub path: PathBuf,
    /// Largest point count of any record
    pub max_points: usize,
    /// Deepest indexed zoom level
    pub max_zoom: u32,
    pub ways: u64,
}

fn check_zoom(zoom: u32) -> Result<(), IndexError> {
    if zoom > MAX_ZOOM {
        return Err(IndexError::ZoomOutOfRange(zoom));
    }
    Ok(())
}

/// Appends ways to a record store and indexes them by covering tile.
pub struct SpatialIndexBuilder {
    writer: BufWriter<File>,
    path: PathBuf,
    position: u64,
    tiles: HashMap<u64, Vec<MapObjectOffset>>,
    max_points: usize,
    max_zoom: u32,
    detail_zoom: u32,
    ways: u64,
}

impl SpatialIndexBuilder {
    /// Create (or truncate) the record store at `path`.
    pub fn create(path: &Path, max_zoom: u32) -> Result<Self, IndexError> {
        check_zoom(max_zoom)?;
        let file = File::create(path)?;
        Self::new(file, path, max_zoom)
    }

    /// Build into an already open, empty, writable record store.
    ///
    /// Fails with [`IndexError::ZoomOutOfRange`] when `max_zoom` is deeper
    /// than [`MAX_ZOOM`].
    pub fn new(file: File, path: impl Into<PathBuf>, max_zoom: u32) -> Result<Self, IndexError> {
        check_zoom(max_zoom)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path: path.into(),
            position: 0,
            tiles: HashMap::new(),
            max_points: 0,
            max_zoom,
            detail_zoom: DEFAULT_DETAIL_ZOOM,
            ways: 0,
        })
    }

    /// Zoom level from which minor ways are indexed.
    pub fn with_detail_zoom(mut self, detail_zoom: u32) -> Self {
        self.detail_zoom = detail_zoom;
        self
    }

    /// Append one way and index it.
    ///
    /// Ways without points are skipped and yield `None`.
    pub fn push_way<W: WayRecord + ?Sized>(
        &mut self,
        way: &W,
    ) -> Result<Option<MapObjectOffset>, IndexError> {
        let points = way.points();
        let Some(bbox) = BoundingBox::from_points(points.iter().copied()) else {
            return Ok(None);
        };

        let offset = MapObjectOffset(self.position);
        self.position += write_map_object(&mut self.writer, &bbox, points)?;
        self.max_points = self.max_points.max(points.len());
        self.ways += 1;

        let min_z = if is_important_way(way) {
            0
        } else {
            self.detail_zoom
        };
        for tile in covering_tiles(&bbox, min_z, self.max_zoom) {
            self.tiles.entry(tile.index()).or_default().push(offset);
        }

        Ok(Some(offset))
    }

    /// Push every way of `ways`.
    pub fn extend<I, W>(&mut self, ways: I) -> Result<(), IndexError>
    where
        I: IntoIterator<Item = W>,
        W: WayRecord,
    {
        for way in ways {
            self.push_way(&way)?;
        }
        Ok(())
    }

    /// Flush the record store and freeze the index.
    pub fn finish(mut self) -> Result<SpatialIndex, IndexError> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;

        info!(
            ways = self.ways,
            tiles = self.tiles.len(),
            bytes = self.position,
            max_points = self.max_points,
            "Spatial index built"
        );
        debug!(path = %self.path.display(), max_zoom = self.max_zoom, "Record store flushed");

        Ok(SpatialIndex {
            tiles: self.tiles,
            path: self.path,
            max_points: self.max_points,
            max_zoom: self.max_zoom,
            ways: self.ways,
        })
    }
}
