//! Binary record codec for the way store.
//!
//! ```text
//! bbox    min.lat, min.lon, max.lat, max.lon   (4 × f64 LE)
//! count   number of points                     (i64 LE)
//! points  count × (lat, lon)                   (2 × f64 LE each)
//! ```

use super::error::IndexError;
use crate::coord::{BoundingBox, Point};
use std::io::{self, Write};

/// Size of the fixed record header.
pub const RECORD_HEADER_SIZE: usize = 40;

/// Size of one serialized point.
pub const POINT_SIZE: usize = 16;

/// Byte offset of a record within the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapObjectOffset(pub u64);

/// A decoded way: bounding box and points in node order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapObject {
    pub bbox: BoundingBox,
    pub points: Vec<Point>,
}

impl MapObject {
    /// Empty object whose point buffer can hold `capacity` points.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bbox: BoundingBox::default(),
            points: Vec::with_capacity(capacity),
        }
    }
}

/// Encoded size of a record with `points` points.
pub fn encoded_len(points: usize) -> usize {
    RECORD_HEADER_SIZE + points * POINT_SIZE
}

/// Serialize one record, returning the number of bytes written.
pub fn write_map_object<W: Write>(
    writer: &mut W,
    bbox: &BoundingBox,
    points: &[Point],
) -> io::Result<u64> {
    let mut buf = Vec::with_capacity(encoded_len(points.len()));
    buf.extend_from_slice(&bbox.min.lat.to_le_bytes());
    buf.extend_from_slice(&bbox.min.lon.to_le_bytes());
    buf.extend_from_slice(&bbox.max.lat.to_le_bytes());
    buf.extend_from_slice(&bbox.max.lon.to_le_bytes());
    buf.extend_from_slice(&(points.len() as i64).to_le_bytes());
    for point in points {
        buf.extend_from_slice(&point.lat.to_le_bytes());
        buf.extend_from_slice(&point.lon.to_le_bytes());
    }
    writer.write_all(&buf)?;
    Ok(buf.len() as u64)
}

/// Decode the record at `offset` into `out`, reusing its point buffer.
pub fn read_map_object(
    data: &[u8],
    offset: MapObjectOffset,
    out: &mut MapObject,
) -> Result<(), IndexError> {
    let corrupt = |reason: &str| IndexError::CorruptRecord {
        offset: offset.0,
        reason: reason.to_string(),
    };

    let start = usize::try_from(offset.0).map_err(|_| corrupt("offset out of range"))?;
    let header = start
        .checked_add(RECORD_HEADER_SIZE)
        .and_then(|end| data.get(start..end))
        .ok_or_else(|| corrupt("truncated header"))?;

    out.bbox = BoundingBox::new(
        Point::new(f64_at(header, 8), f64_at(header, 0)),
        Point::new(f64_at(header, 24), f64_at(header, 16)),
    );

    let count = i64::from_le_bytes(word(header, 32));
    let count = usize::try_from(count).map_err(|_| corrupt("negative point count"))?;
    let body_start = start + RECORD_HEADER_SIZE;
    let body = count
        .checked_mul(POINT_SIZE)
        .and_then(|len| body_start.checked_add(len))
        .and_then(|end| data.get(body_start..end))
        .ok_or_else(|| corrupt("truncated points"))?;

    out.points.clear();
    out.points.extend(
        body.chunks_exact(POINT_SIZE)
            .map(|chunk| Point::new(f64_at(chunk, 8), f64_at(chunk, 0))),
    );
    Ok(())
}

#[inline]
fn word(bytes: &[u8], at: usize) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(&bytes[at..at + 8]);
    out
}

#[inline]
fn f64_at(bytes: &[u8], at: usize) -> f64 {
    f64::from_le_bytes(word(bytes, at))
}
