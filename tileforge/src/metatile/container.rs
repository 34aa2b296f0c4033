//! Metatile container decoding and encoding.

use super::error::MetatileError;
use super::path::METATILE;
use crate::coord::Tile;
use crate::subrange::BoundedSubRange;
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Magic bytes at the start of every metatile.
pub const META_MAGIC: &[u8; 4] = b"META";

/// Byte offset of the tile count field.
pub const HEADER_COUNT_OFFSET: u64 = 4;

/// Byte offset of the first offset-table entry.
pub const TABLE_OFFSET: u64 = 20;

/// Size of one offset-table entry.
pub const ENTRY_SIZE: u64 = 8;

/// Position of one tile's bytes inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileEntry {
    pub offset: u32,
    pub length: u32,
}

/// Read the offset-table entry for tile `index` of the container at `path`.
///
/// Only the count field and the requested entry are read; the magic is
/// not checked.
pub fn read_container_entry(path: &Path, index: u32) -> Result<TileEntry, MetatileError> {
    let mut file = File::open(path).map_err(|e| MetatileError::from_io(path, 0, e))?;
    read_entry(&mut file, path, index)
}

/// Open the bytes of tile `index` as a bounded reader over the container.
pub fn open_tile(path: &Path, index: u32) -> Result<BoundedSubRange<File>, MetatileError> {
    let mut file = File::open(path).map_err(|e| MetatileError::from_io(path, 0, e))?;
    let entry = read_entry(&mut file, path, index)?;

    let file_len = file
        .metadata()
        .map_err(|e| MetatileError::from_io(path, 0, e))?
        .len();
    if u64::from(entry.offset) + u64::from(entry.length) > file_len {
        return Err(MetatileError::EntryOutOfFile {
            path: path.to_path_buf(),
            offset: entry.offset,
            length: entry.length,
            file_len,
        });
    }

    BoundedSubRange::new(file, u64::from(entry.offset), u64::from(entry.length))
        .map_err(|e| MetatileError::from_io(path, 0, e))
}

fn read_entry<R: Read + Seek>(
    reader: &mut R,
    path: &Path,
    index: u32,
) -> Result<TileEntry, MetatileError> {
    let io_err = |e| MetatileError::from_io(path, 4, e);

    reader
        .seek(SeekFrom::Start(HEADER_COUNT_OFFSET))
        .map_err(io_err)?;
    let count = read_u32(reader).map_err(io_err)?;
    if index >= count {
        return Err(MetatileError::BoundsExceeded {
            path: path.to_path_buf(),
            index,
            count,
        });
    }

    reader
        .seek(SeekFrom::Start(TABLE_OFFSET + u64::from(index) * ENTRY_SIZE))
        .map_err(io_err)?;
    let offset = read_u32(reader).map_err(io_err)?;
    let length = read_u32(reader).map_err(io_err)?;

    Ok(TileEntry { offset, length })
}

fn read_u32<R: Read>(reader: &mut R) -> io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Fully decoded metatile header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetatileHeader {
    pub magic: [u8; 4],
    /// x of the top-left tile of the block
    pub x: u32,
    /// y of the top-left tile of the block
    pub y: u32,
    pub z: u32,
    pub entries: Vec<TileEntry>,
}

impl MetatileHeader {
    /// Read the header and offset table of the container at `path`.
    pub fn read(path: &Path) -> Result<Self, MetatileError> {
        let mut file = File::open(path).map_err(|e| MetatileError::from_io(path, 0, e))?;
        let io_err = |e| MetatileError::from_io(path, 4, e);

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic).map_err(io_err)?;
        let count = read_u32(&mut file).map_err(io_err)?;
        let x = read_u32(&mut file).map_err(io_err)?;
        let y = read_u32(&mut file).map_err(io_err)?;
        let z = read_u32(&mut file).map_err(io_err)?;

        let mut entries = Vec::with_capacity(count.min(METATILE * METATILE) as usize);
        for _ in 0..count {
            let offset = read_u32(&mut file).map_err(io_err)?;
            let length = read_u32(&mut file).map_err(io_err)?;
            entries.push(TileEntry { offset, length });
        }

        Ok(Self {
            magic,
            x,
            y,
            z,
            entries,
        })
    }

    /// Whether the magic matches a mod_tile metatile.
    pub fn has_valid_magic(&self) -> bool {
        &self.magic == META_MAGIC
    }
}

/// Builds metatile containers.
///
/// # Example
///
/// ```
/// use tileforge::coord::Tile;
/// use tileforge::metatile::MetatileWriter;
///
/// let mut writer = MetatileWriter::new(Tile { x: 8, y: 16, z: 5 });
/// writer.push(b"tile-0".to_vec());
/// let bytes = writer.to_bytes();
/// assert_eq!(&bytes[0..4], b"META");
/// ```
#[derive(Debug, Clone)]
pub struct MetatileWriter {
    origin: Tile,
    tiles: Vec<Vec<u8>>,
}

impl MetatileWriter {
    /// Start a container whose block contains `tile`.
    pub fn new(tile: Tile) -> Self {
        let mask = METATILE - 1;
        Self {
            origin: Tile {
                x: tile.x & !mask,
                y: tile.y & !mask,
                z: tile.z,
            },
            tiles: Vec::new(),
        }
    }

    /// Append the next tile payload.
    pub fn push(&mut self, data: Vec<u8>) -> &mut Self {
        self.tiles.push(data);
        self
    }

    /// Serialize header, offset table and payloads.
    pub fn to_bytes(&self) -> Vec<u8> {
        let count = self.tiles.len() as u32;
        let header_len = TABLE_OFFSET as usize + self.tiles.len() * ENTRY_SIZE as usize;
        let payload_len: usize = self.tiles.iter().map(Vec::len).sum();
        let mut bytes = Vec::with_capacity(header_len + payload_len);

        bytes.extend_from_slice(META_MAGIC);
        bytes.extend_from_slice(&count.to_le_bytes());
        bytes.extend_from_slice(&self.origin.x.to_le_bytes());
        bytes.extend_from_slice(&self.origin.y.to_le_bytes());
        bytes.extend_from_slice(&self.origin.z.to_le_bytes());

        let mut offset = header_len as u32;
        for tile in &self.tiles {
            bytes.extend_from_slice(&offset.to_le_bytes());
            bytes.extend_from_slice(&(tile.len() as u32).to_le_bytes());
            offset += tile.len() as u32;
        }
        for tile in &self.tiles {
            bytes.extend_from_slice(tile);
        }

        bytes
    }

    /// Write the container to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_container(dir: &TempDir, tiles: &[&[u8]]) -> std::path::PathBuf {
        let path = dir.path().join("0.meta");
        let mut writer = MetatileWriter::new(Tile { x: 0, y: 0, z: 3 });
        for tile in tiles {
            writer.push(tile.to_vec());
        }
        writer.write_to(&path).unwrap();
        path
    }

    #[test]
    fn test_read_entry_inside_file() {
        let dir = TempDir::new().unwrap();
        let path = write_container(&dir, &[b"abc", b"defgh"]);

        let first = read_container_entry(&path, 0).unwrap();
        assert_eq!(first, TileEntry { offset: 36, length: 3 });

        let second = read_container_entry(&path, 1).unwrap();
        assert_eq!(second, TileEntry { offset: 39, length: 5 });

        let len = fs::metadata(&path).unwrap().len();
        assert!(u64::from(second.offset + second.length) <= len);
    }

    #[test]
    fn test_index_at_count_is_bounds_error() {
        let dir = TempDir::new().unwrap();
        let path = write_container(&dir, &[b"abc"]);

        for index in [1, 2, 63, u32::MAX] {
            let err = read_container_entry(&path, index).unwrap_err();
            assert!(
                matches!(err, MetatileError::BoundsExceeded { count: 1, .. }),
                "index {} gave {:?}",
                index,
                err
            );
        }
    }

    #[test]
    fn test_missing_container_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = read_container_entry(&dir.path().join("missing.meta"), 0).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_truncated_header_is_short_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("short.meta");
        fs::write(&path, b"META\x01\x00").unwrap();

        let err = read_container_entry(&path, 0).unwrap_err();
        assert!(matches!(err, MetatileError::ShortRead { .. }));
    }

    #[test]
    fn test_truncated_table_is_short_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.meta");
        let mut bytes = b"META".to_vec();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 12]);
        bytes.extend_from_slice(&20u32.to_le_bytes());
        fs::write(&path, bytes).unwrap();

        let err = read_container_entry(&path, 0).unwrap_err();
        assert!(matches!(err, MetatileError::ShortRead { .. }));
    }

    #[test]
    fn test_open_tile_reads_payload() {
        let dir = TempDir::new().unwrap();
        let path = write_container(&dir, &[b"abc", b"defgh"]);

        let mut reader = open_tile(&path, 1).unwrap();
        let mut data = Vec::new();
        reader.read_to_end(&mut data).unwrap();
        assert_eq!(data, b"defgh");
    }

    #[test]
    fn test_open_tile_rejects_entry_past_eof() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.meta");
        let mut bytes = b"META".to_vec();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 12]);
        bytes.extend_from_slice(&28u32.to_le_bytes());
        bytes.extend_from_slice(&100u32.to_le_bytes());
        fs::write(&path, bytes).unwrap();

        let err = open_tile(&path, 0).unwrap_err();
        assert!(matches!(err, MetatileError::EntryOutOfFile { .. }));
    }

    #[test]
    fn test_header_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("h.meta");
        let mut writer = MetatileWriter::new(Tile { x: 19, y: 13, z: 6 });
        writer.push(vec![1, 2]).push(vec![3]);
        writer.write_to(&path).unwrap();

        let header = MetatileHeader::read(&path).unwrap();
        assert!(header.has_valid_magic());
        assert_eq!((header.x, header.y, header.z), (16, 8, 6));
        assert_eq!(
            header.entries,
            vec![
                TileEntry { offset: 36, length: 2 },
                TileEntry { offset: 38, length: 1 },
            ]
        );
    }
}
