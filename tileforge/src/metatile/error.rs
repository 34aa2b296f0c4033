//! Metatile error types.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while locating or decoding a metatile.
#[derive(Debug, Error)]
pub enum MetatileError {
    /// The container file does not exist
    #[error("Metatile not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// In-container index is not below the declared tile count
    #[error("Tile index {index} exceeds bounds of metatile {} ({count} tiles)", path.display())]
    BoundsExceeded {
        path: PathBuf,
        index: u32,
        count: u32,
    },

    /// An entry points past the end of the container
    #[error("Tile entry {offset}+{length} lies outside metatile {} ({file_len} bytes)", path.display())]
    EntryOutOfFile {
        path: PathBuf,
        offset: u32,
        length: u32,
        file_len: u64,
    },

    /// Fewer bytes than a header field requires
    #[error("Short read in metatile {}: expected {expected} bytes", path.display())]
    ShortRead { path: PathBuf, expected: usize },

    /// Any other I/O failure
    #[error("I/O error on metatile {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl MetatileError {
    /// Classify an I/O error raised while reading `path`.
    pub(crate) fn from_io(path: &Path, expected: usize, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => MetatileError::NotFound {
                path: path.to_path_buf(),
            },
            io::ErrorKind::UnexpectedEof => MetatileError::ShortRead {
                path: path.to_path_buf(),
                expected,
            },
            _ => MetatileError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// Whether the container itself is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, MetatileError::NotFound { .. })
    }
}
