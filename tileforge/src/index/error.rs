//! Spatial index errors.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("I/O error on record store: {0}")]
    Io(#[from] io::Error),

    /// A record could not be decoded at the given offset
    #[error("Corrupt record at offset {offset}: {reason}")]
    CorruptRecord { offset: u64, reason: String },

    #[error("Failed to map record store {}: {source}", path.display())]
    Mmap {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Zoom level {0} exceeds the deepest supported zoom 30")]
    ZoomOutOfRange(u32),

    /// Source data could not be read
    #[error("Failed to read way source: {0}")]
    Source(String),
}
