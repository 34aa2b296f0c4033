use crate::index::IndexError;
use thiserror::Error;

/// Errors from in-process tile rendering.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Nothing is indexed for the tile
    #[error("No geometry indexed for tile {z}/{x}/{y}")]
    NotFound { x: u32, y: u32, z: u32 },

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("Failed to encode tile: {0}")]
    Encode(String),

    #[error("Unsupported tile format '{0}', only png is rendered")]
    UnsupportedFormat(String),
}
