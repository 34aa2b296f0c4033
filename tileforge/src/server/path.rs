//! Tile URL parsing.

use crate::coord::{CoordError, Tile};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Image formats a tile can be requested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileFormat {
    Png,
    Webp,
}

impl TileFormat {
    pub fn extension(self) -> &'static str {
        match self {
            TileFormat::Png => "png",
            TileFormat::Webp => "webp",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            TileFormat::Png => "image/png",
            TileFormat::Webp => "image/webp",
        }
    }
}

impl fmt::Display for TileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A parsed `/tile/{z}/{x}/{y}.{ext}` request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePath {
    pub tile: Tile,
    pub format: TileFormat,
}

/// Why a request path is not a tile path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathParseError {
    #[error("could not match path")]
    NoMatch,

    #[error("invalid number '{0}' in path")]
    InvalidNumber(String),

    #[error(transparent)]
    InvalidTile(#[from] CoordError),
}

fn tile_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^/tile/([0-9]+)/([0-9]+)/([0-9]+)\.(png|webp)$").unwrap()
    })
}

/// Parse a tile request path.
///
/// # Example
///
/// ```
/// use tileforge::server::{parse_tile_path, TileFormat};
///
/// let parsed = parse_tile_path("/tile/4/3/2.png").unwrap();
/// assert_eq!((parsed.tile.z, parsed.tile.x, parsed.tile.y), (4, 3, 2));
/// assert_eq!(parsed.format, TileFormat::Png);
/// ```
pub fn parse_tile_path(path: &str) -> Result<TilePath, PathParseError> {
    let captures = tile_pattern()
        .captures(path)
        .ok_or(PathParseError::NoMatch)?;

    let number = |i: usize| -> Result<u32, PathParseError> {
        let text = &captures[i];
        text.parse()
            .map_err(|_| PathParseError::InvalidNumber(text.to_string()))
    };
    let z = number(1)?;
    let x = number(2)?;
    let y = number(3)?;

    let format = match &captures[4] {
        "webp" => TileFormat::Webp,
        _ => TileFormat::Png,
    };

    Ok(TilePath {
        tile: Tile::new(x, y, z)?,
        format,
    })
}
