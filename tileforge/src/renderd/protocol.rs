//! renderd wire frames.
//!
//! ```text
//! offset  0: version   (u32 LE, 3)
//! offset  4: command   (u32 LE)
//! offset  8: x, y, z   (3 × u32 LE)
//! offset 20: map name  (44 bytes, NUL padded)
//! ```

use super::error::RenderdError;
use crate::coord::Tile;

/// Protocol version spoken by this client.
pub const PROTOCOL_VERSION: u32 = 3;

/// Size of both request and response frames.
pub const FRAME_SIZE: usize = 64;

const MAP_NAME_FIELD: usize = 44;

/// Longest map name that still leaves room for the NUL terminator.
pub const MAX_MAP_NAME_LEN: usize = MAP_NAME_FIELD - 1;

/// renderd command codes, carried in the second word of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RenderCommand {
    Render = 1,
    Dirty = 2,
    Done = 3,
    NotDone = 4,
    RenderPrio = 5,
    RenderBulk = 6,
    RenderLow = 7,
}

impl RenderCommand {
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Render),
            2 => Some(Self::Dirty),
            3 => Some(Self::Done),
            4 => Some(Self::NotDone),
            5 => Some(Self::RenderPrio),
            6 => Some(Self::RenderBulk),
            7 => Some(Self::RenderLow),
            _ => None,
        }
    }
}

/// A render request for one tile of one map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub command: RenderCommand,
    pub tile: Tile,
    pub map_name: String,
}

impl RenderRequest {
    pub fn new(tile: Tile, map_name: impl Into<String>, command: RenderCommand) -> Self {
        Self {
            command,
            tile,
            map_name: map_name.into(),
        }
    }

    /// Serialize into a request frame.
    pub fn encode(&self) -> Result<[u8; FRAME_SIZE], RenderdError> {
        let name = self.map_name.as_bytes();
        if name.len() > MAX_MAP_NAME_LEN {
            return Err(RenderdError::MapNameTooLong {
                name: self.map_name.clone(),
                len: name.len(),
            });
        }

        let mut frame = [0u8; FRAME_SIZE];
        frame[0..4].copy_from_slice(&PROTOCOL_VERSION.to_le_bytes());
        frame[4..8].copy_from_slice(&self.command.code().to_le_bytes());
        frame[8..12].copy_from_slice(&self.tile.x.to_le_bytes());
        frame[12..16].copy_from_slice(&self.tile.y.to_le_bytes());
        frame[16..20].copy_from_slice(&self.tile.z.to_le_bytes());
        frame[20..20 + name.len()].copy_from_slice(name);
        Ok(frame)
    }
}

/// The two meaningful words of a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderResponse {
    pub version: u32,
    pub status: u32,
}

impl RenderResponse {
    pub fn decode(frame: &[u8; FRAME_SIZE]) -> Self {
        let word = |at: usize| {
            u32::from_le_bytes([frame[at], frame[at + 1], frame[at + 2], frame[at + 3]])
        };
        Self {
            version: word(0),
            status: word(4),
        }
    }

    /// Check version and status, mapping failures to errors.
    pub fn check(&self) -> Result<(), RenderdError> {
        if self.version != PROTOCOL_VERSION {
            return Err(RenderdError::VersionMismatch(self.version));
        }
        if self.status != RenderCommand::Done.code() {
            return Err(RenderdError::Rejected(self.status));
        }
        Ok(())
    }
}
