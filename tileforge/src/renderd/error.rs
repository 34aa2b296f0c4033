//! Renderd error types.

use std::io;
use thiserror::Error;

/// Failures of a renderd exchange.
///
/// None of these are fatal to a tile request; the caller re-checks the
/// metatile store afterwards.
#[derive(Debug, Error)]
pub enum RenderdError {
    /// Map name does not fit the 44-byte name field
    #[error("Map name '{name}' is {len} bytes, at most 43 are allowed")]
    MapNameTooLong { name: String, len: usize },

    /// Connecting, writing or reading failed
    #[error("renderd transport error on {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: io::Error,
    },

    /// Connection closed before a full response frame arrived
    #[error("Short read from renderd: got {received} of 64 bytes")]
    ShortRead { received: usize },

    /// Response frame carries a different protocol version
    #[error("renderd protocol version mismatch: expected 3, got {0}")]
    VersionMismatch(u32),

    /// Daemon answered with something other than Done
    #[error("renderd rejected the request with status {0}")]
    Rejected(u32),

    /// Unix socket endpoint on a platform without Unix sockets
    #[error("Unsupported renderd endpoint: {0}")]
    UnsupportedEndpoint(String),
}
