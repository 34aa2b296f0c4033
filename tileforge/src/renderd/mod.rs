//! Client for the renderd tile rendering daemon.
//!
//! renderd accepts fixed 64-byte request frames over TCP or a Unix
//! socket and answers with a 64-byte frame once the metatile has been
//! written (or the request was refused).
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use tileforge::coord::Tile;
//! use tileforge::renderd::{RenderCommand, RenderDaemon, RenderdClient};
//!
//! let client = RenderdClient::new("/run/renderd/renderd.sock", "ajt")
//!     .with_timeout(Some(Duration::from_secs(30)));
//! client.request_render(&Tile { x: 0, y: 0, z: 0 }, RenderCommand::RenderPrio)?;
//! # Ok::<(), tileforge::renderd::RenderdError>(())
//! ```

mod client;
mod error;
mod protocol;

pub use client::{RenderDaemon, RenderdClient, RenderdEndpoint};
pub use error::RenderdError;
pub use protocol::{
    RenderCommand, RenderRequest, RenderResponse, FRAME_SIZE, MAX_MAP_NAME_LEN, PROTOCOL_VERSION,
};
