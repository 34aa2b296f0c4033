//! mod_tile compatible metatile storage.
//!
//! A metatile bundles an 8×8 block of rendered tiles into one file. This
//! module resolves the hashed on-disk location of the metatile holding a
//! tile and decodes the container's header and offset table.
//!
//! # Layout
//!
//! ```text
//! <base>/<map>/<z>/<h4>/<h3>/<h2>/<h1>/<h0>.meta
//!
//! offset  0: magic "META"        (4 bytes)
//! offset  4: tile count          (u32 LE)
//! offset  8: x, y, z of origin   (3 × u32 LE)
//! offset 20: count × (offset, length) entries (2 × u32 LE each)
//!            tile payloads
//! ```

mod container;
mod error;
mod path;

pub use container::{
    open_tile, read_container_entry, MetatileHeader, MetatileWriter, TileEntry, ENTRY_SIZE,
    HEADER_COUNT_OFFSET, META_MAGIC, TABLE_OFFSET,
};
pub use error::MetatileError;
pub use path::{resolve_path, MetatileLocation, METATILE};
