//! tileforge - a slippy map tile server
//!
//! Serves `z/x/y` raster tiles either out of a mod_tile metatile tree,
//! rendering missing or stale metatiles through renderd, or by rasterizing
//! OpenStreetMap ways in process from a memory-mapped spatial index.
//!
//! # Modules
//!
//! - [`coord`] - Web Mercator tile and coordinate math
//! - [`metatile`] - metatile path hashing and container codec
//! - [`subrange`] - bounded reader over one tile inside a container
//! - [`renderd`] - renderd wire protocol client
//! - [`index`] - spatial index build and memory-mapped lookup
//! - [`osm`] - OSM PBF way source
//! - [`render`] - in-process rasterizer
//! - [`server`] - HTTP routing and per-request orchestration
//! - [`config`] - INI configuration
//! - [`logging`] - tracing setup

pub mod config;
pub mod coord;
pub mod index;
pub mod logging;
pub mod metatile;
pub mod osm;
pub mod render;
pub mod renderd;
pub mod server;
pub mod subrange;

/// Version of the tileforge library and CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
