//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`init`] - Configuration initialization
//! - [`locate`] - Print where a tile lives in the metatile store
//! - [`render`] - Serve tiles rendered in-process from an OSM extract
//! - [`serve`] - Serve tiles from a metatile tree, rendering through renderd

pub mod common;
pub mod init;
pub mod locate;
pub mod render;
pub mod serve;
