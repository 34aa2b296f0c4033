//! In-process tile rasterizer.
//!
//! Strokes every indexed way touching a tile onto a white 256×256 canvas
//! and encodes it as PNG.

mod error;

pub use error::RenderError;

use crate::coord::{point_to_pixel, tile_bounds, Tile};
use crate::index::TileIndexStore;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Shader, Stroke, Transform};
use tracing::trace;

/// Edge length of rendered tiles in pixels.
pub const TILE_SIZE: u32 = 256;

/// Renders tiles from a [`TileIndexStore`].
#[derive(Debug, Clone)]
pub struct RenderPipeline {
    store: Arc<TileIndexStore>,
    line_width: f32,
}

impl RenderPipeline {
    pub fn new(store: Arc<TileIndexStore>) -> Self {
        Self {
            store,
            line_width: 1.0,
        }
    }

    pub fn store(&self) -> &TileIndexStore {
        &self.store
    }

    /// Render `tile` to PNG bytes.
    pub fn render(&self, tile: &Tile) -> Result<Vec<u8>, RenderError> {
        let offsets = self.store.lookup(tile).ok_or(RenderError::NotFound {
            x: tile.x,
            y: tile.y,
            z: tile.z,
        })?;

        let mut pixmap = Pixmap::new(TILE_SIZE, TILE_SIZE)
            .ok_or_else(|| RenderError::Encode("cannot allocate canvas".to_string()))?;
        pixmap.fill(Color::WHITE);

        let paint = Paint {
            shader: Shader::SolidColor(Color::BLACK),
            anti_alias: true,
            ..Default::default()
        };
        let stroke = Stroke {
            width: self.line_width,
            ..Default::default()
        };

        let bbox = tile_bounds(tile);
        let mut way = self.store.new_buffer();
        let mut drawn = 0usize;

        for &offset in offsets {
            self.store.materialize(offset, &mut way)?;
            if !bbox.overlaps(&way.bbox) {
                continue;
            }

            // Segments are drawn from the first vertex inside the tile
            // onwards; earlier vertices are all outside.
            let mut visible = false;
            let mut builder = PathBuilder::new();
            for (i, point) in way.points.iter().enumerate() {
                if bbox.contains(*point) {
                    visible = true;
                }
                if i != 0 && visible {
                    let from = point_to_pixel(way.points[i - 1], tile, TILE_SIZE);
                    let to = point_to_pixel(*point, tile, TILE_SIZE);
                    builder.move_to(from.x, from.y);
                    builder.line_to(to.x, to.y);
                }
            }

            if let Some(path) = builder.finish() {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
                drawn += 1;
            }
        }

        trace!(z = tile.z, x = tile.x, y = tile.y, candidates = offsets.len(), drawn, "Tile rasterized");
        encode_png(&pixmap)
    }
}

fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, RenderError> {
    // Canvas is fully opaque, so premultiplied and straight RGBA agree.
    let image = RgbaImage::from_raw(pixmap.width(), pixmap.height(), pixmap.data().to_vec())
        .ok_or_else(|| RenderError::Encode("canvas size mismatch".to_string()))?;
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(buffer.into_inner())
}
