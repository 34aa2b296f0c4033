//! Process-wide serving state.

use super::orchestrator::{MetatileBackend, TileService};
use crate::index::{IndexError, SpatialIndex, SpatialIndexBuilder, TileIndexStore};
use crate::render::RenderPipeline;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::info;

/// Everything request handlers share.
///
/// In in-process mode the context owns the record store: dropping it
/// unmaps the store and deletes its temporary file.
#[derive(Debug)]
pub struct AppContext {
    service: TileService,
    // Declared after `service` so the map is released before the file.
    _record_store: Option<NamedTempFile>,
}

impl AppContext {
    /// Serve from a metatile tree.
    pub fn metatiles(backend: MetatileBackend) -> Self {
        Self {
            service: TileService::Metatiles(backend),
            _record_store: None,
        }
    }

    /// Build a spatial index into a temporary record store and render
    /// tiles from it.
    ///
    /// `load` receives an empty builder and must return the finished index.
    pub fn in_process<F>(max_zoom: u32, detail_zoom: u32, load: F) -> Result<Self, IndexError>
    where
        F: FnOnce(SpatialIndexBuilder) -> Result<SpatialIndex, IndexError>,
    {
        let record_store = NamedTempFile::new()?;
        let builder = SpatialIndexBuilder::new(record_store.reopen()?, record_store.path(), max_zoom)?
            .with_detail_zoom(detail_zoom);
        let index = load(builder)?;
        let store = TileIndexStore::open(index)?;
        info!(
            path = %store.path().display(),
            max_zoom = store.max_zoom(),
            "Record store mapped"
        );

        Ok(Self {
            service: TileService::InProcess(RenderPipeline::new(Arc::new(store))),
            _record_store: Some(record_store),
        })
    }

    pub fn service(&self) -> &TileService {
        &self.service
    }
}
