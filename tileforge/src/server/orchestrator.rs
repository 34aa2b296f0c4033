//! Per-request tile resolution.
//!
//! [`MetatileBackend`] serves tiles out of a mod_tile metatile tree,
//! falling back to renderd for missing tiles and refreshing stale ones in
//! the background. [`TileService`] also covers the in-process renderer.

use super::error::TileError;
use super::path::{TileFormat, TilePath};
use crate::coord::Tile;
use crate::metatile::{open_tile, resolve_path};
use crate::render::{RenderError, RenderPipeline};
use crate::renderd::{RenderCommand, RenderDaemon};
use crate::subrange::BoundedSubRange;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, error, warn};

/// One tile's bytes inside a metatile, with the container's mtime.
#[derive(Debug)]
pub struct StoredTile {
    pub reader: BoundedSubRange<File>,
    pub modified: SystemTime,
}

/// What a tile request resolved to.
#[derive(Debug)]
pub enum TileBody {
    Stored(StoredTile),
    Rendered(Vec<u8>),
}

/// Metatile store with optional renderd fallback.
#[derive(Clone)]
pub struct MetatileBackend {
    base_dir: PathBuf,
    map_name: String,
    renderer: Option<Arc<dyn RenderDaemon>>,
    expiration: Option<Duration>,
}

impl std::fmt::Debug for MetatileBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetatileBackend")
            .field("base_dir", &self.base_dir)
            .field("map_name", &self.map_name)
            .field("renderer", &self.renderer.is_some())
            .field("expiration", &self.expiration)
            .finish()
    }
}

impl MetatileBackend {
    pub fn new(base_dir: impl Into<PathBuf>, map_name: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            map_name: map_name.into(),
            renderer: None,
            expiration: None,
        }
    }

    /// Render missing and stale tiles through `renderer`.
    pub fn with_renderer(mut self, renderer: Arc<dyn RenderDaemon>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Treat tiles older than `expiration` as stale. `None` or zero
    /// disables staleness.
    pub fn with_expiration(mut self, expiration: Option<Duration>) -> Self {
        self.expiration = expiration.filter(|e| !e.is_zero());
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Resolve a tile, rendering it first if it is missing.
    ///
    /// Blocks on filesystem access and on renderd; call from a blocking
    /// context inside a tokio runtime.
    pub fn fetch_blocking(&self, tile: &Tile) -> Result<StoredTile, TileError> {
        let location = resolve_path(&self.base_dir, &self.map_name, tile);
        debug!(path = %location.path.display(), offset = location.offset, "Resolved metatile");

        let modified = match fs::metadata(&location.path) {
            Ok(meta) => {
                let modified = modified_time(&meta, &location.path)?;
                if self.is_stale(modified) {
                    self.spawn_refresh(*tile);
                }
                modified
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.render_missing(tile, &location.path)?
            }
            Err(e) => {
                warn!(path = %location.path.display(), error = %e, "Cannot stat metatile");
                return Err(TileError::Internal(e.to_string()));
            }
        };

        let reader = open_tile(&location.path, location.offset).map_err(|e| {
            if !e.is_not_found() {
                warn!(path = %location.path.display(), error = %e, "Could not open tile");
            }
            TileError::from(e)
        })?;

        Ok(StoredTile { reader, modified })
    }

    /// Synchronously render a missing metatile and re-check the store.
    fn render_missing(&self, tile: &Tile, path: &Path) -> Result<SystemTime, TileError> {
        let Some(renderer) = &self.renderer else {
            error!(path = %path.display(), "Metatile does not exist");
            return Err(TileError::NotFound);
        };

        let result = renderer.request_render(tile, RenderCommand::RenderPrio);
        if let Err(e) = &result {
            // The daemon may still have written the file.
            warn!(z = tile.z, x = tile.x, y = tile.y, error = %e, "Could not generate tile");
        }

        match fs::metadata(path) {
            Ok(meta) => modified_time(&meta, path),
            Err(e) => {
                if result.is_ok() {
                    warn!(
                        path = %path.display(),
                        "Metatile not found after successful render, are the paths matching?"
                    );
                }
                Err(TileError::Internal(format!(
                    "metatile {} unavailable after render: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    fn is_stale(&self, modified: SystemTime) -> bool {
        let Some(expiration) = self.expiration else {
            return false;
        };
        match modified.checked_add(expiration) {
            Some(expires) => expires < SystemTime::now(),
            None => false,
        }
    }

    /// Fire-and-forget low priority re-render of a stale tile.
    ///
    /// Needs a tokio runtime; without one the refresh is skipped and the
    /// stale tile is still served.
    fn spawn_refresh(&self, tile: Tile) {
        let Some(renderer) = self.renderer.clone() else {
            return;
        };
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!(z = tile.z, x = tile.x, y = tile.y, error = %e, "No runtime, skipping stale tile refresh");
                return;
            }
        };
        debug!(z = tile.z, x = tile.x, y = tile.y, "Refreshing stale tile");
        runtime.spawn_blocking(move || {
            if let Err(e) = renderer.request_render(&tile, RenderCommand::RenderLow) {
                warn!(z = tile.z, x = tile.x, y = tile.y, error = %e, "Background refresh failed");
            }
        });
    }
}

fn modified_time(meta: &fs::Metadata, path: &Path) -> Result<SystemTime, TileError> {
    meta.modified().map_err(|e| {
        TileError::Internal(format!("no modification time for {}: {}", path.display(), e))
    })
}

/// Source of tiles for the HTTP layer.
#[derive(Debug, Clone)]
pub enum TileService {
    Metatiles(MetatileBackend),
    InProcess(RenderPipeline),
}

impl TileService {
    /// Resolve one tile request.
    pub async fn fetch(&self, request: TilePath) -> Result<TileBody, TileError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.fetch_blocking(&request))
            .await
            .map_err(|e| TileError::Internal(format!("tile task failed: {}", e)))?
    }

    fn fetch_blocking(&self, request: &TilePath) -> Result<TileBody, TileError> {
        match self {
            TileService::Metatiles(backend) => {
                backend.fetch_blocking(&request.tile).map(TileBody::Stored)
            }
            TileService::InProcess(pipeline) => {
                if request.format != TileFormat::Png {
                    return Err(RenderError::UnsupportedFormat(request.format.to_string()).into());
                }
                let png = pipeline.render(&request.tile).map_err(|e| {
                    if !matches!(e, RenderError::NotFound { .. }) {
                        warn!(error = %e, "Render failed");
                    }
                    e
                })?;
                Ok(TileBody::Rendered(png))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metatile::MetatileWriter;
    use crate::renderd::RenderdError;
    use std::io::Read;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records requests and optionally writes the metatile like renderd.
    struct MockDaemon {
        base_dir: PathBuf,
        write_file: bool,
        fail: bool,
        calls: AtomicUsize,
        commands: Mutex<Vec<RenderCommand>>,
    }

    impl MockDaemon {
        fn new(base_dir: &Path, write_file: bool, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                base_dir: base_dir.to_path_buf(),
                write_file,
                fail,
                calls: AtomicUsize::new(0),
                commands: Mutex::new(Vec::new()),
            })
        }
    }

    impl RenderDaemon for MockDaemon {
        fn request_render(&self, tile: &Tile, command: RenderCommand) -> Result<(), RenderdError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.commands.lock().unwrap().push(command);
            if self.write_file {
                write_metatile(&self.base_dir, tile, b"rendered");
            }
            if self.fail {
                return Err(RenderdError::Rejected(4));
            }
            Ok(())
        }
    }

    /// Write a metatile for `tile`'s block where every slot holds `data`.
    fn write_metatile(base_dir: &Path, tile: &Tile, data: &[u8]) -> PathBuf {
        let location = resolve_path(base_dir, "ajt", tile);
        let mut writer = MetatileWriter::new(*tile);
        for _ in 0..64 {
            writer.push(data.to_vec());
        }
        writer.write_to(&location.path).unwrap();
        location.path
    }

    fn read_all(mut stored: StoredTile) -> Vec<u8> {
        let mut out = Vec::new();
        stored.reader.read_to_end(&mut out).unwrap();
        out
    }

    const TILE: Tile = Tile { x: 3, y: 2, z: 4 };

    #[test]
    fn test_existing_tile_served() {
        let dir = TempDir::new().unwrap();
        write_metatile(dir.path(), &TILE, b"png-bytes");

        let backend = MetatileBackend::new(dir.path(), "ajt");
        let stored = backend.fetch_blocking(&TILE).unwrap();
        assert_eq!(read_all(stored), b"png-bytes");
    }

    #[test]
    fn test_missing_without_renderer_is_not_found() {
        let dir = TempDir::new().unwrap();
        let backend = MetatileBackend::new(dir.path(), "ajt");
        assert!(matches!(backend.fetch_blocking(&TILE), Err(TileError::NotFound)));
    }

    #[test]
    fn test_missing_rendered_then_served() {
        let dir = TempDir::new().unwrap();
        let daemon = MockDaemon::new(dir.path(), true, false);
        let backend = MetatileBackend::new(dir.path(), "ajt").with_renderer(daemon.clone());

        let stored = backend.fetch_blocking(&TILE).unwrap();
        assert_eq!(read_all(stored), b"rendered");
        assert_eq!(*daemon.commands.lock().unwrap(), vec![RenderCommand::RenderPrio]);
    }

    #[test]
    fn test_render_error_still_serves_written_file() {
        let dir = TempDir::new().unwrap();
        let daemon = MockDaemon::new(dir.path(), true, true);
        let backend = MetatileBackend::new(dir.path(), "ajt").with_renderer(daemon);

        let stored = backend.fetch_blocking(&TILE).unwrap();
        assert_eq!(read_all(stored), b"rendered");
    }

    #[test]
    fn test_still_missing_after_render_is_internal() {
        let dir = TempDir::new().unwrap();
        let daemon = MockDaemon::new(dir.path(), false, false);
        let backend = MetatileBackend::new(dir.path(), "ajt").with_renderer(daemon.clone());

        let err = backend.fetch_blocking(&TILE).unwrap_err();
        assert!(matches!(err, TileError::Internal(_)));
        assert_eq!(daemon.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_tile_served_and_refreshed() {
        let dir = TempDir::new().unwrap();
        let path = write_metatile(dir.path(), &TILE, b"old");
        let old = SystemTime::now() - Duration::from_secs(3600);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(old)
            .unwrap();

        let daemon = MockDaemon::new(dir.path(), false, true);
        let service = TileService::Metatiles(
            MetatileBackend::new(dir.path(), "ajt")
                .with_renderer(daemon.clone())
                .with_expiration(Some(Duration::from_secs(60))),
        );

        let body = service
            .fetch(TilePath {
                tile: TILE,
                format: TileFormat::Png,
            })
            .await
            .unwrap();
        let TileBody::Stored(stored) = body else {
            panic!("expected stored tile");
        };
        assert_eq!(read_all(stored), b"old");

        for _ in 0..100 {
            if daemon.calls.load(Ordering::SeqCst) > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(*daemon.commands.lock().unwrap(), vec![RenderCommand::RenderLow]);
    }

    #[test]
    fn test_stale_tile_outside_runtime_served_without_refresh() {
        let dir = TempDir::new().unwrap();
        let path = write_metatile(dir.path(), &TILE, b"old");
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(SystemTime::now() - Duration::from_secs(3600))
            .unwrap();

        let daemon = MockDaemon::new(dir.path(), false, false);
        let backend = MetatileBackend::new(dir.path(), "ajt")
            .with_renderer(daemon.clone())
            .with_expiration(Some(Duration::from_secs(60)));

        let stored = backend.fetch_blocking(&TILE).unwrap();
        assert_eq!(read_all(stored), b"old");
        assert_eq!(daemon.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fresh_tile_not_refreshed() {
        let dir = TempDir::new().unwrap();
        write_metatile(dir.path(), &TILE, b"new");
        let daemon = MockDaemon::new(dir.path(), false, false);
        let backend = MetatileBackend::new(dir.path(), "ajt")
            .with_renderer(daemon.clone())
            .with_expiration(Some(Duration::from_secs(3600)));

        backend.fetch_blocking(&TILE).unwrap();
        assert_eq!(daemon.calls.load(Ordering::SeqCst), 0);
    }
}
