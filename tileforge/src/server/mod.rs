//! HTTP tile server.
//!
//! Routes `GET /tile/{z}/{x}/{y}.{png|webp}` to either a metatile store
//! (optionally backed by renderd) or the in-process renderer, and serves
//! static files for every other path.

mod conditional;
mod context;
mod error;
mod handlers;
mod orchestrator;
mod path;

pub use conditional::{evaluate_range, http_date, is_not_modified, ByteRange, RangeRequest};
pub use context::AppContext;
pub use error::TileError;
pub use handlers::router;
pub use orchestrator::{MetatileBackend, StoredTile, TileBody, TileService};
pub use path::{parse_tile_path, PathParseError, TileFormat, TilePath};

use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use std::future::{Future, IntoFuture};
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Time in-flight HTTPS connections get to finish after shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTPS listener serving the same routes as the plain listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsListener {
    pub addr: SocketAddr,
    /// PEM certificate chain
    pub cert: PathBuf,
    /// PEM private key
    pub key: PathBuf,
}

/// Serve `context` on `addr`, and over HTTPS when `tls` is set, until
/// `shutdown` resolves.
///
/// The certificate is loaded before either listener is bound, so a bad
/// certificate or key fails startup. Failure of either listener stops
/// both. The context is dropped after the servers have drained,
/// releasing any mapped record store.
pub async fn serve<F>(
    addr: SocketAddr,
    tls: Option<TlsListener>,
    context: AppContext,
    static_dir: &Path,
    shutdown: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let tls = match tls {
        Some(listener) => {
            let config = RustlsConfig::from_pem_file(&listener.cert, &listener.key).await?;
            Some((listener.addr, config))
        }
        None => {
            info!("TLS is disabled");
            None
        }
    };

    let context = Arc::new(context);
    let app = router(Arc::clone(&context), static_dir);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP listener started");

    match tls {
        Some((tls_addr, config)) => {
            let handle = Handle::new();
            let tls_handle = handle.clone();
            let shutdown = async move {
                shutdown.await;
                tls_handle.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
            };

            let plain = axum::serve(listener, app.clone())
                .with_graceful_shutdown(shutdown)
                .into_future();
            let secure = async move {
                info!(addr = %tls_addr, "HTTPS listener started");
                axum_server::bind_rustls(tls_addr, config)
                    .handle(handle)
                    .serve(app.into_make_service())
                    .await
            };
            tokio::try_join!(plain, secure)?;
        }
        None => {
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await?;
        }
    }

    info!("Server stopped");
    drop(context);
    Ok(())
}
