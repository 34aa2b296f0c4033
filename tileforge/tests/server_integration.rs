//! Integration tests for the HTTP tile server.
//!
//! These drive the axum router directly and verify:
//! - Serving tiles out of metatile containers
//! - Status mapping for missing, out-of-bounds and malformed requests
//! - Rendering through a renderd stand-in on a cache miss
//! - Conditional and range requests
//! - In-process rendering from a spatial index
//! - Listener startup and shutdown

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tileforge::coord::{tile_bounds, Point, Tile};
use tileforge::index::Way;
use tileforge::metatile::{resolve_path, MetatileWriter};
use tileforge::renderd::{RenderCommand, RenderDaemon, RenderdError};
use tileforge::server::{http_date, router, serve, AppContext, MetatileBackend, TlsListener};
use tower::ServiceExt;

// =============================================================================
// Test Helpers
// =============================================================================

const MAP: &str = "ajt";

/// Write a raw container: `count` entries, all pointing at `payload`.
///
/// The payload sits behind the table at offset X and has length L.
fn write_raw_container(base: &Path, tile: &Tile, count: u32, payload: &[u8]) -> PathBuf {
    let location = resolve_path(base, MAP, tile);
    let table_end = 20 + count * 8;
    let mut bytes = b"META".to_vec();
    bytes.extend_from_slice(&count.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 12]);
    for _ in 0..count {
        bytes.extend_from_slice(&table_end.to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    }
    bytes.extend_from_slice(payload);

    fs::create_dir_all(location.path.parent().unwrap()).unwrap();
    fs::write(&location.path, bytes).unwrap();
    location.path
}

fn metatile_app(base: &Path) -> Router {
    let context = AppContext::metatiles(MetatileBackend::new(base, MAP));
    router(Arc::new(context), base)
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

async fn get(app: Router, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

fn header_str<'a>(response: &'a Response, name: header::HeaderName) -> &'a str {
    response.headers()[name].to_str().unwrap()
}

/// renderd stand-in that writes the metatile it is asked for.
struct WritingDaemon {
    base: PathBuf,
    calls: AtomicUsize,
}

impl RenderDaemon for WritingDaemon {
    fn request_render(&self, tile: &Tile, _command: RenderCommand) -> Result<(), RenderdError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let location = resolve_path(&self.base, MAP, tile);
        let mut writer = MetatileWriter::new(*tile);
        for _ in 0..64 {
            writer.push(b"fresh".to_vec());
        }
        writer.write_to(&location.path).unwrap();
        // Report a protocol failure anyway; the file is what counts.
        Err(RenderdError::ShortRead { received: 0 })
    }
}

// =============================================================================
// Metatile Serving
// =============================================================================

#[tokio::test]
async fn test_serves_tile_from_container() {
    let dir = TempDir::new().unwrap();
    let payload = b"\x89PNG fake tile bytes";
    let path = write_raw_container(dir.path(), &Tile { x: 3, y: 2, z: 4 }, 64, payload);
    let modified = fs::metadata(&path).unwrap().modified().unwrap();

    let response = get(metatile_app(dir.path()), "/tile/4/3/2.png").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "image/png");
    assert_eq!(header_str(&response, header::CACHE_CONTROL), "no-cache");
    assert_eq!(header_str(&response, header::LAST_MODIFIED), http_date(modified));
    assert_eq!(header_str(&response, header::ACCEPT_RANGES), "bytes");
    assert_eq!(body_bytes(response).await, payload);
}

#[tokio::test]
async fn test_single_entry_container_serves_first_slot() {
    let dir = TempDir::new().unwrap();
    write_raw_container(dir.path(), &Tile { x: 0, y: 0, z: 4 }, 1, b"only");

    let response = get(metatile_app(dir.path()), "/tile/4/0/0.webp").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "image/webp");
    assert_eq!(body_bytes(response).await, b"only");
}

#[tokio::test]
async fn test_index_beyond_count_is_server_error() {
    let dir = TempDir::new().unwrap();
    // Slot of 4/3/2 is 26, the container declares a single tile.
    write_raw_container(dir.path(), &Tile { x: 3, y: 2, z: 4 }, 1, b"only");

    let response = get(metatile_app(dir.path()), "/tile/4/3/2.png").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_missing_without_renderd_is_not_found() {
    let dir = TempDir::new().unwrap();
    let response = get(metatile_app(dir.path()), "/tile/0/0/0.png").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_is_rendered_then_served() {
    let dir = TempDir::new().unwrap();
    let daemon = Arc::new(WritingDaemon {
        base: dir.path().to_path_buf(),
        calls: AtomicUsize::new(0),
    });
    let backend = MetatileBackend::new(dir.path(), MAP).with_renderer(daemon.clone());
    let app = router(Arc::new(AppContext::metatiles(backend)), dir.path());

    let response = get(app, "/tile/12/2200/1343.png").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"fresh");
    assert_eq!(daemon.calls.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Request Validation
// =============================================================================

#[tokio::test]
async fn test_malformed_path_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let response = get(metatile_app(dir.path()), "/tile/4/3/2").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(response).await, b"could not match path");
}

#[tokio::test]
async fn test_bare_tile_prefix_is_bad_request() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("tile")).unwrap();

    for uri in ["/tile", "/tile/"] {
        let response = get(metatile_app(dir.path()), uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body_bytes(response).await, b"could not match path");
    }
}

#[tokio::test]
async fn test_out_of_range_tile_is_bad_request() {
    let dir = TempDir::new().unwrap();
    let response = get(metatile_app(dir.path()), "/tile/2/4/0.png").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_get_is_method_not_allowed() {
    let dir = TempDir::new().unwrap();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/tile/4/3/2.png")
        .body(Body::empty())
        .unwrap();

    let response = send(metatile_app(dir.path()), request).await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_static_files_served() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("index.html"), "<html>map</html>").unwrap();

    let response = get(metatile_app(dir.path()), "/index.html").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"<html>map</html>");
}

// =============================================================================
// Conditional and Range Requests
// =============================================================================

#[tokio::test]
async fn test_if_modified_since_not_modified() {
    let dir = TempDir::new().unwrap();
    write_raw_container(dir.path(), &Tile { x: 3, y: 2, z: 4 }, 64, b"tile");
    let later = http_date(SystemTime::now() + Duration::from_secs(3600));

    let request = Request::get("/tile/4/3/2.png")
        .header(header::IF_MODIFIED_SINCE, later)
        .body(Body::empty())
        .unwrap();
    let response = send(metatile_app(dir.path()), request).await;

    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn test_range_request_partial_content() {
    let dir = TempDir::new().unwrap();
    write_raw_container(dir.path(), &Tile { x: 3, y: 2, z: 4 }, 64, b"0123456789");

    let request = Request::get("/tile/4/3/2.png")
        .header(header::RANGE, "bytes=2-5")
        .body(Body::empty())
        .unwrap();
    let response = send(metatile_app(dir.path()), request).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes 2-5/10");
    assert_eq!(body_bytes(response).await, b"2345");
}

#[tokio::test]
async fn test_range_honoured_despite_stale_if_range() {
    let dir = TempDir::new().unwrap();
    write_raw_container(dir.path(), &Tile { x: 3, y: 2, z: 4 }, 64, b"0123456789");
    let long_ago = http_date(SystemTime::UNIX_EPOCH + Duration::from_secs(86_400));

    let request = Request::get("/tile/4/3/2.png")
        .header(header::RANGE, "bytes=2-5")
        .header(header::IF_RANGE, long_ago)
        .body(Body::empty())
        .unwrap();
    let response = send(metatile_app(dir.path()), request).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(body_bytes(response).await, b"2345");
}

#[tokio::test]
async fn test_unsatisfiable_range() {
    let dir = TempDir::new().unwrap();
    write_raw_container(dir.path(), &Tile { x: 3, y: 2, z: 4 }, 64, b"0123456789");

    let request = Request::get("/tile/4/3/2.png")
        .header(header::RANGE, "bytes=10-")
        .body(Body::empty())
        .unwrap();
    let response = send(metatile_app(dir.path()), request).await;

    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), "bytes */10");
}

// =============================================================================
// In-Process Rendering
// =============================================================================

fn in_process_app(static_dir: &Path) -> Router {
    let tile = Tile { x: 8, y: 5, z: 4 };
    let bbox = tile_bounds(&tile);
    let center = bbox.center();
    let way = Way::new(vec![
        Point::new(bbox.min.lon + 0.5, center.lat),
        Point::new(bbox.max.lon - 0.5, center.lat),
    ])
    .with_tag("highway", "primary");

    let context = AppContext::in_process(6, 11, |mut builder| {
        builder.push_way(&way)?;
        builder.finish()
    })
    .unwrap();
    router(Arc::new(context), static_dir)
}

#[tokio::test]
async fn test_in_process_renders_png() {
    let dir = TempDir::new().unwrap();
    let response = get(in_process_app(dir.path()), "/tile/4/8/5.png").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), "image/png");
    let body = body_bytes(response).await;
    assert_eq!(&body[..4], b"\x89PNG");
}

#[tokio::test]
async fn test_in_process_unindexed_tile_not_found() {
    let dir = TempDir::new().unwrap();
    let response = get(in_process_app(dir.path()), "/tile/4/0/0.png").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_in_process_rejects_webp() {
    let dir = TempDir::new().unwrap();
    let response = get(in_process_app(dir.path()), "/tile/4/8/5.webp").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// =============================================================================
// Listener Lifecycle
// =============================================================================

#[tokio::test]
async fn test_serve_returns_after_shutdown() {
    let dir = TempDir::new().unwrap();
    let context = AppContext::metatiles(MetatileBackend::new(dir.path(), MAP));
    let addr = "127.0.0.1:0".parse().unwrap();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        serve(addr, None, context, dir.path(), async {}),
    )
    .await
    .expect("server did not stop");
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_tls_with_missing_certificate_fails_startup() {
    let dir = TempDir::new().unwrap();
    let context = AppContext::metatiles(MetatileBackend::new(dir.path(), MAP));
    let tls = TlsListener {
        addr: "127.0.0.1:0".parse().unwrap(),
        cert: dir.path().join("cert.pem"),
        key: dir.path().join("key.pem"),
    };

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        serve(
            "127.0.0.1:0".parse().unwrap(),
            Some(tls),
            context,
            dir.path(),
            std::future::pending(),
        ),
    )
    .await
    .expect("startup did not fail");
    assert!(result.is_err());
}
