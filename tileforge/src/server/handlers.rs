//! HTTP routing.

use super::conditional::{evaluate_range, http_date, is_not_modified, ByteRange, RangeRequest};
use super::context::AppContext;
use super::error::TileError;
use super::orchestrator::{StoredTile, TileBody};
use super::path::{parse_tile_path, TileFormat};
use axum::extract::State;
use axum::http::header::{
    ACCEPT_RANGES, ALLOW, CACHE_CONTROL, CONTENT_RANGE, CONTENT_TYPE, IF_MODIFIED_SINCE,
    LAST_MODIFIED, RANGE,
};
use axum::http::{HeaderMap, HeaderName, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

/// Build the application router.
///
/// `/tile` and everything below it goes to the tile service, everything
/// else is served from `static_dir`.
pub fn router(context: Arc<AppContext>, static_dir: &Path) -> Router {
    Router::new()
        .route("/tile", any(tile_handler))
        .route("/tile/", any(tile_handler))
        .route("/tile/{*path}", any(tile_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(context)
}

async fn tile_handler(
    State(context): State<Arc<AppContext>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    debug!(%method, %uri, "Tile request received");
    if method != Method::GET {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            [(ALLOW, "GET")],
            "Only GET requests allowed",
        )
            .into_response();
    }

    let request = match parse_tile_path(uri.path()) {
        Ok(request) => request,
        Err(e) => return error_response(e.into()),
    };

    match context.service().fetch(request).await {
        Ok(TileBody::Stored(stored)) => serve_stored(stored, request.format, &headers).await,
        Ok(TileBody::Rendered(png)) => {
            ([(CONTENT_TYPE, request.format.content_type())], png).into_response()
        }
        Err(e) => error_response(e),
    }
}

fn error_response(error: TileError) -> Response {
    let status = error.status();
    match error {
        TileError::BadRequest(message) => (status, message).into_response(),
        _ => status.into_response(),
    }
}

/// Respond with a stored tile, honouring If-Modified-Since and Range.
async fn serve_stored(stored: StoredTile, format: TileFormat, headers: &HeaderMap) -> Response {
    let header = |name: HeaderName| headers.get(name).and_then(|v| v.to_str().ok());
    let last_modified = http_date(stored.modified);

    if is_not_modified(stored.modified, header(IF_MODIFIED_SINCE)) {
        return (
            StatusCode::NOT_MODIFIED,
            [
                (CACHE_CONTROL, "no-cache".to_string()),
                (LAST_MODIFIED, last_modified),
            ],
        )
            .into_response();
    }

    let total = stored.reader.len();
    let range = match evaluate_range(header(RANGE), total) {
        RangeRequest::Full => None,
        RangeRequest::Partial(range) => Some(range),
        RangeRequest::Unsatisfiable => {
            return (
                StatusCode::RANGE_NOT_SATISFIABLE,
                [(CONTENT_RANGE, format!("bytes */{}", total))],
            )
                .into_response();
        }
    };

    let reader = stored.reader;
    let body = match tokio::task::spawn_blocking(move || read_body(reader, range)).await {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => {
            warn!(error = %e, "Failed to read tile bytes");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
        Err(e) => {
            warn!(error = %e, "Tile read task failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let common = [
        (CONTENT_TYPE, format.content_type().to_string()),
        (CACHE_CONTROL, "no-cache".to_string()),
        (LAST_MODIFIED, last_modified),
        (ACCEPT_RANGES, "bytes".to_string()),
    ];
    match range {
        Some(range) => (
            StatusCode::PARTIAL_CONTENT,
            common,
            [(CONTENT_RANGE, range.content_range(total))],
            body,
        )
            .into_response(),
        None => (StatusCode::OK, common, body).into_response(),
    }
}

fn read_body<R: Read + Seek>(mut reader: R, range: Option<ByteRange>) -> io::Result<Vec<u8>> {
    let mut body = Vec::new();
    match range {
        Some(range) => {
            reader.seek(SeekFrom::Start(range.start))?;
            reader.take(range.length()).read_to_end(&mut body)?;
        }
        None => {
            reader.read_to_end(&mut body)?;
        }
    }
    Ok(body)
}
