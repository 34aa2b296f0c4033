//! Tile request failures and their HTTP status.

use super::path::PathParseError;
use crate::metatile::MetatileError;
use crate::render::RenderError;
use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TileError {
    #[error("{0}")]
    BadRequest(String),

    #[error("tile not found")]
    NotFound,

    #[error("{0}")]
    Internal(String),
}

impl TileError {
    pub fn status(&self) -> StatusCode {
        match self {
            TileError::BadRequest(_) => StatusCode::BAD_REQUEST,
            TileError::NotFound => StatusCode::NOT_FOUND,
            TileError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PathParseError> for TileError {
    fn from(err: PathParseError) -> Self {
        TileError::BadRequest(err.to_string())
    }
}

impl From<MetatileError> for TileError {
    fn from(err: MetatileError) -> Self {
        if err.is_not_found() {
            TileError::NotFound
        } else {
            TileError::Internal(err.to_string())
        }
    }
}

impl From<RenderError> for TileError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::NotFound { .. } => TileError::NotFound,
            RenderError::UnsupportedFormat(_) => TileError::BadRequest(err.to_string()),
            _ => TileError::Internal(err.to_string()),
        }
    }
}
