//! Error types for the HTTP server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use smap_sitemap::CacheError;

/// Server error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ServerError {
    /// Requested file is not a sitemap file or not part of the current set.
    #[error("Sitemap not found: {0}")]
    NotFound(String),

    /// Cache error from smap-sitemap.
    #[error("{0}")]
    Cache(CacheError),

    /// Blocking task panicked or was cancelled.
    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<CacheError> for ServerError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::NotFound(name) => Self::NotFound(name),
            other => Self::Cache(other),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::NotFound(name) => (
                StatusCode::NOT_FOUND,
                json!({"error": "Sitemap not found", "path": name}),
            ),
            Self::Cache(e) => {
                tracing::error!("Failed to serve sitemap: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": e.to_string()}),
                )
            }
            Self::Task(e) => {
                tracing::error!("Sitemap task failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": e.to_string()}),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
