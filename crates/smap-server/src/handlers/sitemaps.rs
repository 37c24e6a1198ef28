//! Sitemap file endpoint.
//!
//! Serves `sitemapindex.xml` and `sitemap_<N>.xml` from the sitemap cache,
//! generating the sitemap on the first request.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use smap_sitemap::SitemapFile;

use crate::error::ServerError;
use crate::state::AppState;

/// Content type of sitemap documents.
const XML_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Handle GET {server_path}{file}.
pub(crate) async fn get_sitemap(
    Path(name): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ServerError> {
    let file = SitemapFile::parse(&name).ok_or(ServerError::NotFound(name))?;

    // Generation blocks on the cache lock and disk I/O
    let cache = Arc::clone(&state.cache);
    let body = tokio::task::spawn_blocking(move || cache.read(&file)).await??;

    Ok(([(header::CONTENT_TYPE, XML_CONTENT_TYPE)], body))
}
