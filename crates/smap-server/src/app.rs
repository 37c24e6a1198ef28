//! Router construction.
//!
//! Builds the axum router with the sitemap route and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::security;
use crate::state::AppState;

/// Create the application router.
///
/// Sitemap files are served under the cache's configured server path. Any
/// other path returns 404.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    let route = format!("{}{{file}}", state.cache.config().server_path());

    Router::new()
        .route(&route, get(handlers::sitemaps::get_sitemap))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(security::content_type_options_layer()),
        )
        .with_state(state)
}
