//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;

use smap_sitemap::SitemapCache;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Sitemap cache serving the generated files.
    pub(crate) cache: Arc<SitemapCache>,
}
