//! Generation and serving settings.

use std::path::{Path, PathBuf};

use crate::buffer::MAX_ENTRIES_PER_PAGE;
use crate::entry::Priority;

/// Settings passed explicitly to [`SitemapCache`](crate::SitemapCache) and
/// [`generate`](crate::generate).
///
/// The domain is stored without a trailing slash and the server path always
/// starts and ends with `/`, so `domain + server_path + file` is a valid URL.
#[derive(Clone, Debug)]
pub struct SitemapConfig {
    domain: String,
    cache_dir: PathBuf,
    server_path: String,
    default_priority: Priority,
    prune_stale: bool,
    max_entries_per_page: usize,
}

impl SitemapConfig {
    /// Create settings for `domain` (e.g. `https://example.com`), caching
    /// files in `cache_dir`.
    pub fn new(domain: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        let domain = domain.into();
        Self {
            domain: domain.trim_end_matches('/').to_owned(),
            cache_dir: cache_dir.into(),
            server_path: "/".to_owned(),
            default_priority: Priority::DEFAULT,
            prune_stale: true,
            max_entries_per_page: MAX_ENTRIES_PER_PAGE,
        }
    }

    /// URL path under which the sitemap files are served.
    #[must_use]
    pub fn with_server_path(mut self, server_path: &str) -> Self {
        self.server_path = normalize_server_path(server_path);
        self
    }

    #[must_use]
    pub fn with_default_priority(mut self, priority: Priority) -> Self {
        self.default_priority = priority;
        self
    }

    /// Remove `sitemap_<N>.xml` files left over from a larger generation.
    #[must_use]
    pub fn with_prune_stale(mut self, prune_stale: bool) -> Self {
        self.prune_stale = prune_stale;
        self
    }

    /// Page capacity; clamped to `1..=MAX_ENTRIES_PER_PAGE`.
    #[must_use]
    pub fn with_max_entries_per_page(mut self, max: usize) -> Self {
        self.max_entries_per_page = max.clamp(1, MAX_ENTRIES_PER_PAGE);
        self
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    #[must_use]
    pub fn server_path(&self) -> &str {
        &self.server_path
    }

    #[must_use]
    pub fn default_priority(&self) -> Priority {
        self.default_priority
    }

    #[must_use]
    pub fn prune_stale(&self) -> bool {
        self.prune_stale
    }

    #[must_use]
    pub fn max_entries_per_page(&self) -> usize {
        self.max_entries_per_page
    }

    /// Absolute URL of a resource path such as `/doc/A`.
    #[must_use]
    pub fn resource_url(&self, path: &str) -> String {
        format!("{}{path}", self.domain)
    }

    /// Absolute URL of a sitemap file such as `sitemap_1.xml`.
    #[must_use]
    pub fn file_url(&self, file_name: &str) -> String {
        format!("{}{}{file_name}", self.domain, self.server_path)
    }
}

fn normalize_server_path(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_owned()
    } else {
        format!("/{trimmed}/")
    }
}
