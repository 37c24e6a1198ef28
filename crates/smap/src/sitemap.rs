//! Sitemap cache construction from configuration.

use smap_config::Config;
use smap_sitemap::{Priority, SitemapCache, SitemapConfig, SitemapRegistry};

use crate::bindings::JsonFileEnumerator;
use crate::error::CliError;

/// Build the sitemap cache described by `config`.
///
/// Routes with a bindings file are registered as parameterized, all others
/// as static.
pub(crate) fn build_cache(config: &Config) -> Result<SitemapCache, CliError> {
    let sitemap_config = sitemap_config(config)?;
    let mut registry = SitemapRegistry::new(sitemap_config.default_priority());

    for route in &config.routes_resolved {
        let priority = route
            .priority
            .map(Priority::new)
            .transpose()?
            .unwrap_or(sitemap_config.default_priority());

        match &route.bindings {
            Some(path) => {
                registry.register_parameterized_with_priority(
                    &route.pattern,
                    priority,
                    JsonFileEnumerator::new(path),
                )?;
            }
            None => {
                registry.register_static(&route.pattern, priority)?;
            }
        }
    }

    tracing::debug!(routes = registry.source_count(), "Sitemap routes registered");
    Ok(SitemapCache::new(registry, sitemap_config))
}

fn sitemap_config(config: &Config) -> Result<SitemapConfig, CliError> {
    let resolved = &config.sitemap_resolved;
    Ok(
        SitemapConfig::new(resolved.domain.as_str(), resolved.cache_dir.as_path())
            .with_server_path(&resolved.server_path)
            .with_default_priority(Priority::new(resolved.default_priority)?)
            .with_prune_stale(resolved.prune_stale)
            .with_max_entries_per_page(resolved.max_entries_per_page),
    )
}
