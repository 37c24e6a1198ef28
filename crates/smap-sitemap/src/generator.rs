//! Sitemap generation from a registry of sources.
//!
//! A run writes every page and the index into a private staging directory
//! inside the cache directory. Only when all of them were written are they
//! renamed into the cache directory, pages first and the index last. A run
//! that fails before the first rename drops its staging directory and leaves
//! the files of the previous generation untouched. A rename failing after
//! that is reported as [`GenerationError::Commit`].

use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::buffer::PageBuffer;
use crate::config::SitemapConfig;
use crate::document::{INDEX_FILE_NAME, SitemapIndex, parse_page_number};
use crate::entry::Entry;
use crate::error::GenerationError;
use crate::route::Router;
use crate::source::{ParameterizedSource, ResourceInstance, SitemapRegistry};

const STAGING_PREFIX: &str = ".staging-";

/// Generate all sitemap pages and the index for `registry`.
///
/// Returns the file names written into the cache directory: the pages in
/// order, followed by [`INDEX_FILE_NAME`].
///
/// The caller must be the only writer of the cache directory for the
/// duration of the call. [`SitemapCache`](crate::SitemapCache) guarantees
/// this with its exclusive lock.
pub fn generate<R: Router>(
    registry: &SitemapRegistry<R>,
    config: &SitemapConfig,
) -> Result<Vec<String>, GenerationError> {
    let started = Instant::now();
    let cache_dir = config.cache_dir();
    remove_stale_staging(cache_dir);

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(cache_dir)
        .map_err(|e| GenerationError::storage(cache_dir, e))?;
    let mut buffer = PageBuffer::with_capacity(staging.path(), config.max_entries_per_page());

    for source in registry.static_sources() {
        let entry = Entry::new(config.resource_url(&source.location)).with_priority(source.priority);
        buffer.add_entry(entry)?;
    }
    for source in registry.parameterized_sources() {
        enumerate_source(registry.router(), config, source, &mut buffer)?;
    }
    buffer.flush()?;
    let pages = buffer.into_locations();

    let index = SitemapIndex::new(pages.iter().map(|page| config.file_url(page)).collect());
    let index_path = staging.path().join(INDEX_FILE_NAME);
    fs::write(&index_path, index.to_xml()?).map_err(|e| GenerationError::storage(&index_path, e))?;

    let names = pages.iter().map(String::as_str).chain([INDEX_FILE_NAME]);
    for (committed, name) in names.enumerate() {
        let target = cache_dir.join(name);
        fs::rename(staging.path().join(name), &target).map_err(move |source| {
            if committed == 0 {
                GenerationError::storage(target, source)
            } else {
                GenerationError::Commit {
                    path: target,
                    source,
                }
            }
        })?;
    }
    if config.prune_stale() {
        prune_stale_pages(cache_dir, pages.len());
    }

    tracing::info!(
        pages = pages.len(),
        elapsed_ms = started.elapsed().as_millis(),
        "Sitemap generated"
    );

    let mut files = pages;
    files.push(INDEX_FILE_NAME.to_owned());
    Ok(files)
}

fn enumerate_source<R: Router>(
    router: &R,
    config: &SitemapConfig,
    source: &ParameterizedSource,
    buffer: &mut PageBuffer,
) -> Result<(), GenerationError> {
    let mut count = 0usize;
    for item in source.enumerator.instances() {
        let instance = item.map_err(|err| GenerationError::Enumeration {
            pattern: source.pattern.clone(),
            source: err,
        })?;
        let path = router.build_url(source.route, instance.bindings())?;
        buffer.add_entry(instance_entry(config.resource_url(&path), source, &instance))?;
        count += 1;
    }
    tracing::debug!(route = %source.pattern, instances = count, "Enumerated route");
    Ok(())
}

fn instance_entry(
    location: String,
    source: &ParameterizedSource,
    instance: &ResourceInstance,
) -> Entry {
    let mut entry = Entry::new(location).with_priority(source.priority);
    if let Some(freq) = instance.change_frequency() {
        entry = entry.with_change_frequency(freq);
    }
    if let Some(modified) = instance.last_modified() {
        entry = entry.with_last_modified(modified);
    }
    entry
}

/// Remove `sitemap_<N>.xml` files with `N > page_count`.
fn prune_stale_pages(cache_dir: &Path, page_count: usize) {
    let Ok(entries) = fs::read_dir(cache_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(number) = name.to_str().and_then(parse_page_number) else {
            continue;
        };
        if number > page_count {
            match fs::remove_file(entry.path()) {
                Ok(()) => tracing::debug!(page = number, "Pruned stale sitemap page"),
                Err(e) => tracing::warn!(page = number, "Failed to prune stale sitemap page: {e}"),
            }
        }
    }
}

/// Remove staging directories left behind by an interrupted process.
fn remove_stale_staging(cache_dir: &Path) {
    let Ok(entries) = fs::read_dir(cache_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let is_staging = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(STAGING_PREFIX));
        if is_staging
            && entry.path().is_dir()
            && let Err(e) = fs::remove_dir_all(entry.path())
        {
            tracing::warn!("Failed to remove stale staging directory: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;
    use crate::document::SitemapPage;
    use crate::entry::{ChangeFrequency, Priority};
    use crate::error::EnumerationError;

    fn ids(values: &'static [&'static str]) -> impl Fn() -> Vec<Result<ResourceInstance, EnumerationError>> {
        move || {
            values
                .iter()
                .map(|id| Ok(ResourceInstance::new([("id", *id)])))
                .collect()
        }
    }

    fn read_page(dir: &Path, name: &str) -> SitemapPage {
        SitemapPage::parse(&fs::read_to_string(dir.join(name)).unwrap()).unwrap()
    }

    fn read_index(dir: &Path) -> SitemapIndex {
        SitemapIndex::parse(&fs::read_to_string(dir.join(INDEX_FILE_NAME)).unwrap()).unwrap()
    }

    fn locations(page: &SitemapPage) -> Vec<&str> {
        page.entries().iter().map(Entry::location).collect()
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_static_sources() {
        let tmp = TempDir::new().unwrap();
        let config = SitemapConfig::new("http://x", tmp.path());
        let mut registry = SitemapRegistry::new(Priority::DEFAULT);
        registry.register_static("/a", Priority::DEFAULT).unwrap();
        registry.register_static("/b", Priority::DEFAULT).unwrap();

        let files = generate(&registry, &config).unwrap();

        assert_eq!(files, ["sitemap_1.xml", "sitemapindex.xml"]);
        let page = read_page(tmp.path(), "sitemap_1.xml");
        assert_eq!(locations(&page), ["http://x/a", "http://x/b"]);
        assert!(
            page.entries()
                .iter()
                .all(|e| e.priority() == Some(Priority::DEFAULT))
        );
        assert_eq!(read_index(tmp.path()).locations(), ["http://x/sitemap_1.xml"]);
    }

    #[test]
    fn test_parameterized_source_in_enumeration_order() {
        let tmp = TempDir::new().unwrap();
        let config = SitemapConfig::new("http://x", tmp.path());
        let mut registry = SitemapRegistry::new(Priority::DEFAULT);
        registry
            .register_parameterized("/doc/{id}", ids(&["A", "B", "C"]))
            .unwrap();

        generate(&registry, &config).unwrap();

        let page = read_page(tmp.path(), "sitemap_1.xml");
        assert_eq!(
            locations(&page),
            ["http://x/doc/A", "http://x/doc/B", "http://x/doc/C"]
        );
    }

    #[test]
    fn test_static_sources_precede_parameterized() {
        let tmp = TempDir::new().unwrap();
        let config = SitemapConfig::new("http://x", tmp.path());
        let mut registry = SitemapRegistry::new(Priority::DEFAULT);
        registry
            .register_parameterized("/p/{id}", ids(&["1", "2"]))
            .unwrap();
        registry.register_static("/s1", Priority::DEFAULT).unwrap();
        registry
            .register_parameterized("/q/{id}", ids(&["3"]))
            .unwrap();
        registry.register_static("/s2", Priority::DEFAULT).unwrap();

        generate(&registry, &config).unwrap();

        let page = read_page(tmp.path(), "sitemap_1.xml");
        assert_eq!(
            locations(&page),
            [
                "http://x/s1",
                "http://x/s2",
                "http://x/p/1",
                "http://x/p/2",
                "http://x/q/3"
            ]
        );
    }

    #[test]
    fn test_no_sources_produce_empty_index() {
        let tmp = TempDir::new().unwrap();
        let config = SitemapConfig::new("http://x", tmp.path());
        let registry = SitemapRegistry::new(Priority::DEFAULT);

        let files = generate(&registry, &config).unwrap();

        assert_eq!(files, ["sitemapindex.xml"]);
        assert!(read_index(tmp.path()).locations().is_empty());
        assert_eq!(dir_names(tmp.path()), ["sitemapindex.xml"]);
    }

    #[test]
    fn test_pages_split_and_index_uses_server_path() {
        let tmp = TempDir::new().unwrap();
        let config = SitemapConfig::new("http://x", tmp.path())
            .with_server_path("/sitemaps/")
            .with_max_entries_per_page(2);
        let mut registry = SitemapRegistry::new(Priority::DEFAULT);
        registry
            .register_parameterized("/doc/{id}", ids(&["A", "B", "C", "D", "E"]))
            .unwrap();

        let files = generate(&registry, &config).unwrap();

        assert_eq!(
            files,
            [
                "sitemap_1.xml",
                "sitemap_2.xml",
                "sitemap_3.xml",
                "sitemapindex.xml"
            ]
        );
        assert_eq!(
            read_index(tmp.path()).locations(),
            [
                "http://x/sitemaps/sitemap_1.xml",
                "http://x/sitemaps/sitemap_2.xml",
                "http://x/sitemaps/sitemap_3.xml"
            ]
        );
        assert_eq!(locations(&read_page(tmp.path(), "sitemap_3.xml")), ["http://x/doc/E"]);
    }

    #[test]
    fn test_instance_metadata_is_copied() {
        let tmp = TempDir::new().unwrap();
        let config = SitemapConfig::new("http://x", tmp.path());
        let modified = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let priority = Priority::new(0.9).unwrap();
        let mut registry = SitemapRegistry::new(Priority::DEFAULT);
        registry
            .register_parameterized_with_priority("/doc/{id}", priority, move || {
                vec![Ok::<_, EnumerationError>(ResourceInstance::new([("id", "A")])
                    .with_last_modified(modified)
                    .with_change_frequency(ChangeFrequency::Weekly))]
            })
            .unwrap();

        generate(&registry, &config).unwrap();

        let page = read_page(tmp.path(), "sitemap_1.xml");
        assert_eq!(
            page.entries(),
            [Entry::new("http://x/doc/A")
                .with_priority(priority)
                .with_last_modified(modified)
                .with_change_frequency(ChangeFrequency::Weekly)]
        );
    }

    #[test]
    fn test_enumeration_error_aborts_and_keeps_previous_files() {
        let tmp = TempDir::new().unwrap();
        let config = SitemapConfig::new("http://x", tmp.path());
        let mut good = SitemapRegistry::new(Priority::DEFAULT);
        good.register_static("/a", Priority::DEFAULT).unwrap();
        generate(&good, &config).unwrap();
        let before = fs::read(tmp.path().join("sitemap_1.xml")).unwrap();

        let pulled = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&pulled);
        let mut failing = SitemapRegistry::new(Priority::DEFAULT);
        failing.register_static("/changed", Priority::DEFAULT).unwrap();
        failing
            .register_parameterized("/doc/{id}", move || {
                let counter = Arc::clone(&counter);
                (0..5).map(move |i| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if i == 1 {
                        Err(EnumerationError::new("database unavailable"))
                    } else {
                        Ok(ResourceInstance::new([("id", i.to_string())]))
                    }
                })
            })
            .unwrap();

        let err = generate(&failing, &config).unwrap_err();

        assert!(matches!(err, GenerationError::Enumeration { .. }), "{err:?}");
        assert_eq!(pulled.load(Ordering::SeqCst), 2);
        assert_eq!(fs::read(tmp.path().join("sitemap_1.xml")).unwrap(), before);
        assert_eq!(dir_names(tmp.path()), ["sitemap_1.xml", "sitemapindex.xml"]);
    }

    #[test]
    fn test_substitution_error_aborts() {
        let tmp = TempDir::new().unwrap();
        let config = SitemapConfig::new("http://x", tmp.path());
        let mut registry = SitemapRegistry::new(Priority::DEFAULT);
        registry
            .register_parameterized("/doc/{id:[0-9]+}", ids(&["1", "x"]))
            .unwrap();

        let err = generate(&registry, &config).unwrap_err();

        assert!(matches!(err, GenerationError::Substitution(_)), "{err:?}");
        assert!(dir_names(tmp.path()).is_empty());
    }

    #[test]
    fn test_consecutive_generations_reuse_file_names() {
        let tmp = TempDir::new().unwrap();
        let config = SitemapConfig::new("http://x", tmp.path()).with_max_entries_per_page(2);
        let mut registry = SitemapRegistry::new(Priority::DEFAULT);
        registry
            .register_parameterized("/doc/{id}", ids(&["A", "B", "C"]))
            .unwrap();

        let first = generate(&registry, &config).unwrap();
        let second = generate(&registry, &config).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            dir_names(tmp.path()),
            ["sitemap_1.xml", "sitemap_2.xml", "sitemapindex.xml"]
        );
    }

    #[test]
    fn test_stale_pages_are_pruned() {
        let tmp = TempDir::new().unwrap();
        let config = SitemapConfig::new("http://x", tmp.path()).with_max_entries_per_page(1);
        let mut large = SitemapRegistry::new(Priority::DEFAULT);
        large
            .register_parameterized("/doc/{id}", ids(&["A", "B", "C"]))
            .unwrap();
        let mut small = SitemapRegistry::new(Priority::DEFAULT);
        small.register_static("/only", Priority::DEFAULT).unwrap();
        fs::write(tmp.path().join("robots.txt"), "User-agent: *").unwrap();

        generate(&large, &config).unwrap();
        generate(&small, &config).unwrap();

        assert_eq!(
            dir_names(tmp.path()),
            ["robots.txt", "sitemap_1.xml", "sitemapindex.xml"]
        );
    }

    #[test]
    fn test_stale_pages_kept_without_pruning() {
        let tmp = TempDir::new().unwrap();
        let config = SitemapConfig::new("http://x", tmp.path())
            .with_max_entries_per_page(1)
            .with_prune_stale(false);
        let mut large = SitemapRegistry::new(Priority::DEFAULT);
        large
            .register_parameterized("/doc/{id}", ids(&["A", "B", "C"]))
            .unwrap();
        let mut small = SitemapRegistry::new(Priority::DEFAULT);
        small.register_static("/only", Priority::DEFAULT).unwrap();

        generate(&large, &config).unwrap();
        generate(&small, &config).unwrap();

        assert_eq!(
            dir_names(tmp.path()),
            [
                "sitemap_1.xml",
                "sitemap_2.xml",
                "sitemap_3.xml",
                "sitemapindex.xml"
            ]
        );
        assert_eq!(read_index(tmp.path()).locations().len(), 1);
    }

    #[test]
    fn test_leftover_staging_directory_is_removed() {
        let tmp = TempDir::new().unwrap();
        let leftover = tmp.path().join(".staging-crashed");
        fs::create_dir(&leftover).unwrap();
        fs::write(leftover.join("sitemap_1.xml"), "partial").unwrap();
        let config = SitemapConfig::new("http://x", tmp.path());
        let registry = SitemapRegistry::new(Priority::DEFAULT);

        generate(&registry, &config).unwrap();

        assert!(!leftover.exists());
    }

    #[test]
    fn test_rename_failure_after_first_page_is_commit_error() {
        let tmp = TempDir::new().unwrap();
        let config = SitemapConfig::new("http://x", tmp.path()).with_max_entries_per_page(1);
        let mut registry = SitemapRegistry::new(Priority::DEFAULT);
        registry
            .register_parameterized("/doc/{id}", ids(&["A", "B"]))
            .unwrap();
        fs::create_dir_all(tmp.path().join("sitemap_2.xml").join("blocker")).unwrap();

        let err = generate(&registry, &config).unwrap_err();

        assert!(matches!(err, GenerationError::Commit { .. }), "{err:?}");
        assert!(err.is_partial_commit());
        assert_eq!(locations(&read_page(tmp.path(), "sitemap_1.xml")), ["http://x/doc/A"]);
        assert_eq!(dir_names(tmp.path()), ["sitemap_1.xml", "sitemap_2.xml"]);
    }

    #[test]
    fn test_rename_failure_on_first_page_is_storage_error() {
        let tmp = TempDir::new().unwrap();
        let config = SitemapConfig::new("http://x", tmp.path());
        let mut registry = SitemapRegistry::new(Priority::DEFAULT);
        registry.register_static("/a", Priority::DEFAULT).unwrap();
        fs::create_dir_all(tmp.path().join("sitemap_1.xml").join("blocker")).unwrap();

        let err = generate(&registry, &config).unwrap_err();

        assert!(matches!(err, GenerationError::Storage { .. }), "{err:?}");
        assert!(!err.is_partial_commit());
        assert_eq!(dir_names(tmp.path()), ["sitemap_1.xml"]);
    }

    #[test]
    fn test_missing_cache_dir_is_storage_error() {
        let tmp = TempDir::new().unwrap();
        let config = SitemapConfig::new("http://x", tmp.path().join("missing"));
        let registry = SitemapRegistry::new(Priority::DEFAULT);

        let err = generate(&registry, &config).unwrap_err();

        assert!(matches!(err, GenerationError::Storage { .. }), "{err:?}");
    }
}
