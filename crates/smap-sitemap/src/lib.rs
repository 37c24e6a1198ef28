//! Paginated sitemap generation with a lazily initialized on-disk cache.
//!
//! This crate turns a registry of resource sources into sitemap files and
//! serves them from disk. The main pieces are:
//!
//! - [`SitemapRegistry`]: static and parameterized sources, registered
//!   against a [`Router`] capability
//! - [`PageBuffer`]: splits entries into pages of at most
//!   [`MAX_ENTRIES_PER_PAGE`] entries and writes each page to disk
//! - [`generate`]: walks the registry and writes pages plus the index
//! - [`SitemapCache`]: reader/writer gate that generates on first access and
//!   serves the materialized files afterwards
//!
//! # Storage Layout
//!
//! ```text
//! {cache_dir}/
//! +-- sitemapindex.xml   # references every page of the last generation
//! +-- sitemap_1.xml
//! +-- sitemap_2.xml
//! +-- .staging-XXXXXX/   # exists only while a generation runs
//! ```
//!
//! # Example
//!
//! ```no_run
//! use smap_sitemap::{
//!     EnumerationError, Priority, ResourceInstance, SitemapCache, SitemapConfig, SitemapFile,
//!     SitemapRegistry,
//! };
//!
//! let config = SitemapConfig::new("http://example.com", ".smap/cache");
//! let mut registry = SitemapRegistry::new(config.default_priority());
//! registry.register_static("/about", Priority::DEFAULT)?;
//! registry.register_parameterized("/doc/{id}", || {
//!     ["A", "B", "C"].map(|id| Ok::<_, EnumerationError>(ResourceInstance::new([("id", id)])))
//! })?;
//!
//! let cache = SitemapCache::new(registry, config);
//! let index = cache.read(&SitemapFile::Index)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod buffer;
mod cache;
mod config;
mod document;
mod entry;
mod error;
mod generator;
mod route;
mod source;

pub use buffer::{MAX_ENTRIES_PER_PAGE, PageBuffer};
pub use cache::{CacheStatus, SitemapCache, SitemapFile};
pub use config::SitemapConfig;
pub use document::{INDEX_FILE_NAME, SitemapIndex, SitemapPage, page_file_name};
pub use entry::{ChangeFrequency, Entry, InvalidPriority, Priority, UnknownChangeFrequency};
pub use error::{
    CacheError, DocumentError, EnumerationError, GenerationError, PatternError, SubstitutionError,
};
pub use generator::generate;
pub use route::{PatternRouter, RouteHandle, RoutePattern, Router};
pub use source::{BindingEnumerator, Instances, ResourceInstance, SitemapRegistry};
