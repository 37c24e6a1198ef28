//! Lazily generated, lock-protected sitemap cache.
//!
//! The cache is `Uninitialized` until the first read. That read generates the
//! sitemap under the exclusive lock; concurrent first readers wait for it and
//! reuse its result through a second state check (double-checked locking).
//! Every read after that takes the shared lock only.
//!
//! A failed generation moves an uninitialized cache to `Failed` and is retried
//! on the next read. A failed [`SitemapCache::regenerate`] keeps serving the
//! previous file set, unless the failure hit after some files of the previous
//! set were replaced. The cache then drops the set and becomes `Failed`.

use std::fs;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use crate::config::SitemapConfig;
use crate::document::{INDEX_FILE_NAME, page_file_name, parse_page_number};
use crate::error::{CacheError, GenerationError};
use crate::generator::generate;
use crate::route::{PatternRouter, Router};
use crate::source::SitemapRegistry;

/// Lifecycle state of a [`SitemapCache`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheStatus {
    /// No generation has run yet.
    Uninitialized,
    /// The last successful generation is being served.
    Ready,
    /// No generation has succeeded and the last attempt failed.
    Failed,
}

/// A file served by the cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SitemapFile {
    /// `sitemapindex.xml`
    Index,
    /// `sitemap_<N>.xml`, numbered from 1.
    Page(usize),
}

impl SitemapFile {
    /// Parse a file name such as `sitemap_3.xml`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        if name == INDEX_FILE_NAME {
            Some(Self::Index)
        } else {
            parse_page_number(name).map(Self::Page)
        }
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        match self {
            Self::Index => INDEX_FILE_NAME.to_owned(),
            Self::Page(number) => page_file_name(*number),
        }
    }
}

struct CacheState {
    status: CacheStatus,
    files: Vec<String>,
}

/// Sitemap cache shared between request handlers.
///
/// Owns the registry and configuration. Share it with `Arc<SitemapCache>`.
pub struct SitemapCache<R = PatternRouter> {
    registry: SitemapRegistry<R>,
    config: SitemapConfig,
    state: RwLock<CacheState>,
}

impl<R: Router> SitemapCache<R> {
    pub fn new(registry: SitemapRegistry<R>, config: SitemapConfig) -> Self {
        Self {
            registry,
            config,
            state: RwLock::new(CacheState {
                status: CacheStatus::Uninitialized,
                files: Vec::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &SitemapConfig {
        &self.config
    }

    #[must_use]
    pub fn status(&self) -> CacheStatus {
        self.read_state().status
    }

    /// File names of the set currently served, index last.
    #[must_use]
    pub fn files(&self) -> Vec<String> {
        self.read_state().files.clone()
    }

    /// Generate the sitemap unless it is already `Ready`.
    ///
    /// Returns the file set being served.
    pub fn ensure_ready(&self) -> Result<Vec<String>, CacheError> {
        {
            let state = self.read_state();
            if state.status == CacheStatus::Ready {
                return Ok(state.files.clone());
            }
        }

        let mut state = self.write_state();
        // Another waiter may have finished generation
        if state.status != CacheStatus::Ready {
            self.run_generation(&mut state)?;
        }
        Ok(state.files.clone())
    }

    /// Read a sitemap file, generating the sitemap first if needed.
    pub fn read(&self, file: &SitemapFile) -> Result<Vec<u8>, CacheError> {
        {
            let state = self.read_state();
            if state.status == CacheStatus::Ready {
                return self.read_file(&state, file);
            }
        }

        self.ensure_ready()?;
        let state = self.read_state();
        self.read_file(&state, file)
    }

    /// Re-run generation regardless of the current state.
    ///
    /// Readers are blocked for the duration. On failure the previous set, if
    /// any, stays in place unless the commit was interrupted.
    pub fn regenerate(&self) -> Result<Vec<String>, CacheError> {
        let mut state = self.write_state();
        self.run_generation(&mut state)?;
        Ok(state.files.clone())
    }

    fn run_generation(&self, state: &mut CacheState) -> Result<(), CacheError> {
        tracing::debug!(previous = ?state.status, "Generating sitemap");
        let started = Instant::now();

        match self.prepare_and_generate() {
            Ok(files) => {
                tracing::info!(
                    files = files.len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Sitemap cache ready"
                );
                state.files = files;
                state.status = CacheStatus::Ready;
                Ok(())
            }
            Err(e) => {
                if e.is_partial_commit() {
                    tracing::error!("Sitemap commit interrupted, dropping served set: {e}");
                    state.files.clear();
                    state.status = CacheStatus::Failed;
                } else if state.status == CacheStatus::Ready {
                    tracing::warn!("Sitemap regeneration failed, serving previous set: {e}");
                } else {
                    tracing::error!("Sitemap generation failed: {e}");
                    state.status = CacheStatus::Failed;
                }
                Err(e.into())
            }
        }
    }

    fn prepare_and_generate(&self) -> Result<Vec<String>, GenerationError> {
        let cache_dir = self.config.cache_dir();
        fs::create_dir_all(cache_dir).map_err(|e| GenerationError::storage(cache_dir, e))?;
        generate(&self.registry, &self.config)
    }

    fn read_file(&self, state: &CacheState, file: &SitemapFile) -> Result<Vec<u8>, CacheError> {
        let name = file.file_name();
        if !state.files.contains(&name) {
            return Err(CacheError::NotFound(name));
        }
        let path = self.config.cache_dir().join(&name);
        fs::read(&path).map_err(|source| CacheError::Io { path, source })
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
