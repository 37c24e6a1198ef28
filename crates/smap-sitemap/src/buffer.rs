//! Page buffer splitting entries into bounded sitemap files.

use std::fs;
use std::mem;
use std::path::PathBuf;

use crate::document::{SitemapPage, page_file_name};
use crate::entry::Entry;
use crate::error::GenerationError;

/// Maximum number of `<url>` entries the sitemap protocol allows per file.
pub const MAX_ENTRIES_PER_PAGE: usize = 50_000;

/// Accumulates entries and offloads full pages to disk.
///
/// Pages are written as `sitemap_<N>.xml` into the buffer's directory and
/// numbered from 1 in flush order. The file names of written pages are
/// available through [`PageBuffer::locations`].
#[derive(Debug)]
pub struct PageBuffer {
    dir: PathBuf,
    capacity: usize,
    current: SitemapPage,
    locations: Vec<String>,
}

impl PageBuffer {
    /// Create a buffer with the protocol's page capacity.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_capacity(dir, MAX_ENTRIES_PER_PAGE)
    }

    /// Create a buffer holding at most `capacity` entries per page.
    ///
    /// The capacity is clamped to `1..=MAX_ENTRIES_PER_PAGE`.
    pub fn with_capacity(dir: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            dir: dir.into(),
            capacity: capacity.clamp(1, MAX_ENTRIES_PER_PAGE),
            current: SitemapPage::default(),
            locations: Vec::new(),
        }
    }

    /// Append an entry, flushing the current page first if it is full.
    pub fn add_entry(&mut self, entry: Entry) -> Result<(), GenerationError> {
        if self.current.len() >= self.capacity {
            self.flush()?;
        }
        self.current.push(entry);
        Ok(())
    }

    /// Write the current page to disk and start a new one.
    ///
    /// No-op when the current page is empty: no file is written and the page
    /// counter does not advance.
    pub fn flush(&mut self) -> Result<(), GenerationError> {
        if self.current.is_empty() {
            return Ok(());
        }

        let page = mem::take(&mut self.current);
        let name = page_file_name(self.locations.len() + 1);
        let path = self.dir.join(&name);
        let xml = page.to_xml()?;
        fs::write(&path, xml).map_err(|e| GenerationError::storage(&path, e))?;

        tracing::debug!(page = %name, entries = page.len(), "Flushed sitemap page");
        self.locations.push(name);
        Ok(())
    }

    /// File names of the pages flushed so far, in page order.
    #[must_use]
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    #[must_use]
    pub fn into_locations(self) -> Vec<String> {
        self.locations
    }

    /// Number of pages flushed so far.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.locations.len()
    }

    /// Number of entries in the current, not yet flushed page.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.current.len()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tempfile::TempDir;

    use super::*;

    fn entry(n: usize) -> Entry {
        Entry::new(format!("http://x/{n}"))
    }

    fn read_page(dir: &Path, name: &str) -> SitemapPage {
        SitemapPage::parse(&fs::read_to_string(dir.join(name)).unwrap()).unwrap()
    }

    #[test]
    fn test_no_entries_produce_no_pages() {
        let tmp = TempDir::new().unwrap();
        let mut buffer = PageBuffer::new(tmp.path());

        buffer.flush().unwrap();

        assert_eq!(buffer.page_count(), 0);
        assert!(buffer.locations().is_empty());
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_flush_on_empty_buffer_does_not_advance_counter() {
        let tmp = TempDir::new().unwrap();
        let mut buffer = PageBuffer::with_capacity(tmp.path(), 2);

        buffer.add_entry(entry(1)).unwrap();
        buffer.flush().unwrap();
        buffer.flush().unwrap();
        buffer.flush().unwrap();
        buffer.add_entry(entry(2)).unwrap();
        buffer.flush().unwrap();

        assert_eq!(buffer.locations(), ["sitemap_1.xml", "sitemap_2.xml"]);
        assert!(!tmp.path().join("sitemap_3.xml").exists());
    }

    #[test]
    fn test_entry_at_capacity_stays_in_flushed_page() {
        let tmp = TempDir::new().unwrap();
        let mut buffer = PageBuffer::with_capacity(tmp.path(), 3);

        for n in 1..=3 {
            buffer.add_entry(entry(n)).unwrap();
        }
        // Full but not yet flushed
        assert_eq!(buffer.page_count(), 0);
        assert_eq!(buffer.pending(), 3);

        buffer.add_entry(entry(4)).unwrap();
        assert_eq!(buffer.page_count(), 1);
        assert_eq!(buffer.pending(), 1);

        let first = read_page(tmp.path(), "sitemap_1.xml");
        let locations: Vec<&str> = first.entries().iter().map(Entry::location).collect();
        assert_eq!(locations, ["http://x/1", "http://x/2", "http://x/3"]);
    }

    #[test]
    fn test_page_count_is_ceiling_of_entries_over_capacity() {
        for (entries, expected_pages) in [(0, 0), (1, 1), (4, 1), (5, 2), (8, 2), (9, 3)] {
            let tmp = TempDir::new().unwrap();
            let mut buffer = PageBuffer::with_capacity(tmp.path(), 4);
            for n in 0..entries {
                buffer.add_entry(entry(n)).unwrap();
            }
            buffer.flush().unwrap();

            assert_eq!(buffer.page_count(), expected_pages, "{entries} entries");
        }
    }

    #[test]
    fn test_protocol_capacity_boundary() {
        let tmp = TempDir::new().unwrap();
        let mut buffer = PageBuffer::new(tmp.path());

        for n in 1..=MAX_ENTRIES_PER_PAGE {
            buffer.add_entry(entry(n)).unwrap();
        }
        assert_eq!(buffer.page_count(), 0);

        buffer.add_entry(entry(MAX_ENTRIES_PER_PAGE + 1)).unwrap();
        buffer.flush().unwrap();

        assert_eq!(buffer.page_count(), 2);
        assert_eq!(read_page(tmp.path(), "sitemap_1.xml").len(), MAX_ENTRIES_PER_PAGE);
        let second = read_page(tmp.path(), "sitemap_2.xml");
        assert_eq!(second.entries()[0].location(), "http://x/50001");
    }

    #[test]
    fn test_capacity_is_clamped() {
        let tmp = TempDir::new().unwrap();
        let mut buffer = PageBuffer::with_capacity(tmp.path(), 0);

        buffer.add_entry(entry(1)).unwrap();
        buffer.add_entry(entry(2)).unwrap();

        assert_eq!(buffer.page_count(), 1);
    }

    #[test]
    fn test_storage_failure_is_propagated() {
        let tmp = TempDir::new().unwrap();
        let mut buffer = PageBuffer::new(tmp.path().join("missing"));

        buffer.add_entry(entry(1)).unwrap();
        let err = buffer.flush().unwrap_err();

        assert!(matches!(err, GenerationError::Storage { .. }), "{err:?}");
        assert!(buffer.locations().is_empty());
    }
}
