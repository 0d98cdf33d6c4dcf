//! In-memory page cache in front of the table file.
//!
//! The pager is the sole owner of every cached page buffer. Callers borrow a
//! page for the duration of one call and never hold on to it, so a later
//! fetch can never observe a stale copy.
//!
//! # Invariants
//!
//! - `pages.len() == dirty.len()`
//! - `num_pages` is at least the file's page count and at least one past every
//!   page id that has been fetched or allocated
//! - A dirty flag is only ever set for a slot holding a cached page

use std::path::Path;

use crate::storage::file::{FileError, PageFile};
use crate::storage::page::{Page, PageId};

/// Caches pages lazily and writes modified ones back on flush.
#[derive(Debug)]
pub struct Pager {
    file: PageFile,
    /// Cached pages indexed by page id. Grows on demand.
    pages: Vec<Option<Page>>,
    /// Pages modified since they were loaded.
    dirty: Vec<bool>,
    /// Highest known page count (file pages plus pages allocated since open).
    num_pages: PageId,
}

impl Pager {
    /// Open the table file at `path` and start with an empty cache.
    pub fn open(path: &Path) -> Result<Self, FileError> {
        let file = PageFile::open(path)?;
        let num_pages = file.page_count();

        Ok(Self {
            file,
            pages: Vec::new(),
            dirty: Vec::new(),
            num_pages,
        })
    }

    /// Number of pages known to the pager, including ones not yet written.
    #[must_use]
    pub const fn num_pages(&self) -> PageId {
        self.num_pages
    }

    /// Number of pages currently held in the cache.
    #[must_use]
    pub fn cached_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.is_some()).count()
    }

    /// Number of cached pages waiting to be written.
    #[must_use]
    pub fn dirty_pages(&self) -> usize {
        self.dirty.iter().filter(|&&d| d).count()
    }

    /// Get a page for reading, loading it from the file on first access.
    pub fn fetch(&mut self, page_id: PageId) -> Result<&Page, FileError> {
        self.load(page_id).map(|page| &*page)
    }

    /// Get a page for writing. The page is marked dirty.
    pub fn fetch_mut(&mut self, page_id: PageId) -> Result<&mut Page, FileError> {
        self.load(page_id)?;
        self.mark_dirty(page_id);
        self.load(page_id)
    }

    /// Record that a cached page must be persisted on flush.
    ///
    /// Pages that are not cached are ignored; there is nothing to write.
    pub fn mark_dirty(&mut self, page_id: PageId) {
        let idx = page_id as usize;
        if matches!(self.pages.get(idx), Some(Some(_))) {
            self.dirty[idx] = true;
        }
    }

    /// Hand out a fresh, zeroed page id.
    ///
    /// Page ids are never reused: the new id is always the current page count.
    pub fn allocate(&mut self) -> Result<PageId, FileError> {
        let page_id = self.num_pages;
        if page_id == PageId::MAX {
            return Err(FileError::PageLimitReached);
        }

        let page = self.load(page_id)?;
        page.clear();
        self.mark_dirty(page_id);

        tracing::debug!("allocated page {page_id}");
        Ok(page_id)
    }

    /// Write every dirty page to the file, sync it, and empty the cache.
    ///
    /// Returns the number of pages written.
    pub fn flush_all(&mut self) -> Result<usize, FileError> {
        let mut written = 0;
        for (idx, slot) in self.pages.iter().enumerate() {
            if !self.dirty[idx] {
                continue;
            }
            if let Some(page) = slot {
                let page_id = PageId::try_from(idx).map_err(|_| FileError::PageLimitReached)?;
                self.file.write_page(page_id, page)?;
                written += 1;
            }
        }
        self.file.sync()?;

        self.pages.clear();
        self.dirty.clear();

        tracing::info!("flushed {written} pages ({} total)", self.num_pages);
        Ok(written)
    }

    /// Make sure `page_id` is cached and return it.
    fn load(&mut self, page_id: PageId) -> Result<&mut Page, FileError> {
        let next_count = page_id
            .checked_add(1)
            .ok_or(FileError::PageLimitReached)?;

        let idx = page_id as usize;
        if idx >= self.pages.len() {
            self.pages.resize_with(idx + 1, || None);
            self.dirty.resize(idx + 1, false);
        }

        let Self {
            file,
            pages,
            num_pages,
            ..
        } = self;

        let slot = &mut pages[idx];
        if slot.is_none() {
            let mut page = Page::new();
            file.read_page(page_id, &mut page)?;
            tracing::trace!("loaded page {page_id}");
            *slot = Some(page);
        }
        *num_pages = (*num_pages).max(next_count);

        Ok(slot.get_or_insert_with(Page::new))
    }
}
