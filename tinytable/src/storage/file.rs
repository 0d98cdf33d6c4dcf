//! Table file I/O operations.
//!
//! This module is the page store: it reads and writes whole pages at
//! `page_id * PAGE_SIZE` in a single flat file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::storage::page::{PAGE_SIZE_U64, Page, PageId};

/// A table file handle with low-level page I/O operations.
#[derive(Debug)]
pub struct PageFile {
    file: File,
    /// Current length of the file in bytes. Always a multiple of the page size.
    file_length: u64,
}

impl PageFile {
    /// Open the table file at `path`, creating an empty one if it does not exist.
    ///
    /// Returns an error if the file length is not a whole number of pages.
    pub fn open(path: &Path) -> Result<Self, FileError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(FileError::Io)?;

        let file_length = file.seek(SeekFrom::End(0)).map_err(FileError::Io)?;
        if file_length % PAGE_SIZE_U64 != 0 {
            return Err(FileError::CorruptLength { file_length });
        }
        if file_length / PAGE_SIZE_U64 > u64::from(PageId::MAX) {
            return Err(FileError::TooManyPages { file_length });
        }

        tracing::debug!(
            "opened {} ({} pages)",
            path.display(),
            file_length / PAGE_SIZE_U64
        );

        Ok(Self { file, file_length })
    }

    /// Number of whole pages currently stored in the file.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // bounded by the check in `open`
    pub const fn page_count(&self) -> PageId {
        (self.file_length / PAGE_SIZE_U64) as PageId
    }

    /// Read a page from the file into `page`.
    ///
    /// A page at or beyond the end of the file is zero-initialized instead of read.
    pub fn read_page(&mut self, page_id: PageId, page: &mut Page) -> Result<(), FileError> {
        if page_id >= self.page_count() {
            page.clear();
            return Ok(());
        }

        let offset = u64::from(page_id) * PAGE_SIZE_U64;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(FileError::Io)?;

        self.file
            .read_exact(page.as_bytes_mut())
            .map_err(FileError::Io)?;

        Ok(())
    }

    /// Write a page to the file, extending it if needed.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<(), FileError> {
        let offset = u64::from(page_id) * PAGE_SIZE_U64;
        self.file
            .seek(SeekFrom::Start(offset))
            .map_err(FileError::Io)?;

        self.file
            .write_all(page.as_bytes())
            .map_err(FileError::Io)?;

        self.file_length = self.file_length.max(offset + PAGE_SIZE_U64);
        Ok(())
    }

    /// Sync all pending writes to disk.
    pub fn sync(&self) -> Result<(), FileError> {
        self.file.sync_all().map_err(FileError::Io)
    }
}

/// Errors that can occur during file operations.
#[derive(Debug)]
pub enum FileError {
    /// I/O error.
    Io(std::io::Error),
    /// File length is not a multiple of the page size.
    CorruptLength { file_length: u64 },
    /// File holds more pages than a page id can address.
    TooManyPages { file_length: u64 },
    /// Every page id is already in use.
    PageLimitReached,
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::CorruptLength { file_length } => write!(
                f,
                "corrupt file: length {file_length} is not a whole number of pages"
            ),
            Self::TooManyPages { file_length } => {
                write!(f, "file too large: {file_length} bytes")
            }
            Self::PageLimitReached => write!(f, "no page ids left to allocate"),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::CorruptLength { .. } | Self::TooManyPages { .. } | Self::PageLimitReached => {
                None
            }
        }
    }
}

impl From<std::io::Error> for FileError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::page::PAGE_SIZE;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_empty_file() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");

        let file = PageFile::open(&path).expect("open");
        assert_eq!(file.page_count(), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_corrupt_length_rejected() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");
        fs::write(&path, vec![0u8; PAGE_SIZE + 7]).expect("write file");

        let result = PageFile::open(&path);
        assert!(matches!(
            result,
            Err(FileError::CorruptLength { file_length }) if file_length == PAGE_SIZE_U64 + 7
        ));
    }

    #[test]
    fn test_read_past_end_is_zeroed() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");
        let mut file = PageFile::open(&path).expect("open");

        let mut page = Page::new();
        page.write_u32(0, 0xDEAD_BEEF);
        file.read_page(3, &mut page).expect("read");
        assert!(page.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_extends_and_persists() {
        let dir = tempdir().expect("create temp dir");
        let path = dir.path().join("test.db");

        {
            let mut file = PageFile::open(&path).expect("open");
            let mut page = Page::new();
            page.write_bytes(0, b"hello world");
            file.write_page(2, &page).expect("write");
            file.sync().expect("sync");
            assert_eq!(file.page_count(), 3);
            assert_eq!(file.file_length, 3 * PAGE_SIZE_U64);
        }

        let mut file = PageFile::open(&path).expect("reopen");
        assert_eq!(file.page_count(), 3);

        let mut page = Page::new();
        file.read_page(2, &mut page).expect("read");
        assert_eq!(page.read_bytes(0, 11), b"hello world");

        // The gap before page 2 reads back as zeros
        file.read_page(1, &mut page).expect("read gap");
        assert!(page.as_bytes().iter().all(|&b| b == 0));
    }
}
