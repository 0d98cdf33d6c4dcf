//! Single-file table storage engine.
//!
//! # File Format
//!
//! The table is stored in one file of 4KB pages, page `P` at byte offset
//! `P * 4096`. Every page holds one B+tree node and page 0 is always the root.
//! There is no metadata page and no free list: page ids grow monotonically and
//! are never reused.
//!
//! # Usage
//!
//! ```no_run
//! use tinytable::storage::Table;
//! use tinytable::types::Row;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut table = Table::open(std::path::Path::new("my.db"))?;
//! table.insert(&Row::new(1, "hello")?)?;
//! for row in table.select(None)? {
//!     println!("{row}");
//! }
//! table.close()?;
//! # Ok(())
//! # }
//! ```

pub mod btree;
mod file;
mod page;
mod pager;
mod table;

pub use file::{FileError, PageFile};
pub use page::{PAGE_SIZE, Page, PageId};
pub use pager::Pager;
pub use table::{Table, TableError};
