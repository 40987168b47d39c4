mod disk;
mod error;
mod pager;

pub use disk::DbFile;
pub use error::{StorageError, StorageResult};
pub use pager::Pager;

/// Page size in bytes (4KB)
pub const PAGE_SIZE: usize = 4096;

/// Upper bound on the number of pages a single table file may hold
pub const TABLE_MAX_PAGES: usize = 100;

/// Page number type (index of a page within the database file)
pub type PageNum = usize;
