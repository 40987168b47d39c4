use std::io;
use thiserror::Error;

use super::PageNum;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Db file is not a whole number of pages. Corrupt file ({len} bytes)")]
    CorruptFile { len: u64 },

    #[error("Tried to fetch page number out of bounds: {page_num} >= {max_pages}")]
    PageOutOfBounds { page_num: PageNum, max_pages: usize },

    #[error("Tried to flush page {0}, which is not loaded")]
    PageNotLoaded(PageNum),

    #[error("Page {0} requested twice for mutation")]
    AliasedPage(PageNum),

    #[error("Invalid page limit: {0} (must be between 1 and TABLE_MAX_PAGES)")]
    InvalidMaxPages(usize),

    #[error("Pager file is already closed")]
    FileClosed,
}

pub type StorageResult<T> = Result<T, StorageError>;
