use std::path::Path;

use log::{debug, trace, warn};

use super::disk::DbFile;
use super::error::{StorageError, StorageResult};
use super::{PAGE_SIZE, PageNum, TABLE_MAX_PAGES};

type PageBuf = Box<[u8; PAGE_SIZE]>;

/// Maps page numbers to in-memory page buffers backed by a single file.
///
/// Pages are loaded lazily on first access and stay resident until the pager
/// is closed. Callers mutate the returned buffers in place; every resident page
/// is written back on `close`.
pub struct Pager {
    /// Backing file (None once closed)
    file: Option<DbFile>,
    /// File length at open time
    file_length: u64,
    /// Number of pages touched so far (on disk or allocated in memory)
    num_pages: usize,
    /// Page arena, indexed by page number
    pages: Vec<Option<PageBuf>>,
    /// Maximum number of pages this pager may address
    max_pages: usize,
}

impl Pager {
    /// Open or create the database file at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        Self::with_max_pages(path, TABLE_MAX_PAGES)
    }

    /// Open or create the database file with a custom page limit
    pub fn with_max_pages<P: AsRef<Path>>(path: P, max_pages: usize) -> StorageResult<Self> {
        if max_pages == 0 || max_pages > TABLE_MAX_PAGES {
            return Err(StorageError::InvalidMaxPages(max_pages));
        }

        let file = DbFile::open(path)?;
        let file_length = file.len()?;

        if file_length % PAGE_SIZE as u64 != 0 {
            return Err(StorageError::CorruptFile { len: file_length });
        }

        let num_pages = (file_length / PAGE_SIZE as u64) as usize;
        if num_pages > max_pages {
            return Err(StorageError::PageOutOfBounds {
                page_num: num_pages - 1,
                max_pages,
            });
        }

        debug!(
            "opened {} ({} bytes, {} pages)",
            file.path().display(),
            file_length,
            num_pages
        );

        Ok(Self {
            file: Some(file),
            file_length,
            num_pages,
            pages: (0..max_pages).map(|_| None).collect(),
            max_pages,
        })
    }

    /// Number of pages touched so far
    pub fn num_pages(&self) -> usize {
        self.num_pages
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }

    /// File length observed when the pager was opened
    pub fn file_length(&self) -> u64 {
        self.file_length
    }

    /// Next never-before-allocated page number
    pub fn unused_page_num(&self) -> PageNum {
        self.num_pages
    }

    /// Whether `count` more pages can be allocated without exceeding the limit
    pub fn has_room_for(&self, count: usize) -> bool {
        self.num_pages + count <= self.max_pages
    }

    /// Check if a page is resident in memory
    pub fn is_page_loaded(&self, page_num: PageNum) -> bool {
        self.pages.get(page_num).is_some_and(|p| p.is_some())
    }

    /// Get a page, loading it from disk if necessary
    pub fn page(&mut self, page_num: PageNum) -> StorageResult<&[u8]> {
        self.load_page(page_num)?;
        self.resident(page_num).map(|p| &p[..])
    }

    /// Get a mutable page, loading it from disk if necessary
    pub fn page_mut(&mut self, page_num: PageNum) -> StorageResult<&mut [u8]> {
        self.load_page(page_num)?;
        self.resident_mut(page_num).map(|p| &mut p[..])
    }

    /// Borrow two distinct pages mutably at once, in the order requested
    pub fn page_pair_mut(
        &mut self,
        first: PageNum,
        second: PageNum,
    ) -> StorageResult<(&mut [u8], &mut [u8])> {
        if first == second {
            return Err(StorageError::AliasedPage(first));
        }

        self.load_page(first)?;
        self.load_page(second)?;

        let (low, high) = (first.min(second), first.max(second));
        let (head, tail) = self.pages.split_at_mut(high);
        let low_page = head[low]
            .as_deref_mut()
            .ok_or(StorageError::PageNotLoaded(low))?;
        let high_page = tail[0]
            .as_deref_mut()
            .ok_or(StorageError::PageNotLoaded(high))?;

        if first < second {
            Ok((&mut low_page[..], &mut high_page[..]))
        } else {
            Ok((&mut high_page[..], &mut low_page[..]))
        }
    }

    /// Write a resident page back to its offset in the file
    pub fn flush(&mut self, page_num: PageNum) -> StorageResult<()> {
        let page = self
            .pages
            .get(page_num)
            .and_then(|p| p.as_deref())
            .ok_or(StorageError::PageNotLoaded(page_num))?;
        let file = self.file.as_mut().ok_or(StorageError::FileClosed)?;

        trace!("flushing page {}", page_num);
        file.write_page(page_num, page)
    }

    /// Flush every resident page and sync the file
    pub fn flush_all(&mut self) -> StorageResult<()> {
        for page_num in 0..self.num_pages {
            if self.is_page_loaded(page_num) {
                self.flush(page_num)?;
            }
        }

        if let Some(file) = self.file.as_mut() {
            file.sync()?;
        }

        Ok(())
    }

    /// Flush all pages, release the page buffers and the file handle
    pub fn close(&mut self) -> StorageResult<()> {
        if self.file.is_none() {
            return Err(StorageError::FileClosed);
        }

        self.flush_all()?;
        self.pages.iter_mut().for_each(|p| *p = None);
        self.file = None;
        self.file_length = 0;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    fn load_page(&mut self, page_num: PageNum) -> StorageResult<()> {
        if page_num >= self.max_pages {
            return Err(StorageError::PageOutOfBounds {
                page_num,
                max_pages: self.max_pages,
            });
        }

        if self.pages[page_num].is_some() {
            return Ok(());
        }

        let file = self.file.as_mut().ok_or(StorageError::FileClosed)?;
        let mut page: PageBuf = Box::new([0u8; PAGE_SIZE]);

        let pages_on_disk = (self.file_length / PAGE_SIZE as u64) as usize;
        if page_num < pages_on_disk {
            trace!("loading page {} from disk", page_num);
            file.read_page(page_num, &mut page)?;
        }

        self.pages[page_num] = Some(page);
        if page_num >= self.num_pages {
            self.num_pages = page_num + 1;
        }

        Ok(())
    }

    fn resident(&self, page_num: PageNum) -> StorageResult<&PageBuf> {
        self.pages[page_num]
            .as_ref()
            .ok_or(StorageError::PageNotLoaded(page_num))
    }

    fn resident_mut(&mut self, page_num: PageNum) -> StorageResult<&mut PageBuf> {
        self.pages[page_num]
            .as_mut()
            .ok_or(StorageError::PageNotLoaded(page_num))
    }
}

impl Drop for Pager {
    fn drop(&mut self) {
        if self.file.is_some()
            && let Err(e) = self.flush_all()
        {
            warn!("failed to flush pages on drop: {}", e);
        }
    }
}
