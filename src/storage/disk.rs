use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::error::StorageResult;
use super::{PAGE_SIZE, PageNum};

/// The single backing file of a table, addressed in whole pages
#[derive(Debug)]
pub struct DbFile {
    file: File,
    path: PathBuf,
}

impl DbFile {
    /// Open the file at `path`, creating it (and missing parent directories) if needed
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current file length in bytes
    pub fn len(&self) -> StorageResult<u64> {
        Ok(self.file.metadata()?.len())
    }

    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Read a page into `buffer`. Bytes past end-of-file read as zero.
    pub fn read_page(&mut self, page_num: PageNum, buffer: &mut [u8; PAGE_SIZE]) -> StorageResult<()> {
        let offset = (page_num * PAGE_SIZE) as u64;
        self.file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < PAGE_SIZE {
            let n = self.file.read(&mut buffer[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled < PAGE_SIZE {
            buffer[filled..].fill(0);
        }

        Ok(())
    }

    /// Write a full page at `page_num * PAGE_SIZE`, extending the file if necessary
    pub fn write_page(&mut self, page_num: PageNum, buffer: &[u8; PAGE_SIZE]) -> StorageResult<()> {
        let offset = (page_num * PAGE_SIZE) as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buffer)?;
        Ok(())
    }

    /// Flush OS buffers for this file to disk
    pub fn sync(&mut self) -> StorageResult<()> {
        self.file.sync_data()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    #[test]
    fn test_open_creates_file() {
        let temp_dir = setup_test_dir();
        let test_file = temp_dir.path().join("test.db");

        let file = DbFile::open(&test_file).unwrap();
        assert!(test_file.exists());
        assert!(file.is_empty().unwrap());
        assert_eq!(file.path(), test_file.as_path());
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let temp_dir = setup_test_dir();
        let test_file = temp_dir.path().join("nested").join("dir").join("test.db");

        DbFile::open(&test_file).unwrap();
        assert!(test_file.exists());
    }

    #[test]
    fn test_read_write_page() {
        let temp_dir = setup_test_dir();
        let mut file = DbFile::open(temp_dir.path().join("test.db")).unwrap();

        let mut write_buffer = [0u8; PAGE_SIZE];
        write_buffer[0] = 42;
        write_buffer[100] = 99;
        write_buffer[PAGE_SIZE - 1] = 255;
        file.write_page(0, &write_buffer).unwrap();

        let mut read_buffer = [0u8; PAGE_SIZE];
        file.read_page(0, &mut read_buffer).unwrap();
        assert_eq!(read_buffer, write_buffer);
        assert_eq!(file.len().unwrap(), PAGE_SIZE as u64);
    }

    #[test]
    fn test_write_extends_file() {
        let temp_dir = setup_test_dir();
        let mut file = DbFile::open(temp_dir.path().join("test.db")).unwrap();

        let buffer = [7u8; PAGE_SIZE];
        file.write_page(3, &buffer).unwrap();
        assert_eq!(file.len().unwrap(), 4 * PAGE_SIZE as u64);

        // The gap before page 3 reads back as zeros
        let mut read_buffer = [1u8; PAGE_SIZE];
        file.read_page(1, &mut read_buffer).unwrap();
        assert!(read_buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_read_past_end_is_zeroed() {
        let temp_dir = setup_test_dir();
        let mut file = DbFile::open(temp_dir.path().join("test.db")).unwrap();

        let mut buffer = [0xAAu8; PAGE_SIZE];
        file.read_page(10, &mut buffer).unwrap();
        assert!(buffer.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_reopen_keeps_contents() {
        let temp_dir = setup_test_dir();
        let test_file = temp_dir.path().join("test.db");

        {
            let mut file = DbFile::open(&test_file).unwrap();
            let mut buffer = [0u8; PAGE_SIZE];
            buffer[5] = 5;
            file.write_page(0, &buffer).unwrap();
            file.sync().unwrap();
        }

        let mut file = DbFile::open(&test_file).unwrap();
        let mut buffer = [0u8; PAGE_SIZE];
        file.read_page(0, &mut buffer).unwrap();
        assert_eq!(buffer[5], 5);
    }
}
