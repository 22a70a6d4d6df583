//! Page-level disk access: read one page, decrypt it, verify it.
//!
//! The store has no cache; [`crate::core::stream::PagedStream`] decides
//! what to keep around. Checksum failures are never retried, since
//! re-reading the same bytes cannot change the outcome and a mismatch may
//! equally mean the wrong key was selected.

use crate::core::cipher;
use crate::core::error::{Result, SaiError};
use crate::core::keys::Key;
use crate::core::page::{self, Page, PAGE_SIZE, TABLE_SPAN};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Decrypting page reader over the backing file.
#[derive(Debug)]
pub struct PageStore {
    file: File,
    page_count: u32,
    key: &'static Key,
}

impl PageStore {
    /// Open the backing file read-only. No page is read yet.
    pub fn open<P: AsRef<Path>>(path: P, key: &'static Key) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let page_count = (len / PAGE_SIZE as u64) as u32;
        Ok(PageStore {
            file,
            page_count,
            key,
        })
    }

    /// Total number of pages, table pages included.
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Number of data pages, i.e. the logical stream length in pages.
    pub fn data_page_count(&self) -> u32 {
        let tables = self.page_count.div_ceil(TABLE_SPAN);
        self.page_count - tables
    }

    /// Read and decrypt the page at `index`, fetching the owning table page
    /// first when `index` is a data page.
    pub fn read_page(&mut self, index: u32) -> Result<Page> {
        if page::is_table_index(index) {
            self.load_table(index)
        } else {
            let table = self.load_table(page::owning_table(index))?;
            let expected = table.table_entry((index % TABLE_SPAN) as usize).checksum;
            self.load_data(index, expected)
        }
    }

    /// Read, decrypt, and self-verify the table page at `index`.
    pub fn load_table(&mut self, index: u32) -> Result<Page> {
        debug_assert!(page::is_table_index(index));
        let mut page = self.read_raw(index)?;
        cipher::decrypt_table(page.as_bytes_mut(), self.key, index);
        let recorded = page.table_entry(0).checksum;
        if cipher::table_checksum(page.as_bytes()) != recorded {
            return Err(SaiError::CorruptTable { index });
        }
        Ok(page)
    }

    /// Read and decrypt the data page at `index`, verifying it against the
    /// checksum its owning table page recorded for it.
    pub fn load_data(&mut self, index: u32, expected: u32) -> Result<Page> {
        debug_assert!(!page::is_table_index(index));
        let mut page = self.read_raw(index)?;
        cipher::decrypt_data(page.as_bytes_mut(), self.key, expected);
        if cipher::checksum(page.as_bytes()) != expected {
            return Err(SaiError::CorruptPage { index });
        }
        Ok(page)
    }

    fn read_raw(&mut self, index: u32) -> Result<Page> {
        if index >= self.page_count {
            return Err(SaiError::Truncated { page: index });
        }
        self.file
            .seek(SeekFrom::Start(index as u64 * PAGE_SIZE as u64))?;
        let mut bytes = [0u8; PAGE_SIZE];
        self.file.read_exact(&mut bytes).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                SaiError::Truncated { page: index }
            } else {
                SaiError::Io(e)
            }
        })?;
        Ok(Page::from_bytes(bytes))
    }
}
