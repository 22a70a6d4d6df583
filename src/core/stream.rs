//! Seekable byte view over the logical stream of decrypted data pages.
//!
//! Logical offsets count data pages only; the table pages that punctuate
//! every 511 data pages are skipped by the physical mapping. The stream
//! keeps two single-slot caches, one for the most recently used table page
//! and one for the most recently used data page. Sequential reads within a
//! file therefore decrypt each page once and touch its table page only
//! when crossing into the next table's coverage.

use crate::core::error::{Result, SaiError};
use crate::core::io::PageStore;
use crate::core::keys::Key;
use crate::core::page::{self, Page, PAGE_SIZE, TABLE_SPAN};
use std::io::SeekFrom;
use std::path::Path;

/// Physical page index of logical data page `data_index`.
///
/// Every run of 511 data pages is preceded by one table page, so the
/// physical index advances one extra step per completed run.
pub fn phys_index(data_index: u32) -> u32 {
    1 + data_index + data_index / (TABLE_SPAN - 1)
}

/// Cache and verification counters, observable for cache-behavior checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Reads satisfied by the data-page cache slot.
    pub data_hits: u64,
    /// Reads that had to go to disk for a data page.
    pub data_misses: u64,
    /// Data pages fetched, decrypted, and verified.
    pub data_loads: u64,
    /// Table pages fetched, decrypted, and verified.
    pub table_loads: u64,
}

/// Seekable, verified byte source over a container's logical stream.
#[derive(Debug)]
pub struct PagedStream {
    store: PageStore,
    len: u64,
    pos: u64,
    table_cache: Option<(u32, Page)>,
    data_cache: Option<(u32, Page)>,
    stats: StreamStats,
}

impl PagedStream {
    /// Open a container and verify its root table page.
    ///
    /// The root table is loaded eagerly: a wrong key or a corrupt file
    /// fails here with `CorruptTable { index: 0 }` rather than on the
    /// first read.
    pub fn open<P: AsRef<Path>>(path: P, key: &'static Key) -> Result<Self> {
        let mut store = PageStore::open(path, key)?;
        let root = store.load_table(0)?;
        let len = store.data_page_count() as u64 * PAGE_SIZE as u64;
        Ok(PagedStream {
            store,
            len,
            pos: 0,
            table_cache: Some((0, root)),
            data_cache: None,
            stats: StreamStats {
                table_loads: 1,
                ..StreamStats::default()
            },
        })
    }

    /// Length of the logical stream in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current stream position.
    pub fn tell(&self) -> u64 {
        self.pos
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    /// Read at the current position, advancing it by the bytes copied.
    ///
    /// The position is unchanged when the read fails.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let copied = self.read_at(self.pos, buf)?;
        self.pos += copied as u64;
        Ok(copied)
    }

    /// Read up to `buf.len()` bytes starting at logical offset `offset`,
    /// without touching the stream position.
    ///
    /// Returns the number of bytes copied; short only at end-of-stream.
    pub fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut offset = offset;
        let mut copied = 0;
        while copied < buf.len() && offset < self.len {
            let data_index = (offset / PAGE_SIZE as u64) as u32;
            let within = (offset % PAGE_SIZE as u64) as usize;
            let take = (buf.len() - copied)
                .min(PAGE_SIZE - within)
                .min((self.len - offset) as usize);
            let page = self.data_page(data_index)?;
            buf[copied..copied + take].copy_from_slice(&page.as_bytes()[within..within + take]);
            copied += take;
            offset += take as u64;
        }
        Ok(copied)
    }

    /// Reposition the stream. Seeking past the end is permitted; reads
    /// there return 0 until the position moves back in range.
    pub fn seek(&mut self, from: SeekFrom) -> Result<u64> {
        let target = match from {
            SeekFrom::Start(n) => Some(n),
            SeekFrom::Current(d) => self.pos.checked_add_signed(d),
            SeekFrom::End(d) => self.len.checked_add_signed(d),
        };
        match target {
            Some(n) => {
                self.pos = n;
                Ok(n)
            }
            None => Err(SaiError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "seek before start of stream",
            ))),
        }
    }

    /// The decrypted data page for logical page `data_index`, from cache
    /// or disk. Pages are verified once, when loaded into the cache slot.
    fn data_page(&mut self, data_index: u32) -> Result<&Page> {
        let phys = phys_index(data_index);
        if matches!(self.data_cache, Some((cached, _)) if cached == phys) {
            self.stats.data_hits += 1;
        } else {
            self.stats.data_misses += 1;
            let expected = self.table_entry_checksum(phys)?;
            let data = self.store.load_data(phys, expected)?;
            self.stats.data_loads += 1;
            self.data_cache = Some((phys, data));
        }
        match &self.data_cache {
            Some((_, page)) => Ok(page),
            None => unreachable!("data cache filled above"),
        }
    }

    /// Checksum recorded for physical page `phys` in its owning table
    /// page, loading that table page into the table cache if needed.
    fn table_entry_checksum(&mut self, phys: u32) -> Result<u32> {
        let table_index = page::owning_table(phys);
        if !matches!(self.table_cache, Some((cached, _)) if cached == table_index) {
            let table = self.store.load_table(table_index)?;
            self.stats.table_loads += 1;
            self.table_cache = Some((table_index, table));
        }
        let slot = (phys - table_index) as usize;
        match &self.table_cache {
            Some((_, table)) => Ok(table.table_entry(slot).checksum),
            None => unreachable!("table cache filled above"),
        }
    }
}
