//! The container: an opened SAI document's virtual filesystem.
//!
//! The container owns the backing file (through the paged stream) and the
//! two page caches. Entries handed out by [`VirtualFileSystem::entry`]
//! borrow the container, so they can never outlive the file handle.

use crate::core::entry::FileEntry;
use crate::core::error::{Result, SaiError};
use crate::core::fat::{self, FatEntry, VfsVisitor};
use crate::core::keys::CipherKey;
use crate::core::page::PAGE_SIZE;
use crate::core::stream::{phys_index, PagedStream, StreamStats};
use parking_lot::Mutex;
use std::path::Path;

/// A read-only view of the virtual filesystem inside a SAI document.
///
/// The paged stream is stateful (a position and two cache slots), so it
/// sits behind a mutex; every read API here takes `&self`. Instances are
/// independent; callers that want parallel access open the same file more
/// than once.
#[derive(Debug)]
pub struct VirtualFileSystem {
    stream: Mutex<PagedStream>,
}

impl VirtualFileSystem {
    /// Open a container with the default `User` key.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_key(path, CipherKey::default())
    }

    /// Open a container with an explicit key table.
    ///
    /// The root table page is verified here; a wrong key fails with
    /// `CorruptTable { index: 0 }`.
    pub fn open_with_key<P: AsRef<Path>>(path: P, key: CipherKey) -> Result<Self> {
        let stream = PagedStream::open(path, key.table())?;
        Ok(VirtualFileSystem {
            stream: Mutex::new(stream),
        })
    }

    /// Whether `path` names a file or folder in the container.
    ///
    /// Resolution failures of every kind read as absent.
    pub fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_ok()
    }

    /// Look up `path` and return a read cursor over the named file.
    pub fn entry(&self, path: &str) -> Result<FileEntry<'_>> {
        let fat = self.resolve(path)?;
        if !fat.is_file() {
            return Err(SaiError::NotAFile(path.to_string()));
        }
        Ok(FileEntry::new(self, fat))
    }

    /// Read up to `buf.len()` bytes at `offset` in the logical stream.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.stream.lock().read_at(offset, buf)
    }

    /// Length of the logical stream in bytes.
    pub fn stream_len(&self) -> u64 {
        self.stream.lock().len()
    }

    /// Cache and load counters of the underlying stream.
    pub fn stats(&self) -> StreamStats {
        self.stream.lock().stats()
    }

    /// Walk the whole tree depth-first.
    ///
    /// Any callback returning `false` unwinds the walk immediately; no
    /// further callbacks are delivered.
    pub fn visit(&self, visitor: &mut dyn VfsVisitor) -> Result<()> {
        self.visit_block(0, visitor)?;
        Ok(())
    }

    fn visit_block(&self, block: u32, visitor: &mut dyn VfsVisitor) -> Result<bool> {
        for entry in self.fat_block(block)? {
            match entry.kind {
                fat::EntryKind::Folder => {
                    if !visitor.visit_folder_begin(&entry)
                        || !self.visit_block(entry.page_index, visitor)?
                        || !visitor.visit_folder_end(&entry)
                    {
                        return Ok(false);
                    }
                }
                fat::EntryKind::File => {
                    if !visitor.visit_file(&entry) {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(true)
    }

    /// Resolve a `/`-separated path to its FAT record.
    fn resolve(&self, path: &str) -> Result<FatEntry> {
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
        if segments.peek().is_none() {
            return Err(SaiError::PathNotFound(path.to_string()));
        }
        let mut block = 0u32;
        while let Some(segment) = segments.next() {
            let entries = self.fat_block(block)?;
            let found = entries.into_iter().find(|e| e.name_matches(segment));
            let entry = found.ok_or_else(|| SaiError::PathNotFound(path.to_string()))?;
            if segments.peek().is_none() {
                return Ok(entry);
            }
            if !entry.is_folder() {
                return Err(SaiError::NotAFolder(path.to_string()));
            }
            block = entry.page_index;
        }
        Err(SaiError::PathNotFound(path.to_string()))
    }

    /// Decode the FAT block at logical page `block`.
    fn fat_block(&self, block: u32) -> Result<Vec<FatEntry>> {
        let mut raw = [0u8; PAGE_SIZE];
        let offset = block as u64 * PAGE_SIZE as u64;
        let copied = self.stream.lock().read_at(offset, &mut raw)?;
        if copied < PAGE_SIZE {
            return Err(SaiError::Truncated {
                page: phys_index(block),
            });
        }
        Ok(fat::parse_block(&raw))
    }
}
