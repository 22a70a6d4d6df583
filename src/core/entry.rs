//! File entries: a FAT record plus a read cursor into the container.

use crate::core::error::{Result, SaiError};
use crate::core::fat::{EntryKind, FatEntry};
use crate::core::page::PAGE_SIZE;
use crate::core::vfs::VirtualFileSystem;
use std::borrow::Cow;
use std::io;

/// Offset, in seconds, between the FILETIME epoch (1601) and the Unix
/// epoch (1970).
const FILETIME_UNIX_OFFSET: i64 = 11_644_473_600;

/// A file inside an open container, with standard cursor semantics.
///
/// The entry is a cheap snapshot of its FAT record; it borrows the
/// container and reads through the container's paged stream. Reads are
/// clamped so the cursor never passes the recorded file size.
pub struct FileEntry<'vfs> {
    vfs: &'vfs VirtualFileSystem,
    fat: FatEntry,
    pos: u64,
}

impl<'vfs> FileEntry<'vfs> {
    pub(crate) fn new(vfs: &'vfs VirtualFileSystem, fat: FatEntry) -> Self {
        FileEntry { vfs, fat, pos: 0 }
    }

    pub fn name(&self) -> Cow<'_, str> {
        self.fat.name()
    }

    pub fn kind(&self) -> EntryKind {
        self.fat.kind
    }

    /// File size in bytes.
    pub fn size(&self) -> u64 {
        self.fat.size as u64
    }

    /// Logical page index of the file's first data page.
    pub fn page_index(&self) -> u32 {
        self.fat.page_index
    }

    /// The record's opaque flags word.
    pub fn flags(&self) -> u32 {
        self.fat.flags
    }

    /// Raw Windows FILETIME (100 ns ticks since 1601-01-01 UTC).
    pub fn timestamp(&self) -> u64 {
        self.fat.timestamp
    }

    /// Timestamp as Unix seconds.
    pub fn unix_timestamp(&self) -> i64 {
        (self.fat.timestamp / 10_000_000) as i64 - FILETIME_UNIX_OFFSET
    }

    /// Current cursor position.
    pub fn tell(&self) -> u64 {
        self.pos
    }

    /// Move the cursor, clamped to the file size. Returns the new
    /// position.
    pub fn seek(&mut self, offset: u64) -> u64 {
        self.pos = offset.min(self.size());
        self.pos
    }

    /// Read at the cursor, advancing it by the bytes copied.
    ///
    /// Returns fewer bytes than requested only at end of file.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let remaining = self.size() - self.pos;
        let take = (buf.len() as u64).min(remaining) as usize;
        if take == 0 {
            return Ok(0);
        }
        let offset = self.fat.page_index as u64 * PAGE_SIZE as u64 + self.pos;
        let copied = self.vfs.read_at(offset, &mut buf[..take])?;
        self.pos += copied as u64;
        Ok(copied)
    }

    /// Fill `buf` exactly, failing with `UnexpectedEof` when fewer bytes
    /// remain before the end of the file.
    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let copied = self.read(buf)?;
        if copied < buf.len() {
            return Err(SaiError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "read past end of file entry",
            )));
        }
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let mut raw = [0u8; 1];
        self.read_exact(&mut raw)?;
        Ok(raw[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut raw = [0u8; 2];
        self.read_exact(&mut raw)?;
        Ok(u16::from_le_bytes(raw))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut raw = [0u8; 4];
        self.read_exact(&mut raw)?;
        Ok(u32::from_le_bytes(raw))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let mut raw = [0u8; 8];
        self.read_exact(&mut raw)?;
        Ok(u64::from_le_bytes(raw))
    }
}

impl io::Read for FileEntry<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        FileEntry::read(self, buf).map_err(|e| match e {
            SaiError::Io(inner) => inner,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        })
    }
}

impl io::Seek for FileEntry<'_> {
    /// Seeks clamp to the file size, matching the cursor contract of
    /// [`FileEntry::seek`].
    fn seek(&mut self, from: io::SeekFrom) -> io::Result<u64> {
        let target = match from {
            io::SeekFrom::Start(n) => Some(n),
            io::SeekFrom::Current(d) => self.pos.checked_add_signed(d),
            io::SeekFrom::End(d) => self.size().checked_add_signed(d),
        };
        match target {
            Some(n) => Ok(FileEntry::seek(self, n)),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of file entry",
            )),
        }
    }
}
