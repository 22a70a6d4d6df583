//! # sai-vfs - Read-only access to SAI document containers
//!
//! A SAI document is a single on-disk blob holding an encrypted,
//! page-structured virtual filesystem: folders and files carrying layer
//! data, thumbnails, and document metadata. This crate decrypts and
//! verifies that container and exposes it as a navigable tree with
//! random-access byte reads on any contained file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sai_vfs::{Document, Result};
//!
//! # fn main() -> Result<()> {
//! let doc = Document::open("painting.sai")?;
//!
//! // Well-known files can be read directly
//! let thumb = doc.thumbnail()?;
//! println!("{}x{} preview", thumb.width, thumb.height);
//!
//! // Or walk the whole tree
//! for entry in doc.entries()? {
//!     println!("{} ({} bytes)", entry.path, entry.size.unwrap_or(0));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Lower-level access
//!
//! [`VirtualFileSystem`] is the container itself: path lookup, visitor
//! traversal, and positioned reads on file entries. Everything below it
//! (the paged stream, the page store, the cipher primitives) is public in
//! [`core`] for callers that want to observe the 4096-byte page
//! structure.
//!
//! ```rust,no_run
//! use sai_vfs::{VirtualFileSystem, Result};
//!
//! # fn main() -> Result<()> {
//! let vfs = VirtualFileSystem::open("painting.sai")?;
//! let mut canvas = vfs.entry("canvas")?;
//! let width = canvas.read_u32()?;
//! # Ok(())
//! # }
//! ```
//!
//! Containers are strictly read-only: every page is checksum-verified as
//! it is decrypted, and a mismatch (corruption or a wrong key) surfaces
//! as an error rather than bad bytes.

pub mod core;

pub use crate::core::{
    CipherKey, EntryKind, FatEntry, FileEntry, PagedStream, Result, SaiError, StreamStats,
    VfsVisitor, VirtualFileSystem, PAGE_SIZE,
};

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Well-known path of the document preview image.
const THUMBNAIL_PATH: &str = "thumbnail";

/// Magic bytes opening the thumbnail payload.
const THUMBNAIL_MAGIC: [u8; 4] = *b"BM32";

/// A flattened view of one file or folder, produced by
/// [`Document::entries`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Full path in the container (e.g. `layers/00000001`).
    pub path: String,

    /// Just the name (e.g. `00000001`).
    pub name: String,

    /// True for folders.
    pub is_dir: bool,

    /// File size in bytes (`None` for folders).
    pub size: Option<u64>,

    /// Windows FILETIME as stored in the directory record.
    pub timestamp: u64,
}

/// The document preview, decoded to RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes, RGBA order.
    pub pixels: Vec<u8>,
}

/// High-level reader for a SAI document.
///
/// Wraps [`VirtualFileSystem`] with format-specific convenience reads.
/// Use [`Document::vfs`] to reach the container directly.
pub struct Document {
    vfs: VirtualFileSystem,
}

impl Document {
    /// Open a document with the default `User` key.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        info!("opening SAI document at {:?}", path.as_ref());
        let vfs = VirtualFileSystem::open(path)?;
        Ok(Document { vfs })
    }

    /// Open a document with an explicit key table.
    pub fn open_with_key<P: AsRef<Path>>(path: P, key: CipherKey) -> Result<Self> {
        info!(
            "opening SAI document at {:?} with {:?} key",
            path.as_ref(),
            key
        );
        let vfs = VirtualFileSystem::open_with_key(path, key)?;
        Ok(Document { vfs })
    }

    /// The underlying container.
    pub fn vfs(&self) -> &VirtualFileSystem {
        &self.vfs
    }

    /// Decode the document preview.
    ///
    /// The `thumbnail` file holds a `BM32` magic, little-endian width and
    /// height, and BGRA pixel data; the returned buffer is converted to
    /// RGBA. A missing file, wrong magic, or short payload fails with
    /// [`SaiError::BadThumbnail`].
    pub fn thumbnail(&self) -> Result<Thumbnail> {
        let mut file = self.vfs.entry(THUMBNAIL_PATH).map_err(|e| match e {
            SaiError::PathNotFound(_) | SaiError::NotAFile(_) => {
                SaiError::BadThumbnail("no thumbnail file")
            }
            other => other,
        })?;

        let mut header = [0u8; 12];
        if file.read(&mut header)? < header.len() {
            return Err(SaiError::BadThumbnail("header too short"));
        }
        if header[..4] != THUMBNAIL_MAGIC {
            return Err(SaiError::BadThumbnail("bad magic"));
        }
        let width = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        let height = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
        debug!("thumbnail is {}x{}", width, height);

        let len = (width as u64)
            .checked_mul(height as u64)
            .and_then(|n| n.checked_mul(4))
            .filter(|&n| n <= file.size() - header.len() as u64)
            .ok_or(SaiError::BadThumbnail("pixel data too short"))?;

        let mut pixels = vec![0u8; len as usize];
        let mut filled = 0;
        while filled < pixels.len() {
            let copied = file.read(&mut pixels[filled..])?;
            if copied == 0 {
                return Err(SaiError::BadThumbnail("pixel data too short"));
            }
            filled += copied;
        }
        for px in pixels.chunks_exact_mut(4) {
            px.swap(0, 2); // BGRA -> RGBA
        }
        Ok(Thumbnail {
            width,
            height,
            pixels,
        })
    }

    /// Collect the whole tree depth-first into a flat list.
    pub fn entries(&self) -> Result<Vec<Entry>> {
        struct Collector {
            stack: Vec<String>,
            out: Vec<Entry>,
        }

        impl Collector {
            fn path_of(&self, name: &str) -> String {
                if self.stack.is_empty() {
                    name.to_string()
                } else {
                    format!("{}/{}", self.stack.join("/"), name)
                }
            }
        }

        impl VfsVisitor for Collector {
            fn visit_folder_begin(&mut self, entry: &FatEntry) -> bool {
                let name = entry.name().into_owned();
                self.out.push(Entry {
                    path: self.path_of(&name),
                    name: name.clone(),
                    is_dir: true,
                    size: None,
                    timestamp: entry.timestamp,
                });
                self.stack.push(name);
                true
            }

            fn visit_folder_end(&mut self, _entry: &FatEntry) -> bool {
                self.stack.pop();
                true
            }

            fn visit_file(&mut self, entry: &FatEntry) -> bool {
                let name = entry.name().into_owned();
                self.out.push(Entry {
                    path: self.path_of(&name),
                    name,
                    is_dir: false,
                    size: Some(entry.size as u64),
                    timestamp: entry.timestamp,
                });
                true
            }
        }

        let mut collector = Collector {
            stack: Vec::new(),
            out: Vec::new(),
        };
        self.vfs.visit(&mut collector)?;
        debug!("collected {} entries", collector.out.len());
        Ok(collector.out)
    }
}
