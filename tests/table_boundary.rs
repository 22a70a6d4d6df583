//! Reads that span a table page's coverage boundary.
//!
//! Physical page 512 is the second table page; logical data pages 510 and
//! 511 are physically non-adjacent (511 and 513). A file large enough to
//! straddle that seam must read back as a contiguous byte run.

mod common;

use common::{file, pattern, pattern_byte};
use sai_vfs::{VirtualFileSystem, PAGE_SIZE};
use tempfile::TempDir;

// The file starts at logical page 1 (after the root FAT block), so its
// pages run up past logical 511 and the stream crosses the physical table
// page at 512 inside it.
const BIG_LEN: usize = 513 * PAGE_SIZE + 100;

/// File offset at which the underlying logical page flips 510 -> 511.
const SEAM: u64 = (511 * PAGE_SIZE - PAGE_SIZE) as u64;

#[test]
fn file_reads_skip_interleaved_table_pages() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("big.sai");
    common::write_container(&path, &[file("big", pattern(BIG_LEN))]);

    let vfs = VirtualFileSystem::open(&path).unwrap();
    let mut entry = vfs.entry("big").unwrap();
    assert_eq!(entry.size(), BIG_LEN as u64);

    // Two bytes across the seam come from physical pages 511 and 513.
    entry.seek(SEAM - 1);
    let mut pair = [0u8; 2];
    assert_eq!(entry.read(&mut pair).unwrap(), 2);
    assert_eq!(pair[0], pattern_byte(SEAM as usize - 1));
    assert_eq!(pair[1], pattern_byte(SEAM as usize));

    // Crossing the seam forward touched exactly one table page beyond the
    // root table loaded at open.
    assert_eq!(vfs.stats().table_loads, 2);

    // A larger window over the seam is byte-identical to the source run.
    entry.seek(SEAM - 100);
    let mut window = vec![0u8; 300];
    let mut filled = 0;
    while filled < window.len() {
        let n = entry.read(&mut window[filled..]).unwrap();
        assert!(n > 0);
        filled += n;
    }
    let expected: Vec<u8> = (SEAM as usize - 100..SEAM as usize + 200)
        .map(pattern_byte)
        .collect();
    assert_eq!(window, expected);

    // The tail past the last full page is still reachable.
    entry.seek(BIG_LEN as u64 - 10);
    let mut tail = [0u8; 32];
    assert_eq!(entry.read(&mut tail).unwrap(), 10);
    assert_eq!(tail[0], pattern_byte(BIG_LEN - 10));
}
