//! Depth-first traversal and the flattened entry listing.

mod common;

use common::{file, folder, pattern, Node};
use sai_vfs::{Document, FatEntry, VfsVisitor, VirtualFileSystem};
use tempfile::TempDir;

/// Three folders and five files; `a` nests `b` and `c`.
fn fixture_nodes() -> Vec<Node> {
    vec![
        folder(
            "a",
            vec![
                file("x", pattern(10)),
                folder("b", vec![file("y", pattern(20))]),
                folder("c", vec![]),
            ],
        ),
        file("f1", pattern(30)),
        file("f2", pattern(40)),
        file("f3", pattern(50)),
    ]
}

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
    stop_after: Option<usize>,
}

impl Recorder {
    fn record(&mut self, event: String) -> bool {
        self.events.push(event);
        match self.stop_after {
            Some(n) => self.events.len() < n,
            None => true,
        }
    }
}

impl VfsVisitor for Recorder {
    fn visit_folder_begin(&mut self, entry: &FatEntry) -> bool {
        self.record(format!("begin {}", entry.name()))
    }

    fn visit_folder_end(&mut self, entry: &FatEntry) -> bool {
        self.record(format!("end {}", entry.name()))
    }

    fn visit_file(&mut self, entry: &FatEntry) -> bool {
        self.record(format!("file {}", entry.name()))
    }
}

#[test]
fn traversal_is_depth_first_in_record_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tree.sai");
    common::write_container(&path, &fixture_nodes());
    let vfs = VirtualFileSystem::open(&path).unwrap();

    let mut recorder = Recorder::default();
    vfs.visit(&mut recorder).unwrap();

    assert_eq!(
        recorder.events,
        vec![
            "begin a", "file x", "begin b", "file y", "end b", "begin c", "end c", "end a",
            "file f1", "file f2", "file f3",
        ]
    );
    // 3 folders contribute begin+end, 5 files one callback each.
    assert_eq!(recorder.events.len(), 11);
}

#[test]
fn early_termination_suppresses_further_callbacks() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tree.sai");
    common::write_container(&path, &fixture_nodes());
    let vfs = VirtualFileSystem::open(&path).unwrap();

    for stop_after in 1..=11 {
        let mut recorder = Recorder {
            stop_after: Some(stop_after),
            ..Recorder::default()
        };
        vfs.visit(&mut recorder).unwrap();
        assert_eq!(recorder.events.len(), stop_after);
    }
}

#[test]
fn entries_flatten_the_tree_with_full_paths() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tree.sai");
    common::write_container(&path, &fixture_nodes());
    let doc = Document::open(&path).unwrap();

    let entries = doc.entries().unwrap();
    let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["a", "a/x", "a/b", "a/b/y", "a/c", "f1", "f2", "f3"]
    );

    let y = entries.iter().find(|e| e.path == "a/b/y").unwrap();
    assert!(!y.is_dir);
    assert_eq!(y.name, "y");
    assert_eq!(y.size, Some(20));
    assert_eq!(y.timestamp, common::FIXTURE_FILETIME);

    let b = entries.iter().find(|e| e.path == "a/b").unwrap();
    assert!(b.is_dir);
    assert_eq!(b.size, None);
}

#[test]
fn nested_paths_resolve_through_folders() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tree.sai");
    common::write_container(&path, &fixture_nodes());
    let vfs = VirtualFileSystem::open(&path).unwrap();

    let mut y = vfs.entry("a/b/y").unwrap();
    let mut data = Vec::new();
    let mut buf = [0u8; 64];
    loop {
        let n = y.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }
    assert_eq!(data, pattern(20));
}
