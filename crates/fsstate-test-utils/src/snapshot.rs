//! Point-in-time capture of a directory tree.
//!
//! Two snapshots compare equal when the same relative paths exist with the
//! same kinds, bytes and permission bits. Timestamps are ignored.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One captured entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotEntry {
    Directory { mode: u32 },
    File { mode: u32, content: Vec<u8> },
    Symlink { target: String },
}

/// Entries keyed by forward-slash path relative to the snapshot root.
pub type Snapshot = BTreeMap<String, SnapshotEntry>;

/// Capture everything under `root` (not including `root` itself).
///
/// # Panics
/// Panics if the tree cannot be read.
pub fn snapshot(root: &Path) -> Snapshot {
    let mut entries = Snapshot::new();
    walk(root, root, &mut entries);
    entries
}

fn walk(root: &Path, dir: &Path, entries: &mut Snapshot) {
    let read_dir =
        fs::read_dir(dir).unwrap_or_else(|e| panic!("snapshot: cannot list {}: {e}", dir.display()));
    for entry in read_dir {
        let entry = entry.unwrap_or_else(|e| panic!("snapshot: bad entry in {}: {e}", dir.display()));
        let path = entry.path();
        let rel = path
            .strip_prefix(root)
            .expect("snapshot: entry outside root")
            .to_string_lossy()
            .replace('\\', "/");
        let meta = fs::symlink_metadata(&path)
            .unwrap_or_else(|e| panic!("snapshot: cannot stat {}: {e}", path.display()));

        if meta.file_type().is_symlink() {
            let target = fs::read_link(&path)
                .unwrap_or_else(|e| panic!("snapshot: cannot read link {}: {e}", path.display()));
            entries.insert(
                rel,
                SnapshotEntry::Symlink {
                    target: target.to_string_lossy().into_owned(),
                },
            );
        } else if meta.is_dir() {
            entries.insert(rel, SnapshotEntry::Directory { mode: mode_bits(&meta) });
            walk(root, &path, entries);
        } else {
            let content = fs::read(&path)
                .unwrap_or_else(|e| panic!("snapshot: cannot read {}: {e}", path.display()));
            entries.insert(
                rel,
                SnapshotEntry::File {
                    mode: mode_bits(&meta),
                    content,
                },
            );
        }
    }
}

#[cfg(unix)]
fn mode_bits(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_bits(meta: &fs::Metadata) -> u32 {
    if meta.permissions().readonly() { 0o444 } else { 0o644 }
}
