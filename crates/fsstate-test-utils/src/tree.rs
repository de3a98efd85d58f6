//! [`TestTree`]: a temporary base directory for reconciliation scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory with helpers for seeding entries and asserting on
/// the result of a pass.
///
/// The managed base directory is `root()/base`, so tests can also check that
/// nothing outside the base was touched.
///
/// # Example
///
/// ```rust,no_run
/// use fsstate_test_utils::TestTree;
///
/// let tree = TestTree::new();
/// tree.seed_file("etc/motd", "old");
/// // ... run a pass against tree.base() ...
/// tree.assert_file_content("etc/motd", "hello");
/// ```
pub struct TestTree {
    temp_dir: TempDir,
}

impl Default for TestTree {
    fn default() -> Self {
        Self::new()
    }
}

impl TestTree {
    /// Create a scratch directory with an empty `base/` inside it.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("TestTree::new: failed to create temp dir");
        fs::create_dir(temp_dir.path().join("base"))
            .expect("TestTree::new: failed to create base dir");
        Self { temp_dir }
    }

    /// The scratch directory that contains `base/`.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The managed base directory.
    pub fn base(&self) -> PathBuf {
        self.root().join("base")
    }

    /// Absolute path of `rel` inside the base directory.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.base().join(rel)
    }

    /// Create `rel` (and its parents) as a directory under the base.
    pub fn seed_dir(&self, rel: &str) {
        fs::create_dir_all(self.path(rel))
            .unwrap_or_else(|e| panic!("seed_dir: failed to create {rel}: {e}"));
    }

    /// Write `content` to `rel` under the base, creating parents.
    pub fn seed_file(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .unwrap_or_else(|e| panic!("seed_file: failed to create parent of {rel}: {e}"));
        }
        fs::write(&path, content).unwrap_or_else(|e| panic!("seed_file: failed to write {rel}: {e}"));
    }

    /// Write `content` to `rel` relative to the scratch root, outside the base.
    pub fn seed_outside(&self, rel: &str, content: &str) {
        fs::write(self.root().join(rel), content)
            .unwrap_or_else(|e| panic!("seed_outside: failed to write {rel}: {e}"));
    }

    /// # Panics
    /// Panics if `rel` is not a directory.
    pub fn assert_dir(&self, rel: &str) {
        let path = self.path(rel);
        assert!(path.is_dir(), "Expected directory: {}", path.display());
    }

    /// # Panics
    /// Panics if `rel` is not a regular file.
    pub fn assert_file(&self, rel: &str) {
        let path = self.path(rel);
        assert!(path.is_file(), "Expected file: {}", path.display());
    }

    /// # Panics
    /// Panics if anything (including a dangling symlink) exists at `rel`.
    pub fn assert_absent(&self, rel: &str) {
        let path = self.path(rel);
        assert!(
            fs::symlink_metadata(&path).is_err(),
            "Expected nothing at: {}",
            path.display()
        );
    }

    /// # Panics
    /// Panics if the file cannot be read or its bytes differ from `expected`.
    pub fn assert_file_content(&self, rel: &str, expected: &str) {
        let path = self.path(rel);
        let actual = fs::read(&path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", path.display()));
        assert_eq!(
            actual,
            expected.as_bytes(),
            "File {} has unexpected content.\nExpected: {:?}\nActual: {:?}",
            path.display(),
            expected,
            String::from_utf8_lossy(&actual)
        );
    }

    /// Permission bits of `rel`.
    #[cfg(unix)]
    pub fn mode_of(&self, rel: &str) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        let path = self.path(rel);
        fs::metadata(&path)
            .unwrap_or_else(|e| panic!("mode_of: cannot stat {}: {e}", path.display()))
            .permissions()
            .mode()
            & 0o7777
    }
}

/// Whether the tests run with root privileges, which bypass permission
/// checks and allow arbitrary chown.
#[cfg(unix)]
pub fn is_root() -> bool {
    match std::process::Command::new("id").arg("-u").output() {
        Ok(output) => String::from_utf8_lossy(&output.stdout).trim() == "0",
        Err(_) => false,
    }
}
