//! Atomic content writes with advisory locking

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::ExponentialBackoff;
use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// Tuning knobs for [`write_atomic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobustnessConfig {
    /// How long to keep retrying the advisory lock before giving up.
    pub lock_timeout: Duration,
    /// Flush file contents to disk before the rename.
    pub enable_fsync: bool,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            enable_fsync: true,
        }
    }
}

/// Symlink chains longer than this are treated as loops.
const MAX_LINK_HOPS: usize = 40;

/// Replace the content of `path` with `content` atomically.
///
/// Writes to a fresh sibling temp file (`.<name>.XXXXXX.tmp`) and renames it
/// over the target, so readers see either the old or the new bytes. An
/// existing target keeps its permission bits and owner. When the new file
/// cannot be handed to the existing owner (an unprivileged process writing a
/// file it does not own), the target is truncated and rewritten in place.
///
/// A symlink is written through: the file it names receives the content and
/// the link stays a link.
///
/// The parent directory must already exist. A missing parent is reported as
/// an I/O error on `path` itself; nothing is created on the way.
pub fn write_atomic(path: &NormalizedPath, content: &[u8], config: RobustnessConfig) -> Result<()> {
    let native_path = path.to_native();
    let target = resolve_links(&native_path)?;
    let file_name = target.file_name().ok_or_else(|| {
        Error::io(
            &native_path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })?;
    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let existing = match fs::metadata(&target) {
        Ok(meta) => Some(meta),
        Err(e) if e.kind() == ErrorKind::NotFound => None,
        Err(e) => return Err(Error::io(&native_path, e)),
    };

    // The temp file is removed on drop unless it is persisted.
    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{}.", file_name.to_string_lossy()))
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| Error::io(&native_path, e))?;

    lock_exclusive(temp.as_file(), &native_path, config.lock_timeout)?;
    temp.write_all(content).map_err(|e| Error::io(&native_path, e))?;
    if config.enable_fsync {
        temp.as_file().sync_all().map_err(|e| Error::io(&native_path, e))?;
    }

    if let Some(existing) = &existing {
        let owner_kept =
            carry_ownership(temp.as_file(), existing).map_err(|e| Error::io(&native_path, e))?;
        if !owner_kept {
            drop(temp);
            tracing::debug!(path = %target.display(), "owner cannot be preserved, writing in place");
            return write_in_place(&target, &native_path, content, config);
        }
        fs::set_permissions(temp.path(), existing.permissions())
            .map_err(|e| Error::io(&native_path, e))?;
    }

    FileExt::unlock(temp.as_file()).map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;
    temp.persist(&target)
        .map_err(|e| Error::io(&native_path, e.error))?;
    tracing::trace!(path = %target.display(), bytes = content.len(), "atomic write complete");
    Ok(())
}

/// Follow `path` through any symlinks to the entry that receives the write.
/// A dangling link resolves to the missing file it points at.
fn resolve_links(path: &Path) -> Result<PathBuf> {
    let mut current = path.to_path_buf();
    for _ in 0..MAX_LINK_HOPS {
        match fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                let link = fs::read_link(&current).map_err(|e| Error::io(path, e))?;
                current = match current.parent() {
                    Some(parent) => parent.join(link),
                    None => link,
                };
            }
            Ok(_) => return Ok(current),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(current),
            Err(e) => return Err(Error::io(path, e)),
        }
    }
    Err(Error::io(
        path,
        std::io::Error::other("too many levels of symbolic links"),
    ))
}

/// Give the temp file the uid/gid of the file it replaces. Returns `false`
/// when the process is not allowed to.
#[cfg(unix)]
fn carry_ownership(temp: &File, existing: &fs::Metadata) -> std::io::Result<bool> {
    use std::os::unix::fs::MetadataExt;

    let current = temp.metadata()?;
    if current.uid() == existing.uid() && current.gid() == existing.gid() {
        return Ok(true);
    }
    match std::os::unix::fs::fchown(temp, Some(existing.uid()), Some(existing.gid())) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::PermissionDenied => Ok(false),
        Err(e) => Err(e),
    }
}

#[cfg(not(unix))]
fn carry_ownership(_temp: &File, _existing: &fs::Metadata) -> std::io::Result<bool> {
    Ok(true)
}

fn write_in_place(
    target: &Path,
    reported: &Path,
    content: &[u8],
    config: RobustnessConfig,
) -> Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(target)
        .map_err(|e| Error::io(reported, e))?;
    lock_exclusive(&file, reported, config.lock_timeout)?;
    file.write_all(content).map_err(|e| Error::io(reported, e))?;
    if config.enable_fsync {
        file.sync_all().map_err(|e| Error::io(reported, e))?;
    }
    FileExt::unlock(&file).map_err(|_| Error::LockFailed {
        path: reported.to_path_buf(),
    })
}

fn lock_exclusive(file: &File, target: &Path, timeout: Duration) -> Result<()> {
    let policy = ExponentialBackoff {
        initial_interval: Duration::from_millis(10),
        max_elapsed_time: Some(timeout),
        ..Default::default()
    };
    backoff::retry(policy, || {
        FileExt::try_lock_exclusive(file).map_err(backoff::Error::transient)
    })
    .map_err(|_| Error::LockFailed {
        path: target.to_path_buf(),
    })
}

/// Read raw bytes from a file.
pub fn read_bytes(path: &NormalizedPath) -> Result<Vec<u8>> {
    let native_path = path.to_native();
    fs::read(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}
