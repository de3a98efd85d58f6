//! SHA-256 checksum utilities
//!
//! Checksums use the canonical `sha256:<hex>` format. The reconciler compares
//! the desired content checksum against the file on disk to decide whether a
//! write is needed at all.

use sha2::{Digest, Sha256};

use crate::{Error, NormalizedPath, Result};

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of in-memory content.
pub fn compute_content_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Compute the SHA-256 checksum of a file's contents.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn compute_file_checksum(path: &NormalizedPath) -> Result<String> {
    let content = crate::io::read_bytes(path)?;
    Ok(compute_content_checksum(&content))
}

/// Whether the regular file at `path` holds exactly `content`.
///
/// A missing file never matches.
pub fn content_matches(path: &NormalizedPath, content: &[u8]) -> Result<bool> {
    let native_path = path.to_native();
    match std::fs::metadata(&native_path) {
        Ok(meta) if meta.len() != content.len() as u64 => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(Error::io(&native_path, e)),
    }
    Ok(compute_file_checksum(path)? == compute_content_checksum(content))
}
