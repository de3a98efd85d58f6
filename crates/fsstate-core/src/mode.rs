//! Octal permission modes

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Error, Operation, Result};

/// Largest value a mode may carry: setuid, setgid, sticky and rwx for all.
const MAX_MODE: u32 = 0o7777;

/// Permission bits parsed from an octal literal such as `"0755"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileMode(u32);

/// The string was not an octal permission literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid octal mode: {mode:?}")]
pub struct ModeParseError {
    pub mode: String,
}

impl FileMode {
    pub fn new(bits: u32) -> Option<Self> {
        (bits <= MAX_MODE).then_some(Self(bits))
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Set the permission bits of `path`, skipping the syscall when they
    /// already match. Returns whether anything changed.
    #[cfg(unix)]
    pub fn apply(&self, path: &Path) -> Result<bool> {
        use std::os::unix::fs::PermissionsExt;

        let meta = std::fs::metadata(path).map_err(|e| Error::os(path, Operation::ChangeMode, e))?;
        if meta.permissions().mode() & MAX_MODE == self.0 {
            return Ok(false);
        }
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(self.0))
            .map_err(|e| Error::os(path, Operation::ChangeMode, e))?;
        Ok(true)
    }

    /// Only the read-only flag exists here: a mode without any write bit
    /// marks the entry read-only.
    #[cfg(not(unix))]
    pub fn apply(&self, path: &Path) -> Result<bool> {
        let meta = std::fs::metadata(path).map_err(|e| Error::os(path, Operation::ChangeMode, e))?;
        let readonly = self.0 & 0o222 == 0;
        let mut permissions = meta.permissions();
        if permissions.readonly() == readonly {
            return Ok(false);
        }
        permissions.set_readonly(readonly);
        std::fs::set_permissions(path, permissions)
            .map_err(|e| Error::os(path, Operation::ChangeMode, e))?;
        Ok(true)
    }
}

impl FromStr for FileMode {
    type Err = ModeParseError;

    /// Accepts octal digits with an optional `0o` prefix, e.g. `0755`,
    /// `755`, `0o755`. Surrounding whitespace is ignored.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || ModeParseError { mode: s.to_string() };

        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0o")
            .or_else(|| trimmed.strip_prefix("0O"))
            .unwrap_or(trimmed);

        if digits.is_empty() || !digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return Err(invalid());
        }

        let bits = u32::from_str_radix(digits, 8).map_err(|_| invalid())?;
        Self::new(bits).ok_or_else(invalid)
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}
