//! Error types for fsstate-core

use std::fmt;
use std::path::{Path, PathBuf};

use crate::rules::EntryKind;

/// Result type for fsstate-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// The filesystem operation that was being attempted when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Inspect,
    CreateDirectory,
    RemoveDirectory,
    WriteFile,
    CreateFile,
    RemoveFile,
    RemoveSymlink,
    ChangeOwner,
    ChangeMode,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Inspect => "inspect",
            Self::CreateDirectory => "create directory",
            Self::RemoveDirectory => "remove directory",
            Self::WriteFile => "write file",
            Self::CreateFile => "create file",
            Self::RemoveFile => "remove file",
            Self::RemoveSymlink => "remove symlink",
            Self::ChangeOwner => "change owner of",
            Self::ChangeMode => "change mode of",
        };
        f.write_str(name)
    }
}

/// Errors that abort a reconciliation pass
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rule document is malformed or misses a required field
    #[error("Failed to parse rules at {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// `mode` is not an octal permission literal
    #[error("Invalid mode {mode:?} for {path}: expected an octal literal such as \"0755\"")]
    ModeParse { path: PathBuf, mode: String },

    /// Owner or group could not be resolved, or chown was refused
    #[error("Cannot change ownership of {path} to {owner}:{group}: {reason}")]
    Ownership {
        path: PathBuf,
        owner: String,
        group: String,
        reason: String,
    },

    /// The OS denied the operation
    #[error("Permission denied: cannot {operation} {path}: {source}")]
    Permission {
        path: PathBuf,
        operation: Operation,
        #[source]
        source: std::io::Error,
    },

    /// Any other OS-level failure
    #[error("Failed to {operation} {path}: {source}")]
    Io {
        path: PathBuf,
        operation: Operation,
        #[source]
        source: std::io::Error,
    },

    /// The target exists but is the other kind of entry
    #[error("{path} exists but is not a {expected}")]
    KindConflict { path: PathBuf, expected: EntryKind },

    /// Rule path resolves outside (or onto) its base directory
    #[error("Rule path {rule_path:?} does not resolve to an entry inside {base}")]
    PathEscape { rule_path: String, base: PathBuf },

    /// Filesystem layer error with no more specific classification
    #[error(transparent)]
    Fs(fsstate_fs::Error),
}

impl Error {
    /// Classify an OS error for `operation` on `path`.
    pub fn os(path: impl Into<PathBuf>, operation: Operation, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::Permission {
                path,
                operation,
                source,
            }
        } else {
            Self::Io {
                path,
                operation,
                source,
            }
        }
    }

    /// Attach `path` and `operation` to a filesystem layer error.
    pub fn from_fs(path: impl Into<PathBuf>, operation: Operation, err: fsstate_fs::Error) -> Self {
        match err {
            fsstate_fs::Error::Io { source, .. } => Self::os(path, operation, source),
            other => Self::from(other),
        }
    }

    /// The path the failing rule targeted, when known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Parse { path, .. }
            | Self::ModeParse { path, .. }
            | Self::Ownership { path, .. }
            | Self::Permission { path, .. }
            | Self::Io { path, .. }
            | Self::KindConflict { path, .. } => Some(path),
            Self::PathEscape { .. } | Self::Fs(_) => None,
        }
    }
}

impl From<fsstate_fs::Error> for Error {
    fn from(err: fsstate_fs::Error) -> Self {
        match err {
            fsstate_fs::Error::ConfigParse {
                path,
                format,
                message,
            } => Self::Parse {
                path,
                message: format!("invalid {format}: {message}"),
            },
            other => Self::Fs(other),
        }
    }
}
