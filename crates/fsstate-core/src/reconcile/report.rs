//! Record of the changes a pass made

use std::fmt;

use fsstate_fs::NormalizedPath;

use crate::mode::FileMode;
use crate::ownership::Ownership;

/// What changed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    CreatedDirectory,
    RemovedDirectory,
    /// File content was created or replaced.
    WroteFile,
    /// A missing file without declared content was created empty.
    CreatedEmptyFile,
    RemovedFile,
    RemovedSymlink,
    ChangedOwner(Ownership),
    ChangedMode(FileMode),
}

/// A single state-changing action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub path: NormalizedPath,
}

impl Action {
    pub fn new(kind: ActionKind, path: &NormalizedPath) -> Self {
        Self {
            kind,
            path: path.clone(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = &self.path;
        match &self.kind {
            ActionKind::CreatedDirectory => write!(f, "Created directory: {path}"),
            ActionKind::RemovedDirectory => write!(f, "Removed directory: {path}"),
            ActionKind::WroteFile => write!(f, "Created/updated file: {path}"),
            ActionKind::CreatedEmptyFile => write!(f, "Created empty file: {path}"),
            ActionKind::RemovedFile => write!(f, "Removed file: {path}"),
            ActionKind::RemovedSymlink => write!(f, "Removed symlink: {path}"),
            ActionKind::ChangedOwner(ownership) => {
                write!(f, "Changed ownership of {path} to {ownership}")
            }
            ActionKind::ChangedMode(mode) => write!(f, "Changed mode of {path} to {mode}"),
        }
    }
}

/// Actions taken by a successful pass, in the order they happened.
///
/// No-ops are not recorded, so a pass over an already converged tree yields
/// an empty report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    actions: Vec<Action>,
}

impl ApplyReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and keep an action.
    pub fn record(&mut self, action: Action) {
        tracing::info!("{action}");
        self.actions.push(action);
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
