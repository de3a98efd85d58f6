//! Shared test utilities for the fsstate workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tree`]: [`TestTree`] scratch base directory with setup and assertion helpers
//! - [`snapshot`]: point-in-time capture of a directory tree for idempotence checks

pub mod snapshot;
pub mod tree;

pub use snapshot::{Snapshot, SnapshotEntry, snapshot};
pub use tree::TestTree;
#[cfg(unix)]
pub use tree::is_root;
