//! Declarative filesystem state for fsstate
//!
//! A rule tree describes files and directories that should (or should not)
//! exist under a base directory, together with their content, ownership and
//! permission bits. The [`Reconciler`] converges the filesystem onto it.
//!
//! - **Rules**: [`RuleNode`] trees, loaded from YAML, JSON or TOML through
//!   [`RuleDocument`]
//! - **Reconciliation**: idempotent, ordered, fail-fast application with an
//!   [`ApplyReport`] of what changed
//! - **Modes and ownership**: validated octal modes ([`FileMode`]) and
//!   name-or-ID ownership ([`Ownership`])
//!
//! # Architecture
//!
//! ```text
//!        fsstate (CLI)
//!              |
//!        fsstate-core
//!              |
//!         fsstate-fs
//! ```
//!
//! # Example
//!
//! ```no_run
//! use fsstate_core::{ApplyOptions, Reconciler, RuleDocument};
//!
//! fn example() -> fsstate_core::Result<()> {
//!     let document = RuleDocument::load("file_rules.yml")?;
//!     let report = Reconciler::new(ApplyOptions::default())
//!         .run(document.rules(), "/srv/managed_files")?;
//!     println!("{} change(s)", report.len());
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod mode;
pub mod ownership;
pub mod reconcile;
pub mod rules;

pub use error::{Error, Operation, Result};
pub use mode::{FileMode, ModeParseError};
pub use ownership::{Ownership, ResolvedOwnership};
pub use reconcile::{Action, ActionKind, ApplyOptions, ApplyReport, PathPolicy, Reconciler};
pub use rules::{EntryKind, EntryState, RuleDocument, RuleNode};
