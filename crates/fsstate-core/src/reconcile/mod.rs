//! Rule application
//!
//! The [`Reconciler`] walks a rule tree in listed order and converges the
//! filesystem under a base directory onto it. The first failure aborts the
//! whole pass; actions taken before it stay in place.

mod engine;
mod options;
mod report;

pub use engine::Reconciler;
pub use options::{ApplyOptions, PathPolicy};
pub use report::{Action, ActionKind, ApplyReport};
