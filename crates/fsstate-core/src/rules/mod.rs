//! Rule data model and rule documents

mod document;
mod rule;

pub use document::RuleDocument;
pub use rule::{EntryKind, EntryState, RuleNode};
