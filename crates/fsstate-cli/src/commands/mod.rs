//! Command implementations for fsstate-cli

pub mod apply;
pub mod validate;

pub use apply::{ApplyArgs, run_apply};
pub use validate::run_validate;
