//! Filesystem primitives for fsstate
//!
//! Provides lexically normalized path handling, atomic content writes and
//! format-agnostic loading of rule documents. Everything above this layer
//! talks to the disk through these types.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use config::{ConfigStore, Format};
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use path::NormalizedPath;
