//! CLI argument parsing using clap derive macros

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Default managed directory, relative to the working directory
pub const DEFAULT_BASE_DIR: &str = "./managed_files";

/// Default rule document, relative to the working directory
pub const DEFAULT_RULES: &str = "file_rules.yml";

/// Declarative filesystem state
///
/// Converges a base directory onto a tree of rules describing which files
/// and directories exist, what they contain and who owns them.
#[derive(Parser, Debug)]
#[command(name = "fsstate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Apply a rule document to the base directory
    Apply {
        /// Directory the rules are applied under (created if missing)
        #[arg(short, long, env = "FSSTATE_BASE_DIR", default_value = DEFAULT_BASE_DIR)]
        base_dir: PathBuf,

        /// Rule document (.yml, .yaml, .json or .toml)
        #[arg(short, long, env = "FSSTATE_RULES", default_value = DEFAULT_RULES)]
        rules: PathBuf,

        /// Allow rule paths that resolve outside their base directory
        #[arg(long)]
        allow_escape: bool,

        /// Skip fsync after atomic writes
        #[arg(long)]
        no_fsync: bool,
    },

    /// Parse a rule document and check every mode without touching the filesystem
    Validate {
        /// Rule document (.yml, .yaml, .json or .toml)
        #[arg(short, long, env = "FSSTATE_RULES", default_value = DEFAULT_RULES)]
        rules: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
