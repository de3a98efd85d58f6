//! fsstate CLI
//!
//! Applies declarative rule documents to a managed directory.

mod cli;
mod commands;
mod error;

use std::io;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(cmd) => execute_command(cmd),
        None => {
            println!("{} declarative filesystem state", "fsstate".green().bold());
            println!();
            println!("Run {} for available commands.", "fsstate --help".cyan());
            Ok(())
        }
    }
}

/// Install the stderr subscriber. `RUST_LOG` wins over the default level.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(verbose)
        .try_init();
    if result.is_ok() {
        tracing::debug!("Verbose mode enabled");
    }
}

fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Apply {
            base_dir,
            rules,
            allow_escape,
            no_fsync,
        } => commands::run_apply(&commands::ApplyArgs {
            base_dir,
            rules,
            allow_escape,
            no_fsync,
        }),
        Commands::Validate { rules } => commands::run_validate(&rules),
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "fsstate", &mut io::stdout());
            Ok(())
        }
    }
}
