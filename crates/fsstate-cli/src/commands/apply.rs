//! The apply command
//!
//! Loads a rule document and converges the base directory onto it.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;

use fsstate_core::{ApplyOptions, PathPolicy, Reconciler, RuleDocument};
use fsstate_fs::RobustnessConfig;

use crate::error::{CliError, Result};

/// Resolved arguments for [`run_apply`]
#[derive(Debug, Clone)]
pub struct ApplyArgs {
    pub base_dir: PathBuf,
    pub rules: PathBuf,
    pub allow_escape: bool,
    pub no_fsync: bool,
}

impl ApplyArgs {
    fn options(&self) -> ApplyOptions {
        let policy = if self.allow_escape {
            PathPolicy::Unrestricted
        } else {
            PathPolicy::Confined
        };
        ApplyOptions::default()
            .with_path_policy(policy)
            .with_robustness(RobustnessConfig {
                enable_fsync: !self.no_fsync,
                ..RobustnessConfig::default()
            })
    }
}

/// Run the apply command
///
/// The rule document is loaded before anything is created, so a document
/// that fails to parse leaves the filesystem untouched.
pub fn run_apply(args: &ApplyArgs) -> Result<()> {
    println!(
        "{} Applying {} to {}",
        "=>".blue().bold(),
        args.rules.display().to_string().cyan(),
        args.base_dir.display().to_string().cyan()
    );

    let document = RuleDocument::load(&args.rules)?;
    let (base, created) = prepare_base(&args.base_dir)?;

    let report = Reconciler::new(args.options()).run(document.rules(), &base)?;
    let changes = report.len() + usize::from(created);

    if changes == 0 {
        println!(
            "{} {} is already up to date.",
            "OK".green().bold(),
            base.display()
        );
    } else {
        println!(
            "{} Applied {} rule(s): {} change(s) under {}",
            "OK".green().bold(),
            document.len(),
            changes,
            base.display()
        );
    }

    Ok(())
}

/// Create `base_dir` if missing and return its canonical form, plus whether
/// it had to be created.
fn prepare_base(base_dir: &Path) -> Result<(PathBuf, bool)> {
    let created = !base_dir.is_dir();
    if created {
        if base_dir.exists() {
            return Err(CliError::user(format!(
                "Base directory {} exists but is not a directory",
                base_dir.display()
            )));
        }
        fs::create_dir_all(base_dir)?;
        tracing::info!("Created directory: {}", base_dir.display());
    }
    let base = dunce::canonicalize(base_dir)?;
    tracing::debug!(base = %base.display(), "resolved base directory");
    Ok((base, created))
}
