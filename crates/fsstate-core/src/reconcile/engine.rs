//! Reconciler implementation

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;

use fsstate_fs::{NormalizedPath, checksum, io};

use super::options::{ApplyOptions, PathPolicy};
use super::report::{Action, ActionKind, ApplyReport};
use crate::error::{Error, Operation, Result};
use crate::mode::FileMode;
use crate::ownership::ResolvedOwnership;
use crate::rules::{EntryKind, EntryState, RuleNode};

/// Converges a directory tree onto an ordered list of rules.
///
/// Rules are applied strictly one at a time in listed order. A recursive
/// directory rule becomes the base directory of its children, and the
/// parent's later siblings only run once the whole subtree is done.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    options: ApplyOptions,
}

impl Reconciler {
    pub fn new(options: ApplyOptions) -> Self {
        Self { options }
    }

    /// Ensure `base` exists (with any missing ancestors), then apply `rules`.
    pub fn run(&self, rules: &[RuleNode], base: impl AsRef<Path>) -> Result<ApplyReport> {
        let base = absolute_base(base.as_ref())?;
        let mut report = ApplyReport::new();

        let native = base.to_native();
        if !native.is_dir() {
            fs::create_dir_all(&native)
                .map_err(|e| Error::os(&native, Operation::CreateDirectory, e))?;
            report.record(Action::new(ActionKind::CreatedDirectory, &base));
        }

        self.apply_rules(rules, &base, &mut report)?;
        Ok(report)
    }

    /// Apply `rules` relative to `base`.
    ///
    /// Stops at the first error. Changes made before it are kept.
    pub fn apply(&self, rules: &[RuleNode], base: impl AsRef<Path>) -> Result<ApplyReport> {
        let base = absolute_base(base.as_ref())?;
        let mut report = ApplyReport::new();
        self.apply_rules(rules, &base, &mut report)?;
        Ok(report)
    }

    fn apply_rules(
        &self,
        rules: &[RuleNode],
        base: &NormalizedPath,
        report: &mut ApplyReport,
    ) -> Result<()> {
        for rule in rules {
            self.apply_rule(rule, base, report)?;
        }
        Ok(())
    }

    fn apply_rule(
        &self,
        rule: &RuleNode,
        base: &NormalizedPath,
        report: &mut ApplyReport,
    ) -> Result<()> {
        let target = self.resolve_target(rule, base)?;
        let native = target.to_native();
        tracing::debug!(
            path = %target,
            kind = %rule.kind,
            state = %rule.state,
            "applying rule"
        );

        // Validate everything that can fail without side effects first.
        // Mode and ownership only matter for entries that will exist.
        let (mode, ownership) = match rule.state {
            EntryState::Present => {
                let mode = rule
                    .mode
                    .as_deref()
                    .map(|raw| {
                        raw.parse::<FileMode>().map_err(|e| Error::ModeParse {
                            path: native.clone(),
                            mode: e.mode,
                        })
                    })
                    .transpose()?;
                let ownership = rule
                    .ownership()
                    .map(|ownership| ownership.resolve(&native))
                    .transpose()?;
                (mode, ownership)
            }
            EntryState::Absent => (None, None),
        };
        if rule.has_partial_ownership() {
            tracing::warn!(
                path = %target,
                "owner and group must both be set; ownership left unchanged"
            );
        }

        match (rule.kind, rule.state) {
            (EntryKind::Directory, EntryState::Present) => self.ensure_directory(&target, report)?,
            (EntryKind::Directory, EntryState::Absent) => self.remove_directory(&target, report)?,
            (EntryKind::File, EntryState::Present) => {
                self.ensure_file(&target, rule.content.as_deref(), report)?
            }
            (EntryKind::File, EntryState::Absent) => self.remove_file(&target, report)?,
        }

        if rule.state == EntryState::Present {
            if let Some(ownership) = ownership {
                self.apply_ownership(&target, &ownership, report)?;
            }
            if let Some(mode) = mode
                && mode.apply(&native)?
            {
                report.record(Action::new(ActionKind::ChangedMode(mode), &target));
            }
        }

        if rule.recurses() && !rule.children.is_empty() {
            tracing::debug!(base = %target, children = rule.children.len(), "descending");
            self.apply_rules(&rule.children, &target, report)?;
        }

        Ok(())
    }

    fn resolve_target(&self, rule: &RuleNode, base: &NormalizedPath) -> Result<NormalizedPath> {
        let target = base.join(&rule.path);
        if self.options.path_policy == PathPolicy::Unrestricted {
            return Ok(target);
        }

        let absolute = NormalizedPath::new(&rule.path).is_absolute();
        if absolute || target == *base || !target.starts_with(base) {
            return Err(Error::PathEscape {
                rule_path: rule.path.clone(),
                base: base.to_native(),
            });
        }
        Ok(target)
    }

    fn ensure_directory(&self, target: &NormalizedPath, report: &mut ApplyReport) -> Result<()> {
        let native = target.to_native();
        match fs::metadata(&native) {
            Ok(meta) if meta.is_dir() => {
                tracing::debug!(path = %target, "directory already present");
                Ok(())
            }
            Ok(_) => Err(Error::KindConflict {
                path: native,
                expected: EntryKind::Directory,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::create_dir_all(&native)
                    .map_err(|e| Error::os(&native, Operation::CreateDirectory, e))?;
                report.record(Action::new(ActionKind::CreatedDirectory, target));
                Ok(())
            }
            Err(e) => Err(Error::os(&native, Operation::Inspect, e)),
        }
    }

    fn remove_directory(&self, target: &NormalizedPath, report: &mut ApplyReport) -> Result<()> {
        let native = target.to_native();
        match fs::symlink_metadata(&native) {
            Ok(meta) if meta.file_type().is_symlink() => self.remove_symlink(target, report),
            Ok(meta) if meta.is_dir() => {
                fs::remove_dir_all(&native)
                    .map_err(|e| Error::os(&native, Operation::RemoveDirectory, e))?;
                report.record(Action::new(ActionKind::RemovedDirectory, target));
                Ok(())
            }
            Ok(_) => Err(Error::KindConflict {
                path: native,
                expected: EntryKind::Directory,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %target, "directory already absent");
                Ok(())
            }
            Err(e) => Err(Error::os(&native, Operation::Inspect, e)),
        }
    }

    fn ensure_file(
        &self,
        target: &NormalizedPath,
        content: Option<&str>,
        report: &mut ApplyReport,
    ) -> Result<()> {
        let native = target.to_native();
        let exists = match fs::metadata(&native) {
            Ok(meta) if meta.is_dir() => {
                return Err(Error::KindConflict {
                    path: native,
                    expected: EntryKind::File,
                });
            }
            Ok(_) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(Error::os(&native, Operation::Inspect, e)),
        };

        match content {
            Some(content) => {
                let bytes = content.as_bytes();
                if exists
                    && checksum::content_matches(target, bytes)
                        .map_err(|e| Error::from_fs(&native, Operation::Inspect, e))?
                {
                    tracing::debug!(path = %target, "content up to date");
                    return Ok(());
                }
                io::write_atomic(target, bytes, self.options.robustness)
                    .map_err(|e| Error::from_fs(&native, Operation::WriteFile, e))?;
                report.record(Action::new(ActionKind::WroteFile, target));
            }
            None if exists => {
                tracing::debug!(path = %target, "file present, content unmanaged");
            }
            None => {
                OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&native)
                    .map_err(|e| Error::os(&native, Operation::CreateFile, e))?;
                report.record(Action::new(ActionKind::CreatedEmptyFile, target));
            }
        }
        Ok(())
    }

    fn remove_file(&self, target: &NormalizedPath, report: &mut ApplyReport) -> Result<()> {
        let native = target.to_native();
        match fs::symlink_metadata(&native) {
            Ok(meta) if meta.file_type().is_symlink() => self.remove_symlink(target, report),
            Ok(meta) if meta.is_dir() => Err(Error::KindConflict {
                path: native,
                expected: EntryKind::File,
            }),
            Ok(_) => {
                fs::remove_file(&native)
                    .map_err(|e| Error::os(&native, Operation::RemoveFile, e))?;
                report.record(Action::new(ActionKind::RemovedFile, target));
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %target, "file already absent");
                Ok(())
            }
            Err(e) => Err(Error::os(&native, Operation::Inspect, e)),
        }
    }

    /// Removes the link itself, never what it points to.
    fn remove_symlink(&self, target: &NormalizedPath, report: &mut ApplyReport) -> Result<()> {
        let native = target.to_native();
        fs::remove_file(&native).map_err(|e| Error::os(&native, Operation::RemoveSymlink, e))?;
        report.record(Action::new(ActionKind::RemovedSymlink, target));
        Ok(())
    }

    fn apply_ownership(
        &self,
        target: &NormalizedPath,
        ownership: &ResolvedOwnership,
        report: &mut ApplyReport,
    ) -> Result<()> {
        if ownership.apply(&target.to_native())? {
            report.record(Action::new(
                ActionKind::ChangedOwner(ownership.request().clone()),
                target,
            ));
        }
        Ok(())
    }
}

/// Anchor `base` at the working directory before normalizing, so leading
/// `..` segments of a relative base are resolved instead of dropped.
fn absolute_base(base: &Path) -> Result<NormalizedPath> {
    let absolute = std::path::absolute(base).map_err(|e| Error::os(base, Operation::Inspect, e))?;
    Ok(NormalizedPath::new(absolute))
}
