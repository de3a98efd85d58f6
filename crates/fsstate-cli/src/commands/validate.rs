//! The validate command

use std::path::Path;

use colored::Colorize;

use fsstate_core::{RuleDocument, RuleNode};
use fsstate_fs::Format;

use crate::error::Result;

/// Run the validate command
///
/// Parses the document and every mode it declares. Nothing is written and
/// owners are not looked up.
pub fn run_validate(rules: &Path) -> Result<()> {
    let extension = rules
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    let format = Format::from_extension(extension)?;

    let document = RuleDocument::load(rules)?;
    document.validate()?;

    println!(
        "{} {} is valid {} ({} rule(s), {} total)",
        "OK".green().bold(),
        rules.display(),
        format.name(),
        document.len(),
        count_rules(document.rules())
    );
    Ok(())
}

/// Count every rule that a pass would visit.
fn count_rules(rules: &[RuleNode]) -> usize {
    rules
        .iter()
        .map(|rule| {
            let nested = if rule.recurses() {
                count_rules(&rule.children)
            } else {
                0
            };
            1 + nested
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn count_rules_skips_non_recursive_children() {
        let mut quiet = RuleNode::directory("b").with_children(vec![RuleNode::file("x")]);
        quiet.recurse = false;
        let rules = vec![
            RuleNode::directory("a").with_children(vec![RuleNode::file("1"), RuleNode::file("2")]),
            quiet,
        ];

        assert_eq!(count_rules(&rules), 4);
    }

    #[test]
    fn validate_accepts_well_formed_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.toml");
        fs::write(
            &path,
            "[[rules]]\npath = \"srv\"\nfile_type = \"directory\"\nmode = \"0755\"\n",
        )
        .unwrap();

        run_validate(&path).unwrap();
    }

    #[test]
    fn validate_rejects_malformed_mode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.yml");
        fs::write(&path, "- path: f\n  mode: \"rwx\"\n").unwrap();

        let err = run_validate(&path).unwrap_err();
        assert!(matches!(
            err,
            CliError::Core(fsstate_core::Error::ModeParse { .. })
        ));
    }

    #[test]
    fn validate_rejects_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.ini");
        fs::write(&path, "").unwrap();

        let err = run_validate(&path).unwrap_err();
        assert!(matches!(err, CliError::Fs(_)));
    }
}
