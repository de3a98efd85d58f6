//! End-to-end integration test for the full pipeline
//!
//! Rule document on disk -> RuleDocument -> Reconciler -> filesystem.

use fsstate_core::{ActionKind, ApplyOptions, Reconciler, RuleDocument};
use fsstate_fs::{NormalizedPath, RobustnessConfig};
use fsstate_test_utils::{TestTree, snapshot};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-fixtures/rules")
        .join(name)
}

fn reconciler() -> Reconciler {
    Reconciler::new(ApplyOptions::default().with_robustness(RobustnessConfig {
        enable_fsync: false,
        ..RobustnessConfig::default()
    }))
}

#[test]
fn test_all_formats_describe_the_same_tree() {
    let yaml = RuleDocument::load(fixture("site.yml")).unwrap();
    let json = RuleDocument::load(fixture("site.json")).unwrap();
    let toml = RuleDocument::load(fixture("site.toml")).unwrap();

    assert_eq!(yaml, json);
    assert_eq!(yaml, toml);
    yaml.validate().unwrap();
}

#[rstest]
#[case("site.yml")]
#[case("site.json")]
#[case("site.toml")]
fn test_fixture_applies_to_fresh_base(#[case] name: &str) {
    let tree = TestTree::new();
    let document = RuleDocument::load(fixture(name)).unwrap();

    let report = reconciler().run(document.rules(), tree.base()).unwrap();

    tree.assert_dir("srv/www");
    tree.assert_file_content("srv/www/index.html", "<h1>hello</h1>\n");
    tree.assert_file_content("run/app.pid", "");
    tree.assert_absent("srv/cache");
    assert_eq!(
        report.actions().iter().map(|a| a.kind.clone()).collect::<Vec<_>>(),
        vec![
            ActionKind::CreatedDirectory,
            ActionKind::CreatedDirectory,
            ActionKind::WroteFile,
            ActionKind::CreatedDirectory,
            ActionKind::CreatedEmptyFile,
        ]
    );
}

#[test]
fn test_formats_produce_identical_trees() {
    let trees: Vec<_> = ["site.yml", "site.json", "site.toml"]
        .into_iter()
        .map(|name| {
            let tree = TestTree::new();
            let document = RuleDocument::load(fixture(name)).unwrap();
            reconciler().run(document.rules(), tree.base()).unwrap();
            snapshot(&tree.base())
        })
        .collect();

    assert_eq!(trees[0], trees[1]);
    assert_eq!(trees[0], trees[2]);
}

#[test]
fn test_report_paths_are_resolved_targets() {
    let tree = TestTree::new();
    let document = RuleDocument::load(fixture("site.yml")).unwrap();

    let report = reconciler().run(document.rules(), tree.base()).unwrap();

    let base = NormalizedPath::new(tree.base());
    let expected: Vec<NormalizedPath> = ["srv", "srv/www", "srv/www/index.html", "run", "run/app.pid"]
        .into_iter()
        .map(|rel| base.join(rel))
        .collect();
    let actual: Vec<NormalizedPath> = report.actions().iter().map(|a| a.path.clone()).collect();
    assert_eq!(actual, expected);
}
