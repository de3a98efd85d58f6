//! Scenario tests
//!
//! Each test starts from a seeded base directory that has drifted from the
//! rules and checks what a pass changes, what it leaves alone, and what a
//! second pass does.

use fsstate_core::{ActionKind, ApplyOptions, Error, Reconciler, RuleDocument, RuleNode};
use fsstate_test_utils::{SnapshotEntry, TestTree, snapshot};
use pretty_assertions::assert_eq;

fn reconciler() -> Reconciler {
    Reconciler::new(ApplyOptions::default())
}

fn site_rules() -> RuleDocument {
    RuleDocument::from_yaml_str(
        r#"
- path: srv
  file_type: directory
  recurse: true
  children:
    - path: www
      file_type: directory
    - path: www/index.html
      content: "<h1>hello</h1>\n"
    - path: cache
      file_type: directory
      state: absent
- path: srv/www/old.html
  state: absent
- path: run
  file_type: directory
- path: run/app.pid
"#,
    )
    .unwrap()
}

// =============================================================================
// Drift repair
// =============================================================================

#[test]
fn test_drifted_tree_is_repaired_and_unmanaged_entries_survive() {
    let tree = TestTree::new();
    tree.seed_file("srv/www/index.html", "<h1>stale</h1>\n");
    tree.seed_file("srv/www/old.html", "old");
    tree.seed_file("srv/cache/a/b.bin", "cached");
    tree.seed_file("srv/www/unmanaged.css", "body{}");
    tree.seed_file("run/app.pid", "4242\n");
    tree.seed_outside("neighbour.txt", "outside");

    let report = reconciler().apply(site_rules().rules(), tree.base()).unwrap();

    tree.assert_file_content("srv/www/index.html", "<h1>hello</h1>\n");
    tree.assert_absent("srv/www/old.html");
    tree.assert_absent("srv/cache");
    tree.assert_file_content("srv/www/unmanaged.css", "body{}");
    tree.assert_file_content("run/app.pid", "4242\n");
    assert_eq!(
        std::fs::read_to_string(tree.root().join("neighbour.txt")).unwrap(),
        "outside"
    );
    assert_eq!(
        report.actions().iter().map(|a| a.kind.clone()).collect::<Vec<_>>(),
        vec![
            ActionKind::WroteFile,
            ActionKind::RemovedDirectory,
            ActionKind::RemovedFile,
        ]
    );
}

#[test]
fn test_repaired_tree_is_stable() {
    let tree = TestTree::new();
    tree.seed_file("srv/cache/junk", "x");
    tree.seed_file("srv/www/old.html", "old");
    let rules = site_rules();

    reconciler().apply(rules.rules(), tree.base()).unwrap();
    let repaired = snapshot(&tree.base());

    for _ in 0..3 {
        let report = reconciler().apply(rules.rules(), tree.base()).unwrap();
        assert!(report.is_empty(), "unexpected actions: {:?}", report.actions());
    }
    assert_eq!(snapshot(&tree.base()), repaired);
}

#[test]
fn test_content_drift_is_detected_byte_for_byte() {
    let tree = TestTree::new();
    let rules = site_rules();
    reconciler().apply(rules.rules(), tree.base()).unwrap();

    // Same length, one byte different.
    tree.seed_file("srv/www/index.html", "<h1>hellO</h1>\n");

    let report = reconciler().apply(rules.rules(), tree.base()).unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.actions()[0].kind, ActionKind::WroteFile);
    tree.assert_file_content("srv/www/index.html", "<h1>hello</h1>\n");
}

// =============================================================================
// Fail-fast and recovery
// =============================================================================

#[test]
fn test_failed_pass_keeps_earlier_changes_and_fixed_rules_finish_the_job() {
    let tree = TestTree::new();
    let mut rules = site_rules().into_rules();
    rules.insert(2, RuleNode::file("run/too-early").with_content("x"));

    let err = reconciler().apply(&rules, tree.base()).unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "got {err:?}");

    let partial = snapshot(&tree.base());
    assert!(matches!(partial.get("srv/www/index.html"), Some(SnapshotEntry::File { .. })));
    assert!(!partial.contains_key("run"));

    rules.remove(2);
    let report = reconciler().apply(&rules, tree.base()).unwrap();

    assert_eq!(
        report.actions().iter().map(|a| a.kind.clone()).collect::<Vec<_>>(),
        vec![ActionKind::CreatedDirectory, ActionKind::CreatedEmptyFile]
    );
}

#[test]
fn test_kind_conflict_needs_an_explicit_absent_rule() {
    let tree = TestTree::new();
    tree.seed_file("run", "not a directory");
    let rules = site_rules();

    let err = reconciler().apply(rules.rules(), tree.base()).unwrap_err();
    assert!(matches!(err, Error::KindConflict { .. }), "got {err:?}");
    tree.assert_file_content("run", "not a directory");

    let mut fixed = vec![RuleNode::file("run").absent()];
    fixed.extend(rules.into_rules());
    reconciler().apply(&fixed, tree.base()).unwrap();

    tree.assert_dir("run");
    tree.assert_file_content("run/app.pid", "");
}
