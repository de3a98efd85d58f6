//! Tests for the Reconciler against real temporary trees

use fsstate_core::{ActionKind, ApplyOptions, Reconciler, RuleDocument, RuleNode};
use fsstate_test_utils::{TestTree, snapshot};
use pretty_assertions::assert_eq;

fn reconciler() -> Reconciler {
    Reconciler::new(ApplyOptions::default())
}

fn kinds(report: &fsstate_core::ApplyReport) -> Vec<ActionKind> {
    report.actions().iter().map(|a| a.kind.clone()).collect()
}

#[test]
fn test_directory_creation_creates_ancestors() {
    let tree = TestTree::new();
    let rules = vec![RuleNode::directory("a/b/c")];

    let report = reconciler().apply(&rules, tree.base()).unwrap();

    tree.assert_dir("a");
    tree.assert_dir("a/b");
    tree.assert_dir("a/b/c");
    assert_eq!(kinds(&report), vec![ActionKind::CreatedDirectory]);
}

#[test]
fn test_directory_creation_with_existing_ancestor() {
    let tree = TestTree::new();
    tree.seed_dir("a");

    reconciler()
        .apply(&[RuleNode::directory("a/b/c")], tree.base())
        .unwrap();

    tree.assert_dir("a/b/c");
}

#[test]
fn test_existing_directory_is_not_an_action() {
    let tree = TestTree::new();
    tree.seed_dir("present");

    let report = reconciler()
        .apply(&[RuleNode::directory("present")], tree.base())
        .unwrap();

    assert!(report.is_empty());
}

#[test]
fn test_file_content_round_trip() {
    let tree = TestTree::new();
    let rules = vec![RuleNode::file("f.txt").with_content("hello")];

    let report = reconciler().apply(&rules, tree.base()).unwrap();

    tree.assert_file_content("f.txt", "hello");
    assert_eq!(kinds(&report), vec![ActionKind::WroteFile]);
}

#[test]
fn test_file_content_overwrites_and_truncates() {
    let tree = TestTree::new();
    tree.seed_file("f.txt", "a much longer previous body\n");

    reconciler()
        .apply(&[RuleNode::file("f.txt").with_content("hello")], tree.base())
        .unwrap();

    tree.assert_file_content("f.txt", "hello");
}

#[test]
fn test_empty_content_empties_file() {
    let tree = TestTree::new();
    tree.seed_file("f.txt", "stale");

    reconciler()
        .apply(&[RuleNode::file("f.txt").with_content("")], tree.base())
        .unwrap();

    tree.assert_file_content("f.txt", "");
}

#[test]
fn test_file_without_content_is_created_empty() {
    let tree = TestTree::new();

    let report = reconciler()
        .apply(&[RuleNode::file("touched")], tree.base())
        .unwrap();

    tree.assert_file_content("touched", "");
    assert_eq!(kinds(&report), vec![ActionKind::CreatedEmptyFile]);
}

#[test]
fn test_file_without_content_leaves_existing_content() {
    let tree = TestTree::new();
    tree.seed_file("keep.txt", "user data");

    let report = reconciler()
        .apply(&[RuleNode::file("keep.txt")], tree.base())
        .unwrap();

    tree.assert_file_content("keep.txt", "user data");
    assert!(report.is_empty());
}

#[test]
fn test_absent_directory_removes_exactly_the_target() {
    let tree = TestTree::new();
    tree.seed_file("d/inner/deep.txt", "x");
    tree.seed_file("d/top.txt", "y");
    tree.seed_file("sibling/keep.txt", "z");
    tree.seed_file("d-suffix.txt", "w");

    let report = reconciler()
        .apply(&[RuleNode::directory("d").absent()], tree.base())
        .unwrap();

    tree.assert_absent("d");
    tree.assert_file_content("sibling/keep.txt", "z");
    tree.assert_file_content("d-suffix.txt", "w");
    assert_eq!(kinds(&report), vec![ActionKind::RemovedDirectory]);
}

#[test]
fn test_absent_missing_entries_are_noops() {
    let tree = TestTree::new();
    let rules = vec![
        RuleNode::directory("nope").absent(),
        RuleNode::file("nope.txt").absent(),
    ];

    let report = reconciler().apply(&rules, tree.base()).unwrap();
    assert!(report.is_empty());
}

#[test]
fn test_absent_file_is_removed() {
    let tree = TestTree::new();
    tree.seed_file("old.log", "x");

    let report = reconciler()
        .apply(&[RuleNode::file("old.log").absent()], tree.base())
        .unwrap();

    tree.assert_absent("old.log");
    assert_eq!(kinds(&report), vec![ActionKind::RemovedFile]);
}

#[test]
fn test_recursion_scopes_children_to_parent() {
    let tree = TestTree::new();
    let rules = vec![RuleNode::directory("parent").with_children(vec![
        RuleNode::directory("x"),
        RuleNode::file("y").with_content("why"),
    ])];

    reconciler().apply(&rules, tree.base()).unwrap();

    tree.assert_dir("parent/x");
    tree.assert_file_content("parent/y", "why");
    tree.assert_absent("x");
    tree.assert_absent("y");
}

#[test]
fn test_children_ignored_without_recurse() {
    let tree = TestTree::new();
    let mut rule = RuleNode::directory("parent").with_children(vec![RuleNode::directory("x")]);
    rule.recurse = false;

    reconciler().apply(&[rule], tree.base()).unwrap();

    tree.assert_dir("parent");
    tree.assert_absent("parent/x");
}

#[test]
fn test_file_rule_children_have_no_effect() {
    let tree = TestTree::new();
    let rule = RuleNode::file("f").with_children(vec![RuleNode::directory("x")]);

    reconciler().apply(&[rule], tree.base()).unwrap();

    tree.assert_file("f");
    tree.assert_absent("x");
}

#[test]
fn test_nested_recursion_runs_depth_first_before_siblings() {
    let tree = TestTree::new();
    let rules = vec![
        RuleNode::directory("a").with_children(vec![
            RuleNode::directory("b").with_children(vec![RuleNode::file("c.txt").with_content("c")]),
        ]),
        RuleNode::file("after.txt").with_content("after"),
    ];

    let report = reconciler().apply(&rules, tree.base()).unwrap();

    let paths: Vec<String> = report
        .actions()
        .iter()
        .map(|a| {
            a.path
                .as_str()
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string()
        })
        .collect();
    assert_eq!(paths, vec!["a", "b", "c.txt", "after.txt"]);
}

#[test]
fn test_order_directory_then_file_succeeds() {
    let tree = TestTree::new();
    let rules = vec![
        RuleNode::directory("p"),
        RuleNode::file("p/q.txt").with_content("q"),
    ];

    reconciler().apply(&rules, tree.base()).unwrap();

    tree.assert_file_content("p/q.txt", "q");
}

#[test]
fn test_idempotent_second_pass_takes_no_actions() {
    let tree = TestTree::new();
    let rules = RuleDocument::from_yaml_str(
        r#"
- path: app
  file_type: directory
  mode: "0750"
  recurse: true
  children:
    - path: conf
      file_type: directory
    - path: conf/settings.ini
      content: "[core]\nlevel = 1\n"
      mode: "0640"
    - path: run
      file_type: directory
- path: stale
  file_type: directory
  state: absent
- path: marker
"#,
    )
    .unwrap();
    tree.seed_file("stale/junk", "x");

    let first = reconciler().apply(rules.rules(), tree.base()).unwrap();
    let after_first = snapshot(&tree.base());

    let second = reconciler().apply(rules.rules(), tree.base()).unwrap();
    let after_second = snapshot(&tree.base());

    assert!(!first.is_empty());
    assert!(second.is_empty(), "second pass acted: {:?}", second.actions());
    assert_eq!(after_first, after_second);
}

#[test]
fn test_run_creates_missing_base() {
    let tree = TestTree::new();
    let base = tree.root().join("fresh/base");

    let report = reconciler()
        .run(&[RuleNode::file("f.txt").with_content("x")], &base)
        .unwrap();

    assert!(base.join("f.txt").is_file());
    assert_eq!(
        kinds(&report),
        vec![ActionKind::CreatedDirectory, ActionKind::WroteFile]
    );
}

#[test]
fn test_run_with_existing_base_records_nothing_for_it() {
    let tree = TestTree::new();

    let report = reconciler().run(&[], tree.base()).unwrap();
    assert!(report.is_empty());
}

#[cfg(unix)]
mod unix {
    use super::*;
    use fsstate_test_utils::is_root;
    use pretty_assertions::assert_eq;
    use std::os::unix::fs::{MetadataExt, symlink};

    #[test]
    fn test_mode_is_applied_after_creation() {
        let tree = TestTree::new();
        let rules = vec![
            RuleNode::directory("bin").with_mode("0700"),
            RuleNode::file("bin/tool").with_content("#!/bin/sh\n").with_mode("0755"),
        ];

        let report = reconciler().apply(&rules, tree.base()).unwrap();

        assert_eq!(tree.mode_of("bin"), 0o700);
        assert_eq!(tree.mode_of("bin/tool"), 0o755);
        assert!(
            report
                .actions()
                .iter()
                .any(|a| matches!(a.kind, ActionKind::ChangedMode(_)))
        );
    }

    #[test]
    fn test_rewrite_keeps_existing_mode() {
        let tree = TestTree::new();
        let rules = vec![RuleNode::file("script").with_content("v1").with_mode("0750")];
        reconciler().apply(&rules, tree.base()).unwrap();

        let updated = vec![RuleNode::file("script").with_content("v2")];
        reconciler().apply(&updated, tree.base()).unwrap();

        tree.assert_file_content("script", "v2");
        assert_eq!(tree.mode_of("script"), 0o750);
    }

    #[test]
    fn test_mode_is_skipped_for_absent_rules() {
        let tree = TestTree::new();
        let rules = vec![RuleNode::file("gone").absent().with_mode("0600")];

        let report = reconciler().apply(&rules, tree.base()).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_malformed_mode_is_ignored_for_absent_rules() {
        let tree = TestTree::new();
        tree.seed_file("old.txt", "stale");
        let rules = vec![
            RuleNode::file("old.txt").absent().with_mode("abc"),
            RuleNode::directory("after"),
        ];

        let report = reconciler().apply(&rules, tree.base()).unwrap();

        tree.assert_absent("old.txt");
        tree.assert_dir("after");
        assert_eq!(
            kinds(&report),
            vec![ActionKind::RemovedFile, ActionKind::CreatedDirectory]
        );
    }

    #[test]
    fn test_current_ownership_is_not_an_action() {
        let tree = TestTree::new();
        let meta = std::fs::metadata(tree.base()).unwrap();
        let rules = vec![
            RuleNode::directory("owned").with_owner(meta.uid().to_string(), meta.gid().to_string()),
        ];

        let report = reconciler().apply(&rules, tree.base()).unwrap();
        assert_eq!(kinds(&report), vec![ActionKind::CreatedDirectory]);
    }

    #[test]
    fn test_absent_directory_symlink_removes_only_the_link() {
        let tree = TestTree::new();
        let outside = tree.root().join("outside");
        std::fs::create_dir(&outside).unwrap();
        std::fs::write(outside.join("precious"), "keep").unwrap();
        symlink(&outside, tree.path("link")).unwrap();

        let report = reconciler()
            .apply(&[RuleNode::directory("link").absent()], tree.base())
            .unwrap();

        tree.assert_absent("link");
        assert!(outside.join("precious").is_file());
        assert_eq!(kinds(&report), vec![ActionKind::RemovedSymlink]);
    }

    #[test]
    fn test_content_rule_writes_through_symlink() {
        let tree = TestTree::new();
        tree.seed_file("shared/app.conf", "old");
        symlink("shared/app.conf", tree.path("app.conf")).unwrap();

        let report = reconciler()
            .apply(&[RuleNode::file("app.conf").with_content("new")], tree.base())
            .unwrap();

        assert!(
            std::fs::symlink_metadata(tree.path("app.conf"))
                .unwrap()
                .file_type()
                .is_symlink()
        );
        tree.assert_file_content("shared/app.conf", "new");
        assert_eq!(kinds(&report), vec![ActionKind::WroteFile]);
    }

    #[test]
    fn test_content_rewrite_keeps_foreign_owner() {
        if !is_root() {
            eprintln!("Skipping test: handing files to another uid needs root");
            return;
        }
        let tree = TestTree::new();
        tree.seed_file("svc.conf", "v1");
        std::os::unix::fs::chown(tree.path("svc.conf"), Some(4242), Some(4343)).unwrap();

        reconciler()
            .apply(&[RuleNode::file("svc.conf").with_content("v2")], tree.base())
            .unwrap();

        tree.assert_file_content("svc.conf", "v2");
        let meta = std::fs::metadata(tree.path("svc.conf")).unwrap();
        assert_eq!((meta.uid(), meta.gid()), (4242, 4343));
    }
}
