use predicates::prelude::*;
use spiral_cli::test_utils::TestTree;

use crate::common::{STATIC_FOO, UNVERSIONED_BAR, generate_json, spiral};

fn generated_tree() -> TestTree {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("foo", STATIC_FOO).unwrap();
    tree.add_descriptor("bar", UNVERSIONED_BAR).unwrap();
    spiral(&tree).arg("generate").assert().success();
    tree
}

#[test]
fn test_cache_list() {
    let tree = generated_tree();

    spiral(&tree)
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("foo 1.0"))
        .stdout(predicate::str::contains("bar 9999"));
}

#[test]
fn test_cache_list_empty() {
    let tree = TestTree::new().unwrap();

    spiral(&tree)
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No versions recorded"));
}

/// Removing an entry makes exactly that package regenerate
#[test]
fn test_cache_remove_forces_one_package() {
    let tree = generated_tree();

    spiral(&tree).args(["cache", "remove", "foo"]).assert().success();

    let report = generate_json(&tree, &[]);
    assert_eq!(report["summary"]["prepared"], 1);
    assert_eq!(report["summary"]["skipped"], 1);

    spiral(&tree)
        .args(["cache", "remove", "unknown"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No version recorded for 'unknown'"));
}

#[test]
fn test_cache_clear() {
    let tree = generated_tree();

    spiral(&tree).args(["cache", "clear"]).assert().success().stdout(predicate::str::contains("Cleared 2 entries"));

    let report = generate_json(&tree, &[]);
    assert_eq!(report["summary"]["prepared"], 2);
}
