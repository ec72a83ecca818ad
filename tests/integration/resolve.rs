use predicates::prelude::*;
use spiral_cli::test_utils::TestTree;

use crate::common::{MISSING_DEPS, STATIC_FOO, UNVERSIONED_BAR, spiral};

#[test]
fn test_resolve_static_and_unversioned() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("foo", STATIC_FOO).unwrap();
    tree.add_descriptor("bar", UNVERSIONED_BAR).unwrap();

    spiral(&tree)
        .args(["resolve", "repo/packages/foo"])
        .assert()
        .success()
        .stdout(predicate::str::diff("foo 1.0\n"));

    spiral(&tree)
        .args(["resolve", "repo/packages/bar", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"version\": \"9999\""));

    // Resolution alone never touches the cache
    assert!(!tree.cache_path().exists());
}

#[test]
fn test_resolve_invalid_descriptor() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("broken", MISSING_DEPS).unwrap();

    spiral(&tree)
        .args(["resolve", "repo/packages/broken"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("field 'deps' is required"));
}

#[test]
fn test_resolve_missing_file() {
    let tree = TestTree::new().unwrap();

    spiral(&tree)
        .args(["resolve", "repo/packages/nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read descriptor"));
}
