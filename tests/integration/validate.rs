use predicates::prelude::*;
use spiral_cli::test_utils::TestTree;

use crate::common::{MISSING_DEPS, STATIC_FOO, UNVERSIONED_BAR, spiral};

/// All descriptors in the sources tree are valid
#[test]
fn test_validate_sources_tree() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("foo", STATIC_FOO).unwrap();
    tree.add_descriptor("bar.json", UNVERSIONED_BAR).unwrap();

    spiral(&tree)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("✓"))
        .stdout(predicate::str::contains("2 of 2 descriptors valid"));
}

/// One invalid descriptor fails the command and is named in the output
#[test]
fn test_validate_reports_invalid_descriptor() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("foo", STATIC_FOO).unwrap();
    tree.add_descriptor("broken", MISSING_DEPS).unwrap();

    spiral(&tree)
        .arg("validate")
        .assert()
        .failure()
        .stdout(predicate::str::contains("✗"))
        .stdout(predicate::str::contains("field 'deps' is required"))
        .stderr(predicate::str::contains("1 descriptor(s) failed validation"));
}

/// Explicit paths, including YAML and TOML descriptors
#[test]
fn test_validate_explicit_paths() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("foo.yaml", "name: foo\ndeps: [a, b]\n").unwrap();
    tree.add_descriptor("bar.toml", "name = \"bar\"\ndeps = []\n").unwrap();

    let output = spiral(&tree)
        .args(["validate", "--format", "json", "repo/packages/foo.yaml", "repo/packages/bar.toml"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let outcomes: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(outcomes[0]["name"], "foo");
    assert_eq!(outcomes[1]["name"], "bar");
}

/// Validation never writes output or cache
#[test]
fn test_validate_has_no_side_effects() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("foo", STATIC_FOO).unwrap();

    spiral(&tree).arg("validate").assert().success();
    assert!(!tree.output_dir().exists());
    assert!(!tree.cache_path().exists());
}

/// Grouping descriptors in subdirectories does not fail validation
#[test]
fn test_validate_nested_layout() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("libs/foo", STATIC_FOO).unwrap();
    tree.add_descriptor("utils/bar", UNVERSIONED_BAR).unwrap();

    spiral(&tree)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 of 2 descriptors valid"));
}
