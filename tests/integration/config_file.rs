use predicates::prelude::*;
use spiral_cli::config::GeneratorConfig;
use spiral_cli::test_utils::TestTree;
use std::fs;

use crate::common::{STATIC_FOO, spiral};

/// ./spiral.toml is picked up automatically
#[test]
fn test_implicit_config_file() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("foo", STATIC_FOO).unwrap();
    fs::write(tree.root.join("spiral.toml"), "category = \"extra-custom\"\n").unwrap();

    spiral(&tree).arg("generate").assert().success();
    assert!(tree.output_dir().join("extra-custom").join("foo").exists());
}

/// --config and SPIRAL_CONFIG name a file anywhere
#[test]
fn test_explicit_config_file() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("foo", STATIC_FOO).unwrap();
    let config = GeneratorConfig {
        category: "extra-explicit".to_string(),
        ..tree.config()
    };
    let path = tree.write_config(&config).unwrap();
    let moved = tree.root.join("conf").join("generator.toml");
    fs::create_dir_all(moved.parent().unwrap()).unwrap();
    fs::rename(&path, &moved).unwrap();

    spiral(&tree).arg("--config").arg(&moved).arg("generate").assert().success();
    assert!(tree.output_dir().join("extra-explicit").join("foo").exists());

    fs::remove_dir_all(tree.output_dir()).unwrap();
    spiral(&tree).env("SPIRAL_CONFIG", &moved).args(["generate", "--force"]).assert().success();
    assert!(tree.output_dir().join("extra-explicit").join("foo").exists());
}

#[test]
fn test_missing_explicit_config_is_fatal() {
    let tree = TestTree::new().unwrap();

    spiral(&tree)
        .args(["--config", "nope.toml", "generate"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Configuration file not found: nope.toml"));
}

#[test]
fn test_invalid_config_is_fatal() {
    let tree = TestTree::new().unwrap();
    fs::write(tree.root.join("spiral.toml"), "record_policy = \"sometimes\"\n").unwrap();

    spiral(&tree)
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}
