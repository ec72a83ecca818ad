//! Common helpers for Spiral integration tests
//!
//! Tests build a throwaway checkout with [`TestTree`] and drive the real `spiral`
//! binary inside it, so every default path (`repo/packages`, `template`, `TREE`,
//! `versions.json`) resolves into the temporary directory.

// Not every test module uses every helper
#![allow(dead_code)]

use assert_cmd::Command;
use spiral_cli::test_utils::TestTree;

/// Static descriptor: no network access needed.
pub const STATIC_FOO: &str =
    r#"{"name": "foo", "deps": ["libfoo1", "libfoo-dev"], "description": "foo tools", "version": {"method": "static", "static": "1.0"}}"#;

/// Descriptor without version information, resolves to `9999`.
pub const UNVERSIONED_BAR: &str = r#"{"name": "bar", "deps": [], "PKGSEC": "utils"}"#;

/// Descriptor missing its `deps` field.
pub const MISSING_DEPS: &str = r#"{"name": "broken"}"#;

/// A `spiral` command running inside `tree` with a clean environment.
pub fn spiral(tree: &TestTree) -> Command {
    let mut cmd = Command::cargo_bin("spiral").unwrap();
    cmd.current_dir(&tree.root)
        .env_remove("SPIRAL_CONFIG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .env("SPIRAL_NO_PROGRESS", "1");
    cmd
}

/// Run `spiral generate --format json` and return the parsed report.
pub fn generate_json(tree: &TestTree, extra: &[&str]) -> serde_json::Value {
    let output = spiral(tree)
        .args(["generate", "--format", "json"])
        .args(extra)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).unwrap()
}
