use predicates::prelude::*;
use spiral_cli::test_utils::TestTree;
use std::fs;

use crate::common::{MISSING_DEPS, STATIC_FOO, UNVERSIONED_BAR, generate_json, spiral};

/// A fresh run materializes every valid descriptor
#[test]
fn test_generate_materializes_packages() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("foo", STATIC_FOO).unwrap();
    tree.add_descriptor("bar.json", UNVERSIONED_BAR).unwrap();
    tree.add_template_file("autobuild/section", "@PKGSEC@\n").unwrap();

    spiral(&tree)
        .arg("generate")
        .assert()
        .success()
        .stderr(predicate::str::contains(">>> Generation start"))
        .stderr(predicate::str::contains("foo: prepared"))
        .stderr(predicate::str::contains(">>> Saving version log..."));

    assert_eq!(tree.read_package_file("foo", "spec").unwrap(), "VER=1.0\n");
    assert_eq!(
        tree.read_package_file("foo", "autobuild/defines").unwrap(),
        "PKGNAME=foo\nPKGDEP=\"libfoo1 libfoo-dev\"\nPKGDES=\"Empty package for Debiantai compatibility, foo tools\"\n"
    );
    assert_eq!(tree.read_package_file("bar", "spec").unwrap(), "VER=9999\n");
    assert_eq!(tree.read_package_file("bar", "autobuild/section").unwrap(), "utils\n");

    let cache: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tree.cache_path()).unwrap()).unwrap();
    assert_eq!(cache, serde_json::json!({"bar": "9999", "foo": "1.0"}));
}

/// A second run with nothing changed skips every package and keeps the cache
#[test]
fn test_second_run_skips_everything() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("foo", STATIC_FOO).unwrap();

    spiral(&tree).arg("generate").assert().success();
    let cache_before = fs::read_to_string(tree.cache_path()).unwrap();

    spiral(&tree)
        .arg("generate")
        .assert()
        .success()
        .stderr(predicate::str::contains("foo: no updates found, ignoring..."));
    assert_eq!(fs::read_to_string(tree.cache_path()).unwrap(), cache_before);
}

/// Deleting the output tree does not trigger regeneration while the cache is intact
#[test]
fn test_deleted_output_stays_skipped_until_forced() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("foo", STATIC_FOO).unwrap();

    spiral(&tree).arg("generate").assert().success();
    fs::remove_dir_all(tree.output_dir()).unwrap();

    let report = generate_json(&tree, &[]);
    assert_eq!(report["summary"]["skipped"], 1);
    assert!(!tree.package_dir("foo").exists());

    let report = generate_json(&tree, &["--force"]);
    assert_eq!(report["summary"]["prepared"], 1);
    assert!(tree.package_dir("foo").join("spec").exists());
}

/// A version change regenerates the package and updates the cache
#[test]
fn test_version_change_regenerates() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("foo", STATIC_FOO).unwrap();
    spiral(&tree).arg("generate").assert().success();

    tree.add_descriptor("foo", &STATIC_FOO.replace("\"1.0\"", "\"1.1\"")).unwrap();
    let report = generate_json(&tree, &[]);

    assert_eq!(report["items"][0]["outcome"], "prepared");
    assert_eq!(report["items"][0]["version"], "1.1");
    assert_eq!(tree.read_package_file("foo", "spec").unwrap(), "VER=1.1\n");
}

/// Invalid descriptors are omitted without failing the run
#[test]
fn test_invalid_descriptor_is_omitted() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("broken", MISSING_DEPS).unwrap();
    tree.add_descriptor("foo", STATIC_FOO).unwrap();

    let report = generate_json(&tree, &[]);

    assert_eq!(report["summary"]["prepared"], 1);
    assert_eq!(report["summary"]["omitted"], 1);
    assert_eq!(report["items"][0]["stage"], "validate");
    assert!(report["items"][0]["reason"].as_str().unwrap().contains("deps"));
    assert!(!tree.package_dir("broken").exists());

    let cache = fs::read_to_string(tree.cache_path()).unwrap();
    assert!(!cache.contains("broken"));
}

/// Without a template nothing is processed and the command fails
#[test]
fn test_missing_template_is_fatal() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("foo", STATIC_FOO).unwrap();
    fs::remove_dir_all(tree.template_dir()).unwrap();

    spiral(&tree)
        .arg("generate")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Template directory does not exist"));

    assert!(!tree.output_dir().exists());
    assert!(!tree.cache_path().exists());
}

/// --clean wipes packages that no longer have a descriptor
#[test]
fn test_clean_removes_stale_packages() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("foo", STATIC_FOO).unwrap();
    spiral(&tree).arg("generate").assert().success();

    let stale = tree.package_dir("old-package");
    fs::create_dir_all(&stale).unwrap();

    spiral(&tree).args(["generate", "--clean"]).assert().success();
    assert!(!stale.exists());
}

/// Path and category flags override the defaults
#[test]
fn test_path_flags() {
    let tree = TestTree::new().unwrap();
    let sources = tree.root.join("descriptors");
    fs::create_dir_all(&sources).unwrap();
    fs::write(sources.join("foo"), STATIC_FOO).unwrap();

    spiral(&tree)
        .args(["generate", "--sources", "descriptors", "--output", "out", "--category", "extra-test"])
        .args(["--cache", "state/versions.json"])
        .assert()
        .success();

    assert!(tree.root.join("out").join("extra-test").join("foo").join("spec").exists());
    assert!(tree.root.join("state").join("versions.json").exists());
}

/// Quiet mode keeps stdout for the report only
#[test]
fn test_quiet_json_report() {
    let tree = TestTree::new().unwrap();
    tree.add_descriptor("foo", STATIC_FOO).unwrap();

    let output = spiral(&tree)
        .args(["--quiet", "generate", "--format", "json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("prepared").not())
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["items"][0]["name"], "foo");
}
