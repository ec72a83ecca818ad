//! Template materialization
//!
//! A package's output directory is produced by copying the whole template tree and then
//! rewriting every file in it with the package's placeholder map (see
//! [`crate::descriptor::ResolvedPackage::variables`]).
//!
//! # Two-phase replace
//!
//! [`materialize`] never writes into the live package directory:
//!
//! 1. the template is copied into a fresh staging directory next to `output_path`;
//! 2. every file in the staging copy is substituted in place;
//! 3. only then is the previous package directory (if any) removed and the staging
//!    directory renamed into its place.
//!
//! A failure in steps 1 or 2, or in removing the previous directory, leaves the previous
//! package directory untouched and the staging directory is cleaned up automatically. The
//! removal and the rename are two separate filesystem calls: if the rename fails after
//! the removal succeeded, `output_path` is left absent.
//!
//! # Examples
//!
//! ```rust,no_run
//! use spiral_cli::templating::materialize;
//! use std::collections::BTreeMap;
//! use std::path::Path;
//!
//! let mut vars = BTreeMap::new();
//! vars.insert("NAME".to_string(), "foo".to_string());
//! vars.insert("VER".to_string(), "1.0".to_string());
//!
//! materialize(Path::new("template"), Path::new("TREE/extra-spiral/foo"), &vars)?;
//! # Ok::<(), spiral_cli::templating::MaterializationError>(())
//! ```

mod error;
mod substitute;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::utils::fs::{copy_dir, ensure_dir, remove_dir_all};

pub use error::MaterializationError;
pub use substitute::{Substitution, substitute};

/// Copy `template_root` to `output_path` and substitute `variables` into every file.
///
/// Any existing directory at `output_path` is replaced as a whole.
///
/// # Errors
///
/// See [`MaterializationError`]. Every error other than
/// [`MaterializationError::ReplaceFailed`] leaves the previous contents of `output_path`
/// as they were. `ReplaceFailed` from the final rename means the previous directory is
/// already gone and `output_path` does not exist.
pub fn materialize(
    template_root: &Path,
    output_path: &Path,
    variables: &BTreeMap<String, String>,
) -> Result<(), MaterializationError> {
    if !template_root.is_dir() {
        return Err(MaterializationError::TemplateMissing {
            path: template_root.to_path_buf(),
        });
    }

    let substitution = Substitution::new(variables).map_err(|e| {
        MaterializationError::InvalidVariables {
            reason: e.to_string(),
        }
    })?;

    let parent = output_path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let copy_failed = |reason: String| MaterializationError::CopyFailed {
        path: output_path.to_path_buf(),
        reason,
    };

    ensure_dir(parent).map_err(|e| copy_failed(format!("{e:#}")))?;
    let staging = tempfile::Builder::new()
        .prefix(".spiral-staging-")
        .tempdir_in(parent)
        .map_err(|e| copy_failed(format!("cannot create staging directory: {e}")))?;

    debug!("Staging {} in {}", output_path.display(), staging.path().display());
    copy_dir(template_root, staging.path()).map_err(|e| copy_failed(format!("{e:#}")))?;
    substitute_tree(staging.path(), output_path, &substitution)?;

    let replace_failed = |reason: String| MaterializationError::ReplaceFailed {
        path: output_path.to_path_buf(),
        reason,
    };
    remove_dir_all(output_path).map_err(|e| replace_failed(format!("{e:#}")))?;
    fs::rename(staging.path(), output_path).map_err(|e| replace_failed(e.to_string()))?;
    // The staging directory has been moved, dropping the handle has nothing left to remove
    drop(staging);

    Ok(())
}

/// Substitute every regular file under `root` in place.
///
/// `reported_root` replaces `root` in error paths, so errors name the final output
/// location rather than the staging directory.
fn substitute_tree(
    root: &Path,
    reported_root: &Path,
    substitution: &Substitution<'_>,
) -> Result<(), MaterializationError> {
    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|e| MaterializationError::CopyFailed {
            path: reported_root.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let reported = reported_root.join(path.strip_prefix(root).unwrap_or(path));

        let content = fs::read_to_string(path).map_err(|e| MaterializationError::UnreadableFile {
            path: reported.clone(),
            reason: e.to_string(),
        })?;

        let rendered = substitution.apply(&content);
        if rendered != content {
            fs::write(path, rendered.as_bytes()).map_err(|e| MaterializationError::WriteFailed {
                path: reported,
                reason: e.to_string(),
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    fn template(root: &Path) {
        fs::create_dir_all(root.join("autobuild")).unwrap();
        fs::write(root.join("spec"), "VER=@VER@\n").unwrap();
        fs::write(root.join("autobuild").join("defines"), "PKGNAME=@NAME@\nPKGDEP=\"@DEPS@\"\n").unwrap();
    }

    #[test]
    fn test_materialize_substitutes_every_file() {
        let temp = TempDir::new().unwrap();
        let tpl = temp.path().join("template");
        template(&tpl);
        let out = temp.path().join("TREE").join("extra-spiral").join("foo");

        materialize(&tpl, &out, &vars(&[("NAME", "foo"), ("VER", "1.0"), ("DEPS", "a b")])).unwrap();

        assert_eq!(fs::read_to_string(out.join("spec")).unwrap(), "VER=1.0\n");
        assert_eq!(
            fs::read_to_string(out.join("autobuild").join("defines")).unwrap(),
            "PKGNAME=foo\nPKGDEP=\"a b\"\n"
        );
        // Template itself is untouched
        assert_eq!(fs::read_to_string(tpl.join("spec")).unwrap(), "VER=@VER@\n");
    }

    #[test]
    fn test_round_trip_exact_output() {
        let temp = TempDir::new().unwrap();
        let tpl = temp.path().join("template");
        fs::create_dir_all(&tpl).unwrap();
        fs::write(tpl.join("f"), "@NAME@-@VER@").unwrap();
        let out = temp.path().join("out");

        materialize(&tpl, &out, &vars(&[("NAME", "foo"), ("VER", "1.0")])).unwrap();
        assert_eq!(fs::read_to_string(out.join("f")).unwrap(), "foo-1.0");
    }

    #[test]
    fn test_existing_output_is_replaced() {
        let temp = TempDir::new().unwrap();
        let tpl = temp.path().join("template");
        template(&tpl);
        let out = temp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("stale"), "old").unwrap();

        materialize(&tpl, &out, &vars(&[("NAME", "foo")])).unwrap();

        assert!(!out.join("stale").exists());
        assert!(out.join("spec").exists());
    }

    #[test]
    fn test_failed_removal_keeps_previous_output() {
        let temp = TempDir::new().unwrap();
        let tpl = temp.path().join("template");
        template(&tpl);
        // A regular file where the package directory belongs cannot be removed as a directory
        let out = temp.path().join("out");
        fs::write(&out, "not a directory").unwrap();

        let err = materialize(&tpl, &out, &vars(&[("NAME", "foo")])).unwrap_err();
        assert!(matches!(err, MaterializationError::ReplaceFailed { ref path, .. } if path == &out));

        assert_eq!(fs::read_to_string(&out).unwrap(), "not a directory");
        let leftovers = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(".spiral-staging-"))
            .count();
        assert_eq!(leftovers, 0, "staging directory was not cleaned up");
    }

    #[test]
    fn test_binary_file_is_unreadable_and_keeps_previous_output() {
        let temp = TempDir::new().unwrap();
        let tpl = temp.path().join("template");
        template(&tpl);
        fs::write(tpl.join("logo.png"), [0x89, b'P', b'N', b'G', 0xff, 0xfe, 0x00]).unwrap();
        let out = temp.path().join("out");
        fs::create_dir_all(&out).unwrap();
        fs::write(out.join("previous"), "kept").unwrap();

        let err = materialize(&tpl, &out, &vars(&[("NAME", "foo")])).unwrap_err();
        match err {
            MaterializationError::UnreadableFile {
                path,
                ..
            } => assert_eq!(path, out.join("logo.png")),
            other => panic!("Expected UnreadableFile, got {other:?}"),
        }

        assert_eq!(fs::read_to_string(out.join("previous")).unwrap(), "kept");
        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(".spiral-staging-"))
            .collect();
        assert!(leftovers.is_empty(), "staging directory was not cleaned up");
    }

    #[test]
    fn test_missing_template() {
        let temp = TempDir::new().unwrap();
        let err = materialize(&temp.path().join("nope"), &temp.path().join("out"), &BTreeMap::new()).unwrap_err();
        assert!(matches!(err, MaterializationError::TemplateMissing { .. }));
    }

    #[test]
    fn test_empty_variables_copy_verbatim() {
        let temp = TempDir::new().unwrap();
        let tpl = temp.path().join("template");
        template(&tpl);
        let out = temp.path().join("out");

        materialize(&tpl, &out, &BTreeMap::new()).unwrap();
        assert_eq!(fs::read_to_string(out.join("spec")).unwrap(), "VER=@VER@\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_permissions_survive_substitution() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let tpl = temp.path().join("template");
        fs::create_dir_all(&tpl).unwrap();
        let script = tpl.join("build");
        fs::write(&script, "#!/bin/sh\necho @NAME@\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        let out = temp.path().join("out");

        materialize(&tpl, &out, &vars(&[("NAME", "foo")])).unwrap();

        let mode = fs::metadata(out.join("build")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
        assert_eq!(fs::read_to_string(out.join("build")).unwrap(), "#!/bin/sh\necho foo\n");
    }
}
