//! Path helpers: user path expansion and path-component safety checks.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

/// Expand `~` and `$VAR` / `${VAR}` references in a user-supplied path.
///
/// # Errors
///
/// Fails when the path references an unset environment variable or the home
/// directory cannot be determined.
///
/// # Examples
///
/// ```rust,no_run
/// use spiral_cli::utils::fs::expand_path;
///
/// # fn example() -> anyhow::Result<()> {
/// let cache = expand_path("~/.local/state/spiral/versions.json")?;
/// # Ok(())
/// # }
/// ```
pub fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded =
        shellexpand::full(path).with_context(|| format!("Failed to expand path: {path}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Whether `name` is usable as exactly one directory entry name.
///
/// Rejects empty names, `.` and `..`, absolute paths, and anything containing a
/// path separator, so joining the name onto a directory can never escape it.
#[must_use]
pub fn is_safe_component(name: &str) -> bool {
    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return false;
    }

    let mut components = Path::new(name).components();
    matches!((components.next(), components.next()), (Some(Component::Normal(_)), None))
}
