//! File system utilities for Spiral
//!
//! - [`dirs`] - creating, copying (following symlinks) and removing directory trees
//! - [`atomic`] - temp-and-rename writes for the version cache
//! - [`paths`] - user path expansion and directory-name safety checks

pub mod atomic;
pub mod dirs;
pub mod paths;

pub use atomic::atomic_write;
pub use dirs::{copy_dir, ensure_dir, ensure_parent_dir, remove_dir_all};
pub use paths::{expand_path, is_safe_component};
