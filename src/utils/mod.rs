//! Utility modules for Spiral
//!
//! - [`fs`] - directory copy, atomic writes, path expansion and safety checks
//! - [`progress`] - progress bars for generation runs

pub mod fs;
pub mod progress;

pub use fs::{atomic_write, copy_dir, ensure_dir, expand_path, remove_dir_all};
pub use progress::ProgressBar;
