//! Materialization error types.

use std::path::PathBuf;

use thiserror::Error;

/// Failure while copying a template or substituting its placeholders
///
/// Paths refer to the final output location of the package, even though the work
/// happens in a staging directory next to it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaterializationError {
    /// The template root is not a directory
    #[error("template directory {} does not exist", .path.display())]
    TemplateMissing {
        /// The template root that was requested
        path: PathBuf,
    },

    /// Copying the template tree failed
    #[error("failed to copy template into {}: {reason}", .path.display())]
    CopyFailed {
        /// Destination of the copy
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// A file could not be read as UTF-8 text
    ///
    /// Template files are always treated as text; a binary file in the template
    /// ends up here and aborts the package.
    #[error("cannot read {} as text: {reason}", .path.display())]
    UnreadableFile {
        /// The offending file
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// A substituted file could not be written back
    #[error("failed to write {}: {reason}", .path.display())]
    WriteFailed {
        /// The file being written
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// The previous package directory could not be replaced
    #[error("failed to replace {}: {reason}", .path.display())]
    ReplaceFailed {
        /// The package directory
        path: PathBuf,
        /// Underlying failure
        reason: String,
    },

    /// The variable map could not be turned into a placeholder matcher
    #[error("invalid template variables: {reason}")]
    InvalidVariables {
        /// Underlying failure
        reason: String,
    },
}
