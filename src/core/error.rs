//! Error handling for Spiral
//!
//! This module provides the crate-wide error type and user-friendly error reporting for
//! the `spiral` binary. The error system follows two principles:
//! 1. **Strongly-typed errors** for precise handling in code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! Each core component owns a focused error enum:
//! - [`ValidationError`] - descriptor parsing and validation ([`crate::descriptor`])
//! - [`ResolutionError`] - version resolution ([`crate::version`])
//! - [`MaterializationError`] - template copy and substitution ([`crate::templating`])
//!
//! [`SpiralError`] wraps all of them together with configuration failures, and
//! [`ErrorContext`] adds the details and suggestions shown by the CLI.
//!
//! # Fatal vs. per-item errors
//!
//! Only configuration errors ([`SpiralError::TemplateNotFound`],
//! [`SpiralError::ConfigFileNotFound`], [`SpiralError::ConfigError`]) abort a run. Every
//! other variant is caught by [`crate::generator::Generator`] at the item boundary and
//! reported as an omitted package.
//!
//! # Examples
//!
//! ```rust,no_run
//! use spiral_cli::core::{SpiralError, user_friendly_error};
//!
//! let error = SpiralError::TemplateNotFound {
//!     path: "template".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

pub use crate::descriptor::ValidationError;
pub use crate::templating::MaterializationError;
pub use crate::version::ResolutionError;

/// The main error type for Spiral operations
///
/// # Error Categories
///
/// ## Configuration (fatal)
/// - [`TemplateNotFound`] - the template directory is missing
/// - [`ConfigFileNotFound`] - an explicitly requested config file is missing
/// - [`ConfigError`] - the config file could not be parsed or is inconsistent
///
/// ## Per-item pipeline
/// - [`DescriptorUnreadable`] - a descriptor candidate could not be read
/// - [`Validation`] - the descriptor is malformed or incomplete
/// - [`Resolution`] - no version could be resolved
/// - [`Materialization`] - the package tree could not be written
///
/// ## Other
/// - [`Other`] - messages rebuilt from foreign errors by [`user_friendly_error`]
///
/// [`TemplateNotFound`]: SpiralError::TemplateNotFound
/// [`ConfigFileNotFound`]: SpiralError::ConfigFileNotFound
/// [`ConfigError`]: SpiralError::ConfigError
/// [`DescriptorUnreadable`]: SpiralError::DescriptorUnreadable
/// [`Validation`]: SpiralError::Validation
/// [`Resolution`]: SpiralError::Resolution
/// [`Materialization`]: SpiralError::Materialization
/// [`Other`]: SpiralError::Other
#[derive(Error, Debug, Clone)]
pub enum SpiralError {
    /// The template directory does not exist
    ///
    /// Nothing can be generated without a template, so this error is raised before
    /// any descriptor is read.
    #[error("Template directory does not exist: {path}")]
    TemplateNotFound {
        /// The configured template path
        path: String,
    },

    /// A configuration file named on the command line or via `SPIRAL_CONFIG` is missing
    #[error("Configuration file not found: {path}")]
    ConfigFileNotFound {
        /// The path that was requested
        path: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// A descriptor candidate could not be read from disk
    ///
    /// Directories inside the sources tree end up here as well, because every entry of
    /// the tree is treated as a candidate.
    #[error("Cannot read descriptor {path}: {reason}")]
    DescriptorUnreadable {
        /// The candidate path
        path: String,
        /// The underlying I/O failure
        reason: String,
    },

    /// Descriptor validation failed
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Version resolution failed
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// Template materialization failed
    #[error(transparent)]
    Materialization(#[from] MaterializationError),

    /// Generic error for cases not covered by specific variants
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

impl SpiralError {
    /// Whether this error must abort the whole run rather than a single item.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::TemplateNotFound { .. } | Self::ConfigFileNotFound { .. } | Self::ConfigError { .. }
        )
    }
}

/// Error wrapper carrying user-facing details and a suggestion
///
/// # Examples
///
/// ```rust,no_run
/// use spiral_cli::core::{ErrorContext, SpiralError};
///
/// let ctx = ErrorContext::new(SpiralError::ConfigError {
///     message: "unknown fallback policy".to_string(),
/// })
/// .with_suggestion("Use one of: newest, latest-only, never")
/// .with_details("The fallback policy controls which Repology record wins");
///
/// ctx.display();
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying Spiral error
    pub error: SpiralError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: SpiralError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    ///
    /// Suggestions are displayed in green so they stand out from the error itself.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`SpiralError`] (directly or anywhere in the `anyhow` context chain) and
/// [`std::io::Error`]; everything else is shown with its full context chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(spiral_error) = error.chain().find_map(|e| e.downcast_ref::<SpiralError>()) {
        return create_error_context(spiral_error.clone());
    }

    if let Some(io_error) = error.chain().find_map(|e| e.downcast_ref::<std::io::Error>()) {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(SpiralError::Other {
                    message: format!("{error:#}"),
                })
                .with_suggestion("Check the ownership and permissions of the sources, template and output directories")
                .with_details("Spiral needs read access to descriptors and the template, and write access to the output tree and version cache");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(SpiralError::Other {
                    message: format!("{error:#}"),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    ErrorContext::new(SpiralError::Other {
        message: format!("{error:#}"),
    })
}

/// Attach the suggestion and details appropriate for each [`SpiralError`] variant.
fn create_error_context(error: SpiralError) -> ErrorContext {
    match &error {
        SpiralError::TemplateNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Create the template directory or point to it with --template / `template = \"...\"` in spiral.toml")
            .with_details("Every generated package is a copy of the template tree, so generation cannot start without it"),

        SpiralError::ConfigFileNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check the path passed with --config or the SPIRAL_CONFIG environment variable"),

        SpiralError::ConfigError {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Check spiral.toml for syntax errors and unknown values")
            .with_details("Valid fallback policies: newest, latest-only, never. Valid record policies: on-resolve, on-success"),

        SpiralError::Validation(_) => ErrorContext::new(error)
            .with_suggestion("Descriptors must be objects with a string 'name' and a list 'deps'"),

        SpiralError::Resolution(ResolutionError::LookupFailed {
            ..
        }) => ErrorContext::new(error)
            .with_suggestion("Check your internet connection, or raise lookup_timeout_secs in spiral.toml"),

        SpiralError::Resolution(ResolutionError::NoVersionFound {
            ..
        }) => ErrorContext::new(error)
            .with_suggestion("Set 'distro' to a repository that packages the project, or use a static version"),

        _ => ErrorContext::new(error),
    }
}
