//! Core types for Spiral
//!
//! This module holds the crate-wide error type and the user-facing error rendering used
//! by the CLI. Component-specific errors live next to their components and are re-exported
//! here so callers can match on everything from one place.
//!
//! # Examples
//!
//! ```rust,no_run
//! use spiral_cli::core::{SpiralError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn start() -> Result<()> {
//!     Err(SpiralError::TemplateNotFound {
//!         path: "template".to_string(),
//!     }
//!     .into())
//! }
//!
//! if let Err(e) = start() {
//!     user_friendly_error(e).display();
//! }
//! ```

pub mod error;

pub use error::{
    ErrorContext, MaterializationError, ResolutionError, SpiralError, ValidationError,
    user_friendly_error,
};
