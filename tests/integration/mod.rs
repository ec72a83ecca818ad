//! Integration test suite for Spiral
//!
//! End-to-end tests that run the `spiral` binary against temporary checkouts. No test
//! needs network access: descriptors use static or no version information, and remote
//! resolution is covered by the library tests with a scripted lookup.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **generate**: full runs, incremental skipping, `--force`, `--clean`, reports
//! - **validate**: the `validate` command
//! - **resolve**: the `resolve` command
//! - **cache_command**: `cache list | remove | clear`
//! - **config_file**: `spiral.toml`, `--config` and `SPIRAL_CONFIG`

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cache_command;
mod config_file;
mod generate;
mod resolve;
mod validate;
