// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 artmgr Contributors

//! # artmgr Test Utilities
//!
//! Shared test utilities for artmgr crates providing:
//! - sample projects holding a few artifact files
//! - scratch artifact servers backed by a local folder
//! - CLI command helpers for testing the `artmgr` binary

pub mod cli;
pub mod project;
pub mod server;

// Re-export commonly used items at crate root
pub use cli::{artmgr, ArtmgrCommand};
pub use project::{artifact_bytes, TestProject};
pub use server::TestServer;

/// Repository name used by fixtures
pub const REPO_NAME: &str = "myRepo";

/// Branch name used by fixtures
pub const BRANCH_NAME: &str = "myBranch";
