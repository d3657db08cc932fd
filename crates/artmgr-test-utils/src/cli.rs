// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 artmgr Contributors

//! CLI command helpers for testing the artmgr binary.
//!
//! Provides convenient wrappers around assert_cmd for testing the artmgr CLI.

use assert_cmd::Command;
use std::path::Path;

/// Creates a new artmgr Command for testing.
///
/// Logging is forced to errors only so stdout holds just command output.
///
/// # Example
/// ```ignore
/// use artmgr_test_utils::artmgr;
///
/// artmgr()
///     .args(["--server", server.address().as_str(), "--repo", "myRepo", "branches"])
///     .assert()
///     .success();
/// ```
#[allow(deprecated)] // cargo_bin is deprecated but still works for our use case
pub fn artmgr() -> Command {
    let mut cmd = Command::cargo_bin("artmgr").expect("artmgr binary not found");
    cmd.env("RUST_LOG", "error").env_remove("ARTMGR_SERVER");
    cmd
}

/// Fluent API wrapper for artmgr invocations against one server and repo.
pub struct ArtmgrCommand {
    cmd: Command,
}

impl ArtmgrCommand {
    /// Command bound to `server` and `repo`, working on `project_dir`.
    pub fn new(server: &str, repo: &str, project_dir: &Path) -> Self {
        let mut cmd = artmgr();
        cmd.arg("--server")
            .arg(server)
            .arg("--repo")
            .arg(repo)
            .arg("--project-dir")
            .arg(project_dir);
        Self { cmd }
    }

    /// Add an argument to the command.
    pub fn arg(mut self, arg: &str) -> Self {
        self.cmd.arg(arg);
        self
    }

    /// Add multiple arguments to the command.
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    /// Execute the command and assert success.
    pub fn run_success(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().success()
    }

    /// Execute the command and assert failure.
    pub fn run_failure(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().failure()
    }

    /// Get the underlying Command for custom assertions.
    pub fn into_inner(self) -> Command {
        self.cmd
    }
}
