// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 artmgr Contributors

//! Scratch artifact server backed by a local folder.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary folder usable as a local transport target.
pub struct TestServer {
    temp_dir: TempDir,
    repo: Option<String>,
}

impl TestServer {
    /// Empty server; repositories are created on first write.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            repo: None,
        }
    }

    /// Server with an empty folder for `repo` already in place.
    pub fn with_repo(repo: &str) -> Self {
        let mut server = Self::new();
        std::fs::create_dir_all(server.temp_dir.path().join(repo))
            .expect("Failed to create repository folder");
        server.repo = Some(repo.to_string());
        server
    }

    /// Target address of the server.
    pub fn address(&self) -> String {
        self.temp_dir.path().to_string_lossy().into_owned()
    }

    /// Get the path to the server folder.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Folder of the repository created by [`with_repo`](Self::with_repo).
    pub fn repo_dir(&self) -> Option<PathBuf> {
        self.repo.as_ref().map(|r| self.temp_dir.path().join(r))
    }

    /// Read a repository file, if it exists.
    pub fn read(&self, repo: &str, path: &str) -> Option<Vec<u8>> {
        std::fs::read(self.temp_dir.path().join(repo).join(path)).ok()
    }
}

impl Default for TestServer {
    fn default() -> Self {
        Self::new()
    }
}
