// artmgr - Artifact Repository Manager
// Copyright (C) 2025 artmgr Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! What a caller hands the engine to open a session

use crate::error::{ArtmgrError, ArtmgrResult};
use artmgr_config::OptionOverrides;
use artmgr_transport::TransportTargets;

/// Parameters of one reader or manager session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Read target and optional distinct write target
    pub targets: TransportTargets,
    /// Repository name below the target address
    pub repo: String,
    /// Subdirectory scope, normalized to end in `/`
    pub subdir: Option<String>,
    /// Report mutations instead of performing them
    pub dry_run: bool,
    /// Highest-priority option layer
    pub overrides: OptionOverrides,
}

impl SessionOptions {
    /// Session on `server` (`read[,write]`) for repository `repo`
    pub fn new(server: &str, repo: &str) -> ArtmgrResult<Self> {
        let repo = repo.trim().trim_matches('/');
        if repo.is_empty() {
            return Err(ArtmgrError::invalid_argument("repository name cannot be empty"));
        }
        Ok(SessionOptions {
            targets: TransportTargets::parse(server)?,
            repo: repo.to_string(),
            subdir: None,
            dry_run: false,
            overrides: OptionOverrides::default(),
        })
    }

    pub fn with_subdir(mut self, subdir: Option<&str>) -> Self {
        self.subdir = subdir.and_then(normalize_subdir);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_overrides(mut self, overrides: OptionOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Scope prefix with `/` separators and one trailing `/`
///
/// Returns `None` for a scope that names the project root.
pub fn normalize_subdir(subdir: &str) -> Option<String> {
    let parts: Vec<&str> = subdir
        .split(['/', '\\'])
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();
    (!parts.is_empty()).then(|| format!("{}/", parts.join("/")))
}
