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

//! Queries against the git working copy an artifact directory belongs to
//!
//! Each query runs the `git` command first. Branch and remote lookups fall
//! back to reading `.git/HEAD` and `.git/config` directly when git is not
//! available.

use crate::error::{ArtmgrError, ArtmgrResult};
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

async fn run_git(dir: &Path, args: &[&str]) -> ArtmgrResult<Option<String>> {
    if !dir.is_dir() {
        return Err(ArtmgrError::invalid_argument(format!(
            "can't find directory: '{}'",
            dir.display()
        )));
    }
    let output = match Command::new("git").args(args).current_dir(dir).output().await {
        Ok(output) => output,
        Err(e) => {
            debug!(error = %e, "git could not be executed");
            return Ok(None);
        }
    };
    if !output.status.success() {
        debug!(?args, status = %output.status, "git query failed");
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&output.stdout).trim_end().to_string()))
}

/// Name of the checked out branch
pub async fn current_branch(dir: &Path) -> ArtmgrResult<String> {
    if let Some(branch) = run_git(dir, &["rev-parse", "--abbrev-ref", "HEAD"]).await? {
        return Ok(branch);
    }
    let head_path = dir.join(".git").join("HEAD");
    let head = tokio::fs::read_to_string(&head_path).await.map_err(|_| {
        ArtmgrError::Vcs(format!("can't find git metadata in '{}'", dir.display()))
    })?;
    let head = head.lines().next().unwrap_or_default().trim();
    Ok(head
        .rsplit_once("refs/heads/")
        .map_or(head, |(_, branch)| branch)
        .to_string())
}

/// Repository name derived from the `origin` remote URL
pub async fn origin_repo_name(dir: &Path) -> ArtmgrResult<String> {
    let url = match run_git(dir, &["config", "--get", "remote.origin.url"]).await? {
        Some(url) => url,
        None => origin_url_from_config(dir).await?,
    };
    repo_name_from_url(&url)
        .ok_or_else(|| ArtmgrError::Vcs(format!("can't derive a repository name from '{url}'")))
}

/// Files git reports as untracked and ignored, relative to `dir`
pub async fn ignored_files(dir: &Path) -> ArtmgrResult<Vec<String>> {
    let listing = run_git(dir, &["ls-files", "--others", "--ignored", "--exclude-standard"])
        .await?
        .ok_or_else(|| {
            ArtmgrError::Vcs("can't derive the file list from git: git execution failed".into())
        })?;
    Ok(listing
        .lines()
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

async fn origin_url_from_config(dir: &Path) -> ArtmgrResult<String> {
    let config_path = dir.join(".git").join("config");
    let config = tokio::fs::read_to_string(&config_path).await.map_err(|_| {
        ArtmgrError::Vcs(format!("can't find git metadata in '{}'", dir.display()))
    })?;

    let mut in_origin = false;
    for line in config.lines().map(str::trim) {
        if line.starts_with('[') {
            in_origin = line == r#"[remote "origin"]"#;
        } else if in_origin {
            if let Some((key, value)) = line.split_once('=') {
                if key.trim() == "url" {
                    return Ok(value.trim().to_string());
                }
            }
        }
    }
    Err(ArtmgrError::Vcs(format!(
        "no origin remote in '{}'",
        config_path.display()
    )))
}

/// Path part of a remote URL, without a `.git` suffix
///
/// Handles `scheme://host/path`, scp-like `user@host:path` and plain paths.
pub fn repo_name_from_url(url: &str) -> Option<String> {
    let path = match url.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path)?,
        None => url.split_once(':').map_or(url, |(_, path)| path),
    };
    let path = path.trim_matches('/');
    let name = path.strip_suffix(".git").unwrap_or(path);
    (!name.is_empty()).then(|| name.to_string())
}
