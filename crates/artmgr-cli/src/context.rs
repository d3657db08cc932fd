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

//! Global flags and session setup shared by all commands

use crate::prompt::TerminalPrompt;
use anyhow::{Context, Result};
use artmgr_config::{OptionOverrides, Settings, SettingsLoader};
use artmgr_core::{normalize_subdir, vcs, ArtifactManager, ArtifactReader, SessionOptions};
use artmgr_observability::LogFormat;
use artmgr_transport::OpenOptions;
use clap::{ArgAction, Args};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Flags accepted before or after any subcommand
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Repository server: `read[,write]` addresses (default: $ARTMGR_SERVER)
    #[arg(long, global = true, value_name = "ADDRESS")]
    pub server: Option<String>,

    /// Repository name (default: the origin remote of the project)
    #[arg(long, global = true, value_name = "NAME")]
    pub repo: Option<String>,

    /// Restrict operations to a subdirectory of the project
    #[arg(long, global = true, value_name = "PREFIX")]
    pub subdir: Option<String>,

    /// Report what would change without changing anything
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log format: pretty, compact or json
    #[arg(long, global = true, value_name = "FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Settings file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project directory holding the artifacts
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub project_dir: PathBuf,

    /// Take artifacts from the files git ignores
    #[arg(long, global = true)]
    pub git_ignored: bool,

    /// Ignore files of this size in bytes or smaller
    #[arg(long, global = true, value_name = "BYTES")]
    pub min_size: Option<u64>,

    /// Explicit artifact patterns, comma separated
    #[arg(long, global = true, value_name = "GLOBS", value_delimiter = ',')]
    pub files: Option<Vec<String>>,

    /// Artifact file extensions, comma separated
    #[arg(long, global = true, value_name = "EXTS", value_delimiter = ',')]
    pub extensions: Option<Vec<String>>,
}

impl GlobalArgs {
    /// Option overrides given on the command line
    pub fn overrides(&self) -> OptionOverrides {
        OptionOverrides {
            derive_from_vcs_ignore: self.git_ignored.then_some(true),
            minimum_size: self.min_size,
            explicit_files: self.files.clone(),
            extension_allowlist: self.extensions.clone(),
            ..Default::default()
        }
    }
}

/// Everything a command needs to open a session
#[derive(Debug)]
pub struct CliContext {
    pub args: GlobalArgs,
    pub settings: Settings,
}

impl CliContext {
    /// Load settings from `--config` (if any) and the environment
    pub async fn load(args: GlobalArgs) -> Result<Self> {
        let settings = SettingsLoader::new()
            .load_with_overrides(args.config.as_deref())
            .await
            .context("Failed to load settings")?;
        Ok(CliContext { args, settings })
    }

    /// Normalized subdirectory scope
    pub fn subdir(&self) -> Option<String> {
        self.args.subdir.as_deref().and_then(normalize_subdir)
    }

    /// Directory scanned for local artifacts
    pub fn local_dir(&self) -> PathBuf {
        match self.subdir() {
            Some(prefix) => self.args.project_dir.join(prefix.trim_end_matches('/')),
            None => self.args.project_dir.clone(),
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.args.project_dir
    }

    /// Repository name from `--repo` or the project's origin remote
    pub async fn repo_name(&self) -> Result<String> {
        if let Some(repo) = &self.args.repo {
            return Ok(repo.clone());
        }
        vcs::origin_repo_name(self.project_dir())
            .await
            .context("Cannot determine the repository name; pass --repo")
    }

    /// `branch`, or the project's current git branch
    pub async fn branch_name(&self, branch: Option<&str>) -> Result<String> {
        if let Some(branch) = branch {
            return Ok(branch.to_string());
        }
        vcs::current_branch(self.project_dir())
            .await
            .context("Cannot determine the branch name; pass it explicitly")
    }

    async fn session(&self) -> Result<SessionOptions> {
        let server = self
            .args
            .server
            .as_deref()
            .or(self.settings.server.as_deref())
            .context("No server given; use --server or ARTMGR_SERVER")?;
        let repo = self.repo_name().await?;
        Ok(SessionOptions::new(server, &repo)?
            .with_subdir(self.args.subdir.as_deref())
            .with_dry_run(self.args.dry_run)
            .with_overrides(self.args.overrides()))
    }

    fn open_options(&self) -> OpenOptions {
        OpenOptions::new(
            &self.settings.share_domain,
            self.settings.share_mount_root.clone(),
        )
        .with_prompt(Arc::new(TerminalPrompt))
    }

    /// Read-only session
    pub async fn reader(&self) -> Result<ArtifactReader> {
        let session = self.session().await?;
        ArtifactReader::open(&session, &self.settings, &self.open_options())
            .await
            .with_context(|| format!("Failed to open repository '{}'", session.repo))
    }

    /// Read-write session; initializes an empty repository
    pub async fn manager(&self) -> Result<ArtifactManager> {
        let session = self.session().await?;
        ArtifactManager::open(&session, &self.settings, &self.open_options())
            .await
            .with_context(|| format!("Failed to open repository '{}'", session.repo))
    }
}
