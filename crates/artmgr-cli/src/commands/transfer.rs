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

//! Moving artifacts between the project and the repository

use crate::commands::refused;
use crate::context::CliContext;
use crate::output;
use anyhow::Result;
use artmgr_core::UploadOutcome;
use clap::Parser;
use std::process::ExitCode;

/// Upload the project's artifacts as a branch
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:
    # Upload to the branch named like the current git branch
    artmgr upload

    # Replace the content of an existing branch
    artmgr upload release-1.2 --overwrite")]
pub struct UploadCmd {
    /// Target branch (default: the current git branch)
    #[arg(value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Replace the branch if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

impl UploadCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<ExitCode> {
        let branch = ctx.branch_name(self.branch.as_deref()).await?;
        let mut manager = ctx.manager().await?;
        match manager
            .upload_artifacts(&ctx.local_dir(), &branch, self.overwrite)
            .await?
        {
            UploadOutcome::BranchExists => Ok(refused(&format!(
                "Branch '{branch}' already exists; use --overwrite to replace it"
            ))),
            UploadOutcome::Transferred(count) => {
                if manager.is_dry_run() {
                    output::info("Dry run: nothing uploaded");
                } else {
                    output::success(&format!("Branch '{branch}' uploaded"));
                    output::detail("New objects", &count.to_string());
                }
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

/// Bring the project in line with a branch
#[derive(Parser, Debug)]
pub struct DownloadCmd {
    /// Source branch (default: the current git branch)
    #[arg(value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Delete local artifacts the branch does not hold
    #[arg(long)]
    pub remove_old: bool,
}

impl DownloadCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<ExitCode> {
        let branch = ctx.branch_name(self.branch.as_deref()).await?;
        let mut reader = ctx.reader().await?;
        match reader
            .download_artifacts(&branch, &ctx.local_dir(), self.remove_old)
            .await?
        {
            Some(count) => {
                output::success(&format!("Project synced with branch '{branch}'"));
                output::detail("Downloaded", &count.to_string());
                Ok(ExitCode::SUCCESS)
            }
            None => Ok(refused(&format!("Branch '{branch}' not found in repository"))),
        }
    }
}
