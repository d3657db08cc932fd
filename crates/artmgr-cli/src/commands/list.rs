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

use crate::commands::refused;
use crate::context::CliContext;
use crate::output;
use anyhow::Result;
use artmgr_core::ListSource;
use clap::Parser;
use std::process::ExitCode;

/// List artifacts of a branch, the local project or the whole repository
#[derive(Parser, Debug)]
pub struct ListCmd {
    /// Branch to list (default: the current git branch)
    #[arg(value_name = "BRANCH", conflicts_with_all = ["local", "all"])]
    pub branch: Option<String>,

    /// List the artifacts found in the project directory
    #[arg(long, conflicts_with = "all")]
    pub local: bool,

    /// List every object stored in the repository
    #[arg(short, long)]
    pub all: bool,
}

impl ListCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<ExitCode> {
        let source = if self.local {
            ListSource::Local(ctx.local_dir())
        } else if self.all {
            ListSource::All
        } else {
            ListSource::Branch(ctx.branch_name(self.branch.as_deref()).await?)
        };

        let mut reader = ctx.reader().await?;
        let Some(items) = reader.list_artifacts(&source).await? else {
            return Ok(refused("Branch not found in repository"));
        };
        output::listing(&items, reader.subdir());
        Ok(ExitCode::SUCCESS)
    }
}
