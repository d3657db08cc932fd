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

use crate::context::CliContext;
use crate::output;
use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

/// Compare the project's artifacts with a branch
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Branch to compare with (default: the current git branch)
    #[arg(value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Also list artifacts present on both sides
    #[arg(short, long)]
    pub all: bool,
}

impl StatusCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<ExitCode> {
        let branch = ctx.branch_name(self.branch.as_deref()).await?;
        let mut reader = ctx.reader().await?;
        let report = reader
            .local_changes(&ctx.local_dir(), &branch, self.all)
            .await?;
        output::header(&format!("Project compared with branch '{branch}'"));
        output::report(&report, reader.subdir());

        let clean = report
            .sections
            .iter()
            .filter(|s| s.label != artmgr_core::LABEL_IN_BOTH)
            .all(|s| s.items.is_empty());
        if clean {
            output::success(&format!("Project matches branch '{branch}'"));
        }
        Ok(ExitCode::SUCCESS)
    }
}
