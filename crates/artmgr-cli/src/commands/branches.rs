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

/// List the branches of the repository
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:
    # Branch names only
    artmgr --server /srv/artifacts --repo tools branches

    # Each branch with its log message
    artmgr branches --logs")]
pub struct BranchesCmd {
    /// Show the log message of each branch
    #[arg(short, long)]
    pub logs: bool,
}

impl BranchesCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<ExitCode> {
        let mut reader = ctx.reader().await?;
        if self.logs {
            for (branch, log) in reader.list_branches_with_logs().await? {
                let first = log.lines().next().unwrap_or_default();
                println!("{:<24} {}", branch, console::style(first).dim());
            }
        } else {
            for branch in reader.list_branches() {
                println!("{branch}");
            }
        }
        if reader.list_branches().is_empty() {
            output::info("No branches in repository");
        }
        Ok(ExitCode::SUCCESS)
    }
}
