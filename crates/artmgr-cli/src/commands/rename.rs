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
use clap::Parser;
use std::process::ExitCode;

/// Rename a branch, keeping its log message
#[derive(Parser, Debug)]
pub struct RenameCmd {
    #[arg(value_name = "OLD")]
    pub old: String,

    #[arg(value_name = "NEW")]
    pub new: String,
}

impl RenameCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<ExitCode> {
        let mut manager = ctx.manager().await?;
        if !manager.rename_branch(&self.old, &self.new).await? {
            return Ok(refused(&format!("Branch '{}' not found in repository", self.old)));
        }
        output::success(&format!("Renamed '{}' to '{}'", self.old, self.new));
        Ok(ExitCode::SUCCESS)
    }
}
