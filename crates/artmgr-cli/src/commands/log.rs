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

//! Branch log messages

use crate::commands::refused;
use crate::context::CliContext;
use crate::output;
use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

/// Set the log message of a branch
#[derive(Parser, Debug)]
pub struct SetLogCmd {
    #[arg(value_name = "BRANCH")]
    pub branch: String,

    #[arg(value_name = "MESSAGE")]
    pub message: String,
}

impl SetLogCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<ExitCode> {
        let mut manager = ctx.manager().await?;
        if !manager.list_branches().contains(&self.branch) {
            return Ok(refused(&format!("Branch '{}' not found in repository", self.branch)));
        }
        manager.put_log(&self.branch, &self.message).await?;
        output::success(&format!("Log message of '{}' updated", self.branch));
        Ok(ExitCode::SUCCESS)
    }
}

/// Show the log message of a branch
#[derive(Parser, Debug)]
pub struct LogCmd {
    #[arg(value_name = "BRANCH")]
    pub branch: String,
}

impl LogCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<ExitCode> {
        let reader = ctx.reader().await?;
        if !reader.list_branches().contains(&self.branch) {
            return Ok(refused(&format!("Branch '{}' not found in repository", self.branch)));
        }
        println!("{}", reader.get_log(&self.branch).await?);
        Ok(ExitCode::SUCCESS)
    }
}
