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

/// Compare two branches
#[derive(Parser, Debug)]
pub struct DiffCmd {
    #[arg(value_name = "BRANCH1")]
    pub branch1: String,

    #[arg(value_name = "BRANCH2")]
    pub branch2: String,

    /// Also list artifacts present in both branches
    #[arg(short, long)]
    pub all: bool,
}

impl DiffCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<ExitCode> {
        let reader = ctx.reader().await?;
        match reader.diff(&self.branch1, &self.branch2, self.all).await? {
            Some(report) => {
                output::report(&report, reader.subdir());
                Ok(ExitCode::SUCCESS)
            }
            None => Ok(refused("Both branches must exist in the repository")),
        }
    }
}
