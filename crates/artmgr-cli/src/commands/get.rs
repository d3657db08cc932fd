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
use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Fetch a single file from a branch
#[derive(Parser, Debug)]
pub struct GetCmd {
    /// Path of the file within the branch
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Branch holding the file (default: the current git branch)
    #[arg(value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Where to write the file (default: its name, in the project directory)
    #[arg(short, long, value_name = "OUT")]
    pub output: Option<PathBuf>,
}

impl GetCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<ExitCode> {
        let out = match &self.output {
            Some(out) => out.clone(),
            None => {
                let name = Path::new(&self.file)
                    .file_name()
                    .with_context(|| format!("'{}' does not name a file", self.file))?;
                ctx.project_dir().join(name)
            }
        };
        let branch = ctx.branch_name(self.branch.as_deref()).await?;
        let reader = ctx.reader().await?;
        if !reader.get(&self.file, &branch, &out).await? {
            return Ok(refused(&format!(
                "'{}' not found in branch '{branch}'",
                self.file
            )));
        }
        if !reader.is_dry_run() {
            output::success(&format!("Saved {}", out.display()));
        }
        Ok(ExitCode::SUCCESS)
    }
}
