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

/// Show the effective repository options
///
/// The options printed are the repository's stored options with any
/// command-line overrides applied on top.
#[derive(Parser, Debug)]
pub struct OptionsCmd {
    /// Store the effective options in the repository
    #[arg(long)]
    pub save: bool,
}

impl OptionsCmd {
    pub async fn execute(&self, ctx: &CliContext) -> Result<ExitCode> {
        if self.save {
            let manager = ctx.manager().await?;
            manager.put_options().await?;
            print!("{}", manager.render_options()?);
            if !manager.is_dry_run() {
                output::success("Repository options saved");
            }
        } else {
            let reader = ctx.reader().await?;
            if !reader.is_initialized() {
                output::warning("Repository not initialized; showing defaults");
            }
            print!("{}", reader.render_options()?);
        }
        Ok(ExitCode::SUCCESS)
    }
}
