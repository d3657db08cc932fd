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

mod commands;
mod context;
mod output;
mod prompt;

use anyhow::Result;
use artmgr_observability::{init_tracing, level_for_verbosity};
use clap::{Parser, Subcommand};
use commands::*;
use context::{CliContext, GlobalArgs};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "artmgr")]
#[command(version, about = "Keep build artifacts in a shared, content-addressed repository")]
#[command(
    long_about = "artmgr stores the build artifacts of a project in a remote repository,
one snapshot per branch. Identical files are stored once, whatever branch or path they
appear under. Repositories live on a local or mounted filesystem, on a network share,
or are read over HTTP."
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List branches
    Branches(BranchesCmd),

    /// List artifacts
    #[command(alias = "ls")]
    List(ListCmd),

    /// Compare the project with a branch
    Status(StatusCmd),

    /// Compare two branches
    Diff(DiffCmd),

    /// Upload the project's artifacts
    Upload(UploadCmd),

    /// Download a branch into the project
    Download(DownloadCmd),

    /// Fetch one file from a branch
    Get(GetCmd),

    /// Rename a branch
    #[command(alias = "mv")]
    Rename(RenameCmd),

    /// Set the log message of a branch
    SetLog(SetLogCmd),

    /// Show the log message of a branch
    Log(LogCmd),

    /// Show the repository options
    Options(OptionsCmd),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = level_for_verbosity(cli.global.verbose, cli.global.quiet);
    if let Err(e) = init_tracing(cli.global.log_format, level) {
        output::error(&format!("Error: {e}"));
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            output::error(&format!("Error: {e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if let Commands::Version = cli.command {
        print_version();
        return Ok(ExitCode::SUCCESS);
    }

    let ctx = CliContext::load(cli.global).await?;
    match cli.command {
        Commands::Branches(cmd) => cmd.execute(&ctx).await,
        Commands::List(cmd) => cmd.execute(&ctx).await,
        Commands::Status(cmd) => cmd.execute(&ctx).await,
        Commands::Diff(cmd) => cmd.execute(&ctx).await,
        Commands::Upload(cmd) => cmd.execute(&ctx).await,
        Commands::Download(cmd) => cmd.execute(&ctx).await,
        Commands::Get(cmd) => cmd.execute(&ctx).await,
        Commands::Rename(cmd) => cmd.execute(&ctx).await,
        Commands::SetLog(cmd) => cmd.execute(&ctx).await,
        Commands::Log(cmd) => cmd.execute(&ctx).await,
        Commands::Options(cmd) => cmd.execute(&ctx).await,
        Commands::Version => {
            print_version();
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_version() {
    println!("artmgr {}", env!("CARGO_PKG_VERSION"));
    println!("repository format: {}", artmgr_config::REPOSITORY_VERSION);
    println!("license: {}", env!("CARGO_PKG_LICENSE"));
}
