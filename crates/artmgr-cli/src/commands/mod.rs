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

// Command modules for the artmgr CLI
pub mod branches;
pub mod diff;
pub mod get;
pub mod list;
pub mod log;
pub mod options;
pub mod rename;
pub mod status;
pub mod transfer;

pub use branches::BranchesCmd;
pub use diff::DiffCmd;
pub use get::GetCmd;
pub use list::ListCmd;
pub use log::{LogCmd, SetLogCmd};
pub use options::OptionsCmd;
pub use rename::RenameCmd;
pub use status::StatusCmd;
pub use transfer::{DownloadCmd, UploadCmd};

use std::process::ExitCode;

/// Exit status for an operation that completed but did not do what was asked
pub(crate) fn refused(msg: &str) -> ExitCode {
    crate::output::warning(msg);
    ExitCode::FAILURE
}
