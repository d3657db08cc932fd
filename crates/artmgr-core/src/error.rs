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

//! Error type of the artifact engine

use artmgr_config::ConfigError;
use artmgr_transport::TransportError;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for engine operations
pub type ArtmgrResult<T> = Result<T, ArtmgrError>;

/// Terminal failures of an engine operation
///
/// Absence is not represented here: reads report a missing branch, file or
/// object through `Option`, `bool` or an empty value.
#[derive(Error, Debug)]
pub enum ArtmgrError {
    /// A caller-supplied value is unusable
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The remote backend failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Persisted or supplied options are unusable
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Local filesystem failure
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A ref line that cannot be interpreted
    #[error("corrupt ref for branch '{branch}': {line}")]
    CorruptRef { branch: String, line: String },

    /// An entry names an object the repository does not hold
    #[error("object {id} is missing from the repository")]
    MissingObject { id: String },

    /// The version control tool could not be queried
    #[error("version control query failed: {0}")]
    Vcs(String),
}

impl ArtmgrError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ArtmgrError::InvalidArgument(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArtmgrError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn corrupt_ref(branch: impl Into<String>, line: impl Into<String>) -> Self {
        ArtmgrError::CorruptRef {
            branch: branch.into(),
            line: line.into(),
        }
    }

    pub fn is_corrupt_ref(&self) -> bool {
        matches!(self, ArtmgrError::CorruptRef { .. })
    }

    /// True for unsupported repository versions, which are never retried
    pub fn is_unsupported_version(&self) -> bool {
        matches!(self, ArtmgrError::Config(e) if e.is_unsupported_version())
    }
}
