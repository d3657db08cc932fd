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

//! Transport error types and utilities

use std::io;
use thiserror::Error;

/// Result type alias for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors raised by transport backends
///
/// Absence of a remote entry is never reported through this type: read
/// primitives return `false` or [`ObjectKind::Absent`](crate::ObjectKind)
/// instead. Everything here is terminal for the operation in flight.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Empty or malformed target address, repository name or path
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Filesystem or share I/O failure other than a missing entry
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// Path the failing operation was addressing
        path: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// HTTP response with a status other than success or 404
    #[error("HTTP status {status} for {url}")]
    Http {
        /// Requested URL
        url: String,
        /// Response status code
        status: u16,
    },

    /// HTTP request that could not be completed
    #[error("request to {url} failed: {source}")]
    Request {
        /// Requested URL
        url: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// A path component that should be a folder is a file
    #[error("'{0}' exists and is not a folder")]
    NotAFolder(String),

    /// Write attempted through a read-only target
    #[error("'{0}' is a read-only target")]
    ReadOnly(String),

    /// Share credentials could not be obtained
    #[error("credential error: {0}")]
    Credential(String),
}

impl TransportError {
    /// Create an InvalidArgument error
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        TransportError::InvalidArgument(msg.into())
    }

    /// Wrap an I/O error with the path it happened on
    pub fn io<S: Into<String>>(path: S, source: io::Error) -> Self {
        TransportError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a NotAFolder error
    pub fn not_a_folder<S: Into<String>>(path: S) -> Self {
        TransportError::NotAFolder(path.into())
    }

    /// Create a ReadOnly error
    pub fn read_only<S: Into<String>>(address: S) -> Self {
        TransportError::ReadOnly(address.into())
    }

    /// Create a Credential error
    pub fn credential<S: Into<String>>(msg: S) -> Self {
        TransportError::Credential(msg.into())
    }

    /// Check if this is an InvalidArgument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, TransportError::InvalidArgument(_))
    }

    /// Check if this is an HTTP status error
    pub fn is_http_status(&self) -> bool {
        matches!(self, TransportError::Http { .. })
    }
}
