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

//! Transport layer for remote artifact repositories
//!
//! A transport exposes one remote backend through a small set of
//! path-addressed primitives. Paths are relative, `/`-separated and never
//! empty. Three capability levels exist:
//!
//! - [`Transport`]: read access (`exists`, `get`). Every backend has it.
//! - [`WriteTransport`]: mutation primitives plus the derived
//!   [`folder_ensure`](WriteTransport::folder_ensure) and
//!   [`update`](WriteTransport::update) operations.
//! - [`FolderList`]: optional listing of folder contents.
//!
//! Backends:
//!
//! - [`HttpTransport`]: read-only over HTTP(S)
//! - [`LocalTransport`]: read-write over a local directory
//! - [`ShareTransport`]: read-write over a network share session
//! - [`MemoryTransport`]: read-write, in memory, for tests
//!
//! # Atomic commit
//!
//! [`WriteTransport::update`] writes to `<dest>.new` and renames it over
//! `<dest>`. Readers never observe partially written canonical content. It
//! does not serialize two independent writers; the last rename wins.
//!
//! # Examples
//!
//! ```rust,no_run
//! use artmgr_transport::{MemoryTransport, Transport, WriteTransport};
//!
//! #[tokio::main]
//! async fn main() -> artmgr_transport::TransportResult<()> {
//!     let remote = MemoryTransport::new();
//!     remote.folder_ensure("refs/feature").await?;
//!
//!     let mut data: &[u8] = b"1f2e3d dir/file.zip\n";
//!     remote.update(&mut data, "refs/feature/login").await?;
//!
//!     let mut out = Vec::new();
//!     assert!(remote.get("refs/feature/login", &mut out).await?);
//!     assert!(!remote.exists("refs/feature/logout").await?);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod http;
pub mod local;
pub mod memory;
pub mod open;
pub mod share;

use async_trait::async_trait;
use std::fmt::Debug;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

pub use error::{TransportError, TransportResult};
pub use http::HttpTransport;
pub use local::LocalTransport;
pub use memory::MemoryTransport;
pub use open::{open_reader, open_writer, AddressKind, OpenOptions, TransportTargets};
pub use share::{
    CredentialPrompt, MountedShareConnector, ShareAddress, ShareConnector, ShareDefaults,
    ShareSession, ShareTransport,
};

/// Suffix of the staging entry written by [`WriteTransport::update`]
pub const STAGING_SUFFIX: &str = ".new";

/// Destination for fetched content
pub type Sink<'a> = &'a mut (dyn AsyncWrite + Send + Unpin);

/// Source of content to store
pub type Source<'a> = &'a mut (dyn AsyncRead + Send + Unpin);

/// Kind of entry found at a remote path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Regular file
    File,
    /// Folder
    Dir,
    /// Nothing at that path
    Absent,
}

/// Read access to a remote repository
///
/// # Error Handling
///
/// Absence is not an error. `exists` returns `false` and `get` returns
/// `Ok(false)` when the remote confirms the entry is missing. Any other
/// failure (unreachable host, unexpected status, I/O error) is an `Err`.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    /// Check whether an entry exists at `path`
    async fn exists(&self, path: &str) -> TransportResult<bool>;

    /// Stream the entry at `path` into `sink`
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Content was written to the sink
    /// * `Ok(false)` - The entry does not exist; nothing was written
    /// * `Err` - Any other failure
    async fn get(&self, path: &str, sink: Sink<'_>) -> TransportResult<bool>;
}

/// Write access to a remote repository
///
/// Implementors provide the primitives. [`folder_ensure`](Self::folder_ensure)
/// and [`update`](Self::update) are derived from them and shared by every
/// backend.
#[async_trait]
pub trait WriteTransport: Transport {
    /// Report what kind of entry lives at `path`
    async fn otype(&self, path: &str) -> TransportResult<ObjectKind>;

    /// Store everything read from `source` at `dest`
    ///
    /// The parent folder must already exist. An existing entry is replaced.
    async fn put(&self, source: Source<'_>, dest: &str) -> TransportResult<()>;

    /// Remove the entry at `path`. Removing a missing entry succeeds.
    async fn delete(&self, path: &str) -> TransportResult<()>;

    /// Move `old` to `new`, replacing any entry already at `new`
    async fn rename(&self, old: &str, new: &str) -> TransportResult<()>;

    /// Create a single folder level. The parent must already exist.
    async fn folder_create(&self, path: &str) -> TransportResult<()>;

    /// Create the repository root itself if it is missing
    async fn init_base(&self) -> TransportResult<()>;

    /// Create `path` and any missing ancestors
    ///
    /// Walks up from `path` until an existing folder is found, then creates
    /// the missing levels top-down. Fails if any ancestor is a file.
    async fn folder_ensure(&self, path: &str) -> TransportResult<()> {
        let mut missing = Vec::new();
        let mut current = path.trim_matches('/');
        while !current.is_empty() {
            match self.otype(current).await? {
                ObjectKind::Dir => break,
                ObjectKind::File => return Err(TransportError::not_a_folder(current)),
                ObjectKind::Absent => {
                    missing.push(current.to_string());
                    current = current.rsplit_once('/').map_or("", |(parent, _)| parent);
                }
            }
        }
        for folder in missing.iter().rev() {
            debug!(folder = %folder, "creating folder");
            self.folder_create(folder).await?;
        }
        Ok(())
    }

    /// Atomically replace the content at `dest`
    ///
    /// Stages the content at `dest` + [`STAGING_SUFFIX`] and renames it into
    /// place, so `dest` always holds either the old or the new content.
    async fn update(&self, source: Source<'_>, dest: &str) -> TransportResult<()> {
        let staging = format!("{dest}{STAGING_SUFFIX}");
        self.put(source, &staging).await?;
        self.rename(&staging, dest).await
    }
}

/// Optional capability: enumerate the entries of a folder
#[async_trait]
pub trait FolderList: Send + Sync {
    /// Names (not paths) of the entries directly under `path`, sorted
    async fn folder_list(&self, path: &str) -> TransportResult<Vec<String>>;
}

/// Reject paths a transport must never be handed
///
/// Paths are relative and `/`-separated. Empty paths, absolute paths and
/// `..` components are invalid arguments.
pub fn validate_path(path: &str) -> TransportResult<()> {
    if path.is_empty() {
        return Err(TransportError::invalid_argument("path cannot be empty"));
    }
    if path.starts_with('/') || path.starts_with('\\') {
        return Err(TransportError::invalid_argument(format!(
            "path must be relative: {path}"
        )));
    }
    if path.split('/').any(|part| part == "..") {
        return Err(TransportError::invalid_argument(format!(
            "path must stay inside the repository: {path}"
        )));
    }
    Ok(())
}
