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

//! Artifact repository engine
//!
//! Binary artifacts are stored content-addressed in a remote repository and
//! grouped into named branches: sets of files that travel together. This
//! crate holds the repository model and the operations on it:
//!
//! - [`ObjectId`]: git-style blob hashing and sharded object paths
//! - [`Index`]: id to metadata table, persisted one record per line
//! - [`ArtifactSet`]: branch contents with path aliases, and the ref codec
//! - [`scan`]: selection and hashing of local artifact files
//! - [`diff`]: (id, path) set comparison
//! - [`ArtifactReader`]: listings, comparisons and downloads
//! - [`ArtifactManager`]: initialization, uploads, renames and branch logs
//!
//! All remote I/O goes through the `artmgr-transport` traits, one awaited
//! call at a time.
//!
//! # Examples
//!
//! ```no_run
//! use artmgr_config::Settings;
//! use artmgr_core::{ArtifactManager, SessionOptions, UploadOutcome};
//! use artmgr_transport::OpenOptions;
//! use std::path::Path;
//!
//! # async fn example() -> artmgr_core::ArtmgrResult<()> {
//! let settings = Settings::default();
//! let open = OpenOptions::new(&settings.share_domain, None);
//! let session = SessionOptions::new("/srv/artifacts", "group/project")?;
//!
//! let mut manager = ArtifactManager::open(&session, &settings, &open).await?;
//! match manager.upload_artifacts(Path::new("."), "main", false).await? {
//!     UploadOutcome::Transferred(n) => println!("{n} new objects"),
//!     UploadOutcome::BranchExists => println!("branch already uploaded"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod diff;
mod error;
mod index;
pub mod layout;
mod manager;
mod oid;
mod reader;
mod refs;
pub mod scan;
mod session;
pub mod vcs;

pub use diff::{compare, Comparison, Presence};
pub use error::{ArtmgrError, ArtmgrResult};
pub use index::{Index, IndexEntry};
pub use manager::{ArtifactManager, UploadOutcome};
pub use oid::ObjectId;
pub use reader::{
    ArtifactListing, ArtifactReader, DiffReport, ListSource, ReportItem, ReportSection,
    LABEL_IN_BOTH, LABEL_ONLY_LOCAL, LABEL_ONLY_SERVER,
};
pub use refs::ArtifactSet;
pub use scan::LocalScan;
pub use session::{normalize_subdir, SessionOptions};
