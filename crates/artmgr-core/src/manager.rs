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

//! Read-write access to an artifact repository
//!
//! [`ArtifactManager`] wraps an [`ArtifactReader`] with a write transport
//! and adds the operations that change the repository. Every rewrite of an
//! existing file (index, refs, branch list, logs) goes through
//! `WriteTransport::update`, so readers never see partial content.
//! Concurrent managers on one repository are last-writer-wins.

use crate::error::{ArtmgrError, ArtmgrResult};
use crate::layout::{
    self, BRANCHES, INDEX, OBJECTS, OPTIONS, README_HTML, README_HTML_NAME, README_NAME, REFS,
};
use crate::oid::ObjectId;
use crate::reader::ArtifactReader;
use crate::refs::ArtifactSet;
use crate::session::SessionOptions;
use artmgr_config::{render_options, Settings};
use artmgr_transport::{open_reader, open_writer, validate_path, OpenOptions, WriteTransport};
use std::ops::{Deref, DerefMut};
use std::path::Path;
use tracing::{debug, info, warn};

/// Result of [`ArtifactManager::upload_artifacts`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The branch ref was written; this many objects were new
    Transferred(usize),
    /// The branch exists and overwriting was not requested; nothing changed
    BranchExists,
}

/// Reader plus write operations
#[derive(Debug)]
pub struct ArtifactManager {
    reader: ArtifactReader,
    writer: Box<dyn WriteTransport>,
}

impl Deref for ArtifactManager {
    type Target = ArtifactReader;

    fn deref(&self) -> &ArtifactReader {
        &self.reader
    }
}

impl DerefMut for ArtifactManager {
    fn deref_mut(&mut self) -> &mut ArtifactReader {
        &mut self.reader
    }
}

impl ArtifactManager {
    /// Open the read and write targets of `session`
    pub async fn open(
        session: &SessionOptions,
        settings: &Settings,
        open_options: &OpenOptions,
    ) -> ArtmgrResult<Self> {
        let writer =
            open_writer(session.targets.write_address(), &session.repo, open_options).await?;
        let reader = open_reader(&session.targets.read, &session.repo, open_options).await?;
        let reader = ArtifactReader::with_transport(reader, session, settings).await?;
        Self::with_transports(reader, writer).await
    }

    /// Combine a reader with a write transport
    ///
    /// Initializes the repository when it has no index yet, unless the
    /// session is a dry run.
    pub async fn with_transports(
        reader: ArtifactReader,
        writer: Box<dyn WriteTransport>,
    ) -> ArtmgrResult<Self> {
        let manager = ArtifactManager { reader, writer };
        if !manager.writer.exists(INDEX).await? && !manager.is_dry_run() {
            manager.repo_init().await?;
        }
        Ok(manager)
    }

    /// Create the repository skeleton
    ///
    /// Writes the object and ref folders, the README pages, an empty index
    /// and the negotiated options.
    pub async fn repo_init(&self) -> ArtmgrResult<()> {
        info!(repo = %self.repo(), "initializing repository");
        self.writer.init_base().await?;
        self.writer.folder_ensure(OBJECTS).await?;
        self.writer.folder_ensure(REFS).await?;

        self.put_bytes(README_HTML.as_bytes(), README_HTML_NAME).await?;
        let plain = layout::strip_tags(README_HTML);
        self.put_bytes(plain.as_bytes(), README_NAME).await?;
        self.put_bytes(b"", INDEX).await?;
        self.put_options().await
    }

    async fn put_bytes(&self, mut data: &[u8], dest: &str) -> ArtmgrResult<()> {
        self.writer.put(&mut data, dest).await?;
        Ok(())
    }

    async fn update_bytes(&self, mut data: &[u8], dest: &str) -> ArtmgrResult<()> {
        self.writer.update(&mut data, dest).await?;
        Ok(())
    }

    /// Persist the session's effective options
    pub async fn put_options(&self) -> ArtmgrResult<()> {
        let text = render_options(self.options())?;
        if self.is_dry_run() {
            info!(options = %text, "dry run: would write repository options");
            return Ok(());
        }
        debug!(options = %text, "writing repository options");
        self.put_bytes(text.as_bytes(), OPTIONS).await
    }

    async fn ensure_parent(&self, path: &str) -> ArtmgrResult<()> {
        if let Some(parent) = layout::parent_folder(path) {
            self.writer.folder_ensure(parent).await?;
        }
        Ok(())
    }

    /// Set the log message of a branch
    pub async fn put_log(&mut self, branch: &str, message: &str) -> ArtmgrResult<()> {
        let dest = checked_branch_path(branch, layout::log_path)?;
        if self.is_dry_run() {
            info!(branch = %branch, "dry run: would set log message");
            return Ok(());
        }
        self.ensure_parent(&dest).await?;
        self.update_bytes(message.as_bytes(), &dest).await?;
        if let Some(log) = self.reader.branches.get_mut(branch) {
            *log = message.to_string();
        }
        info!(branch = %branch, "log message set");
        Ok(())
    }

    async fn put_object(&self, source: &Path, id: &ObjectId) -> ArtmgrResult<()> {
        self.writer.folder_ensure(&id.shard_folder()).await?;
        let mut file = tokio::fs::File::open(source)
            .await
            .map_err(|e| ArtmgrError::io(source, e))?;
        self.writer.put(&mut file, &id.storage_path()).await?;
        Ok(())
    }

    async fn put_branch_ref(&self, branch: &str, artifacts: &ArtifactSet) -> ArtmgrResult<()> {
        let dest = layout::ref_path(branch);
        self.ensure_parent(&dest).await?;
        self.update_bytes(artifacts.encode().as_bytes(), &dest).await
    }

    async fn put_index(&self) -> ArtmgrResult<()> {
        self.update_bytes(self.index().encode().as_bytes(), INDEX).await
    }

    async fn put_branch_list(&self) -> ArtmgrResult<()> {
        let names = self.list_branches().join("\n");
        self.update_bytes(names.as_bytes(), BRANCHES).await
    }

    /// Rename a branch, carrying its log message along
    ///
    /// Returns false, changing nothing, if `old` is not a known branch.
    pub async fn rename_branch(&mut self, old: &str, new: &str) -> ArtmgrResult<bool> {
        if !self.reader.branches.contains_key(old) {
            warn!(branch = %old, "branch does not exist in artifact repository");
            return Ok(false);
        }
        let new_ref = checked_branch_path(new, layout::ref_path)?;
        if self.reader.branches.contains_key(new) {
            warn!(branch = %new, "target branch already exists in artifact repository");
            return Ok(false);
        }
        if self.is_dry_run() {
            info!(old = %old, new = %new, "dry run: would rename branch");
            return Ok(true);
        }
        info!(old = %old, new = %new, "renaming branch");

        self.ensure_parent(&new_ref).await?;
        self.writer.rename(&layout::ref_path(old), &new_ref).await?;

        let log = self.get_log(old).await?;
        let new_log = layout::log_path(new);
        if !log.is_empty() {
            self.ensure_parent(&new_log).await?;
            self.writer.rename(&layout::log_path(old), &new_log).await?;
        } else if self.writer.exists(&new_log).await? {
            debug!(path = %new_log, "removing stale log");
            self.writer.delete(&new_log).await?;
        }

        self.reader.branches.remove(old);
        self.reader.branches.insert(new.to_string(), log);
        self.put_branch_list().await?;
        Ok(true)
    }

    /// Upload the artifacts of `dir` as `branch`
    ///
    /// Without `overwrite`, an existing branch is left untouched and
    /// [`UploadOutcome::BranchExists`] is returned. Otherwise every local
    /// object the repository lacks is transferred, the branch ref is
    /// rewritten to the local snapshot, and the branch list and index are
    /// rewritten when they changed.
    pub async fn upload_artifacts(
        &mut self,
        dir: &Path,
        branch: &str,
        overwrite: bool,
    ) -> ArtmgrResult<UploadOutcome> {
        checked_branch_path(branch, layout::ref_path)?;
        if self.get_branch(branch).await?.is_some() && !overwrite {
            warn!(branch = %branch, "branch already exists in repository; overwrite not requested");
            return Ok(UploadOutcome::BranchExists);
        }

        let local = self.reader.local_scan(dir).await?;
        let new_objects: Vec<(&ObjectId, &[String])> = local
            .artifacts
            .iter()
            .filter(|(id, _)| !self.index().contains(id))
            .collect();
        info!(
            branch = %branch,
            local = local.artifacts.len(),
            already_stored = local.artifacts.len() - new_objects.len(),
            dry_run = self.is_dry_run(),
            "uploading local artifacts"
        );

        let mut uploaded = 0;
        for (id, paths) in new_objects {
            info!(paths = %paths.join(" "), "uploading");
            if self.is_dry_run() {
                continue;
            }
            let Some(entry) = local.index.get(id) else {
                continue;
            };
            let relative = match self.subdir() {
                Some(prefix) => entry.path.strip_prefix(prefix).unwrap_or(&entry.path),
                None => &entry.path,
            };
            self.put_object(&dir.join(relative), id).await?;
            self.reader.index.insert(*id, entry.clone());
            uploaded += 1;
        }

        if self.is_dry_run() {
            return Ok(UploadOutcome::Transferred(0));
        }
        self.put_branch_ref(branch, &local.artifacts).await?;
        if !self.reader.branches.contains_key(branch) {
            self.reader
                .branches
                .insert(branch.to_string(), String::new());
            self.put_branch_list().await?;
        }
        if uploaded > 0 {
            self.put_index().await?;
        }
        info!(branch = %branch, uploaded, "upload complete");
        Ok(UploadOutcome::Transferred(uploaded))
    }
}

/// Repository path for a branch name, rejecting names that escape the
/// repository
fn checked_branch_path(branch: &str, to_path: fn(&str) -> String) -> ArtmgrResult<String> {
    if branch.trim().is_empty() {
        return Err(ArtmgrError::invalid_argument("branch name cannot be empty"));
    }
    let path = to_path(branch);
    validate_path(&path)?;
    Ok(path)
}
