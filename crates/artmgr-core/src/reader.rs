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

//! Read-only access to an artifact repository
//!
//! [`ArtifactReader`] loads the repository options, branch registry and
//! index when it opens, then answers listing, comparison and download
//! requests against them. Local scans are memoized per directory until
//! [`ArtifactReader::invalidate_local`] is called.

use crate::diff::{self, in_scope, Comparison, Pair, Presence};
use crate::error::{ArtmgrError, ArtmgrResult};
use crate::index::{Index, IndexEntry};
use crate::layout::{self, BRANCHES, INDEX, OPTIONS};
use crate::oid::ObjectId;
use crate::refs::ArtifactSet;
use crate::scan::{self, LocalScan};
use crate::session::SessionOptions;
use artmgr_config::{
    negotiate, parse_persisted, render_options, OptionOverrides, RepoOptions, Settings,
    Validator,
};
use artmgr_transport::{open_reader, OpenOptions, Transport};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Which collection [`ArtifactReader::list_artifacts`] lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListSource {
    /// Artifacts found by scanning a local directory
    Local(PathBuf),
    /// One branch
    Branch(String),
    /// Every object in the repository index
    All,
}

/// One object in a listing
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactListing {
    pub id: ObjectId,
    pub entry: IndexEntry,
    /// Paths of the object in the listed collection, primary first
    pub paths: Vec<String>,
}

/// One (object, path) line of a comparison report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportItem {
    pub id: ObjectId,
    pub path: String,
    pub entry: Option<IndexEntry>,
}

/// A labelled list of a comparison report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSection {
    pub label: String,
    pub items: Vec<ReportItem>,
}

/// Comparison report, sections in a fixed order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffReport {
    pub sections: Vec<ReportSection>,
}

impl DiffReport {
    /// Section with the given label
    pub fn section(&self, label: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|s| s.label == label)
    }

    /// Number of items across all sections
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}

pub const LABEL_IN_BOTH: &str = "in both";
pub const LABEL_ONLY_LOCAL: &str = "only in local";
pub const LABEL_ONLY_SERVER: &str = "only in server";

#[derive(Debug)]
struct CachedScan {
    dir: PathBuf,
    scan: Arc<LocalScan>,
}

/// Read-only view of one repository
#[derive(Debug)]
pub struct ArtifactReader {
    transport: Box<dyn Transport>,
    repo: String,
    subdir: Option<String>,
    dry_run: bool,
    options: RepoOptions,
    initialized: bool,
    pub(crate) branches: BTreeMap<String, String>,
    pub(crate) index: Index,
    local: Option<CachedScan>,
}

impl ArtifactReader {
    /// Open the read target of `session`
    pub async fn open(
        session: &SessionOptions,
        settings: &Settings,
        open_options: &OpenOptions,
    ) -> ArtmgrResult<Self> {
        let transport = open_reader(&session.targets.read, &session.repo, open_options).await?;
        Self::with_transport(transport, session, settings).await
    }

    /// Build a reader over an already opened transport
    pub async fn with_transport(
        transport: Box<dyn Transport>,
        session: &SessionOptions,
        settings: &Settings,
    ) -> ArtmgrResult<Self> {
        let mut reader = ArtifactReader {
            transport,
            repo: session.repo.clone(),
            subdir: session.subdir.clone(),
            dry_run: session.dry_run,
            options: settings.default_options.clone(),
            initialized: false,
            branches: BTreeMap::new(),
            index: Index::new(),
            local: None,
        };
        reader.load_options(settings, &session.overrides).await?;
        reader.branches = reader.load_branches().await?;
        reader.index = reader.load_index().await?;
        debug!(
            repo = %reader.repo,
            branches = reader.branches.len(),
            objects = reader.index.len(),
            "opened repository"
        );
        Ok(reader)
    }

    /// Content at `path`, or `None` if the repository has no such entry
    pub(crate) async fn fetch(&self, path: &str) -> ArtmgrResult<Option<Vec<u8>>> {
        let mut buffer = Vec::new();
        if self.transport.get(path, &mut buffer).await? {
            Ok(Some(buffer))
        } else {
            Ok(None)
        }
    }

    async fn fetch_text(&self, path: &str) -> ArtmgrResult<Option<String>> {
        Ok(self
            .fetch(path)
            .await?
            .map(|data| String::from_utf8_lossy(&data).into_owned()))
    }

    async fn load_options(
        &mut self,
        settings: &Settings,
        overrides: &OptionOverrides,
    ) -> ArtmgrResult<()> {
        let persisted = match self.fetch_text(OPTIONS).await? {
            Some(text) => {
                self.initialized = true;
                parse_persisted(&text, settings.supported_version)?
            }
            None => {
                warn!(repo = %self.repo, "repository not initialized");
                OptionOverrides::default()
            }
        };
        let options = negotiate(&settings.default_options, &persisted, overrides);
        options.validate()?;
        self.options = options;
        Ok(())
    }

    async fn load_branches(&self) -> ArtmgrResult<BTreeMap<String, String>> {
        let text = self.fetch_text(BRANCHES).await?.unwrap_or_default();
        Ok(text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|name| (name.to_string(), String::new()))
            .collect())
    }

    async fn load_index(&self) -> ArtmgrResult<Index> {
        match self.fetch_text(INDEX).await? {
            Some(text) => Index::parse(&text),
            None => Ok(Index::new()),
        }
    }

    pub fn repo(&self) -> &str {
        &self.repo
    }

    pub fn subdir(&self) -> Option<&str> {
        self.subdir.as_deref()
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// True when the repository holds an options file
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Effective options of this session
    pub fn options(&self) -> &RepoOptions {
        &self.options
    }

    /// Effective options in the persisted file format
    pub fn render_options(&self) -> ArtmgrResult<String> {
        Ok(render_options(&self.options)?)
    }

    /// The repository index as loaded, plus this session's uploads
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Branch names, sorted
    pub fn list_branches(&self) -> Vec<String> {
        self.branches.keys().cloned().collect()
    }

    /// Branch names with their log messages, sorted by name
    pub async fn list_branches_with_logs(&mut self) -> ArtmgrResult<Vec<(String, String)>> {
        let names = self.list_branches();
        let mut result = Vec::with_capacity(names.len());
        for name in names {
            let log = self.get_log(&name).await?;
            self.branches.insert(name.clone(), log.clone());
            result.push((name, log));
        }
        Ok(result)
    }

    /// Log message of a branch; empty if it has none
    pub async fn get_log(&self, branch: &str) -> ArtmgrResult<String> {
        Ok(self
            .fetch_text(&layout::log_path(branch))
            .await?
            .unwrap_or_default())
    }

    /// Entries of a branch, failing on a corrupt ref
    pub async fn read_branch(&self, branch: &str) -> ArtmgrResult<Option<ArtifactSet>> {
        match self.fetch(&layout::ref_path(branch)).await? {
            Some(data) => Ok(Some(ArtifactSet::decode(branch, &data, &self.index)?)),
            None => Ok(None),
        }
    }

    /// Entries of a branch, or `None` when it is missing or unreadable
    ///
    /// A corrupt ref is reported and treated as a missing branch; other
    /// failures propagate.
    pub async fn get_branch(&self, branch: &str) -> ArtmgrResult<Option<ArtifactSet>> {
        match self.read_branch(branch).await {
            Ok(Some(set)) => Ok(Some(set)),
            Ok(None) => {
                warn!(branch = %branch, "branch not in remote repository");
                Ok(None)
            }
            Err(e) if e.is_corrupt_ref() => {
                warn!(error = %e, "invalid branch ref in remote repository");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Forget the memoized local scan
    pub fn invalidate_local(&mut self) {
        self.local = None;
    }

    /// Local scan of `dir`, computed once per directory
    pub async fn local_scan(&mut self, dir: &Path) -> ArtmgrResult<Arc<LocalScan>> {
        if let Some(cached) = &self.local {
            if cached.dir == dir {
                return Ok(Arc::clone(&cached.scan));
            }
        }
        let scan = Arc::new(scan::scan(dir, &self.options, self.subdir.as_deref()).await?);
        self.local = Some(CachedScan {
            dir: dir.to_path_buf(),
            scan: Arc::clone(&scan),
        });
        Ok(scan)
    }

    /// List a collection, ordered by primary path then modification time
    ///
    /// Returns `None` when a named branch does not exist.
    pub async fn list_artifacts(
        &mut self,
        source: &ListSource,
    ) -> ArtmgrResult<Option<Vec<ArtifactListing>>> {
        let (set, index) = match source {
            ListSource::Local(dir) => {
                let local = self.local_scan(dir).await?;
                (local.artifacts.clone(), local.index.clone())
            }
            ListSource::Branch(name) => match self.get_branch(name).await? {
                Some(set) => (set, self.index.clone()),
                None => return Ok(None),
            },
            ListSource::All => (
                self.index
                    .iter()
                    .map(|(id, entry)| (*id, entry.path.clone()))
                    .collect(),
                self.index.clone(),
            ),
        };

        let mut listing = Vec::with_capacity(set.len());
        for (id, paths) in set.iter() {
            let primary = paths.first().map(String::as_str).unwrap_or_default();
            if !in_scope(primary, self.subdir.as_deref()) {
                continue;
            }
            let entry = index
                .get(id)
                .cloned()
                .ok_or_else(|| ArtmgrError::MissingObject { id: id.to_hex() })?;
            listing.push(ArtifactListing {
                id: *id,
                entry,
                paths: paths.to_vec(),
            });
        }
        listing.sort_by(|a, b| {
            a.paths
                .cmp(&b.paths)
                .then(a.entry.mtime.total_cmp(&b.entry.mtime))
        });
        Ok(Some(listing))
    }

    /// Compare two branches
    ///
    /// Returns `None` if either branch is missing. The `in both` section is
    /// only included with `show_all`.
    pub async fn diff(
        &self,
        branch1: &str,
        branch2: &str,
        show_all: bool,
    ) -> ArtmgrResult<Option<DiffReport>> {
        let (Some(left), Some(right)) = (self.get_branch(branch1).await?, self.get_branch(branch2).await?)
        else {
            return Ok(None);
        };
        let cmp = diff::compare(Some(&left), Some(&right)).within_scope(self.subdir.as_deref());
        info!(
            left = %branch1,
            right = %branch2,
            only_left = cmp.only_left.len(),
            only_right = cmp.only_right.len(),
            "compared branches"
        );
        let mut sections = Vec::new();
        if show_all {
            sections.push((LABEL_IN_BOTH.to_string(), &cmp.in_both));
        }
        sections.push((format!("only in {branch1}"), &cmp.only_left));
        sections.push((format!("only in {branch2}"), &cmp.only_right));
        Ok(Some(build_report(sections, &self.index)))
    }

    /// Compare the artifacts in `dir` with a branch
    ///
    /// Returns the comparison (local on the left) and an index covering
    /// every object it mentions. A missing branch compares as empty.
    pub async fn local_check_list(
        &mut self,
        dir: &Path,
        branch: &str,
    ) -> ArtmgrResult<(Comparison, Index)> {
        let local = self.local_scan(dir).await?;
        let remote = self.get_branch(branch).await?;
        let cmp = diff::compare(Some(&local.artifacts), remote.as_ref());

        let mut all = local.index.clone();
        for (id, _) in &cmp.only_right {
            if let Some(entry) = self.index.get(id) {
                all.insert(*id, entry.clone());
            }
        }
        Ok((cmp, all))
    }

    /// Report of local artifacts against a branch
    pub async fn local_changes(
        &mut self,
        dir: &Path,
        branch: &str,
        show_all: bool,
    ) -> ArtmgrResult<DiffReport> {
        let (cmp, all) = self.local_check_list(dir, branch).await?;
        let cmp = cmp.within_scope(self.subdir.as_deref());
        let mut sections = Vec::new();
        if show_all {
            sections.push((LABEL_IN_BOTH.to_string(), &cmp.in_both));
        }
        sections.push((LABEL_ONLY_LOCAL.to_string(), &cmp.only_left));
        sections.push((LABEL_ONLY_SERVER.to_string(), &cmp.only_right));
        Ok(build_report(sections, &all))
    }

    /// Bring `dir` in line with a branch
    ///
    /// Fetches every branch entry missing locally and, with `remove_old`,
    /// deletes local artifacts the branch does not hold. A path the branch
    /// holds with other content is overwritten, never deleted. Entries
    /// outside the subdirectory scope are left alone. Returns the number of
    /// files fetched, or `None` if the branch is missing or its ref is
    /// unreadable; local files are not touched in that case.
    pub async fn download_artifacts(
        &mut self,
        branch: &str,
        dir: &Path,
        remove_old: bool,
    ) -> ArtmgrResult<Option<usize>> {
        if !self.branches.contains_key(branch) {
            warn!(branch = %branch, "branch does not exist in artifact repository");
            return Ok(None);
        }
        let Some(remote) = self.get_branch(branch).await? else {
            return Ok(None);
        };
        let local = self.local_scan(dir).await?;
        let cmp = diff::compare(Some(&local.artifacts), Some(&remote));
        let classified = cmp.classified();

        let incoming: BTreeSet<&str> = classified
            .iter()
            .filter(|(_, presence)| *presence == Presence::RightOnly)
            .map(|((_, path), _)| path.as_str())
            .collect();

        let mut touched = false;
        for ((_, path), presence) in &classified {
            let Some(relative) = self.strip_scope(path) else {
                continue;
            };
            match presence {
                Presence::LeftOnly if incoming.contains(path.as_str()) => {
                    debug!(path = %relative, "replaced by branch content");
                }
                Presence::LeftOnly if remove_old && self.dry_run => {
                    info!(path = %relative, "would delete");
                }
                Presence::LeftOnly if remove_old => {
                    info!(path = %relative, "deleting");
                    let target = dir.join(relative);
                    tokio::fs::remove_file(&target)
                        .await
                        .map_err(|e| ArtmgrError::io(&target, e))?;
                    touched = true;
                }
                Presence::LeftOnly => debug!(path = %relative, "only in local"),
                Presence::Both => debug!(path = %relative, "up to date"),
                Presence::RightOnly => {}
            }
        }

        let mut downloaded = 0;
        for ((id, path), presence) in &classified {
            if *presence != Presence::RightOnly {
                continue;
            }
            let Some(relative) = self.strip_scope(path) else {
                continue;
            };
            if self.dry_run {
                info!(path = %relative, "would download");
                continue;
            }
            info!(path = %relative, "downloading");
            self.fetch_object(id, &dir.join(relative)).await?;
            downloaded += 1;
            touched = true;
        }
        if touched {
            self.invalidate_local();
        }
        Ok(Some(downloaded))
    }

    /// Fetch the file stored at exactly `filename` in a branch into `out`
    ///
    /// Returns false when the branch or the file within it is missing.
    pub async fn get(&self, filename: &str, branch: &str, out: &Path) -> ArtmgrResult<bool> {
        let Some(set) = self.get_branch(branch).await? else {
            warn!(branch = %branch, "no files in branch");
            return Ok(false);
        };
        let Some(id) = set.find_path(filename) else {
            warn!(branch = %branch, file = %filename, "file not found in branch");
            return Ok(false);
        };
        if self.dry_run {
            info!(file = %filename, out = %out.display(), "would download");
        } else {
            info!(file = %filename, out = %out.display(), "downloading");
            self.fetch_object(&id, out).await?;
        }
        Ok(true)
    }

    /// Path relative to the scope, or `None` outside it
    fn strip_scope<'a>(&self, path: &'a str) -> Option<&'a str> {
        match &self.subdir {
            Some(prefix) => path.strip_prefix(prefix.as_str()),
            None => Some(path),
        }
    }

    /// Write an object to a local file and restore its recorded metadata
    async fn fetch_object(&self, id: &ObjectId, target: &Path) -> ArtmgrResult<()> {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ArtmgrError::io(parent, e))?;
        }
        let mut file = tokio::fs::File::create(target)
            .await
            .map_err(|e| ArtmgrError::io(target, e))?;
        if !self.transport.get(&id.storage_path(), &mut file).await? {
            return Err(ArtmgrError::MissingObject { id: id.to_hex() });
        }
        file.flush().await.map_err(|e| ArtmgrError::io(target, e))?;

        if let Some(entry) = self.index.get(id) {
            let file = file.into_std().await;
            match Duration::try_from_secs_f64(entry.mtime.max(0.0)) {
                Ok(offset) => file
                    .set_modified(UNIX_EPOCH + offset)
                    .map_err(|e| ArtmgrError::io(target, e))?,
                Err(_) => warn!(path = %entry.path, mtime = entry.mtime, "unusable mtime in index"),
            }
            drop(file);
            set_mode(target, entry.mode).await?;
        }
        Ok(())
    }
}

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> ArtmgrResult<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .await
        .map_err(|e| ArtmgrError::io(path, e))
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> ArtmgrResult<()> {
    Ok(())
}

fn build_report(sections: Vec<(String, &BTreeSet<Pair>)>, index: &Index) -> DiffReport {
    DiffReport {
        sections: sections
            .into_iter()
            .map(|(label, pairs)| ReportSection {
                label,
                items: diff::sorted_by_path(pairs)
                    .into_iter()
                    .map(|(id, path)| ReportItem {
                        id: *id,
                        path: path.clone(),
                        entry: index.get(id).cloned(),
                    })
                    .collect(),
            })
            .collect(),
    }
}
