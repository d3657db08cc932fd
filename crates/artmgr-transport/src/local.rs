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

//! Local filesystem transport
//!
//! Maps repository paths directly onto a rooted directory,
//! `<base>/<repo>/<path>`. Missing entries map to `false` or
//! [`ObjectKind::Absent`]; every other I/O failure is a
//! [`TransportError::Io`].
//!
//! The `fs_*` helpers are shared with the mounted share session, which
//! serves a network share through the same filesystem calls.
//!
//! # Examples
//!
//! ```rust,no_run
//! use artmgr_transport::{LocalTransport, Transport, WriteTransport};
//!
//! #[tokio::main]
//! async fn main() -> artmgr_transport::TransportResult<()> {
//!     let remote = LocalTransport::new("/srv/artifacts", "myproject")?;
//!     remote.init_base().await?;
//!     assert!(!remote.exists("index").await?);
//!     Ok(())
//! }
//! ```

use crate::{
    validate_path, FolderList, ObjectKind, Sink, Source, Transport, TransportError,
    TransportResult, WriteTransport,
};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Local filesystem transport rooted at `<base>/<repo>`
#[derive(Debug, Clone)]
pub struct LocalTransport {
    root: PathBuf,
}

impl LocalTransport {
    /// Create a transport for repository `repo` under directory `base`
    ///
    /// Nothing is touched on disk until [`WriteTransport::init_base`] or a
    /// write primitive runs.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `base` or `repo` is empty.
    pub fn new<P: AsRef<Path>>(base: P, repo: &str) -> TransportResult<Self> {
        let base = base.as_ref();
        if base.as_os_str().is_empty() {
            return Err(TransportError::invalid_argument(
                "local transport base directory cannot be empty",
            ));
        }
        if repo.trim_matches('/').is_empty() {
            return Err(TransportError::invalid_argument(
                "repository name cannot be empty",
            ));
        }
        Ok(LocalTransport {
            root: base.join(repo.trim_matches('/')),
        })
    }

    /// Root directory of the repository
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> TransportResult<PathBuf> {
        validate_path(path)?;
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn exists(&self, path: &str) -> TransportResult<bool> {
        let full = self.resolve(path)?;
        Ok(fs_stat(&full).await? != ObjectKind::Absent)
    }

    async fn get(&self, path: &str, sink: Sink<'_>) -> TransportResult<bool> {
        let full = self.resolve(path)?;
        fs_read_into(&full, sink).await
    }
}

#[async_trait]
impl WriteTransport for LocalTransport {
    async fn otype(&self, path: &str) -> TransportResult<ObjectKind> {
        let full = self.resolve(path)?;
        fs_stat(&full).await
    }

    async fn put(&self, source: Source<'_>, dest: &str) -> TransportResult<()> {
        let full = self.resolve(dest)?;
        fs_write_from(source, &full).await
    }

    async fn delete(&self, path: &str) -> TransportResult<()> {
        let full = self.resolve(path)?;
        fs_remove(&full).await
    }

    async fn rename(&self, old: &str, new: &str) -> TransportResult<()> {
        let from = self.resolve(old)?;
        let to = self.resolve(new)?;
        fs_rename(&from, &to).await
    }

    async fn folder_create(&self, path: &str) -> TransportResult<()> {
        let full = self.resolve(path)?;
        fs_create_folder(&full).await
    }

    async fn init_base(&self) -> TransportResult<()> {
        debug!(root = %self.root.display(), "initializing local repository root");
        match fs_stat(&self.root).await? {
            ObjectKind::Dir => Ok(()),
            ObjectKind::File => Err(TransportError::not_a_folder(self.root.display().to_string())),
            ObjectKind::Absent => fs::create_dir_all(&self.root)
                .await
                .map_err(|e| TransportError::io(self.root.display().to_string(), e)),
        }
    }
}

#[async_trait]
impl FolderList for LocalTransport {
    async fn folder_list(&self, path: &str) -> TransportResult<Vec<String>> {
        let full = self.resolve(path)?;
        fs_list(&full).await
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

pub(crate) async fn fs_stat(path: &Path) -> TransportResult<ObjectKind> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Ok(ObjectKind::Dir),
        Ok(_) => Ok(ObjectKind::File),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(ObjectKind::Absent),
        Err(e) => Err(TransportError::io(display(path), e)),
    }
}

pub(crate) async fn fs_read_into(path: &Path, sink: Sink<'_>) -> TransportResult<bool> {
    let mut file = match fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(TransportError::io(display(path), e)),
    };
    let copied = tokio::io::copy(&mut file, &mut *sink)
        .await
        .map_err(|e| TransportError::io(display(path), e))?;
    sink.flush()
        .await
        .map_err(|e| TransportError::io(display(path), e))?;
    debug!(path = %path.display(), bytes = copied, "read file");
    Ok(true)
}

pub(crate) async fn fs_write_from(source: Source<'_>, path: &Path) -> TransportResult<()> {
    let mut file = fs::File::create(path)
        .await
        .map_err(|e| TransportError::io(display(path), e))?;
    let copied = tokio::io::copy(source, &mut file)
        .await
        .map_err(|e| TransportError::io(display(path), e))?;
    file.sync_all()
        .await
        .map_err(|e| TransportError::io(display(path), e))?;
    debug!(path = %path.display(), bytes = copied, "wrote file");
    Ok(())
}

pub(crate) async fn fs_remove(path: &Path) -> TransportResult<()> {
    let result = match fs_stat(path).await? {
        ObjectKind::Absent => return Ok(()),
        ObjectKind::Dir => fs::remove_dir(path).await,
        ObjectKind::File => fs::remove_file(path).await,
    };
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(TransportError::io(display(path), e)),
    }
}

pub(crate) async fn fs_rename(from: &Path, to: &Path) -> TransportResult<()> {
    let first = match fs::rename(from, to).await {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };
    // Some platforms refuse to rename over an existing file
    if fs_stat(to).await? != ObjectKind::File {
        return Err(TransportError::io(display(from), first));
    }
    fs::remove_file(to)
        .await
        .map_err(|e| TransportError::io(display(to), e))?;
    fs::rename(from, to)
        .await
        .map_err(|e| TransportError::io(display(from), e))
}

pub(crate) async fn fs_create_folder(path: &Path) -> TransportResult<()> {
    match fs::create_dir(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => match fs_stat(path).await? {
            ObjectKind::Dir => Ok(()),
            _ => Err(TransportError::not_a_folder(display(path))),
        },
        Err(e) => Err(TransportError::io(display(path), e)),
    }
}

pub(crate) async fn fs_list(path: &Path) -> TransportResult<Vec<String>> {
    let mut entries = fs::read_dir(path)
        .await
        .map_err(|e| TransportError::io(display(path), e))?;
    let mut names = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| TransportError::io(display(path), e))?
    {
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}
