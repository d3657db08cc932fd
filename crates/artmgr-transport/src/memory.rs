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

//! In-memory transport for testing
//!
//! Implements the full write contract, including the strict rules real
//! backends enforce: `put` and `folder_create` need an existing parent
//! folder, files and folders never share a path. A mutation counter lets
//! tests prove that dry-run sessions never write.
//!
//! Clones share the same underlying store.

use crate::{
    validate_path, FolderList, ObjectKind, Sink, Source, Transport, TransportError,
    TransportResult, WriteTransport,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

/// In-memory transport backed by `Arc<RwLock<BTreeMap>>`
#[derive(Clone, Default)]
pub struct MemoryTransport {
    nodes: Arc<RwLock<BTreeMap<String, Node>>>,
    mutations: Arc<AtomicUsize>,
}

impl MemoryTransport {
    /// Create an empty transport. The root folder always exists.
    pub fn new() -> Self {
        Self::default()
    }

    /// Content of the file at `path`, if there is one
    pub async fn file(&self, path: &str) -> Option<Vec<u8>> {
        match self.nodes.read().await.get(path) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    /// All file paths currently stored, sorted
    pub async fn files(&self) -> Vec<String> {
        self.nodes
            .read()
            .await
            .iter()
            .filter(|(_, node)| matches!(node, Node::File(_)))
            .map(|(path, _)| path.clone())
            .collect()
    }

    /// Number of mutating calls that succeeded so far
    pub fn mutations(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }
}

fn parent(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

fn require_folder(nodes: &BTreeMap<String, Node>, path: &str) -> TransportResult<()> {
    if path.is_empty() {
        return Ok(());
    }
    match nodes.get(path) {
        Some(Node::Dir) => Ok(()),
        Some(Node::File(_)) => Err(TransportError::not_a_folder(path)),
        None => Err(TransportError::io(
            path,
            io::Error::new(io::ErrorKind::NotFound, "folder does not exist"),
        )),
    }
}

impl fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("mutations", &self.mutations())
            .finish()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn exists(&self, path: &str) -> TransportResult<bool> {
        validate_path(path)?;
        Ok(self.nodes.read().await.contains_key(path))
    }

    async fn get(&self, path: &str, sink: Sink<'_>) -> TransportResult<bool> {
        validate_path(path)?;
        let data = match self.nodes.read().await.get(path) {
            Some(Node::File(data)) => data.clone(),
            Some(Node::Dir) => {
                return Err(TransportError::io(
                    path,
                    io::Error::other("cannot read a folder"),
                ))
            }
            None => return Ok(false),
        };
        sink.write_all(&data)
            .await
            .map_err(|e| TransportError::io(path, e))?;
        sink.flush().await.map_err(|e| TransportError::io(path, e))?;
        Ok(true)
    }
}

#[async_trait]
impl WriteTransport for MemoryTransport {
    async fn otype(&self, path: &str) -> TransportResult<ObjectKind> {
        validate_path(path)?;
        Ok(match self.nodes.read().await.get(path) {
            Some(Node::Dir) => ObjectKind::Dir,
            Some(Node::File(_)) => ObjectKind::File,
            None => ObjectKind::Absent,
        })
    }

    async fn put(&self, source: Source<'_>, dest: &str) -> TransportResult<()> {
        validate_path(dest)?;
        let mut data = Vec::new();
        source
            .read_to_end(&mut data)
            .await
            .map_err(|e| TransportError::io(dest, e))?;

        let mut nodes = self.nodes.write().await;
        require_folder(&nodes, parent(dest))?;
        if let Some(Node::Dir) = nodes.get(dest) {
            return Err(TransportError::io(
                dest,
                io::Error::other("a folder exists at this path"),
            ));
        }
        nodes.insert(dest.to_string(), Node::File(data));
        self.record();
        Ok(())
    }

    async fn delete(&self, path: &str) -> TransportResult<()> {
        validate_path(path)?;
        let mut nodes = self.nodes.write().await;
        let prefix = format!("{path}/");
        if nodes.keys().any(|key| key.starts_with(&prefix)) {
            return Err(TransportError::io(
                path,
                io::Error::other("folder is not empty"),
            ));
        }
        if nodes.remove(path).is_some() {
            self.record();
        }
        Ok(())
    }

    async fn rename(&self, old: &str, new: &str) -> TransportResult<()> {
        validate_path(old)?;
        validate_path(new)?;
        let mut nodes = self.nodes.write().await;
        require_folder(&nodes, parent(new))?;
        let node = nodes.remove(old).ok_or_else(|| {
            TransportError::io(old, io::Error::new(io::ErrorKind::NotFound, "no such entry"))
        })?;

        // Move everything below a renamed folder along with it
        let prefix = format!("{old}/");
        let children: Vec<String> = nodes
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .cloned()
            .collect();
        for child in children {
            if let Some(moved) = nodes.remove(&child) {
                nodes.insert(format!("{new}/{}", &child[prefix.len()..]), moved);
            }
        }
        nodes.insert(new.to_string(), node);
        self.record();
        Ok(())
    }

    async fn folder_create(&self, path: &str) -> TransportResult<()> {
        validate_path(path)?;
        let mut nodes = self.nodes.write().await;
        require_folder(&nodes, parent(path))?;
        match nodes.get(path) {
            Some(Node::Dir) => Ok(()),
            Some(Node::File(_)) => Err(TransportError::not_a_folder(path)),
            None => {
                nodes.insert(path.to_string(), Node::Dir);
                self.record();
                Ok(())
            }
        }
    }

    async fn init_base(&self) -> TransportResult<()> {
        Ok(())
    }
}

#[async_trait]
impl FolderList for MemoryTransport {
    async fn folder_list(&self, path: &str) -> TransportResult<Vec<String>> {
        let nodes = self.nodes.read().await;
        require_folder(&nodes, path.trim_matches('/'))?;
        let prefix = match path.trim_matches('/') {
            "" => String::new(),
            folder => format!("{folder}/"),
        };
        Ok(nodes
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let remote = MemoryTransport::new();
        let mut data: &[u8] = b"hello";
        remote.put(&mut data, "README").await.unwrap();

        let mut out = Vec::new();
        assert!(remote.get("README", &mut out).await.unwrap());
        assert_eq!(out, b"hello");
        assert_eq!(remote.mutations(), 1);
    }

    #[tokio::test]
    async fn test_put_needs_parent() {
        let remote = MemoryTransport::new();
        let mut data: &[u8] = b"x";
        assert!(remote.put(&mut data, "objects/ab/cd").await.is_err());
        assert_eq!(remote.mutations(), 0);
    }

    #[tokio::test]
    async fn test_rename_moves_folder_contents() {
        let remote = MemoryTransport::new();
        remote.folder_ensure("refs/old").await.unwrap();
        let mut data: &[u8] = b"x";
        remote.put(&mut data, "refs/old/branch").await.unwrap();

        remote.rename("refs/old", "refs/new").await.unwrap();
        assert!(remote.file("refs/new/branch").await.is_some());
        assert!(!remote.exists("refs/old/branch").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_refuses_non_empty_folder() {
        let remote = MemoryTransport::new();
        remote.folder_ensure("logs").await.unwrap();
        let mut data: &[u8] = b"x";
        remote.put(&mut data, "logs/main").await.unwrap();

        assert!(remote.delete("logs").await.is_err());
        remote.delete("logs/main").await.unwrap();
        remote.delete("logs").await.unwrap();
        assert!(remote.files().await.is_empty());
    }

    #[tokio::test]
    async fn test_folder_list() {
        let remote = MemoryTransport::new();
        remote.folder_ensure("objects/ab").await.unwrap();
        remote.folder_ensure("objects/cd").await.unwrap();
        let mut data: &[u8] = b"x";
        remote.put(&mut data, "objects/ab/ef").await.unwrap();

        assert_eq!(remote.folder_list("objects").await.unwrap(), vec!["ab", "cd"]);
        assert_eq!(remote.folder_list("").await.unwrap(), vec!["objects"]);
    }
}
