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

//! Branch refs
//!
//! A branch is an ordered list of objects, each carrying one or more paths.
//! Its persisted form is one line per path:
//!
//! ```text
//! <id> <path>      object at a path
//! - <path>         another path of the object on the line before
//! ```
//!
//! Reading also accepts the legacy form, a bare list of ids whose paths come
//! from the index. Writing always produces the alias form.

use crate::error::{ArtmgrError, ArtmgrResult};
use crate::index::Index;
use crate::oid::ObjectId;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

const ALIAS_MARKER: &str = "-";

/// Ordered set of objects with their paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    entries: Vec<(ObjectId, Vec<String>)>,
    positions: HashMap<ObjectId, usize>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path for an object
    ///
    /// The first path added for an id is its primary path; later ones are
    /// aliases. Adding a path the object already has does nothing.
    pub fn add(&mut self, id: ObjectId, path: impl Into<String>) {
        let path = path.into();
        match self.positions.get(&id) {
            Some(&pos) => {
                let paths = &mut self.entries[pos].1;
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
            None => {
                self.positions.insert(id, self.entries.len());
                self.entries.push((id, vec![path]));
            }
        }
    }

    /// Number of distinct objects
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.positions.contains_key(id)
    }

    /// Paths of an object, primary first
    pub fn paths(&self, id: &ObjectId) -> Option<&[String]> {
        self.positions
            .get(id)
            .map(|&pos| self.entries[pos].1.as_slice())
    }

    /// Objects in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &[String])> {
        self.entries.iter().map(|(id, paths)| (id, paths.as_slice()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &ObjectId> {
        self.entries.iter().map(|(id, _)| id)
    }

    /// Object stored at exactly `path`, checking aliases too
    pub fn find_path(&self, path: &str) -> Option<ObjectId> {
        self.entries
            .iter()
            .find(|(_, paths)| paths.iter().any(|p| p == path))
            .map(|(id, _)| *id)
    }

    /// Every (id, path) pair, one per alias
    pub fn pairs(&self) -> BTreeSet<(ObjectId, String)> {
        self.entries
            .iter()
            .flat_map(|(id, paths)| paths.iter().map(move |p| (*id, p.clone())))
            .collect()
    }

    /// Persisted form
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (id, paths) in &self.entries {
            let mut paths = paths.iter();
            if let Some(primary) = paths.next() {
                let _ = writeln!(out, "{id} {primary}");
            }
            for alias in paths {
                let _ = writeln!(out, "{ALIAS_MARKER} {alias}");
            }
        }
        out
    }

    /// Parse the persisted form of `branch`
    ///
    /// Lines without a path take it from `index`. An alias line with no
    /// object before it, or an id that does not parse, is a `CorruptRef`.
    /// A pathless id unknown to the index is a `MissingObject`.
    pub fn decode(branch: &str, data: &[u8], index: &Index) -> ArtmgrResult<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|_| ArtmgrError::corrupt_ref(branch, "ref is not valid UTF-8"))?;

        let mut set = ArtifactSet::new();
        let mut previous: Option<ObjectId> = None;
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let (key, path) = match line.split_once(' ') {
                Some((key, path)) => (key, Some(path)),
                None => (line, None),
            };

            if key == ALIAS_MARKER {
                let (Some(id), Some(path)) = (previous, path) else {
                    return Err(ArtmgrError::corrupt_ref(branch, line));
                };
                set.add(id, path);
                continue;
            }

            let id = ObjectId::from_hex(key).map_err(|_| ArtmgrError::corrupt_ref(branch, line))?;
            let path = match path {
                Some(path) => path.to_string(),
                None => index
                    .get(&id)
                    .map(|entry| entry.path.clone())
                    .ok_or_else(|| ArtmgrError::MissingObject { id: id.to_hex() })?,
            };
            set.add(id, path);
            previous = Some(id);
        }
        Ok(set)
    }
}

impl Extend<(ObjectId, String)> for ArtifactSet {
    fn extend<I: IntoIterator<Item = (ObjectId, String)>>(&mut self, iter: I) {
        for (id, path) in iter {
            self.add(id, path);
        }
    }
}

impl FromIterator<(ObjectId, String)> for ArtifactSet {
    fn from_iter<I: IntoIterator<Item = (ObjectId, String)>>(iter: I) -> Self {
        let mut set = ArtifactSet::new();
        set.extend(iter);
        set
    }
}
