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

//! Object index
//!
//! The index maps every object id to the metadata of the file it came from.
//! It is persisted one record per line as `<id> <mtime> <size> <mode> <path>`,
//! with the mode in octal and the records sorted by id. The path is the last
//! field and may contain spaces.
//!
//! The remote index only grows: entries are added by uploads and never
//! pruned. A local index is rebuilt by scanning and lives for one session.

use crate::error::{ArtmgrError, ArtmgrResult};
use crate::oid::ObjectId;
use std::collections::btree_map::{self, BTreeMap};
use std::fmt::Write;

/// Metadata recorded for one object
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    /// Modification time, seconds since the epoch
    pub mtime: f64,
    pub size: u64,
    /// Permission bits
    pub mode: u32,
    /// Canonical path: the first location the content was seen at
    pub path: String,
}

/// Id to metadata table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Index {
    entries: BTreeMap<ObjectId, IndexEntry>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &ObjectId) -> Option<&IndexEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.entries.contains_key(id)
    }

    /// Record an entry, keeping an existing one for the same id
    ///
    /// Returns true when the id was new.
    pub fn insert(&mut self, id: ObjectId, entry: IndexEntry) -> bool {
        match self.entries.entry(id) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(entry);
                true
            }
            btree_map::Entry::Occupied(_) => false,
        }
    }

    /// Entries in id order
    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &IndexEntry)> {
        self.entries.iter()
    }

    /// Parse the persisted form
    ///
    /// Blank lines are skipped. A line with fewer than five fields, or a field
    /// that does not parse, is an error naming the line number.
    pub fn parse(text: &str) -> ArtmgrResult<Self> {
        let mut index = Index::new();
        for (number, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let malformed = |what: &str| {
                ArtmgrError::invalid_argument(format!(
                    "malformed index line {}: {what}: '{line}'",
                    number + 1
                ))
            };

            let fields: Vec<&str> = line.splitn(5, ' ').collect();
            let [id, mtime, size, mode, path] = fields[..] else {
                return Err(malformed("expected 5 fields"));
            };
            let id = ObjectId::from_hex(id).map_err(|_| malformed("bad object id"))?;
            let mtime: f64 = mtime.parse().map_err(|_| malformed("bad mtime"))?;
            if !mtime.is_finite() {
                return Err(malformed("bad mtime"));
            }
            let entry = IndexEntry {
                mtime,
                size: size.parse().map_err(|_| malformed("bad size"))?,
                mode: u32::from_str_radix(mode, 8).map_err(|_| malformed("bad mode"))?,
                path: path.to_string(),
            };
            index.entries.insert(id, entry);
        }
        Ok(index)
    }

    /// Persisted form, sorted by id
    pub fn encode(&self) -> String {
        let mut out = String::new();
        for (id, entry) in &self.entries {
            // writing into a String cannot fail
            let _ = writeln!(
                out,
                "{} {} {} 0{:o} {}",
                id, entry.mtime, entry.size, entry.mode, entry.path
            );
        }
        out
    }
}

impl FromIterator<(ObjectId, IndexEntry)> for Index {
    fn from_iter<I: IntoIterator<Item = (ObjectId, IndexEntry)>>(iter: I) -> Self {
        let mut index = Index::new();
        for (id, entry) in iter {
            index.insert(id, entry);
        }
        index
    }
}

impl Extend<(ObjectId, IndexEntry)> for Index {
    fn extend<I: IntoIterator<Item = (ObjectId, IndexEntry)>>(&mut self, iter: I) {
        for (id, entry) in iter {
            self.insert(id, entry);
        }
    }
}
