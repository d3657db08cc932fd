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

//! Set comparison of artifact collections
//!
//! The unit of comparison is an (id, path) pair, so equality needs both the
//! same content and the same location. A file moved without changes shows
//! up as one pair on each side.

use crate::oid::ObjectId;
use crate::refs::ArtifactSet;
use std::collections::BTreeSet;
use tracing::trace;

/// One object at one path
pub type Pair = (ObjectId, String);

/// Where a pair was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Both,
    LeftOnly,
    RightOnly,
}

/// Result of comparing two collections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    pub in_both: BTreeSet<Pair>,
    pub only_left: BTreeSet<Pair>,
    pub only_right: BTreeSet<Pair>,
}

/// Compare two collections; a missing collection counts as empty
pub fn compare(left: Option<&ArtifactSet>, right: Option<&ArtifactSet>) -> Comparison {
    let left = left.map(ArtifactSet::pairs).unwrap_or_default();
    let right = right.map(ArtifactSet::pairs).unwrap_or_default();

    let comparison = Comparison {
        in_both: left.intersection(&right).cloned().collect(),
        only_left: left.difference(&right).cloned().collect(),
        only_right: right.difference(&left).cloned().collect(),
    };
    trace!(
        both = comparison.in_both.len(),
        left = comparison.only_left.len(),
        right = comparison.only_right.len(),
        "compared collections"
    );
    comparison
}

/// True when `path` lies under the subdirectory scope
///
/// The scope is a path prefix ending in `/`; no scope matches everything.
pub fn in_scope(path: &str, scope: Option<&str>) -> bool {
    scope.is_none_or(|prefix| path.starts_with(prefix))
}

impl Comparison {
    /// Drop pairs outside the subdirectory scope
    pub fn within_scope(mut self, scope: Option<&str>) -> Self {
        if scope.is_some() {
            for set in [&mut self.in_both, &mut self.only_left, &mut self.only_right] {
                set.retain(|(_, path)| in_scope(path, scope));
            }
        }
        self
    }

    /// Every pair with its presence, ordered by path
    pub fn classified(&self) -> Vec<(&Pair, Presence)> {
        let mut all: Vec<(&Pair, Presence)> = self
            .in_both
            .iter()
            .map(|p| (p, Presence::Both))
            .chain(self.only_left.iter().map(|p| (p, Presence::LeftOnly)))
            .chain(self.only_right.iter().map(|p| (p, Presence::RightOnly)))
            .collect();
        all.sort_by(|(a, _), (b, _)| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        all
    }

    pub fn is_identical(&self) -> bool {
        self.only_left.is_empty() && self.only_right.is_empty()
    }
}

/// Pairs ordered by path
pub fn sorted_by_path(pairs: &BTreeSet<Pair>) -> Vec<&Pair> {
    let mut sorted: Vec<&Pair> = pairs.iter().collect();
    sorted.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
    sorted
}
