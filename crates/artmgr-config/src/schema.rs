// Copyright (C) 2026  artmgr Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Configuration types
//!
//! [`RepoOptions`] is the effective per-repository configuration.
//! [`OptionOverrides`] is one partial layer of it, used both for values
//! persisted in a repository and for values supplied by the caller.
//! [`Settings`] is the session-wide value built once at startup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Newest repository format this build reads and writes
pub const REPOSITORY_VERSION: u32 = 3;

/// Name of the single section in the persisted `options` file
pub const OPTIONS_SECTION: &str = "general";

/// Extensions selected by default when scanning for artifacts
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    "cache", "dump", "pkl", "mat", "rpm", "deb", "mpg", "mp3", "mp4", "doc", "docx", "xls",
    "xlsx", "ppt", "pptx", "ps", "pdf", "odt", "ods", "odp", "zip", "tar", "gz", "bz2", "rar",
];

/// Effective options of one artifact repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoOptions {
    /// Repository format version
    pub version: u32,
    /// Select exactly the files git reports as ignored and untracked
    pub derive_from_vcs_ignore: bool,
    /// Files must be strictly larger than this many bytes to be selected
    /// by extension
    pub minimum_size: u64,
    /// Paths or glob patterns always selected, relative to the project
    pub explicit_files: Vec<String>,
    /// Extensions that mark a file as an artifact, with or without a dot
    pub extension_allowlist: Vec<String>,
}

impl Default for RepoOptions {
    fn default() -> Self {
        RepoOptions {
            version: REPOSITORY_VERSION,
            derive_from_vcs_ignore: false,
            minimum_size: 0,
            explicit_files: Vec::new(),
            extension_allowlist: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl RepoOptions {
    /// Overwrite every field the layer defines
    pub fn apply(&mut self, layer: &OptionOverrides) {
        if let Some(version) = layer.version {
            self.version = version;
        }
        if let Some(flag) = layer.derive_from_vcs_ignore {
            self.derive_from_vcs_ignore = flag;
        }
        if let Some(size) = layer.minimum_size {
            self.minimum_size = size;
        }
        if let Some(files) = &layer.explicit_files {
            self.explicit_files.clone_from(files);
        }
        if let Some(extensions) = &layer.extension_allowlist {
            self.extension_allowlist.clone_from(extensions);
        }
    }
}

/// A partial set of options; `None` leaves the lower layer in place
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionOverrides {
    pub version: Option<u32>,
    pub derive_from_vcs_ignore: Option<bool>,
    pub minimum_size: Option<u64>,
    pub explicit_files: Option<Vec<String>>,
    pub extension_allowlist: Option<Vec<String>>,
}

impl OptionOverrides {
    /// True when the layer sets nothing
    pub fn is_empty(&self) -> bool {
        self == &OptionOverrides::default()
    }
}

/// Session-wide settings, built once and passed to every component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default target address, `read[,write]`
    pub server: Option<String>,
    /// Domain applied to share addresses that name none
    pub share_domain: String,
    /// Directory network shares are mounted under, as `<root>/<host>/<share>`
    pub share_mount_root: Option<PathBuf>,
    /// Newest repository version accepted
    #[serde(skip, default = "supported_version")]
    pub supported_version: u32,
    /// Built-in option defaults, the lowest negotiation layer
    pub default_options: RepoOptions,
}

fn supported_version() -> u32 {
    REPOSITORY_VERSION
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            server: None,
            share_domain: "WORKGROUP".to_string(),
            share_mount_root: None,
            supported_version: REPOSITORY_VERSION,
            default_options: RepoOptions::default(),
        }
    }
}
