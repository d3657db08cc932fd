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

//! Local artifact scanner
//!
//! Selects the artifact files of a working directory, hashes them and builds
//! a local [`Index`] plus the [`ArtifactSet`] of (id, path) entries.
//!
//! Selection, in order of precedence:
//!
//! 1. with `derive_from_vcs_ignore`, exactly the files git lists as ignored
//!    and untracked;
//! 2. otherwise the files named by `explicit_files` (glob patterns allowed),
//!    plus every file whose extension is in the allow-list and whose size is
//!    strictly greater than `minimum_size`.
//!
//! `.git` folders and symbolic links are never selected. Files with equal
//! content share one object; the first path met is the canonical one.

use crate::error::{ArtmgrError, ArtmgrResult};
use crate::index::{Index, IndexEntry};
use crate::oid::ObjectId;
use crate::refs::ArtifactSet;
use crate::vcs;
use artmgr_config::RepoOptions;
use std::collections::HashSet;
use std::path::{Component, Path};
use std::time::UNIX_EPOCH;
use tracing::{debug, trace};
use walkdir::WalkDir;

const VCS_METADATA_DIR: &str = ".git";

/// Outcome of scanning a directory
#[derive(Debug, Clone, Default)]
pub struct LocalScan {
    pub index: Index,
    pub artifacts: ArtifactSet,
}

/// Scan `dir` for artifacts
///
/// `prefix` is prepended to every recorded path; it is the subdirectory
/// scope when `dir` is a subfolder of the project.
pub async fn scan(dir: &Path, options: &RepoOptions, prefix: Option<&str>) -> ArtmgrResult<LocalScan> {
    let candidates = if options.derive_from_vcs_ignore {
        vcs::ignored_files(dir).await?
    } else {
        select_by_rules(dir, options)?
    };
    debug!(dir = %dir.display(), count = candidates.len(), "selected local artifacts");

    let mut scan = LocalScan::default();
    for relative in candidates {
        let full = dir.join(&relative);
        let metadata = tokio::fs::metadata(&full)
            .await
            .map_err(|e| ArtmgrError::io(&full, e))?;
        let (id, size) = ObjectId::from_file_async(&full).await?;
        let visible = match prefix {
            Some(prefix) => format!("{prefix}{relative}"),
            None => relative,
        };
        trace!(%id, path = %visible, size, "hashed");

        scan.index.insert(
            id,
            IndexEntry {
                mtime: modification_time(&metadata),
                size,
                mode: permission_bits(&metadata),
                path: visible.clone(),
            },
        );
        scan.artifacts.add(id, visible);
    }
    Ok(scan)
}

fn select_by_rules(dir: &Path, options: &RepoOptions) -> ArtmgrResult<Vec<String>> {
    let explicit = expand_explicit(dir, &options.explicit_files)?;
    let extensions: HashSet<String> = options
        .extension_allowlist
        .iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .collect();

    let mut selected = Vec::new();
    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == VCS_METADATA_DIR));
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            ArtmgrError::io(path, e.into())
        })?;
        // symlinks are reported with their own file type and fall out here
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(relative) = relative_path(dir, entry.path()) else {
            continue;
        };
        if explicit.contains(&relative) {
            selected.push(relative);
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if !matches_extension(&name, &extensions) {
            continue;
        }
        let size = entry
            .metadata()
            .map_err(|e| ArtmgrError::io(entry.path(), e.into()))?
            .len();
        if size > options.minimum_size {
            selected.push(relative);
        }
    }
    Ok(selected)
}

/// True when any dotted suffix of `name` is an allowed extension
///
/// `archive.tar.gz` is checked as both `tar.gz` and `gz`.
fn matches_extension(name: &str, extensions: &HashSet<String>) -> bool {
    let parts: Vec<&str> = name.split('.').skip(1).collect();
    (0..parts.len()).any(|i| extensions.contains(&parts[i..].join(".")))
}

fn expand_explicit(dir: &Path, patterns: &[String]) -> ArtmgrResult<HashSet<String>> {
    let mut files = HashSet::new();
    for pattern in patterns {
        if !pattern.contains(['*', '?', '[', ']']) {
            files.insert(normalize(pattern));
            continue;
        }
        let full_pattern = format!(
            "{}/{}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            pattern
        );
        let matches = glob::glob(&full_pattern).map_err(|e| {
            ArtmgrError::invalid_argument(format!("invalid file pattern '{pattern}': {e}"))
        })?;
        for found in matches {
            let found = found.map_err(|e| ArtmgrError::io(e.path().to_path_buf(), e.into()))?;
            if let Some(relative) = relative_path(dir, &found) {
                files.insert(relative);
            }
        }
    }
    Ok(files)
}

/// `path` relative to `base`, with `/` separators
fn relative_path(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("/"))
}

/// Collapse `.`, `..` and repeated separators of a relative path
fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split(['/', '\\']) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

fn modification_time(metadata: &std::fs::Metadata) -> f64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0.0, |d| d.as_secs_f64())
}

#[cfg(unix)]
fn permission_bits(metadata: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn permission_bits(metadata: &std::fs::Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, path: &str, bytes: &[u8]) {
        let full = dir.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, bytes).unwrap();
    }

    fn paths(scan: &LocalScan) -> Vec<String> {
        let mut all: Vec<String> = scan.artifacts.pairs().into_iter().map(|(_, p)| p).collect();
        all.sort();
        all
    }

    #[test]
    fn test_matches_extension() {
        let exts: HashSet<String> = ["gz".to_string(), "zip".to_string()].into();
        assert!(matches_extension("a.tar.gz", &exts));
        assert!(matches_extension("x.zip", &exts));
        assert!(!matches_extension("zip", &exts));
        assert!(!matches_extension("a.gz.txt", &exts));

        let compound: HashSet<String> = ["tar.gz".to_string()].into();
        assert!(matches_extension("a.tar.gz", &compound));
        assert!(!matches_extension("a.gz", &compound));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("./dir1//a.zip"), "dir1/a.zip");
        assert_eq!(normalize("dir1/../dir2/b.zip"), "dir2/b.zip");
        assert_eq!(normalize("dir\\c.bin"), "dir/c.bin");
    }

    #[tokio::test]
    async fn test_identical_files_collapse_into_aliases() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "dir1/artifactA0.zip", b"same bytes");
        write(temp.path(), "dir1/artifactA1.zip", b"same bytes");
        write(temp.path(), "dir1/artifactB.zip", b"other bytes");
        write(temp.path(), "src/main.c", b"int main;");

        let scan = scan(temp.path(), &RepoOptions::default(), None).await.unwrap();
        assert_eq!(scan.index.len(), 2);
        assert_eq!(scan.artifacts.len(), 2);

        let id = ObjectId::hash(b"same bytes");
        assert_eq!(
            scan.artifacts.paths(&id).unwrap(),
            &["dir1/artifactA0.zip", "dir1/artifactA1.zip"]
        );
        assert_eq!(scan.index.get(&id).unwrap().path, "dir1/artifactA0.zip");
        assert_eq!(scan.index.get(&id).unwrap().size, 10);
    }

    #[tokio::test]
    async fn test_minimum_size_is_strict() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "small.zip", b"1234");
        write(temp.path(), "large.zip", b"12345");
        let options = RepoOptions {
            minimum_size: 4,
            ..Default::default()
        };
        let scan = scan(temp.path(), &options, None).await.unwrap();
        assert_eq!(paths(&scan), vec!["large.zip"]);
    }

    #[tokio::test]
    async fn test_explicit_files_and_globs() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "build/app.bin", b"app");
        write(temp.path(), "build/lib.bin", b"lib");
        write(temp.path(), "docs/manual.html", b"<html/>");
        write(temp.path(), "notes.txt", b"not selected");
        let options = RepoOptions {
            explicit_files: vec!["build/*.bin".to_string(), "./docs/manual.html".to_string()],
            extension_allowlist: Vec::new(),
            ..Default::default()
        };
        let scan = scan(temp.path(), &options, None).await.unwrap();
        assert_eq!(
            paths(&scan),
            vec!["build/app.bin", "build/lib.bin", "docs/manual.html"]
        );
    }

    #[tokio::test]
    async fn test_git_metadata_excluded() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), ".git/objects/pack.zip", b"internal");
        write(temp.path(), "out.zip", b"artifact");
        let scan = scan(temp.path(), &RepoOptions::default(), None).await.unwrap();
        assert_eq!(paths(&scan), vec!["out.zip"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_excluded_and_mode_recorded() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        write(temp.path(), "real.zip", b"payload");
        fs::set_permissions(temp.path().join("real.zip"), fs::Permissions::from_mode(0o755)).unwrap();
        std::os::unix::fs::symlink(temp.path().join("real.zip"), temp.path().join("link.zip")).unwrap();

        let scan = scan(temp.path(), &RepoOptions::default(), None).await.unwrap();
        assert_eq!(paths(&scan), vec!["real.zip"]);
        let id = ObjectId::hash(b"payload");
        assert_eq!(scan.index.get(&id).unwrap().mode, 0o755);
    }

    #[tokio::test]
    async fn test_prefix_applied_to_recorded_paths() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.zip", b"a");
        let scan = scan(temp.path(), &RepoOptions::default(), Some("sub/")).await.unwrap();
        assert_eq!(paths(&scan), vec!["sub/a.zip"]);
    }
}
