// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2025 artmgr Contributors

//! Sample project with artifact files.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Deterministic artifact payload derived from `label`.
///
/// Equal labels give equal bytes; the payload is larger than a typical
/// minimum size filter so it is always selected by extension.
pub fn artifact_bytes(label: &str) -> Vec<u8> {
    let mut data = b"PK\x03\x04".to_vec();
    for i in 0..512u32 {
        data.extend_from_slice(label.as_bytes());
        data.extend_from_slice(&i.to_le_bytes());
    }
    data
}

/// A temporary project directory populated with artifacts.
///
/// Layout:
/// ```text
/// sourceA.txt
/// sourceB.txt
/// dir1/artifactA0.zip .. dir1/artifactA{repeat-1}.zip   (identical bytes)
/// dir1/artifactB.zip
/// dir2/
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl TestProject {
    /// Project with one `artifactA` copy.
    pub fn new() -> Self {
        Self::with_repeat(1)
    }

    /// Project with `repeat` identical `artifactA` copies.
    pub fn with_repeat(repeat: usize) -> Self {
        let project = Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        };
        project.create_dir("dir1");
        project.create_dir("dir2");
        project.write_file("sourceA.txt", b"A simple file");
        for i in 0..repeat {
            project.write_file(&format!("dir1/artifactA{i}.zip"), &artifact_bytes("A"));
        }
        project.write_file("sourceB.txt", b"Another simple file");
        project.write_file("dir1/artifactB.zip", &artifact_bytes("B"));
        project
    }

    /// Get the path to the project directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of a project file.
    pub fn join(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Write a file, creating parent directories.
    pub fn write_file(&self, name: &str, content: &[u8]) {
        let path = self.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&path, content).expect("Failed to write file");
    }

    /// Create a directory in the project.
    pub fn create_dir(&self, name: &str) {
        fs::create_dir_all(self.join(name)).expect("Failed to create directory");
    }

    /// Read a file from the project.
    pub fn read_file(&self, name: &str) -> Vec<u8> {
        fs::read(self.join(name)).expect("Failed to read file")
    }

    /// Check if a file exists in the project.
    pub fn file_exists(&self, name: &str) -> bool {
        self.join(name).exists()
    }

    /// Move an artifact from `dir1` to `dir2`, optionally renaming it to
    /// `<stem>-changed.<ext>`. Returns the new relative path.
    pub fn move_artifact(&self, artifact: &str, change_name: bool) -> String {
        let target = match (change_name, artifact.rsplit_once('.')) {
            (true, Some((stem, ext))) => format!("{stem}-changed.{ext}"),
            (true, None) => format!("{artifact}-changed"),
            (false, _) => artifact.to_string(),
        };
        fs::rename(
            self.join(&format!("dir1/{artifact}")),
            self.join(&format!("dir2/{target}")),
        )
        .expect("Failed to move artifact");
        format!("dir2/{target}")
    }

    /// Delete an artifact from `dir1`.
    pub fn delete_artifact(&self, artifact: &str) {
        fs::remove_file(self.join(&format!("dir1/{artifact}"))).expect("Failed to delete artifact");
    }

    /// Relative paths of every file with the given extension.
    pub fn files_with_extension(&self, ext: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        collect(self.path(), self.path(), ext, &mut found);
        found
    }
}

fn collect(base: &Path, dir: &Path, ext: &str, found: &mut BTreeSet<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect(base, &path, ext, found);
        } else if path.extension().is_some_and(|e| e == ext) {
            if let Ok(relative) = path.strip_prefix(base) {
                found.insert(relative.to_string_lossy().replace('\\', "/"));
            }
        }
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let project = TestProject::with_repeat(2);
        let zips = project.files_with_extension("zip");
        assert_eq!(
            zips.into_iter().collect::<Vec<_>>(),
            vec!["dir1/artifactA0.zip", "dir1/artifactA1.zip", "dir1/artifactB.zip"]
        );
        assert_eq!(
            project.read_file("dir1/artifactA0.zip"),
            project.read_file("dir1/artifactA1.zip")
        );
        assert_ne!(
            project.read_file("dir1/artifactA0.zip"),
            project.read_file("dir1/artifactB.zip")
        );
    }

    #[test]
    fn test_move_and_delete() {
        let project = TestProject::new();
        assert_eq!(
            project.move_artifact("artifactB.zip", true),
            "dir2/artifactB-changed.zip"
        );
        assert!(project.file_exists("dir2/artifactB-changed.zip"));
        project.delete_artifact("artifactA0.zip");
        assert!(!project.file_exists("dir1/artifactA0.zip"));
    }
}
