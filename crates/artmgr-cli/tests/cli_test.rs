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

//! End-to-end tests of the artmgr binary against a scratch local server

use artmgr_test_utils::{artmgr, ArtmgrCommand, TestProject, TestServer, BRANCH_NAME, REPO_NAME};
use predicates::prelude::*;

struct Fixture {
    server: TestServer,
    project: TestProject,
}

impl Fixture {
    fn new() -> Self {
        Fixture {
            server: TestServer::new(),
            project: TestProject::new(),
        }
    }

    fn cmd(&self) -> ArtmgrCommand {
        ArtmgrCommand::new(&self.server.address(), REPO_NAME, self.project.path())
    }

    fn upload(&self) {
        self.cmd().args(&["upload", BRANCH_NAME]).run_success();
    }
}

// ============================================================================
// Basics
// ============================================================================

#[test]
fn test_version_needs_no_server() {
    artmgr()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("artmgr"))
        .stdout(predicate::str::contains("repository format: 3"));
}

#[test]
fn test_missing_server_fails() {
    let project = TestProject::new();
    artmgr()
        .args(["--repo", REPO_NAME, "--project-dir"])
        .arg(project.path())
        .arg("branches")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--server"));
}

#[test]
fn test_unknown_subcommand_fails() {
    artmgr().arg("frobnicate").assert().failure();
}

// ============================================================================
// Upload and listing
// ============================================================================

#[test]
fn test_upload_creates_branch() {
    let fx = Fixture::new();
    fx.cmd()
        .args(&["upload", BRANCH_NAME])
        .run_success()
        .stdout(predicate::str::contains("uploaded"))
        .stdout(predicate::str::contains("New objects"));

    assert!(fx.server.read(REPO_NAME, "index").is_some());
    fx.cmd()
        .arg("branches")
        .run_success()
        .stdout(predicate::str::contains(BRANCH_NAME));
}

#[test]
fn test_upload_refuses_existing_branch() {
    let fx = Fixture::new();
    fx.upload();
    fx.cmd()
        .args(&["upload", BRANCH_NAME])
        .run_failure()
        .code(1)
        .stderr(predicate::str::contains("--overwrite"));
    fx.cmd()
        .args(&["upload", BRANCH_NAME, "--overwrite"])
        .run_success();
}

#[test]
fn test_dry_run_upload_writes_nothing() {
    let fx = Fixture::new();
    fx.cmd()
        .args(&["--dry-run", "upload", BRANCH_NAME])
        .run_success()
        .stdout(predicate::str::contains("Dry run"));
    assert!(fx.server.read(REPO_NAME, "index").is_none());
    assert!(fx.server.read(REPO_NAME, "branches").is_none());
}

#[test]
fn test_list_branch_and_local() {
    let fx = Fixture::new();
    fx.cmd()
        .args(&["list", "--local"])
        .run_success()
        .stdout(predicate::str::contains("dir1/artifactA0.zip"))
        .stdout(predicate::str::contains("sourceA.txt").not());

    fx.upload();
    fx.cmd()
        .args(&["list", BRANCH_NAME])
        .run_success()
        .stdout(predicate::str::contains("dir1/artifactB.zip"));
    fx.cmd()
        .args(&["list", "--all"])
        .run_success()
        .stdout(predicate::str::contains("dir1/artifactA0.zip"));
    fx.cmd().args(&["list", "nowhere"]).run_failure();
}

#[test]
fn test_list_with_subdir_strips_prefix() {
    let fx = Fixture::new();
    fx.upload();
    fx.cmd()
        .args(&["--subdir", "dir1", "list", BRANCH_NAME])
        .run_success()
        .stdout(predicate::str::contains(" artifactB.zip"))
        .stdout(predicate::str::contains("dir1/").not());
}

// ============================================================================
// Comparisons
// ============================================================================

#[test]
fn test_status_before_and_after_upload() {
    let fx = Fixture::new();
    fx.cmd()
        .args(&["status", BRANCH_NAME])
        .run_success()
        .stdout(predicate::str::contains("only in local"));

    fx.upload();
    fx.cmd()
        .args(&["status", BRANCH_NAME])
        .run_success()
        .stdout(predicate::str::contains("matches"));
    fx.cmd()
        .args(&["status", BRANCH_NAME, "--all"])
        .run_success()
        .stdout(predicate::str::contains("in both"));
}

#[test]
fn test_diff_between_branches() {
    let fx = Fixture::new();
    fx.upload();
    let moved = fx.project.move_artifact("artifactB.zip", true);
    fx.cmd().args(&["upload", "second"]).run_success();

    fx.cmd()
        .args(&["diff", BRANCH_NAME, "second"])
        .run_success()
        .stdout(predicate::str::contains("only in second"))
        .stdout(predicate::str::contains(moved.as_str()))
        .stdout(predicate::str::contains("dir1/artifactB.zip"));
    fx.cmd()
        .args(&["diff", BRANCH_NAME, "missing"])
        .run_failure();
}

// ============================================================================
// Download and get
// ============================================================================

#[test]
fn test_download_restores_deleted_artifact() {
    let fx = Fixture::new();
    fx.upload();
    let original = fx.project.read_file("dir1/artifactB.zip");
    fx.project.delete_artifact("artifactB.zip");

    fx.cmd()
        .args(&["download", BRANCH_NAME])
        .run_success()
        .stdout(predicate::str::contains("Downloaded"));
    assert_eq!(fx.project.read_file("dir1/artifactB.zip"), original);

    fx.cmd().args(&["download", "missing"]).run_failure();
}

#[test]
fn test_download_remove_old() {
    let fx = Fixture::new();
    fx.upload();
    fx.project.write_file("dir1/extra.zip", b"not in the branch");

    fx.cmd().args(&["download", BRANCH_NAME]).run_success();
    assert!(fx.project.file_exists("dir1/extra.zip"));
    fx.cmd()
        .args(&["download", BRANCH_NAME, "--remove-old"])
        .run_success();
    assert!(!fx.project.file_exists("dir1/extra.zip"));
}

#[test]
fn test_get_single_file() {
    let fx = Fixture::new();
    fx.upload();
    let out = fx.project.join("copy.zip");
    fx.cmd()
        .args(&["get", "dir1/artifactB.zip", BRANCH_NAME, "-o"])
        .arg(out.to_str().unwrap())
        .run_success();
    assert_eq!(
        std::fs::read(&out).unwrap(),
        fx.project.read_file("dir1/artifactB.zip")
    );

    fx.cmd()
        .args(&["get", "dir1/nothing.zip", BRANCH_NAME])
        .run_failure()
        .stderr(predicate::str::contains("not found"));
}

// ============================================================================
// Branch maintenance
// ============================================================================

#[test]
fn test_log_and_rename() {
    let fx = Fixture::new();
    fx.upload();
    fx.cmd()
        .args(&["set-log", BRANCH_NAME, "nightly build 42"])
        .run_success();
    fx.cmd()
        .args(&["log", BRANCH_NAME])
        .run_success()
        .stdout(predicate::str::contains("nightly build 42"));

    fx.cmd()
        .args(&["rename", BRANCH_NAME, "release"])
        .run_success();
    fx.cmd()
        .args(&["branches", "--logs"])
        .run_success()
        .stdout(predicate::str::contains("release"))
        .stdout(predicate::str::contains("nightly build 42"));
    fx.cmd()
        .args(&["rename", BRANCH_NAME, "again"])
        .run_failure();
    fx.cmd()
        .args(&["set-log", "missing", "text"])
        .run_failure();
}

// ============================================================================
// Options
// ============================================================================

#[test]
fn test_options_show_and_save() {
    let fx = Fixture::new();
    fx.upload();
    fx.cmd()
        .arg("options")
        .run_success()
        .stdout(predicate::str::contains("[general]"))
        .stdout(predicate::str::contains("minimum_size = 0"));

    fx.cmd()
        .args(&["--min-size", "4096", "options", "--save"])
        .run_success();
    fx.cmd()
        .arg("options")
        .run_success()
        .stdout(predicate::str::contains("minimum_size = 4096"));
}

#[test]
fn test_min_size_override_filters_artifacts() {
    let fx = Fixture::new();
    fx.project.write_file("dir1/tiny.zip", b"x");
    fx.cmd()
        .args(&["--min-size", "10", "list", "--local"])
        .run_success()
        .stdout(predicate::str::contains("tiny.zip").not())
        .stdout(predicate::str::contains("artifactB.zip"));
}
