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

//! End-to-end repository tests over a local folder server

use artmgr_config::{OptionOverrides, Settings};
use artmgr_core::{
    scan, ArtifactManager, ArtifactReader, ArtifactSet, ListSource, ObjectId, SessionOptions,
    UploadOutcome, LABEL_IN_BOTH, LABEL_ONLY_LOCAL, LABEL_ONLY_SERVER,
};
use artmgr_test_utils::{artifact_bytes, TestProject, TestServer, BRANCH_NAME, REPO_NAME};
use artmgr_transport::OpenOptions;
use std::path::Path;
use tempfile::TempDir;

fn session(server: &TestServer) -> SessionOptions {
    SessionOptions::new(&server.address(), REPO_NAME).unwrap()
}

async fn open_manager(session: &SessionOptions) -> ArtifactManager {
    let settings = Settings::default();
    let open = OpenOptions::new(&settings.share_domain, None);
    ArtifactManager::open(session, &settings, &open).await.unwrap()
}

async fn open_reader(session: &SessionOptions) -> ArtifactReader {
    let settings = Settings::default();
    let open = OpenOptions::new(&settings.share_domain, None);
    ArtifactReader::open(session, &settings, &open).await.unwrap()
}

async fn local_pairs(dir: &Path) -> ArtifactSet {
    scan::scan(dir, &Default::default(), None)
        .await
        .unwrap()
        .artifacts
}

#[tokio::test]
async fn test_upload_to_empty_repository() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::new();
    let mut mgr = open_manager(&session(&server)).await;

    let outcome = mgr
        .upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();
    assert_eq!(outcome, UploadOutcome::Transferred(2));
    assert_eq!(mgr.index().len(), 2);
    assert_eq!(mgr.list_branches(), vec![BRANCH_NAME]);

    for file in ["options", "README", "README.html", "branches"] {
        assert!(server.read(REPO_NAME, file).is_some(), "{file} missing");
    }
    let index = String::from_utf8(server.read(REPO_NAME, "index").unwrap()).unwrap();
    assert_eq!(index.lines().count(), 2);
    assert!(index.contains(" dir1/artifactB.zip"));

    let id = ObjectId::hash(&artifact_bytes("B"));
    assert_eq!(
        server.read(REPO_NAME, &id.storage_path()).unwrap(),
        artifact_bytes("B")
    );
    // no staging leftovers
    assert!(server.read(REPO_NAME, "index.new").is_none());
}

#[tokio::test]
async fn test_repository_state_visible_to_new_session() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::new();
    open_manager(&session(&server))
        .await
        .upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();

    let reader = open_reader(&session(&server)).await;
    assert!(reader.is_initialized());
    assert_eq!(reader.list_branches(), vec![BRANCH_NAME]);
    let branch = reader.get_branch(BRANCH_NAME).await.unwrap().unwrap();
    assert_eq!(branch.pairs(), local_pairs(project.path()).await.pairs());
}

#[tokio::test]
async fn test_repeated_upload() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::new();
    let mut mgr = open_manager(&session(&server)).await;

    mgr.upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();
    let ref_before = server.read(REPO_NAME, "refs/myBranch").unwrap();
    let index_before = server.read(REPO_NAME, "index").unwrap();

    let again = mgr
        .upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();
    assert_eq!(again, UploadOutcome::BranchExists);
    assert_eq!(server.read(REPO_NAME, "refs/myBranch").unwrap(), ref_before);
    assert_eq!(server.read(REPO_NAME, "index").unwrap(), index_before);

    let forced = mgr
        .upload_artifacts(project.path(), BRANCH_NAME, true)
        .await
        .unwrap();
    assert_eq!(forced, UploadOutcome::Transferred(0));
    assert_eq!(server.read(REPO_NAME, "refs/myBranch").unwrap(), ref_before);
}

#[tokio::test]
async fn test_second_branch_reuses_objects() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::with_repeat(2);
    let mut mgr = open_manager(&session(&server)).await;

    let first = mgr
        .upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();
    assert_eq!(first, UploadOutcome::Transferred(2));
    let second = mgr
        .upload_artifacts(project.path(), "myBranch2", false)
        .await
        .unwrap();
    assert_eq!(second, UploadOutcome::Transferred(0));
    assert_eq!(mgr.list_branches(), vec!["myBranch", "myBranch2"]);

    let report = mgr.diff(BRANCH_NAME, "myBranch2", false).await.unwrap().unwrap();
    assert_eq!(report.item_count(), 0);
}

#[tokio::test]
async fn test_identical_files_stored_once() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::with_repeat(2);
    let mut mgr = open_manager(&session(&server)).await;

    let local = mgr.local_scan(project.path()).await.unwrap();
    let id = ObjectId::hash(&artifact_bytes("A"));
    assert_eq!(local.artifacts.len(), 2);
    assert_eq!(
        local.artifacts.paths(&id).unwrap(),
        &["dir1/artifactA0.zip", "dir1/artifactA1.zip"]
    );

    let outcome = mgr
        .upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();
    assert_eq!(outcome, UploadOutcome::Transferred(2));
    let stored: usize = std::fs::read_dir(server.path().join(REPO_NAME).join("objects"))
        .unwrap()
        .map(|shard| std::fs::read_dir(shard.unwrap().path()).unwrap().count())
        .sum();
    assert_eq!(stored, 2);

    let ref_text = String::from_utf8(server.read(REPO_NAME, "refs/myBranch").unwrap()).unwrap();
    assert!(ref_text.contains(&format!("{id} dir1/artifactA0.zip\n- dir1/artifactA1.zip\n")));

    let report = mgr
        .local_changes(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();
    assert_eq!(report.item_count(), 0);
}

#[tokio::test]
async fn test_local_changes_before_and_after_upload() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::new();
    let mut mgr = open_manager(&session(&server)).await;

    let before = mgr
        .local_changes(project.path(), BRANCH_NAME, true)
        .await
        .unwrap();
    assert_eq!(before.section(LABEL_IN_BOTH).unwrap().items.len(), 0);
    assert_eq!(before.section(LABEL_ONLY_LOCAL).unwrap().items.len(), 2);
    assert_eq!(before.section(LABEL_ONLY_SERVER).unwrap().items.len(), 0);

    mgr.upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();
    let after = mgr
        .local_changes(project.path(), BRANCH_NAME, true)
        .await
        .unwrap();
    assert_eq!(after.section(LABEL_IN_BOTH).unwrap().items.len(), 2);
    assert_eq!(after.section(LABEL_ONLY_LOCAL).unwrap().items.len(), 0);

    let brief = mgr
        .local_changes(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();
    assert!(brief.section(LABEL_IN_BOTH).is_none());
}

#[tokio::test]
async fn test_download_restores_deleted_artifact() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::new();
    let mut mgr = open_manager(&session(&server)).await;
    mgr.upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();
    let recorded_mtime = mgr
        .index()
        .get(&ObjectId::hash(&artifact_bytes("B")))
        .unwrap()
        .mtime;

    project.delete_artifact("artifactB.zip");
    project.write_file("dir1/extra.zip", &artifact_bytes("extra"));
    mgr.invalidate_local();

    let fetched = mgr
        .download_artifacts(BRANCH_NAME, project.path(), false)
        .await
        .unwrap();
    assert_eq!(fetched, Some(1));
    assert_eq!(project.read_file("dir1/artifactB.zip"), artifact_bytes("B"));
    assert!(project.file_exists("dir1/extra.zip"));

    let modified = std::fs::metadata(project.join("dir1/artifactB.zip"))
        .unwrap()
        .modified()
        .unwrap()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs_f64();
    assert!((modified - recorded_mtime).abs() < 1e-3);

    let fetched = mgr
        .download_artifacts(BRANCH_NAME, project.path(), true)
        .await
        .unwrap();
    assert_eq!(fetched, Some(0));
    assert!(!project.file_exists("dir1/extra.zip"));
}

#[tokio::test]
async fn test_download_unknown_branch() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::new();
    let mut mgr = open_manager(&session(&server)).await;
    let fetched = mgr
        .download_artifacts("nope", project.path(), false)
        .await
        .unwrap();
    assert_eq!(fetched, None);
}

#[tokio::test]
async fn test_download_with_remove_old_replaces_changed_content() {
    for label in ["first", "second", "third", "fourth", "fifth"] {
        let server = TestServer::with_repo(REPO_NAME);
        let project = TestProject::new();
        let mut mgr = open_manager(&session(&server)).await;
        mgr.upload_artifacts(project.path(), BRANCH_NAME, false)
            .await
            .unwrap();

        project.write_file("dir1/artifactB.zip", &artifact_bytes(label));
        mgr.invalidate_local();

        let fetched = mgr
            .download_artifacts(BRANCH_NAME, project.path(), true)
            .await
            .unwrap();
        assert_eq!(fetched, Some(1), "{label}");
        assert_eq!(
            project.read_file("dir1/artifactB.zip"),
            artifact_bytes("B"),
            "{label}"
        );
        let report = mgr
            .local_changes(project.path(), BRANCH_NAME, false)
            .await
            .unwrap();
        assert_eq!(report.item_count(), 0, "{label}");
    }
}

#[tokio::test]
async fn test_download_from_corrupt_ref_keeps_local_files() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::new();
    let mut mgr = open_manager(&session(&server)).await;
    mgr.upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();
    let before = local_pairs(project.path()).await;

    let repo = server.repo_dir().unwrap();
    std::fs::write(
        repo.join("refs").join(BRANCH_NAME),
        "- dir1/artifactB.zip\n",
    )
    .unwrap();

    let mut reader = open_reader(&session(&server)).await;
    let fetched = reader
        .download_artifacts(BRANCH_NAME, project.path(), true)
        .await
        .unwrap();
    assert_eq!(fetched, None);
    assert_eq!(local_pairs(project.path()).await.pairs(), before.pairs());
}

#[cfg(unix)]
#[tokio::test]
async fn test_download_restores_mode() {
    use std::os::unix::fs::PermissionsExt;

    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::new();
    let artifact = project.join("dir1/artifactB.zip");
    std::fs::set_permissions(&artifact, std::fs::Permissions::from_mode(0o750)).unwrap();
    let mut mgr = open_manager(&session(&server)).await;
    mgr.upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();

    let target = TempDir::new().unwrap();
    let mut reader = open_reader(&session(&server)).await;
    reader
        .download_artifacts(BRANCH_NAME, target.path(), false)
        .await
        .unwrap();
    let mode = std::fs::metadata(target.path().join("dir1/artifactB.zip"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o7777, 0o750);
}

#[tokio::test]
async fn test_round_trip_into_empty_directory() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::with_repeat(3);
    let mut mgr = open_manager(&session(&server)).await;
    mgr.upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();

    let target = TempDir::new().unwrap();
    let mut reader = open_reader(&session(&server)).await;
    let fetched = reader
        .download_artifacts(BRANCH_NAME, target.path(), false)
        .await
        .unwrap();
    assert_eq!(fetched, Some(4));
    assert_eq!(
        local_pairs(target.path()).await.pairs(),
        local_pairs(project.path()).await.pairs()
    );
}

#[tokio::test]
async fn test_moved_artifact_diff_between_branches() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::with_repeat(2);
    let mut mgr = open_manager(&session(&server)).await;
    mgr.upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();

    let moved = project.move_artifact("artifactB.zip", false);
    mgr.invalidate_local();
    let outcome = mgr
        .upload_artifacts(project.path(), "myBranch2", false)
        .await
        .unwrap();
    assert_eq!(outcome, UploadOutcome::Transferred(0));

    let report = mgr.diff(BRANCH_NAME, "myBranch2", false).await.unwrap().unwrap();
    let old = report.section("only in myBranch").unwrap();
    let new = report.section("only in myBranch2").unwrap();
    assert_eq!(old.items.len(), 1);
    assert_eq!(new.items.len(), 1);
    assert_eq!(old.items[0].path, "dir1/artifactB.zip");
    assert_eq!(new.items[0].path, moved);
    assert_eq!(old.items[0].id, new.items[0].id);

    assert!(mgr.diff(BRANCH_NAME, "absent", false).await.unwrap().is_none());
}

#[tokio::test]
async fn test_rename_moves_log() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::new();
    let mut mgr = open_manager(&session(&server)).await;
    mgr.upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();

    assert_eq!(mgr.get_log(BRANCH_NAME).await.unwrap(), "");
    mgr.put_log(BRANCH_NAME, "This Is A Log").await.unwrap();
    assert_eq!(mgr.get_log(BRANCH_NAME).await.unwrap(), "This Is A Log");

    assert!(mgr.rename_branch(BRANCH_NAME, "myRenamedBranch").await.unwrap());
    assert_eq!(mgr.get_log("myRenamedBranch").await.unwrap(), "This Is A Log");
    assert_eq!(mgr.get_log(BRANCH_NAME).await.unwrap(), "");
    assert_eq!(mgr.list_branches(), vec!["myRenamedBranch"]);
    assert!(mgr.get_branch(BRANCH_NAME).await.unwrap().is_none());
    assert!(mgr.get_branch("myRenamedBranch").await.unwrap().is_some());

    let registry = String::from_utf8(server.read(REPO_NAME, "branches").unwrap()).unwrap();
    assert_eq!(registry, "myRenamedBranch");

    assert!(!mgr.rename_branch("ghost", "other").await.unwrap());
}

#[tokio::test]
async fn test_rename_onto_existing_branch_refused() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::new();
    let mut mgr = open_manager(&session(&server)).await;
    mgr.upload_artifacts(project.path(), "a", false).await.unwrap();
    project.delete_artifact("artifactB.zip");
    mgr.invalidate_local();
    mgr.upload_artifacts(project.path(), "b", false).await.unwrap();
    mgr.put_log("b", "kept").await.unwrap();
    let b_ref = server.read(REPO_NAME, "refs/b").unwrap();

    assert!(!mgr.rename_branch("a", "b").await.unwrap());
    assert_eq!(mgr.list_branches(), vec!["a", "b"]);
    assert_eq!(server.read(REPO_NAME, "refs/b").unwrap(), b_ref);
    assert_eq!(mgr.get_log("b").await.unwrap(), "kept");
    assert!(mgr.get_branch("a").await.unwrap().is_some());
}

#[tokio::test]
async fn test_rename_clears_stale_log_of_target() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::new();
    let mut mgr = open_manager(&session(&server)).await;
    mgr.upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();
    let logs = server.repo_dir().unwrap().join("logs");
    std::fs::create_dir_all(&logs).unwrap();
    std::fs::write(logs.join("fresh"), "left over").unwrap();

    assert!(mgr.rename_branch(BRANCH_NAME, "fresh").await.unwrap());
    assert_eq!(mgr.get_log("fresh").await.unwrap(), "");
    assert!(server.read(REPO_NAME, "logs/fresh").is_none());
}

#[tokio::test]
async fn test_branches_with_logs() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::new();
    let mut mgr = open_manager(&session(&server)).await;
    mgr.upload_artifacts(project.path(), "a", false).await.unwrap();
    mgr.upload_artifacts(project.path(), "b", false).await.unwrap();
    mgr.put_log("b", "second").await.unwrap();

    let listed = mgr.list_branches_with_logs().await.unwrap();
    assert_eq!(
        listed,
        vec![
            ("a".to_string(), String::new()),
            ("b".to_string(), "second".to_string())
        ]
    );
}

#[tokio::test]
async fn test_get_single_file() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::new();
    let mut mgr = open_manager(&session(&server)).await;
    mgr.upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();

    let out = TempDir::new().unwrap();
    let target = out.path().join("copy.zip");
    assert!(mgr
        .get("dir1/artifactB.zip", BRANCH_NAME, &target)
        .await
        .unwrap());
    assert_eq!(std::fs::read(&target).unwrap(), artifact_bytes("B"));

    assert!(!mgr.get("dir1/absent.zip", BRANCH_NAME, &target).await.unwrap());
    assert!(!mgr.get("dir1/artifactB.zip", "absent", &target).await.unwrap());
}

#[tokio::test]
async fn test_list_artifacts() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::with_repeat(2);
    let mut mgr = open_manager(&session(&server)).await;
    mgr.upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();

    let branch = mgr
        .list_artifacts(&ListSource::Branch(BRANCH_NAME.to_string()))
        .await
        .unwrap()
        .unwrap();
    let primary: Vec<&str> = branch.iter().map(|l| l.paths[0].as_str()).collect();
    assert_eq!(primary, vec!["dir1/artifactA0.zip", "dir1/artifactB.zip"]);
    assert_eq!(branch[0].paths.len(), 2);

    let all = mgr.list_artifacts(&ListSource::All).await.unwrap().unwrap();
    assert_eq!(all.len(), 2);

    let local = mgr
        .list_artifacts(&ListSource::Local(project.path().to_path_buf()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(local.len(), 2);

    assert!(mgr
        .list_artifacts(&ListSource::Branch("absent".to_string()))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_subdirectory_scope() {
    let server = TestServer::with_repo(REPO_NAME);
    let project = TestProject::new();
    let scoped = session(&server).with_subdir(Some("dir1"));
    let mut mgr = open_manager(&scoped).await;

    let outcome = mgr
        .upload_artifacts(&project.join("dir1"), BRANCH_NAME, false)
        .await
        .unwrap();
    assert_eq!(outcome, UploadOutcome::Transferred(2));
    let branch = mgr.get_branch(BRANCH_NAME).await.unwrap().unwrap();
    assert!(branch.find_path("dir1/artifactB.zip").is_some());

    let target = TempDir::new().unwrap();
    let fetched = mgr
        .download_artifacts(BRANCH_NAME, target.path(), false)
        .await
        .unwrap();
    assert_eq!(fetched, Some(2));
    assert!(target.path().join("artifactB.zip").exists());
}

#[tokio::test]
async fn test_options_persisted_at_init() {
    let server = TestServer::with_repo(REPO_NAME);
    let overrides = OptionOverrides {
        minimum_size: Some(1_000_000),
        ..Default::default()
    };
    let mgr = open_manager(&session(&server).with_overrides(overrides)).await;
    assert_eq!(mgr.options().minimum_size, 1_000_000);

    let reader = open_reader(&session(&server)).await;
    assert_eq!(reader.options().minimum_size, 1_000_000);
    assert!(reader.render_options().unwrap().contains("minimum_size = 1000000"));

    // nothing in the sample project is large enough any more
    let project = TestProject::new();
    let mut mgr = open_manager(&session(&server)).await;
    let outcome = mgr
        .upload_artifacts(project.path(), BRANCH_NAME, false)
        .await
        .unwrap();
    assert_eq!(outcome, UploadOutcome::Transferred(0));
}

#[tokio::test]
async fn test_newer_repository_version_rejected() {
    let server = TestServer::with_repo(REPO_NAME);
    std::fs::write(
        server.path().join(REPO_NAME).join("options"),
        "[general]\nversion = 99\n",
    )
    .unwrap();

    let settings = Settings::default();
    let open = OpenOptions::new(&settings.share_domain, None);
    let err = ArtifactReader::open(&session(&server), &settings, &open)
        .await
        .unwrap_err();
    assert!(err.is_unsupported_version());
}

#[tokio::test]
async fn test_unparseable_option_is_terminal() {
    let server = TestServer::with_repo(REPO_NAME);
    std::fs::write(
        server.path().join(REPO_NAME).join("options"),
        "[general]\nminimum_size = \"large\"\n",
    )
    .unwrap();

    let settings = Settings::default();
    let open = OpenOptions::new(&settings.share_domain, None);
    let err = ArtifactReader::open(&session(&server), &settings, &open)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("minimum_size"));
}
