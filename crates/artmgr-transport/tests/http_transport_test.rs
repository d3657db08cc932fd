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

//! HTTP transport tests against an in-process web server

use artmgr_transport::{HttpTransport, Transport, TransportError};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

type Files = Arc<HashMap<String, Vec<u8>>>;

/// Static file server publishing a fixed set of repository files
struct TestServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn new(files: &[(&str, &[u8])]) -> Self {
        let files: Files = Arc::new(
            files
                .iter()
                .map(|(path, data)| (path.to_string(), data.to_vec()))
                .collect(),
        );
        let router = Router::new()
            .route("/{*path}", get(serve_file))
            .with_state(files);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        TestServer {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn serve_file(
    State(files): State<Files>,
    Path(path): Path<String>,
) -> Result<Vec<u8>, StatusCode> {
    if path.ends_with("broken") {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    files.get(&path).cloned().ok_or(StatusCode::NOT_FOUND)
}

#[tokio::test]
async fn test_exists_uses_status() {
    let server = TestServer::new(&[("project/index", b"")]).await;
    let remote = HttpTransport::new(&server.url(), "project").unwrap();

    assert!(remote.exists("index").await.unwrap());
    assert!(!remote.exists("branches").await.unwrap());
}

#[tokio::test]
async fn test_get_streams_body() {
    let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let server = TestServer::new(&[("project/objects/ab/cdef", &payload)]).await;
    let remote = HttpTransport::new(&server.url(), "project").unwrap();

    let mut out = Vec::new();
    assert!(remote.get("objects/ab/cdef", &mut out).await.unwrap());
    assert_eq!(out, payload);
}

#[tokio::test]
async fn test_get_missing_is_false() {
    let server = TestServer::new(&[]).await;
    let remote = HttpTransport::new(&server.url(), "project").unwrap();

    let mut out = Vec::new();
    assert!(!remote.get("refs/main", &mut out).await.unwrap());
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_server_error_is_transport_error() {
    let server = TestServer::new(&[]).await;
    let remote = HttpTransport::new(&server.url(), "project").unwrap();

    let mut out = Vec::new();
    let err = remote.get("broken", &mut out).await.unwrap_err();
    assert!(matches!(err, TransportError::Http { status: 500, .. }));
    assert!(remote.exists("broken").await.unwrap_err().is_http_status());
}

#[tokio::test]
async fn test_unreachable_host_is_request_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let remote = HttpTransport::new(&format!("http://{addr}"), "project").unwrap();
    let err = remote.exists("index").await.unwrap_err();
    assert!(matches!(err, TransportError::Request { .. }));
}
