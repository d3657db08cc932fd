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

//! Read-only HTTP(S) transport
//!
//! Serves a repository published by any static web server. Existence is
//! probed with `HEAD`, content is fetched with a streamed `GET`. A 404
//! means the entry is absent; every other non-success status is an error.

use crate::{validate_path, Sink, Transport, TransportError, TransportResult};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// HTTP transport rooted at `<address>/<repo>/`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for repository `repo` published under `address`
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `address` or `repo` is empty.
    pub fn new(address: &str, repo: &str) -> TransportResult<Self> {
        let address = address.trim();
        if address.is_empty() {
            return Err(TransportError::invalid_argument(
                "HTTP address cannot be empty",
            ));
        }
        let repo = repo.trim_matches('/');
        if repo.is_empty() {
            return Err(TransportError::invalid_argument(
                "repository name cannot be empty",
            ));
        }
        let base_url = format!("{}/{}/", address.trim_end_matches('/'), repo);
        let client = Client::builder()
            .user_agent(concat!("artmgr/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| TransportError::Request {
                url: base_url.clone(),
                source,
            })?;
        Ok(HttpTransport { client, base_url })
    }

    /// URL every repository path is resolved against
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> TransportResult<String> {
        validate_path(path)?;
        Ok(format!("{}{}", self.base_url, path))
    }

    /// Map a response to present (`true`), absent (`false`) or an error
    fn classify(url: &str, response: &Response) -> TransportResult<bool> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            Ok(false)
        } else if status.is_success() {
            Ok(true)
        } else {
            Err(TransportError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn exists(&self, path: &str) -> TransportResult<bool> {
        let url = self.url(path)?;
        debug!("HEAD {}", url);
        let response = self
            .client
            .head(&url)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;
        Self::classify(&url, &response)
    }

    async fn get(&self, path: &str, sink: Sink<'_>) -> TransportResult<bool> {
        let url = self.url(path)?;
        debug!("GET {}", url);
        let mut response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?;
        if !Self::classify(&url, &response)? {
            return Ok(false);
        }

        let mut received = 0usize;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|source| TransportError::Request {
                url: url.clone(),
                source,
            })?
        {
            received += chunk.len();
            sink.write_all(&chunk)
                .await
                .map_err(|e| TransportError::io(path, e))?;
        }
        sink.flush().await.map_err(|e| TransportError::io(path, e))?;
        debug!(url = %url, bytes = received, "download complete");
        Ok(true)
    }
}
