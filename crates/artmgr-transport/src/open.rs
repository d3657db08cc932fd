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

//! Opening transports from target addresses
//!
//! A session is given one or two target addresses: a read address and an
//! optional, distinct read-write address. They can be written together as
//! `read[,write]`. The address prefix picks the backend:
//!
//! | prefix | backend |
//! |---|---|
//! | `http:`, `https:` | [`HttpTransport`] (read-only) |
//! | `\\`, `smb:` | [`ShareTransport`] |
//! | anything else | [`LocalTransport`] |
//!
//! [`open_reader`] hands back a `Box<dyn Transport>` and [`open_writer`] a
//! `Box<dyn WriteTransport>`, so whether a session can write is known from
//! its type.

use crate::{
    CredentialPrompt, HttpTransport, LocalTransport, MountedShareConnector, ShareAddress,
    ShareConnector, ShareDefaults, ShareTransport, Transport, TransportError, TransportResult,
    WriteTransport,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Backend family selected by an address prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// Read-only web server
    Http,
    /// Network share
    Share,
    /// Local directory
    Local,
}

impl AddressKind {
    /// Classify a target address
    pub fn of(address: &str) -> Self {
        if address.starts_with("http:") || address.starts_with("https:") {
            AddressKind::Http
        } else if address.starts_with("\\\\") || address.starts_with("smb:") {
            AddressKind::Share
        } else {
            AddressKind::Local
        }
    }
}

/// Read and optional write target of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportTargets {
    /// Address used for all reads
    pub read: String,
    /// Address used for writes; the read address when absent
    pub write: Option<String>,
}

impl TransportTargets {
    /// Split the combined `read[,write]` form
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the read address is empty, or a write address
    /// is announced by a comma but left empty.
    pub fn parse(spec: &str) -> TransportResult<Self> {
        let (read, write) = match spec.split_once(',') {
            Some((read, write)) => (read.trim(), Some(write.trim())),
            None => (spec.trim(), None),
        };
        if read.is_empty() {
            return Err(TransportError::invalid_argument(
                "transport target address cannot be empty",
            ));
        }
        if write.is_some_and(str::is_empty) {
            return Err(TransportError::invalid_argument(
                "write target address cannot be empty",
            ));
        }
        Ok(TransportTargets {
            read: read.to_string(),
            write: write.map(str::to_string),
        })
    }

    /// Address writes go to
    pub fn write_address(&self) -> &str {
        self.write.as_deref().unwrap_or(&self.read)
    }
}

/// Everything needed to open share targets
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// User and domain applied to share addresses that omit them
    pub share_defaults: ShareDefaults,
    /// Opens share sessions
    pub share_connector: Arc<dyn ShareConnector>,
    /// Asked for share passwords not given inline
    pub prompt: Option<Arc<dyn CredentialPrompt>>,
}

impl OpenOptions {
    /// Options for mounted shares below `mount_root`, defaulting the
    /// domain to `share_domain` and the user to the login name
    pub fn new(share_domain: &str, mount_root: Option<PathBuf>) -> Self {
        OpenOptions {
            share_defaults: ShareDefaults::from_env(share_domain),
            share_connector: Arc::new(MountedShareConnector::new(mount_root)),
            prompt: None,
        }
    }

    /// Use `prompt` for share passwords
    pub fn with_prompt(mut self, prompt: Arc<dyn CredentialPrompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }
}

async fn open_share(
    address: &str,
    repo: &str,
    options: &OpenOptions,
) -> TransportResult<ShareTransport> {
    let share = ShareAddress::parse(address, &options.share_defaults)?;
    ShareTransport::connect(
        &share,
        repo,
        options.share_connector.as_ref(),
        options.prompt.as_deref(),
    )
    .await
}

fn require_address(address: &str) -> TransportResult<&str> {
    let address = address.trim();
    if address.is_empty() {
        Err(TransportError::invalid_argument(
            "transport target address cannot be empty",
        ))
    } else {
        Ok(address)
    }
}

/// Open a read transport on `address` for repository `repo`
pub async fn open_reader(
    address: &str,
    repo: &str,
    options: &OpenOptions,
) -> TransportResult<Box<dyn Transport>> {
    let address = require_address(address)?;
    let kind = AddressKind::of(address);
    debug!(address = %address, repo = %repo, kind = ?kind, "opening read transport");
    let transport: Box<dyn Transport> = match kind {
        AddressKind::Http => Box::new(HttpTransport::new(address, repo)?),
        AddressKind::Share => Box::new(open_share(address, repo, options).await?),
        AddressKind::Local => Box::new(LocalTransport::new(address, repo)?),
    };
    Ok(transport)
}

/// Open a write transport on `address` for repository `repo`
///
/// # Errors
///
/// `ReadOnly` for HTTP addresses, plus everything [`open_reader`] reports.
pub async fn open_writer(
    address: &str,
    repo: &str,
    options: &OpenOptions,
) -> TransportResult<Box<dyn WriteTransport>> {
    let address = require_address(address)?;
    let kind = AddressKind::of(address);
    debug!(address = %address, repo = %repo, kind = ?kind, "opening write transport");
    let transport: Box<dyn WriteTransport> = match kind {
        AddressKind::Http => return Err(TransportError::read_only(address)),
        AddressKind::Share => Box::new(open_share(address, repo, options).await?),
        AddressKind::Local => Box::new(LocalTransport::new(address, repo)?),
    };
    Ok(transport)
}
