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

//! Network-share transport
//!
//! A share target is written as
//! `\\[domain\]user[:password]@host\share[\path]`, as a plain
//! `\\host\share[\path]`, or in URL spelling as `smb://...` with forward
//! slashes. The user defaults to the login name and the domain to the
//! configured default. A missing password is requested from a
//! [`CredentialPrompt`].
//!
//! Talking to the share goes through a [`ShareSession`], obtained from a
//! [`ShareConnector`]. The bundled [`MountedShareConnector`] reaches shares
//! that the operating system already exposes as a directory tree.

use crate::local::{
    fs_create_folder, fs_list, fs_read_into, fs_remove, fs_rename, fs_stat, fs_write_from,
};
use crate::{
    validate_path, FolderList, ObjectKind, Sink, Source, Transport, TransportError,
    TransportResult, WriteTransport,
};
use async_trait::async_trait;
use regex_lite::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

static UNC_PATTERN: LazyLock<Result<Regex, regex_lite::Error>> = LazyLock::new(|| {
    Regex::new(
        r"^\\\\(?:(?:(?P<domain>[-.\w]+)[\\;])?(?P<user>[-.\w]+)(?::(?P<password>[^@\\]+))?@)?(?P<host>[-.\w]+)\\(?P<share>[^\\]+)(?:\\(?P<path>.*))?$",
    )
});

/// Defaults applied to share addresses that omit user or domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareDefaults {
    /// Domain used when the address names none
    pub domain: String,
    /// User used when the address names none
    pub user: Option<String>,
}

impl ShareDefaults {
    /// Take the user from `USER` (or `USERNAME`) and the given default domain
    pub fn from_env(domain: impl Into<String>) -> Self {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok()
            .filter(|user| !user.is_empty());
        ShareDefaults {
            domain: domain.into(),
            user,
        }
    }
}

/// Parsed network-share address
#[derive(Clone, PartialEq, Eq)]
pub struct ShareAddress {
    /// Authentication domain
    pub domain: String,
    /// User name
    pub user: String,
    /// Password, when given inline
    pub password: Option<String>,
    /// Server host name
    pub host: String,
    /// Share name on the server
    pub share: String,
    /// Folder inside the share, `/`-separated, possibly empty
    pub path: String,
}

impl ShareAddress {
    /// Parse a share address, filling user and domain from `defaults`
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the address does not follow the share syntax,
    /// or if it names no user and `defaults` has none either.
    pub fn parse(address: &str, defaults: &ShareDefaults) -> TransportResult<Self> {
        let unc = match address.strip_prefix("smb:") {
            Some(rest) => rest.replace('/', "\\"),
            None => address.to_string(),
        };
        let pattern = UNC_PATTERN
            .as_ref()
            .map_err(|e| TransportError::invalid_argument(format!("share pattern: {e}")))?;
        let caps = pattern.captures(&unc).ok_or_else(|| {
            TransportError::invalid_argument(format!("invalid network share address: {address}"))
        })?;
        let group = |name: &str| caps.name(name).map(|m| m.as_str().to_string());

        let user = group("user")
            .or_else(|| defaults.user.clone())
            .ok_or_else(|| {
                TransportError::invalid_argument(format!(
                    "no user given for network share address: {address}"
                ))
            })?;
        Ok(ShareAddress {
            domain: group("domain").unwrap_or_else(|| defaults.domain.clone()),
            user,
            password: group("password"),
            host: group("host").unwrap_or_default(),
            share: group("share").unwrap_or_default(),
            path: group("path")
                .unwrap_or_default()
                .replace('\\', "/")
                .trim_matches('/')
                .to_string(),
        })
    }
}

impl fmt::Debug for ShareAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareAddress")
            .field("domain", &self.domain)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("host", &self.host)
            .field("share", &self.share)
            .field("path", &self.path)
            .finish()
    }
}

/// Source of share passwords that were not given inline
pub trait CredentialPrompt: Send + Sync + fmt::Debug {
    /// Obtain the password for `address`
    fn password(&self, address: &ShareAddress) -> TransportResult<String>;
}

/// An authenticated session on one share
///
/// Paths are relative to the share root and `/`-separated.
#[async_trait]
pub trait ShareSession: Send + Sync + fmt::Debug {
    /// Kind of entry at `path`
    async fn stat(&self, path: &str) -> TransportResult<ObjectKind>;
    /// Stream the file at `path` into `sink`; `false` if it does not exist
    async fn retrieve(&self, path: &str, sink: Sink<'_>) -> TransportResult<bool>;
    /// Store `source` at `path`
    async fn store(&self, source: Source<'_>, path: &str) -> TransportResult<()>;
    /// Remove the entry at `path`
    async fn remove(&self, path: &str) -> TransportResult<()>;
    /// Move `from` to `to`, replacing `to`
    async fn rename(&self, from: &str, to: &str) -> TransportResult<()>;
    /// Create one folder level
    async fn create_directory(&self, path: &str) -> TransportResult<()>;
    /// Names of the entries under `path`
    async fn list_directory(&self, path: &str) -> TransportResult<Vec<String>>;
}

/// Opens sessions on network shares
#[async_trait]
pub trait ShareConnector: Send + Sync + fmt::Debug {
    /// Authenticate against `address` and return a session on its share
    async fn connect(
        &self,
        address: &ShareAddress,
        password: &str,
    ) -> TransportResult<Box<dyn ShareSession>>;

    /// Whether [`connect`](Self::connect) uses the password at all
    fn needs_credentials(&self) -> bool {
        true
    }
}

/// Connector for shares the operating system has already mounted
///
/// With a mount root the share lives at `<mount_root>/<host>/<share>`.
/// Without one the UNC path `\\host\share` is used directly, which works
/// on Windows. Credentials belong to the mount, so the password is unused.
#[derive(Debug, Clone, Default)]
pub struct MountedShareConnector {
    mount_root: Option<PathBuf>,
}

impl MountedShareConnector {
    /// Create a connector resolving shares below `mount_root`
    pub fn new(mount_root: Option<PathBuf>) -> Self {
        MountedShareConnector { mount_root }
    }
}

#[async_trait]
impl ShareConnector for MountedShareConnector {
    async fn connect(
        &self,
        address: &ShareAddress,
        _password: &str,
    ) -> TransportResult<Box<dyn ShareSession>> {
        let root = match &self.mount_root {
            Some(mount_root) => mount_root.join(&address.host).join(&address.share),
            None => PathBuf::from(format!(r"\\{}\{}", address.host, address.share)),
        };
        if fs_stat(&root).await? != ObjectKind::Dir {
            return Err(TransportError::io(
                root.display().to_string(),
                std::io::Error::new(std::io::ErrorKind::NotFound, "share is not reachable"),
            ));
        }
        debug!(root = %root.display(), user = %address.user, "connected to mounted share");
        Ok(Box::new(MountedShareSession { root }))
    }

    fn needs_credentials(&self) -> bool {
        false
    }
}

/// Session on a share reachable as a local directory tree
#[derive(Debug, Clone)]
pub struct MountedShareSession {
    root: PathBuf,
}

impl MountedShareSession {
    fn resolve(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(path)
        }
    }

    /// Directory the share is served from
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ShareSession for MountedShareSession {
    async fn stat(&self, path: &str) -> TransportResult<ObjectKind> {
        fs_stat(&self.resolve(path)).await
    }

    async fn retrieve(&self, path: &str, sink: Sink<'_>) -> TransportResult<bool> {
        fs_read_into(&self.resolve(path), sink).await
    }

    async fn store(&self, source: Source<'_>, path: &str) -> TransportResult<()> {
        fs_write_from(source, &self.resolve(path)).await
    }

    async fn remove(&self, path: &str) -> TransportResult<()> {
        fs_remove(&self.resolve(path)).await
    }

    async fn rename(&self, from: &str, to: &str) -> TransportResult<()> {
        fs_rename(&self.resolve(from), &self.resolve(to)).await
    }

    async fn create_directory(&self, path: &str) -> TransportResult<()> {
        fs_create_folder(&self.resolve(path)).await
    }

    async fn list_directory(&self, path: &str) -> TransportResult<Vec<String>> {
        fs_list(&self.resolve(path)).await
    }
}

/// Read-write transport over a share session
///
/// The repository lives at `<address path>/<repo>` inside the share.
#[derive(Debug)]
pub struct ShareTransport {
    session: Box<dyn ShareSession>,
    base: String,
}

impl ShareTransport {
    /// Open a session for `address` and root the transport at `repo`
    ///
    /// The password comes from the address if given inline, otherwise from
    /// `prompt`. Connectors that need no credentials are never prompted.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` for an empty repository name, `Credential` when a
    /// password is needed and no prompt is available, and whatever the
    /// connector reports for an unreachable share.
    pub async fn connect(
        address: &ShareAddress,
        repo: &str,
        connector: &dyn ShareConnector,
        prompt: Option<&dyn CredentialPrompt>,
    ) -> TransportResult<Self> {
        let repo = repo.trim_matches('/');
        if repo.is_empty() {
            return Err(TransportError::invalid_argument(
                "repository name cannot be empty",
            ));
        }
        let password = match (&address.password, prompt) {
            (Some(password), _) => password.clone(),
            (None, _) if !connector.needs_credentials() => String::new(),
            (None, Some(prompt)) => prompt.password(address)?,
            (None, None) => {
                return Err(TransportError::credential(format!(
                    "no password for {}\\{}@{}",
                    address.domain, address.user, address.host
                )))
            }
        };
        let session = connector.connect(address, &password).await?;
        Ok(Self::with_session(session, &address.path, repo))
    }

    /// Root a transport at `<folder>/<repo>` on an already open session
    pub fn with_session(session: Box<dyn ShareSession>, folder: &str, repo: &str) -> Self {
        let base = [folder.trim_matches('/'), repo.trim_matches('/')]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("/");
        ShareTransport { session, base }
    }

    fn resolve(&self, path: &str) -> TransportResult<String> {
        validate_path(path)?;
        Ok(if self.base.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", self.base, path)
        })
    }
}

#[async_trait]
impl Transport for ShareTransport {
    async fn exists(&self, path: &str) -> TransportResult<bool> {
        let full = self.resolve(path)?;
        Ok(self.session.stat(&full).await? != ObjectKind::Absent)
    }

    async fn get(&self, path: &str, sink: Sink<'_>) -> TransportResult<bool> {
        let full = self.resolve(path)?;
        self.session.retrieve(&full, sink).await
    }
}

#[async_trait]
impl WriteTransport for ShareTransport {
    async fn otype(&self, path: &str) -> TransportResult<ObjectKind> {
        let full = self.resolve(path)?;
        self.session.stat(&full).await
    }

    async fn put(&self, source: Source<'_>, dest: &str) -> TransportResult<()> {
        let full = self.resolve(dest)?;
        self.session.store(source, &full).await
    }

    async fn delete(&self, path: &str) -> TransportResult<()> {
        let full = self.resolve(path)?;
        self.session.remove(&full).await
    }

    async fn rename(&self, old: &str, new: &str) -> TransportResult<()> {
        let from = self.resolve(old)?;
        let to = self.resolve(new)?;
        self.session.rename(&from, &to).await
    }

    async fn folder_create(&self, path: &str) -> TransportResult<()> {
        let full = self.resolve(path)?;
        self.session.create_directory(&full).await
    }

    async fn init_base(&self) -> TransportResult<()> {
        let mut current = String::new();
        for part in self.base.split('/').filter(|part| !part.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(part);
            match self.session.stat(&current).await? {
                ObjectKind::Dir => {}
                ObjectKind::File => return Err(TransportError::not_a_folder(current)),
                ObjectKind::Absent => self.session.create_directory(&current).await?,
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FolderList for ShareTransport {
    async fn folder_list(&self, path: &str) -> TransportResult<Vec<String>> {
        let full = self.resolve(path)?;
        self.session.list_directory(&full).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn defaults() -> ShareDefaults {
        ShareDefaults {
            domain: "CORP".to_string(),
            user: Some("builder".to_string()),
        }
    }

    #[derive(Debug)]
    struct FixedPrompt;

    impl CredentialPrompt for FixedPrompt {
        fn password(&self, _address: &ShareAddress) -> TransportResult<String> {
            Ok("secret".to_string())
        }
    }

    #[test]
    fn test_parse_full_address() {
        let address =
            ShareAddress::parse(r"\\EU\jdoe:pw@files01\builds\nightly\x64", &defaults()).unwrap();
        assert_eq!(address.domain, "EU");
        assert_eq!(address.user, "jdoe");
        assert_eq!(address.password.as_deref(), Some("pw"));
        assert_eq!(address.host, "files01");
        assert_eq!(address.share, "builds");
        assert_eq!(address.path, "nightly/x64");
    }

    #[test]
    fn test_parse_applies_defaults() {
        let address = ShareAddress::parse(r"\\files01\builds", &defaults()).unwrap();
        assert_eq!(address.domain, "CORP");
        assert_eq!(address.user, "builder");
        assert_eq!(address.password, None);
        assert_eq!(address.path, "");
    }

    #[test]
    fn test_parse_user_without_domain() {
        let address = ShareAddress::parse(r"\\jdoe@files01\builds\a", &defaults()).unwrap();
        assert_eq!(address.domain, "CORP");
        assert_eq!(address.user, "jdoe");
        assert_eq!(address.path, "a");
    }

    #[test]
    fn test_parse_url_spelling() {
        let address =
            ShareAddress::parse("smb://EU;jdoe@files01/builds/nightly", &defaults()).unwrap();
        assert_eq!(address.domain, "EU");
        assert_eq!(address.user, "jdoe");
        assert_eq!(address.host, "files01");
        assert_eq!(address.share, "builds");
        assert_eq!(address.path, "nightly");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ShareAddress::parse(r"\\hostonly", &defaults())
            .unwrap_err()
            .is_invalid_argument());
        assert!(ShareAddress::parse("/srv/share", &defaults()).is_err());

        let no_user = ShareDefaults {
            domain: "CORP".to_string(),
            user: None,
        };
        assert!(ShareAddress::parse(r"\\files01\builds", &no_user).is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let address = ShareAddress::parse(r"\\jdoe:hunter2@files01\builds", &defaults()).unwrap();
        assert!(!format!("{address:?}").contains("hunter2"));
    }

    /// Connector that authenticates with a password before mounting
    #[derive(Debug)]
    struct Authenticated(MountedShareConnector);

    #[async_trait]
    impl ShareConnector for Authenticated {
        async fn connect(
            &self,
            address: &ShareAddress,
            password: &str,
        ) -> TransportResult<Box<dyn ShareSession>> {
            if password != "secret" {
                return Err(TransportError::credential("wrong password"));
            }
            self.0.connect(address, password).await
        }
    }

    #[tokio::test]
    async fn test_connect_requires_password_source() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("files01/builds")).unwrap();
        let connector =
            Authenticated(MountedShareConnector::new(Some(temp_dir.path().to_path_buf())));
        let address = ShareAddress::parse(r"\\files01\builds", &defaults()).unwrap();

        let err = ShareTransport::connect(&address, "repo", &connector, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Credential(_)));

        ShareTransport::connect(&address, "repo", &connector, Some(&FixedPrompt))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_mounted_share_needs_no_password() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("files01/builds")).unwrap();
        let connector = MountedShareConnector::new(Some(temp_dir.path().to_path_buf()));
        let address = ShareAddress::parse(r"\\files01\builds", &defaults()).unwrap();
        assert!(!connector.needs_credentials());

        let transport = ShareTransport::connect(&address, "repo", &connector, None)
            .await
            .unwrap();
        transport.init_base().await.unwrap();
        assert!(temp_dir.path().join("files01/builds/repo").is_dir());
    }

    #[tokio::test]
    async fn test_unreachable_share() {
        let temp_dir = TempDir::new().unwrap();
        let connector = MountedShareConnector::new(Some(temp_dir.path().to_path_buf()));
        let address = ShareAddress::parse(r"\\jdoe:pw@files01\builds", &defaults()).unwrap();

        let err = ShareTransport::connect(&address, "repo", &connector, None)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Io { .. }));
    }

    #[tokio::test]
    async fn test_write_contract_over_mounted_share() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("files01/builds")).unwrap();
        let connector = MountedShareConnector::new(Some(temp_dir.path().to_path_buf()));
        let address = ShareAddress::parse(r"\\jdoe:pw@files01\builds\team", &defaults()).unwrap();

        let remote = ShareTransport::connect(&address, "repo", &connector, None)
            .await
            .unwrap();
        remote.init_base().await.unwrap();
        remote.folder_ensure("objects/ab").await.unwrap();
        let mut data: &[u8] = b"payload";
        remote.update(&mut data, "objects/ab/cdef").await.unwrap();

        let on_disk = temp_dir.path().join("files01/builds/team/repo/objects/ab/cdef");
        assert_eq!(std::fs::read(on_disk).unwrap(), b"payload");
        assert_eq!(remote.otype("objects").await.unwrap(), ObjectKind::Dir);
        assert_eq!(remote.folder_list("objects").await.unwrap(), vec!["ab"]);
    }
}
