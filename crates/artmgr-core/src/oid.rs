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

//! Object identifiers
//!
//! An object is named by the SHA-1 of `"blob <len>\0"` followed by its bytes,
//! the same scheme git uses for blobs. Identity depends only on length and
//! content, never on a file's name or location.

use crate::error::{ArtmgrError, ArtmgrResult};
use crate::layout::OBJECTS;
use sha1::{Digest, Sha1};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tokio::io::AsyncReadExt;

/// Content identifier of an object
///
/// # Examples
///
/// ```
/// use artmgr_core::ObjectId;
///
/// // same digest `git hash-object` reports for an empty file
/// assert_eq!(
///     ObjectId::hash(b"").to_hex(),
///     "e69de29bb2d1d6434b8b29ae775ad8c2e48c5391"
/// );
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; 20]);

fn blob_hasher(len: u64) -> Sha1 {
    let mut hasher = Sha1::new();
    hasher.update(format!("blob {len}\0").as_bytes());
    hasher
}

fn finish(hasher: Sha1) -> ObjectId {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hasher.finalize());
    ObjectId(bytes)
}

impl ObjectId {
    /// Hash an in-memory buffer
    pub fn hash(data: &[u8]) -> Self {
        let mut hasher = blob_hasher(data.len() as u64);
        hasher.update(data);
        finish(hasher)
    }

    /// Hash a file by streaming it in 64KB chunks
    ///
    /// Returns the id together with the number of bytes hashed. The length
    /// prefix comes from the file's metadata; if the file changes size while
    /// it is being read the call fails rather than produce a wrong id.
    pub async fn from_file_async<P: AsRef<Path>>(path: P) -> ArtmgrResult<(Self, u64)> {
        let path = path.as_ref();
        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| ArtmgrError::io(path, e))?;
        let len = file
            .metadata()
            .await
            .map_err(|e| ArtmgrError::io(path, e))?
            .len();

        let mut hasher = blob_hasher(len);
        let mut buffer = vec![0u8; 64 * 1024];
        let mut seen = 0u64;
        loop {
            let read = file
                .read(&mut buffer)
                .await
                .map_err(|e| ArtmgrError::io(path, e))?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
            seen += read as u64;
        }

        if seen != len {
            return Err(ArtmgrError::io(
                path,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("file changed while hashing: expected {len} bytes, read {seen}"),
                ),
            ));
        }
        Ok((finish(hasher), len))
    }

    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        ObjectId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase hex form, as written in the index and refs
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 40 character hex id
    pub fn from_hex(s: &str) -> ArtmgrResult<Self> {
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| ArtmgrError::invalid_argument(format!("invalid object id '{s}': {e}")))?;
        Ok(ObjectId(bytes))
    }

    /// Repository path of the object: `objects/<first two hex>/<rest>`
    pub fn storage_path(&self) -> String {
        let hex = self.to_hex();
        format!("{}/{}/{}", OBJECTS, &hex[..2], &hex[2..])
    }

    /// Shard folder holding the object
    pub fn shard_folder(&self) -> String {
        format!("{}/{}", OBJECTS, &self.to_hex()[..2])
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", &self.to_hex()[..12])
    }
}

impl FromStr for ObjectId {
    type Err = ArtmgrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
