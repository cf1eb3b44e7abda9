// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Flat-file queue store.
//!
//! Each store is one JSON document mapping change id to record. A
//! missing file is an empty mapping; a file that exists but cannot be
//! parsed is an error, because treating it as empty would erase the
//! denial history on the next save.
//!
//! Saves replace the document as a unit: the new contents go to a
//! sibling temp file which is then renamed over the destination, so a
//! reader never observes a half-written store.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tokio::time::timeout;
use tracing::debug;

/// Store access error types.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed store document {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One persisted id → record mapping.
#[derive(Debug, Clone)]
pub struct QueueStore {
    path: PathBuf,
    io_timeout: Duration,
}

impl QueueStore {
    pub fn new(path: impl Into<PathBuf>, io_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            io_timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the full mapping. A missing or empty file yields an empty map.
    pub async fn load<T: DeserializeOwned>(&self) -> Result<HashMap<String, T>, StoreError> {
        let bytes = match bounded(self.io_timeout, fs::read(&self.path)).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Store file absent, treating as empty");
                return Ok(HashMap::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        // An existing-but-empty file counts as an empty mapping
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(HashMap::new());
        }

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the persisted mapping as a unit.
    pub async fn save<T: Serialize>(&self, map: &HashMap<String, T>) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(map).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })?;

        write_atomic(&self.path, &json, self.io_timeout)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), entries = map.len(), "Store persisted");
        Ok(())
    }
}

/// Atomic write: write to a sibling temp file then rename over `path`.
pub async fn write_atomic(
    path: &Path,
    contents: &[u8],
    io_timeout: Duration,
) -> std::io::Result<()> {
    let tmp = tmp_path(path);
    bounded(io_timeout, fs::write(&tmp, contents)).await?;
    bounded(io_timeout, fs::rename(&tmp, path)).await
}

fn tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{name}.tmp"))
}

/// Bound a filesystem operation by the configured timeout.
pub async fn bounded<F, T>(limit: Duration, op: F) -> std::io::Result<T>
where
    F: Future<Output = std::io::Result<T>>,
{
    match timeout(limit, op).await {
        Ok(result) => result,
        Err(_) => Err(std::io::Error::new(
            ErrorKind::TimedOut,
            "filesystem operation timed out",
        )),
    }
}
