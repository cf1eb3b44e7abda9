// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Submission processing and the approve/deny state machine.
//!
//! Each change id moves `pending -> approved` or `pending -> denied`,
//! never back. Approval patches the survey page before the record
//! leaves the pending queue, so a failed patch leaves the record
//! available for retry. Denial copies the record (plus a `deniedAt`
//! stamp) into the denied queue, which future submissions are checked
//! against.
//!
//! Every load-modify-save cycle runs under one mutex. The queue files
//! are full-document overwrites, so two unserialized writers would
//! silently drop each other's updates.

use crate::config::Config;
use crate::error::{ModerationError, Result};
use crate::models::{timestamp_now, ChangeProposal, DeniedChange, PendingChange};
use crate::patcher;
use crate::store::{bounded, write_atomic, QueueStore};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Outcome of a submission batch.
#[derive(Debug)]
pub struct SubmissionOutcome {
    /// Records accepted into the pending queue, in submission order.
    pub accepted: Vec<PendingChange>,
}

/// Result of the `check_writes` deployment probe.
#[derive(Debug)]
pub struct WriteProbe {
    pub api_writable: bool,
    pub pending_writable: bool,
    pub denied_writable: bool,
    pub survey_writable: bool,
    pub messages: Vec<String>,
}

/// The moderation pipeline over the two queue stores and the survey page.
pub struct ModerationService {
    pending: QueueStore,
    denied: QueueStore,
    survey_path: PathBuf,
    io_timeout: Duration,
    /// Serializes every load-modify-save cycle.
    lock: Mutex<()>,
}

impl ModerationService {
    pub fn new(config: &Config) -> Self {
        let io_timeout = config.stores.io_timeout();
        Self {
            pending: QueueStore::new(&config.stores.pending_path, io_timeout),
            denied: QueueStore::new(&config.stores.denied_path, io_timeout),
            survey_path: config.target.survey_path.clone(),
            io_timeout,
            lock: Mutex::new(()),
        }
    }

    pub async fn list_pending(&self) -> Result<HashMap<String, PendingChange>> {
        let _guard = self.lock.lock().await;
        self.load_pending().await
    }

    pub async fn list_denied(&self) -> Result<HashMap<String, DeniedChange>> {
        let _guard = self.lock.lock().await;
        self.load_denied().await
    }

    /// Process a submission batch.
    ///
    /// Proposals matching a denied record by `(filename, newName,
    /// newDescription)` are dropped silently; the rest are stamped,
    /// assigned fresh ids, and persisted in one write.
    pub async fn submit(&self, proposals: Vec<ChangeProposal>) -> Result<SubmissionOutcome> {
        let _guard = self.lock.lock().await;
        let mut pending = self.load_pending().await?;
        let denied = self.load_denied().await?;

        let mut accepted = Vec::new();
        for proposal in proposals {
            let previously_denied = denied
                .values()
                .any(|d| d.change.proposal.dedup_key() == proposal.dedup_key());
            if previously_denied {
                debug!(
                    filename = %proposal.filename,
                    new_name = %proposal.new_name,
                    "Proposal matches a denied change, dropping"
                );
                continue;
            }

            let record = PendingChange {
                id: Uuid::new_v4().simple().to_string(),
                submitted_at: timestamp_now(),
                proposal,
            };
            pending.insert(record.id.clone(), record.clone());
            accepted.push(record);
        }

        self.save_pending(&pending).await?;
        info!(accepted = accepted.len(), "Submission batch processed");
        Ok(SubmissionOutcome { accepted })
    }

    /// Apply a pending change to the survey page and drop it from the queue.
    ///
    /// The pending record survives any read/patch/write failure so the
    /// approval can be retried.
    pub async fn approve(&self, change_id: &str) -> Result<String> {
        let _guard = self.lock.lock().await;
        let mut pending = self.load_pending().await?;
        let change = pending.get(change_id).ok_or(ModerationError::NotFound)?;

        let key = patcher::derive_key(&change.proposal.new_name, &change.proposal.filename);
        let value = change.proposal.new_description.trim().to_string();

        let document = bounded(self.io_timeout, fs::read_to_string(&self.survey_path))
            .await
            .map_err(ModerationError::TargetRead)?;

        let patched = patcher::patch(&document, &key, &value)?;

        write_atomic(&self.survey_path, patched.as_bytes(), self.io_timeout)
            .await
            .map_err(ModerationError::TargetWrite)?;

        pending.remove(change_id);
        self.save_pending(&pending).await?;

        info!(change_id, key = %key, "Change approved and applied");
        Ok("Change approved and applied".to_string())
    }

    /// Move a pending change into the denied queue.
    ///
    /// The denied store is persisted before the pending store so a crash
    /// between the two writes leaves the record in both queues rather
    /// than in neither.
    pub async fn deny(&self, change_id: &str) -> Result<String> {
        let _guard = self.lock.lock().await;
        let mut pending = self.load_pending().await?;
        let mut denied = self.load_denied().await?;

        let change = pending.remove(change_id).ok_or(ModerationError::NotFound)?;
        let id = change.id.clone();
        denied.insert(
            id.clone(),
            DeniedChange {
                change,
                denied_at: timestamp_now(),
            },
        );

        self.save_denied(&denied).await?;
        self.save_pending(&pending).await?;

        info!(change_id = %id, "Change denied");
        Ok("Change denied".to_string())
    }

    /// Probe whether the queue files and the survey page are writable.
    pub async fn check_writes(&self) -> WriteProbe {
        let mut messages = Vec::new();

        let probe = self
            .pending
            .path()
            .with_file_name(format!(".probe_{}", Uuid::new_v4().simple()));
        let api_writable = match fs::write(&probe, b"probe").await {
            Ok(()) => {
                let _ = fs::remove_file(&probe).await;
                true
            }
            Err(err) => {
                messages.push(format!("Unable to create probe file: {err}"));
                false
            }
        };

        let pending_writable = writable_or_touch(self.pending.path()).await;
        let denied_writable = writable_or_touch(self.denied.path()).await;
        let survey_writable = writable(&self.survey_path).await;

        if !survey_writable {
            warn!(path = %self.survey_path.display(), "Survey file is not writable");
        }

        WriteProbe {
            api_writable,
            pending_writable,
            denied_writable,
            survey_writable,
            messages,
        }
    }

    async fn load_pending(&self) -> Result<HashMap<String, PendingChange>> {
        self.pending
            .load()
            .await
            .map_err(|source| ModerationError::StorageRead {
                store: "pending",
                source,
            })
    }

    async fn load_denied(&self) -> Result<HashMap<String, DeniedChange>> {
        self.denied
            .load()
            .await
            .map_err(|source| ModerationError::StorageRead {
                store: "denied",
                source,
            })
    }

    async fn save_pending(&self, map: &HashMap<String, PendingChange>) -> Result<()> {
        self.pending
            .save(map)
            .await
            .map_err(|source| ModerationError::StorageWrite {
                store: "pending",
                source,
            })
    }

    async fn save_denied(&self, map: &HashMap<String, DeniedChange>) -> Result<()> {
        self.denied
            .save(map)
            .await
            .map_err(|source| ModerationError::StorageWrite {
                store: "denied",
                source,
            })
    }
}

/// Open-for-write probe on an existing file.
async fn writable(path: &std::path::Path) -> bool {
    fs::OpenOptions::new().write(true).open(path).await.is_ok()
}

/// Open-for-write probe, creating the file if absent (an empty queue
/// file reads back as an empty mapping).
async fn writable_or_touch(path: &std::path::Path) -> bool {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .open(path)
        .await
        .is_ok()
}
