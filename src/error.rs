// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for the moderation pipeline

use crate::patcher::PatchError;
use crate::store::StoreError;
use thiserror::Error;

/// Failures of the moderation pipeline.
///
/// Every variant here is an expected failure path: handlers render the
/// `Display` text into a `{success: false, message}` payload rather
/// than letting it escape as a 5xx or a panic.
#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Change not found")]
    NotFound,

    #[error("No valid changes provided")]
    MalformedInput,

    #[error("Could not update survey file: {0}")]
    MalformedTarget(#[from] PatchError),

    #[error("Could not read survey file")]
    TargetRead(#[source] std::io::Error),

    #[error("Could not update survey file")]
    TargetWrite(#[source] std::io::Error),

    #[error("Could not load {store} changes")]
    StorageRead {
        store: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("Could not persist {store} changes")]
    StorageWrite {
        store: &'static str,
        #[source]
        source: StoreError,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ModerationError>;
