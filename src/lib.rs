// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Survey Change Moderator
//!
//! This crate provides the moderation pipeline behind the portfolio survey
//! page: visitors propose renames and new descriptions for survey items,
//! and a moderator approves or denies each proposal through one-click
//! email links.
//!
//! - Proposals are deduplicated against previously denied changes
//! - Pending and denied queues persist as flat JSON files
//! - Approval rewrites the `descriptionsDatabase` literal embedded in the
//!   survey page, leaving the rest of the document untouched
//! - Notification delivery is best-effort and never fails a submission

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod moderation;
pub mod notifier;
pub mod patcher;
pub mod store;

pub use config::Config;
pub use error::ModerationError;
pub use moderation::{ModerationService, SubmissionOutcome};
pub use notifier::Notifier;
pub use store::QueueStore;
