// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Configuration for the survey change moderator.
//!
//! Defaults mirror the file layout of the deployed portfolio site:
//! the survey page under `pages/` and both queue files next to the
//! API endpoint under `api/`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the survey change moderator service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server bind address (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Queue store configuration
    #[serde(default)]
    pub stores: StoreConfig,

    /// Target document configuration
    #[serde(default)]
    pub target: TargetConfig,

    /// Notification configuration
    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Locations and timeouts for the pending/denied queue files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Pending changes file (default: api/pending_changes.json)
    #[serde(default = "default_pending_path")]
    pub pending_path: PathBuf,

    /// Denied changes file (default: api/denied_changes.json)
    #[serde(default = "default_denied_path")]
    pub denied_path: PathBuf,

    /// Upper bound on a single filesystem operation in milliseconds
    /// (default: 5000)
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
}

/// The document holding the embedded descriptions database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Survey page mutated by approved changes (default: pages/survey.html)
    #[serde(default = "default_survey_path")]
    pub survey_path: PathBuf,
}

/// Outbound notification settings.
///
/// Delivery goes through an HTTP mail relay; an empty `relay_url`
/// disables notifications entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Mail relay webhook URL (default: empty, disabled)
    #[serde(default)]
    pub relay_url: String,

    /// Moderator address the digest is sent to (default: empty)
    #[serde(default)]
    pub to: String,

    /// Digest subject line
    #[serde(default = "default_subject")]
    pub subject: String,

    /// Public base URL used to render approve/deny links and image URLs
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Upper bound on the relay request in milliseconds (default: 10000)
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
}

// Default value functions
fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_pending_path() -> PathBuf {
    PathBuf::from("api/pending_changes.json")
}

fn default_denied_path() -> PathBuf {
    PathBuf::from("api/denied_changes.json")
}

fn default_io_timeout_ms() -> u64 {
    5000
}

fn default_survey_path() -> PathBuf {
    PathBuf::from("pages/survey.html")
}

fn default_subject() -> String {
    "Game Pixel Art Survey: New Change Submissions".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_send_timeout_ms() -> u64 {
    10000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            stores: StoreConfig::default(),
            target: TargetConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            pending_path: default_pending_path(),
            denied_path: default_denied_path(),
            io_timeout_ms: default_io_timeout_ms(),
        }
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            survey_path: default_survey_path(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            relay_url: String::new(),
            to: String::new(),
            subject: default_subject(),
            public_base_url: default_public_base_url(),
            send_timeout_ms: default_send_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// Get the filesystem operation timeout
    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

impl NotifyConfig {
    /// Get the relay request timeout
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Whether notification delivery is configured at all.
    pub fn enabled(&self) -> bool {
        !self.relay_url.is_empty()
    }
}
