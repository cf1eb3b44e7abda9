// SPDX-License-Identifier: PMPL-1.0-or-later
//! Change records for the moderation pipeline
//!
//! Field names and the flat record shape match the JSON the front end
//! submits and the queue files already on disk, so the same stores can
//! be read back without migration.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// On-disk and on-the-wire timestamp format.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time in the queue-file timestamp format.
pub fn timestamp_now() -> String {
    Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// A visitor-submitted edit proposal for one survey item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeProposal {
    /// Image filename the proposal refers to
    #[serde(default)]
    pub filename: String,

    /// Name currently displayed for the item
    #[serde(default)]
    pub display_name: String,

    /// Proposed replacement name (may be empty)
    #[serde(default)]
    pub new_name: String,

    /// Proposed replacement description
    #[serde(default)]
    pub new_description: String,

    /// Image path rendered in the notification digest
    #[serde(default)]
    pub image_path: String,
}

impl ChangeProposal {
    /// Identity used when checking a proposal against the denied history.
    pub fn dedup_key(&self) -> (&str, &str, &str) {
        (&self.filename, &self.new_name, &self.new_description)
    }
}

/// A proposal accepted into the pending queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChange {
    #[serde(flatten)]
    pub proposal: ChangeProposal,

    /// Opaque change id, unique per submission
    pub id: String,

    pub submitted_at: String,
}

/// A pending change a moderator rejected.
///
/// Denied records are never deleted or re-promoted; they exist as the
/// dedup oracle for future submissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeniedChange {
    #[serde(flatten)]
    pub change: PendingChange,

    pub denied_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_change_serializes_flat() {
        let record = PendingChange {
            proposal: ChangeProposal {
                filename: "shield.png".to_string(),
                display_name: "shield".to_string(),
                new_name: "Gold Shield".to_string(),
                new_description: "A gleaming shield.".to_string(),
                image_path: "/images/shield.png".to_string(),
            },
            id: "abc123".to_string(),
            submitted_at: "2026-01-02 03:04:05".to_string(),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["filename"], "shield.png");
        assert_eq!(json["newName"], "Gold Shield");
        assert_eq!(json["id"], "abc123");
        assert_eq!(json["submittedAt"], "2026-01-02 03:04:05");
        // flattened: no nested "proposal" object
        assert!(json.get("proposal").is_none());
    }

    #[test]
    fn test_denied_change_retains_original_fields() {
        let json = serde_json::json!({
            "filename": "shield.png",
            "displayName": "shield",
            "newName": "Gold Shield",
            "newDescription": "A gleaming shield.",
            "imagePath": "",
            "id": "abc123",
            "submittedAt": "2026-01-02 03:04:05",
            "deniedAt": "2026-01-03 00:00:00"
        });

        let denied: DeniedChange = serde_json::from_value(json).unwrap();
        assert_eq!(denied.change.id, "abc123");
        assert_eq!(denied.change.proposal.new_name, "Gold Shield");
        assert_eq!(denied.denied_at, "2026-01-03 00:00:00");
    }

    #[test]
    fn test_proposal_tolerates_missing_fields() {
        let proposal: ChangeProposal =
            serde_json::from_str(r#"{"filename": "gem.png"}"#).unwrap();
        assert_eq!(proposal.filename, "gem.png");
        assert!(proposal.new_name.is_empty());
        assert!(proposal.image_path.is_empty());
    }
}
