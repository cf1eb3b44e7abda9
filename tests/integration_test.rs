// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the moderation pipeline.

use survey_change_moderator::{
    config::{Config, StoreConfig, TargetConfig},
    models::ChangeProposal,
    moderation::ModerationService,
    ModerationError,
};
use tempfile::TempDir;

const SURVEY_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Game Pixel Art Survey</title></head>
<body>
<div id="survey-root"></div>
<script>
    const descriptionsDatabase = {
      "Amazonite": "A blue-green gem.",
      "Opal_Locket": "A locket set with opal.",
    };
    renderSurvey(descriptionsDatabase);
</script>
</body>
</html>
"#;

fn service_in(dir: &TempDir) -> ModerationService {
    std::fs::write(dir.path().join("survey.html"), SURVEY_PAGE).unwrap();
    let config = Config {
        stores: StoreConfig {
            pending_path: dir.path().join("pending_changes.json"),
            denied_path: dir.path().join("denied_changes.json"),
            ..Default::default()
        },
        target: TargetConfig {
            survey_path: dir.path().join("survey.html"),
        },
        ..Default::default()
    };
    ModerationService::new(&config)
}

fn gold_shield() -> ChangeProposal {
    ChangeProposal {
        filename: "shield.png".to_string(),
        display_name: "shield".to_string(),
        new_name: "Gold Shield".to_string(),
        new_description: "A gleaming shield.".to_string(),
        image_path: "/images/shield.png".to_string(),
    }
}

#[tokio::test]
async fn test_fresh_directory_lists_empty() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    assert!(service.list_pending().await.unwrap().is_empty());
    assert!(service.list_denied().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_then_approve_applies_change() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    let outcome = service.submit(vec![gold_shield()]).await.unwrap();
    assert_eq!(outcome.accepted.len(), 1);
    let id = outcome.accepted[0].id.clone();

    let message = service.approve(&id).await.unwrap();
    assert_eq!(message, "Change approved and applied");

    let page = std::fs::read_to_string(dir.path().join("survey.html")).unwrap();
    assert!(page.contains(r#""Gold_Shield": "A gleaming shield.","#));
    // surrounding markup untouched
    assert!(page.contains("<div id=\"survey-root\"></div>"));
    assert!(page.contains("renderSurvey(descriptionsDatabase);"));
    assert!(page.contains(r#""Amazonite": "A blue-green gem.","#));

    assert!(!service.list_pending().await.unwrap().contains_key(&id));
}

#[tokio::test]
async fn test_submit_batch_assigns_distinct_ids() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    let batch: Vec<ChangeProposal> = (0..3)
        .map(|i| ChangeProposal {
            filename: format!("gem{i}.png"),
            new_description: format!("Gem number {i}."),
            ..Default::default()
        })
        .collect();

    let outcome = service.submit(batch).await.unwrap();
    assert_eq!(outcome.accepted.len(), 3);

    let pending = service.list_pending().await.unwrap();
    assert_eq!(pending.len(), 3);
    for record in outcome.accepted.windows(2) {
        assert_ne!(record[0].id, record[1].id);
    }
}

#[tokio::test]
async fn test_deny_moves_record_and_retains_fields() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    let outcome = service.submit(vec![gold_shield()]).await.unwrap();
    let id = outcome.accepted[0].id.clone();
    let submitted_at = outcome.accepted[0].submitted_at.clone();

    let message = service.deny(&id).await.unwrap();
    assert_eq!(message, "Change denied");

    assert!(service.list_pending().await.unwrap().is_empty());

    let denied = service.list_denied().await.unwrap();
    let record = denied.get(&id).expect("denied record exists");
    assert_eq!(record.change.proposal.filename, "shield.png");
    assert_eq!(record.change.proposal.new_name, "Gold Shield");
    assert_eq!(record.change.proposal.new_description, "A gleaming shield.");
    assert_eq!(record.change.submitted_at, submitted_at);
    assert!(!record.denied_at.is_empty());

    // the survey page was not touched by a denial
    let page = std::fs::read_to_string(dir.path().join("survey.html")).unwrap();
    assert_eq!(page, SURVEY_PAGE);
}

#[tokio::test]
async fn test_denied_resubmission_is_silently_dropped() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    let outcome = service.submit(vec![gold_shield()]).await.unwrap();
    service.deny(&outcome.accepted[0].id).await.unwrap();

    let outcome = service.submit(vec![gold_shield()]).await.unwrap();
    assert!(outcome.accepted.is_empty());
    assert!(service.list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_changed_description_is_not_a_denied_duplicate() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    let outcome = service.submit(vec![gold_shield()]).await.unwrap();
    service.deny(&outcome.accepted[0].id).await.unwrap();

    let mut revised = gold_shield();
    revised.new_description = "A dented but honest shield.".to_string();
    let outcome = service.submit(vec![revised]).await.unwrap();
    assert_eq!(outcome.accepted.len(), 1);
}

#[tokio::test]
async fn test_duplicate_submission_before_resolution_gets_two_ids() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    let first = service.submit(vec![gold_shield()]).await.unwrap();
    let second = service.submit(vec![gold_shield()]).await.unwrap();

    assert_eq!(first.accepted.len(), 1);
    assert_eq!(second.accepted.len(), 1);
    assert_ne!(first.accepted[0].id, second.accepted[0].id);
    assert_eq!(service.list_pending().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_id_is_not_found_and_stores_unchanged() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    service.submit(vec![gold_shield()]).await.unwrap();

    let err = service.approve("no-such-id").await.unwrap_err();
    assert!(matches!(err, ModerationError::NotFound));
    let err = service.deny("no-such-id").await.unwrap_err();
    assert!(matches!(err, ModerationError::NotFound));

    assert_eq!(service.list_pending().await.unwrap().len(), 1);
    assert!(service.list_denied().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_second_resolution_is_not_found() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    let outcome = service.submit(vec![gold_shield()]).await.unwrap();
    let id = outcome.accepted[0].id.clone();

    service.approve(&id).await.unwrap();
    let err = service.approve(&id).await.unwrap_err();
    assert!(matches!(err, ModerationError::NotFound));
    let err = service.deny(&id).await.unwrap_err();
    assert!(matches!(err, ModerationError::NotFound));
}

#[tokio::test]
async fn test_approve_failure_keeps_record_pending() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    let outcome = service.submit(vec![gold_shield()]).await.unwrap();
    let id = outcome.accepted[0].id.clone();

    std::fs::remove_file(dir.path().join("survey.html")).unwrap();

    let err = service.approve(&id).await.unwrap_err();
    assert!(matches!(err, ModerationError::TargetRead(_)));

    // the record survived, so the approval can be retried
    assert!(service.list_pending().await.unwrap().contains_key(&id));

    std::fs::write(dir.path().join("survey.html"), SURVEY_PAGE).unwrap();
    service.approve(&id).await.unwrap();
    assert!(service.list_pending().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_malformed_survey_page_keeps_record_pending() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);
    std::fs::write(dir.path().join("survey.html"), "<html>no database</html>").unwrap();

    let outcome = service.submit(vec![gold_shield()]).await.unwrap();
    let id = outcome.accepted[0].id.clone();

    let err = service.approve(&id).await.unwrap_err();
    assert!(matches!(err, ModerationError::MalformedTarget(_)));
    assert!(service.list_pending().await.unwrap().contains_key(&id));
}

#[tokio::test]
async fn test_empty_new_name_keys_by_filename_stem() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    let proposal = ChangeProposal {
        filename: "Opal_Locket.png".to_string(),
        new_description: "A locket, reappraised.".to_string(),
        ..Default::default()
    };
    let outcome = service.submit(vec![proposal]).await.unwrap();
    service.approve(&outcome.accepted[0].id).await.unwrap();

    let page = std::fs::read_to_string(dir.path().join("survey.html")).unwrap();
    assert!(page.contains(r#""Opal_Locket": "A locket, reappraised.","#));
    // the old value is gone and the key was not duplicated
    assert!(!page.contains("A locket set with opal."));
    assert_eq!(page.matches("\"Opal_Locket\"").count(), 1);
}

#[tokio::test]
async fn test_approval_replaces_existing_key_in_place() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    let outcome = service.submit(vec![gold_shield()]).await.unwrap();
    service.approve(&outcome.accepted[0].id).await.unwrap();

    let mut updated = gold_shield();
    updated.new_description = "Updated.".to_string();
    let outcome = service.submit(vec![updated]).await.unwrap();
    service.approve(&outcome.accepted[0].id).await.unwrap();

    let page = std::fs::read_to_string(dir.path().join("survey.html")).unwrap();
    assert!(page.contains(r#""Gold_Shield": "Updated.","#));
    assert!(!page.contains("A gleaming shield."));
    assert_eq!(page.matches("\"Gold_Shield\"").count(), 1);
}

#[tokio::test]
async fn test_check_writes_reports_probe_results() {
    let dir = TempDir::new().unwrap();
    let service = service_in(&dir);

    let probe = service.check_writes().await;
    assert!(probe.api_writable);
    assert!(probe.pending_writable);
    assert!(probe.denied_writable);
    assert!(probe.survey_writable);
    assert!(probe.messages.is_empty());
}

#[tokio::test]
async fn test_queues_persist_across_service_instances() {
    let dir = TempDir::new().unwrap();
    let id = {
        let service = service_in(&dir);
        let outcome = service.submit(vec![gold_shield()]).await.unwrap();
        outcome.accepted[0].id.clone()
    };

    // a fresh instance over the same files sees the same queue
    let service = service_in(&dir);
    let pending = service.list_pending().await.unwrap();
    assert!(pending.contains_key(&id));

    service.deny(&id).await.unwrap();
    let service = service_in(&dir);
    assert!(service.list_denied().await.unwrap().contains_key(&id));
}
