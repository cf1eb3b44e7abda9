// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP surface of the moderation pipeline.
//!
//! One action-dispatch endpoint serves both the front end (POSTed
//! forms) and the moderator's emailed links (plain GETs). Every action
//! answers HTTP 200 with a JSON body carrying a success flag, so a
//! link click in a mail client renders a readable result instead of an
//! error page, and the front end reads one shape.

use crate::config::Config;
use crate::error::ModerationError;
use crate::models::{ChangeProposal, PendingChange};
use crate::moderation::ModerationService;
use crate::notifier::Notifier;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared application state.
pub struct AppState {
    pub service: ModerationService,
    pub notifier: Arc<Notifier>,
    pub config: Config,
}

/// Parameters of the action endpoint, from query string or form body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionParams {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub change_id: Option<String>,
    #[serde(default)]
    pub changes: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Plain success/failure payload.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

/// Store listing payload.
#[derive(Debug, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub success: bool,
    pub data: HashMap<String, T>,
}

/// Submission result payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub processed_changes: Vec<String>,
    pub total_changes: usize,
    pub change_items: Vec<PendingChange>,
}

/// Writability probe payload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteProbeResponse {
    pub success: bool,
    pub api_writable: bool,
    pub pending_writable: bool,
    pub denied_writable: bool,
    pub survey_writable: bool,
    pub messages: Vec<String>,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "survey-change-moderator",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// The moderation endpoint: dispatch on the `action` parameter.
///
/// Parameters are read from the query string and, for POSTs, from an
/// urlencoded form body; form values win where both are present.
pub async fn action(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActionParams>,
    form: Option<Form<ActionParams>>,
) -> Response {
    let params = merge_params(query, form.map(|f| f.0));
    let action = params.action.as_deref().unwrap_or("");

    debug!(action, "Processing moderation request");

    match action {
        "list_pending" => list_pending(&state).await,
        "list_denied" => list_denied(&state).await,
        "submit_changes" => submit_changes(&state, params.changes).await,
        "approve_change" => approve_change(&state, params.change_id).await,
        "deny_change" => deny_change(&state, params.change_id).await,
        "ping" => ok("pong"),
        "check_writes" => check_writes(&state).await,
        other => {
            debug!(action = other, "Unknown action");
            fail("Invalid action")
        }
    }
}

async fn list_pending(state: &AppState) -> Response {
    match state.service.list_pending().await {
        Ok(data) => list(data),
        Err(err) => report(err, "list_pending"),
    }
}

async fn list_denied(state: &AppState) -> Response {
    match state.service.list_denied().await {
        Ok(data) => list(data),
        Err(err) => report(err, "list_denied"),
    }
}

async fn submit_changes(state: &AppState, changes: Option<String>) -> Response {
    let proposals = match parse_changes(changes) {
        Ok(proposals) => proposals,
        Err(err) => {
            debug!("Submission payload missing or malformed");
            return fail(err.to_string());
        }
    };

    match state.service.submit(proposals).await {
        Ok(outcome) => {
            if !outcome.accepted.is_empty() {
                // fire-and-forget: delivery failure never reaches the submitter
                let notifier = state.notifier.clone();
                let items = outcome.accepted.clone();
                tokio::spawn(async move {
                    notifier.notify_submission(&items).await;
                });
            }

            let processed_changes: Vec<String> =
                outcome.accepted.iter().map(|c| c.id.clone()).collect();
            Json(SubmitResponse {
                success: true,
                message: "Changes processed".to_string(),
                total_changes: processed_changes.len(),
                processed_changes,
                change_items: outcome.accepted,
            })
            .into_response()
        }
        Err(err) => report(err, "submit_changes"),
    }
}

async fn approve_change(state: &AppState, change_id: Option<String>) -> Response {
    let Some(id) = change_id.filter(|id| !id.is_empty()) else {
        return fail(ModerationError::NotFound.to_string());
    };
    match state.service.approve(&id).await {
        Ok(message) => ok(message),
        Err(err) => report(err, "approve_change"),
    }
}

async fn deny_change(state: &AppState, change_id: Option<String>) -> Response {
    let Some(id) = change_id.filter(|id| !id.is_empty()) else {
        return fail(ModerationError::NotFound.to_string());
    };
    match state.service.deny(&id).await {
        Ok(message) => ok(message),
        Err(err) => report(err, "deny_change"),
    }
}

async fn check_writes(state: &AppState) -> Response {
    let probe = state.service.check_writes().await;
    Json(WriteProbeResponse {
        success: true,
        api_writable: probe.api_writable,
        pending_writable: probe.pending_writable,
        denied_writable: probe.denied_writable,
        survey_writable: probe.survey_writable,
        messages: probe.messages,
    })
    .into_response()
}

/// Parse the `changes` parameter into a non-empty proposal batch.
fn parse_changes(raw: Option<String>) -> Result<Vec<ChangeProposal>, ModerationError> {
    let raw = raw.ok_or(ModerationError::MalformedInput)?;
    let proposals: Vec<ChangeProposal> =
        serde_json::from_str(&raw).map_err(|_| ModerationError::MalformedInput)?;
    if proposals.is_empty() {
        return Err(ModerationError::MalformedInput);
    }
    Ok(proposals)
}

fn merge_params(query: ActionParams, form: Option<ActionParams>) -> ActionParams {
    let Some(form) = form else { return query };
    ActionParams {
        action: form.action.or(query.action),
        change_id: form.change_id.or(query.change_id),
        changes: form.changes.or(query.changes),
    }
}

/// Render an expected failure into the response payload, logging at a
/// severity matched to what it means operationally.
fn report(err: ModerationError, action: &str) -> Response {
    match &err {
        ModerationError::NotFound | ModerationError::MalformedInput => {
            info!(action, error = %err, "Request rejected")
        }
        _ => warn!(action, error = ?err, "Moderation action failed"),
    }
    fail(err.to_string())
}

fn ok(message: impl Into<String>) -> Response {
    Json(MessageResponse {
        success: true,
        message: message.into(),
    })
    .into_response()
}

fn fail(message: impl Into<String>) -> Response {
    Json(MessageResponse {
        success: false,
        message: message.into(),
    })
    .into_response()
}

fn list<T: Serialize>(data: HashMap<String, T>) -> Response {
    Json(ListResponse {
        success: true,
        data,
    })
    .into_response()
}
