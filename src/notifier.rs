// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Best-effort moderator notification.
//!
//! Newly accepted changes are rendered into an HTML digest with
//! one-click approve/deny links and handed to an HTTP mail relay.
//! Delivery can fail for any reason without affecting the submitter:
//! every failure path ends in a log line, never in an error returned
//! to the caller.

use crate::config::NotifyConfig;
use crate::models::PendingChange;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

/// Path of the moderation endpoint, as rendered into emailed links.
const RESOLVER_ENDPOINT: &str = "/api/survey";

/// Message shape the mail relay accepts.
#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    to: &'a str,
    subject: &'a str,
    html: String,
}

/// Mail relay client for submission digests.
pub struct Notifier {
    config: NotifyConfig,
    client: reqwest::Client,
}

impl Notifier {
    pub fn new(config: NotifyConfig) -> Self {
        if config.enabled() {
            if let Err(err) = Url::parse(&config.public_base_url) {
                warn!(
                    base_url = %config.public_base_url,
                    error = %err,
                    "Public base URL does not parse; emailed links will be broken"
                );
            }
        }

        let client = reqwest::Client::builder()
            .timeout(config.send_timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { config, client }
    }

    /// Send the digest for a submission batch. Never returns an error.
    pub async fn notify_submission(&self, items: &[PendingChange]) {
        if items.is_empty() {
            return;
        }
        if !self.config.enabled() {
            debug!("Notification relay not configured, skipping digest");
            return;
        }

        let message = RelayMessage {
            to: &self.config.to,
            subject: &self.config.subject,
            html: self.render_digest(items),
        };

        match self
            .client
            .post(&self.config.relay_url)
            .json(&message)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!(count = items.len(), "Submission digest delivered");
            }
            Ok(response) => {
                warn!(status = %response.status(), "Mail relay rejected submission digest");
            }
            Err(err) => {
                warn!(error = %err, "Failed to deliver submission digest");
            }
        }
    }

    /// One-click action link for an emailed button.
    fn action_link(&self, action: &str, change_id: &str) -> String {
        format!(
            "{}{}?action={}&changeId={}",
            self.config.public_base_url.trim_end_matches('/'),
            RESOLVER_ENDPOINT,
            action,
            urlencoding::encode(change_id)
        )
    }

    /// Absolute URL for a digest thumbnail.
    fn absolute_image_url(&self, image_path: &str) -> String {
        if image_path.starts_with("http") {
            image_path.to_string()
        } else {
            format!(
                "{}/{}",
                self.config.public_base_url.trim_end_matches('/'),
                image_path.trim_start_matches('/')
            )
        }
    }

    fn render_digest(&self, items: &[PendingChange]) -> String {
        let mut rows = String::new();
        for item in items {
            let approve = self.action_link("approve_change", &item.id);
            let deny = self.action_link("deny_change", &item.id);
            let image = if item.proposal.image_path.is_empty() {
                String::new()
            } else {
                format!(
                    "<img src=\"{}\" alt=\"{}\" style=\"width:96px;height:96px;object-fit:contain;background:#111;border-radius:8px\">",
                    escape_html(&self.absolute_image_url(&item.proposal.image_path)),
                    escape_html(&item.proposal.display_name),
                )
            };

            rows.push_str(&format!(
                "<tr>\
                 <td style=\"padding:8px;border-bottom:1px solid #333\">{image}</td>\
                 <td style=\"padding:8px;border-bottom:1px solid #333\"><div><strong>{display}</strong>\
                 <div style=\"color:#aaa;font-size:12px\">{file}</div></div></td>\
                 <td style=\"padding:8px;border-bottom:1px solid #333\">{name}</td>\
                 <td style=\"padding:8px;border-bottom:1px solid #333\">{description}</td>\
                 <td style=\"padding:8px;border-bottom:1px solid #333\">\
                 <a href=\"{approve}\" style=\"padding:6px 10px;border:1px solid #2a8f2a;color:#2a8f2a;text-decoration:none;border-radius:6px\">Approve</a> \
                 <a href=\"{deny}\" style=\"padding:6px 10px;border:1px solid #b13c3c;color:#b13c3c;text-decoration:none;border-radius:6px\">Deny</a>\
                 </td></tr>",
                image = image,
                display = escape_html(&item.proposal.display_name),
                file = escape_html(&item.proposal.filename),
                name = escape_html(&item.proposal.new_name),
                description = escape_html(&item.proposal.new_description).replace('\n', "<br>"),
                approve = escape_html(&approve),
                deny = escape_html(&deny),
            ));
        }

        format!(
            "<html><body style=\"background:#0b0b0b;color:#eee;font-family:Segoe UI,Arial,sans-serif\">\
             <h2 style=\"color:#fff\">New Survey Submissions</h2>\
             <table style=\"width:100%;border-collapse:collapse\">\
             <thead><tr>\
             <th align=\"left\" style=\"padding:8px;border-bottom:1px solid #555\">Image</th>\
             <th align=\"left\" style=\"padding:8px;border-bottom:1px solid #555\">Item</th>\
             <th align=\"left\" style=\"padding:8px;border-bottom:1px solid #555\">Proposed Name</th>\
             <th align=\"left\" style=\"padding:8px;border-bottom:1px solid #555\">Proposed Description</th>\
             <th align=\"left\" style=\"padding:8px;border-bottom:1px solid #555\">Actions</th>\
             </tr></thead><tbody>{rows}</tbody></table>\
             <p style=\"color:#aaa;font-size:12px\">Links perform the action immediately.</p>\
             </body></html>"
        )
    }
}

/// Minimal HTML entity escaping for digest fields.
fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}
