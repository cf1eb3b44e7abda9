// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Survey Change Moderator Service
//!
//! The moderation endpoint behind the portfolio survey page. Visitors
//! propose renames and new descriptions; the moderator approves or
//! denies each proposal via one-click email links, and approvals are
//! applied to the `descriptionsDatabase` literal embedded in the page.
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `BIND_ADDR`: Server bind address (default: 0.0.0.0:8080)
//! - `SURVEY_FILE`: Survey page to patch (default: pages/survey.html)
//! - `PENDING_CHANGES_FILE`: Pending queue (default: api/pending_changes.json)
//! - `DENIED_CHANGES_FILE`: Denied queue (default: api/denied_changes.json)
//! - `PUBLIC_BASE_URL`: Base URL for emailed links (default: http://localhost:8080)
//! - `NOTIFY_RELAY_URL`: Mail relay webhook; empty disables notifications
//! - `NOTIFY_TO`: Moderator address for the digest
//! - `IO_TIMEOUT_MS`: Filesystem operation bound (default: 5000)
//! - `NOTIFY_TIMEOUT_MS`: Relay request bound (default: 10000)

use axum::{
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use survey_change_moderator::{
    config::{Config, NotifyConfig, StoreConfig, TargetConfig},
    handlers::{action, health, AppState},
    moderation::ModerationService,
    notifier::Notifier,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    // Load configuration
    let config = load_config();
    info!(
        bind_addr = %config.bind_addr,
        survey_file = %config.target.survey_path.display(),
        pending_file = %config.stores.pending_path.display(),
        denied_file = %config.stores.denied_path.display(),
        notify_enabled = config.notify.enabled(),
        "Starting survey change moderator"
    );

    // Create application state
    let service = ModerationService::new(&config);
    let notifier = Arc::new(Notifier::new(config.notify.clone()));

    let state = Arc::new(AppState {
        service,
        notifier,
        config: config.clone(),
    });

    // Build router. The endpoint answers GET as well as POST so the
    // approve/deny links in the digest work from a mail client.
    let app = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/api/survey", get(action).post(action))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %addr, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Load configuration from environment variables.
fn load_config() -> Config {
    Config {
        bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
        stores: StoreConfig {
            pending_path: env_path("PENDING_CHANGES_FILE", "api/pending_changes.json"),
            denied_path: env_path("DENIED_CHANGES_FILE", "api/denied_changes.json"),
            io_timeout_ms: env_parse("IO_TIMEOUT_MS", 5000),
        },
        target: TargetConfig {
            survey_path: env_path("SURVEY_FILE", "pages/survey.html"),
        },
        notify: NotifyConfig {
            relay_url: std::env::var("NOTIFY_RELAY_URL").unwrap_or_default(),
            to: std::env::var("NOTIFY_TO").unwrap_or_default(),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            send_timeout_ms: env_parse("NOTIFY_TIMEOUT_MS", 10000),
            ..Default::default()
        },
    }
}

fn env_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

fn env_parse(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
