//! GitHub webhook receiver: a small axum server that turns repository
//! events into Discord channel messages.
//!
//! Routes:
//! - `GET /` - liveness text
//! - `GET /test` - JSON status + the configured webhook destination keys
//! - `POST /webhook` - GitHub event ingestion (`X-GitHub-Event` header +
//!   JSON body)
//!
//! Push commits are summarized through [`changelog::ChangelogGenerator`] and
//! relayed to the changelog destination; issue events are formatted only.

pub mod changelog;
pub mod discord;
pub mod github;
pub mod routes;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::config::WebhookConfig;
use changelog::ChangelogGenerator;

/// Shared state for the request handlers. Cheap to clone: an `Arc` per
/// field, and `reqwest::Client` is reference-counted internally.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WebhookConfig>,
    pub http: reqwest::Client,
    pub changelog: Arc<ChangelogGenerator>,
}

impl AppState {
    pub fn new(config: WebhookConfig) -> Self {
        let http = reqwest::Client::new();
        let changelog = Arc::new(ChangelogGenerator::new(
            http.clone(),
            config.openai_api_key.clone(),
        ));

        Self {
            config: Arc::new(config),
            http,
            changelog,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::home))
        .route("/test", get(routes::test))
        .route("/webhook", post(routes::receive))
        .with_state(state)
}
