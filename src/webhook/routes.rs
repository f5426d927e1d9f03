use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::WEBHOOK_KEYS;
use crate::webhook::{discord, github, AppState};

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

pub async fn home() -> &'static str {
    "GitHub Webhook Server is Running!"
}

/// Reports the destination keys regardless of whether their URLs are set.
pub async fn test() -> Json<Value> {
    Json(json!({
        "status": "running",
        "time": Utc::now().to_rfc3339(),
        "configured_webhooks": WEBHOOK_KEYS,
    }))
}

/// GitHub event ingestion. Always acknowledges with 200 on success; any
/// processing failure becomes a 500 with an error message. No signature
/// verification, no retries.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    let event_type = headers
        .get("X-GitHub-Event")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    match process_event(&state, event_type.as_deref(), &body).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "event": event_type })),
        ),
        Err(e) => {
            error!("Error processing webhook: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": e.to_string() })),
            )
        }
    }
}

async fn process_event(
    state: &AppState,
    event_type: Option<&str>,
    body: &str,
) -> Result<(), WebhookError> {
    let payload: Value = serde_json::from_str(body)?;
    info!(
        "Received {} webhook at {}",
        event_type.unwrap_or("unknown"),
        Utc::now().to_rfc3339()
    );

    match event_type {
        Some("push") => {
            let event = match serde_json::from_value::<github::PushEvent>(payload) {
                Ok(event) => event,
                Err(e) => {
                    // A shape mismatch skips formatting; the event is still
                    // acknowledged.
                    warn!("Error formatting commit message: {e}");
                    return Ok(());
                }
            };

            for line in github::format_push(&event) {
                send_changelog(state, &line).await;
            }
        }
        Some(kind @ ("issues" | "issue_comment")) => {
            let event =
                serde_json::from_value::<github::IssueEvent>(payload).unwrap_or_default();
            let message = github::format_issue(&event, kind);
            // Computed but not delivered anywhere.
            debug!("formatted issue message: {message}");
        }
        _ => {}
    }

    Ok(())
}

/// Generates the AI changelog for one commit and posts it to the changelog
/// destination. Every failure here is logged and swallowed; the webhook
/// request itself still succeeds.
async fn send_changelog(state: &AppState, line: &github::CommitLine) {
    let changelog = match state.changelog.generate(&line.raw.to_string()).await {
        Ok(changelog) => changelog,
        Err(e) => {
            warn!("OpenAI Error: {e}");
            return;
        }
    };

    let Some(url) = state.config.webhook_url("changelog") else {
        warn!("No webhook URL configured for changelog");
        return;
    };

    match discord::deliver(&state.http, url, &changelog).await {
        Ok(()) => info!("Message sent to Discord (changelog)"),
        Err(e) => warn!("Error sending to Discord: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WebhookConfig;
    use crate::webhook::{router, AppState};
    use axum::body::Body;
    use axum::http::Request;
    use axum::response::Response;
    use http_body_util::BodyExt;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    fn app() -> axum::Router {
        // No API key and no destination URLs: outbound calls are all skipped.
        router(AppState::new(WebhookConfig::default()))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn home_reports_liveness() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"GitHub Webhook Server is Running!");
    }

    #[tokio::test]
    async fn test_route_lists_exactly_the_three_keys() {
        let response = app()
            .oneshot(Request::builder().uri("/test").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "running");
        assert_eq!(
            json["configured_webhooks"],
            json!(["github_feeds", "changelog", "issues"])
        );
        assert!(json["time"].is_string());
    }

    #[tokio::test]
    async fn malformed_body_yields_500_error_json() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .header("X-GitHub-Event", "push")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["status"], "error");
        assert!(json["message"].as_str().unwrap().contains("invalid JSON"));
    }

    #[tokio::test]
    async fn push_event_is_acknowledged() {
        let payload = json!({
            "ref": "refs/heads/main",
            "repository": { "name": "nong-bot" },
            "commits": [{
                "id": "0123456789abcdef",
                "message": "fix playback loop",
                "author": { "name": "Alice" }
            }]
        });

        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .header("X-GitHub-Event", "push")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["event"], "push");
    }

    #[tokio::test]
    async fn issue_events_are_formatted_but_not_dispatched() {
        let payload = json!({
            "action": "opened",
            "repository": { "full_name": "org/nong-bot" },
            "sender": { "login": "alice" },
            "issue": { "number": 1, "title": "title", "body": "body" }
        });

        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .header("X-GitHub-Event", "issues")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["event"], "issues");
    }

    #[tokio::test]
    async fn missing_event_header_acknowledges_with_null_event() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["event"], Value::Null);
    }
}
