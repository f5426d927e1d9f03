use serde_json::json;
use thiserror::Error;

/// Identity the relayed messages post under.
const WEBHOOK_USERNAME: &str = "GitHub Bot";
const WEBHOOK_AVATAR_URL: &str =
    "https://github.githubassets.com/images/modules/logos_page/GitHub-Mark.png";

/// Delivery failures are logged by callers, never surfaced to the sender of
/// the originating GitHub event.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("webhook delivery failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Posts one message through a pre-registered Discord channel webhook.
pub async fn deliver(
    http: &reqwest::Client,
    webhook_url: &str,
    content: &str,
) -> Result<(), DeliveryError> {
    http.post(webhook_url)
        .json(&json!({
            "content": content,
            "username": WEBHOOK_USERNAME,
            "avatar_url": WEBHOOK_AVATAR_URL,
        }))
        .send()
        .await?
        .error_for_status()?;

    Ok(())
}
