use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

const OPENAI_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";
const MODEL: &str = "gpt-4o-mini";
const MAX_TOKENS: u32 = 150;

const SYSTEM_PROMPT: &str = "คุณคือผู้เขียน changelog ที่มีความเชี่ยวชาญ \
กรุณาสรุปการเปลี่ยนแปลงของ commit เป็นภาษาไทยที่เข้าใจง่าย \
ใช้ emoji ที่เหมาะสม และจัดรูปแบบให้สวยงาม";

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("OPENAI_API_KEY is not configured")]
    MissingKey,

    #[error("changelog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion response carried no choices")]
    EmptyResponse,
}

/// Turns a raw commit record into a short Thai changelog entry via the
/// OpenAI completions endpoint. Failures are logged by the caller and the
/// commit is skipped; they never fail the webhook request.
pub struct ChangelogGenerator {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl ChangelogGenerator {
    pub fn new(http: reqwest::Client, api_key: Option<String>) -> Self {
        Self { http, api_key }
    }

    pub async fn generate(&self, commit_data: &str) -> Result<String, SummaryError> {
        let api_key = self.api_key.as_ref().ok_or(SummaryError::MissingKey)?;

        let response: ChatCompletionResponse = self
            .http
            .post(OPENAI_COMPLETIONS_URL)
            .bearer_auth(api_key)
            .json(&json!({
                "model": MODEL,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    {
                        "role": "user",
                        "content": format!("สร้าง changelog จาก commit นี้: {commit_data}"),
                    },
                ],
                "max_tokens": MAX_TOKENS,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or(SummaryError::EmptyResponse)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn completion_response_parses_first_choice() {
        let raw = r#"{
            "choices": [
                { "message": { "role": "assistant", "content": "  ✨ ปรับปรุงระบบคิวเพลง  " } }
            ]
        }"#;

        let response: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        let content = response.choices[0].message.content.trim();
        assert_eq!(content, "✨ ปรับปรุงระบบคิวเพลง");
    }

    #[tokio::test]
    async fn missing_api_key_disables_generation() {
        let generator = ChangelogGenerator::new(reqwest::Client::new(), None);
        assert!(matches!(
            generator.generate("{}").await,
            Err(SummaryError::MissingKey)
        ));
    }
}
