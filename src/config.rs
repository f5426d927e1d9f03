use anyhow::Result;

/// Configuration for the Discord bot process.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,
    pub command_prefix: String,
    /// Process-wide default gain, overridable per guild via the volume command.
    pub default_volume: f32,
}

impl BotConfig {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            discord_token: std::env::var("DISCORD_TOKEN")?,
            command_prefix: std::env::var("COMMAND_PREFIX").unwrap_or_else(|_| "!".to_string()),
            default_volume: std::env::var("DEFAULT_VOLUME")
                .unwrap_or_else(|_| "0.5".to_string())
                .parse()?,
        };

        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.discord_token.is_empty() {
            anyhow::bail!("DISCORD_TOKEN must not be empty");
        }

        if self.command_prefix.is_empty() {
            anyhow::bail!("Command prefix must not be empty");
        }

        if !(0.0..=1.0).contains(&self.default_volume) {
            anyhow::bail!(
                "Default volume must be between 0.0 and 1.0, got: {}",
                self.default_volume
            );
        }

        Ok(())
    }
}

/// The three outgoing webhook destinations, in the order `/test` reports them.
pub const WEBHOOK_KEYS: [&str; 3] = ["github_feeds", "changelog", "issues"];

/// Configuration for the webhook receiver process.
///
/// Destination URLs are optional: an unset destination is still listed by
/// `/test` but deliveries to it are skipped with a warning. A missing OpenAI
/// key disables changelog generation entirely.
#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
    pub openai_api_key: Option<String>,
    pub feeds_webhook: Option<String>,
    pub changelog_webhook: Option<String>,
    pub issues_webhook: Option<String>,
    pub port: u16,
}

impl WebhookConfig {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            feeds_webhook: std::env::var("FEEDS_WEBHOOK").ok(),
            changelog_webhook: std::env::var("CHANGELOG_WEBHOOK").ok(),
            issues_webhook: std::env::var("ISSUES_WEBHOOK").ok(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()?,
        })
    }

    /// Destination URL for a webhook key, if configured.
    pub fn webhook_url(&self, key: &str) -> Option<&str> {
        match key {
            "github_feeds" => self.feeds_webhook.as_deref(),
            "changelog" => self.changelog_webhook.as_deref(),
            "issues" => self.issues_webhook.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bot_config_validates_volume_range() {
        let mut config = BotConfig {
            discord_token: "token".to_string(),
            command_prefix: "!".to_string(),
            default_volume: 0.5,
        };
        assert!(config.validate().is_ok());

        config.default_volume = 1.5;
        assert!(config.validate().is_err());

        config.default_volume = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bot_config_rejects_empty_prefix() {
        let config = BotConfig {
            discord_token: "token".to_string(),
            command_prefix: String::new(),
            default_volume: 0.5,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn webhook_keys_are_reported_even_without_urls() {
        let config = WebhookConfig::default();
        for key in WEBHOOK_KEYS {
            assert_eq!(config.webhook_url(key), None);
        }
    }

    #[test]
    fn webhook_url_resolves_configured_destinations() {
        let config = WebhookConfig {
            changelog_webhook: Some("https://discord.com/api/webhooks/1/a".to_string()),
            ..Default::default()
        };

        assert_eq!(
            config.webhook_url("changelog"),
            Some("https://discord.com/api/webhooks/1/a")
        );
        assert_eq!(config.webhook_url("github_feeds"), None);
        assert_eq!(config.webhook_url("unknown"), None);
    }
}
