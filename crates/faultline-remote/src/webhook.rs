//! Slack-compatible chat webhook adapter
//!
//! Posts error reports as `{"text": ...}` messages to an incoming webhook.
//! Message text is passed through the [`Anonymizer`] before it leaves the
//! process. Any non-2xx response is an error, which makes the router fall
//! back to the crash backend.

use faultline_core::{
    config::{AppConfig, ChatWebhookConfig},
    domain::ReportTag,
    ports::IChatWebhook,
};
use faultline_telemetry::Anonymizer;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::WebhookError;

/// Stack traces longer than this are cut before posting
const MAX_STACK_CHARS: usize = 3000;

/// JSON body of an incoming-webhook message
#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<&'a str>,
}

/// Chat webhook posting to a Slack incoming-webhook URL
pub struct SlackWebhook {
    client: Client,
    url: String,
    channel: Option<String>,
    /// Shown as the sender and prefixed to every message
    app_label: String,
    anonymizer: Anonymizer,
}

impl SlackWebhook {
    /// Creates a webhook posting to `url`
    pub fn new(url: impl Into<String>, app_label: impl Into<String>, anonymizer: Anonymizer) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            channel: None,
            app_label: app_label.into(),
            anonymizer,
        }
    }

    /// Builds the adapter from configuration
    ///
    /// Returns `None` when no webhook URL is configured.
    pub fn from_config(config: &ChatWebhookConfig, app: &AppConfig) -> Option<Self> {
        let url = config.url.as_ref()?;
        let label = format!("{} {} ({})", app.name, app.version, app.variant);
        let mut webhook = Self::new(url, label, Anonymizer::new(&config.anonymize));
        webhook.channel = config.channel.clone();
        Some(webhook)
    }

    /// Sets the channel override
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Renders the message text for an error report
    pub fn format_message(&self, error: &str, stack_trace: Option<&str>, tag: ReportTag) -> String {
        let mut text = format!("[{}] {}: {}", tag, self.app_label, error);

        if let Some(stack) = stack_trace.filter(|s| !s.trim().is_empty()) {
            let stack = truncate_chars(stack, MAX_STACK_CHARS);
            text.push_str("\n```\n");
            text.push_str(stack);
            text.push_str("\n```");
        }

        self.anonymizer.anonymize(&text)
    }

    /// Posts a message and checks the response status
    async fn post(&self, text: String) -> Result<(), WebhookError> {
        let message = WebhookMessage {
            text,
            channel: self.channel.as_deref(),
            username: Some(&self.app_label),
        };

        let response = self.client.post(&self.url).json(&message).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WebhookError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "Webhook accepted message");
        Ok(())
    }

    /// Sends a plain test message
    pub async fn send_test_message(&self) -> anyhow::Result<()> {
        let text = format!("{}: webhook test message", self.app_label);
        self.post(text).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl IChatWebhook for SlackWebhook {
    async fn send(
        &self,
        error: &str,
        stack_trace: Option<&str>,
        tag: ReportTag,
    ) -> anyhow::Result<()> {
        let text = self.format_message(error, stack_trace, tag);
        self.post(text).await?;
        Ok(())
    }
}

/// Cuts `s` to at most `max` characters on a char boundary
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use faultline_core::config::AnonymizeConfig;

    use super::*;

    fn plain_anonymizer() -> Anonymizer {
        Anonymizer::new(&AnonymizeConfig {
            strip_paths: false,
            strip_usernames: false,
            strip_filenames: false,
        })
    }

    #[test]
    fn test_format_message_with_stack() {
        let hook = SlackWebhook::new("http://localhost", "app 1.0", plain_anonymizer());
        let text = hook.format_message("StateError: boom", Some("#0 main"), ReportTag::Fatal);
        assert_eq!(text, "[f] app 1.0: StateError: boom\n```\n#0 main\n```");
    }

    #[test]
    fn test_format_message_without_stack() {
        let hook = SlackWebhook::new("http://localhost", "app", plain_anonymizer());
        let text = hook.format_message("E: m", Some("   "), ReportTag::NonFatal);
        assert_eq!(text, "[nf] app: E: m");
    }

    #[test]
    fn test_format_message_strips_filenames() {
        let anonymizer = Anonymizer::new(&AnonymizeConfig {
            strip_paths: false,
            strip_usernames: false,
            strip_filenames: true,
        });
        let hook = SlackWebhook::new("http://localhost", "app", anonymizer);
        let text = hook.format_message("cannot open /data/customers.csv", None, ReportTag::Fatal);
        assert!(text.contains("<FILE>.csv"));
        assert!(!text.contains("customers"));
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    #[test]
    fn test_from_config_requires_url() {
        let app = AppConfig::default();
        assert!(SlackWebhook::from_config(&ChatWebhookConfig::default(), &app).is_none());

        let config = ChatWebhookConfig {
            url: Some("https://hooks.slack.com/services/T/B/X".into()),
            channel: Some("#errors".into()),
            anonymize: AnonymizeConfig::default(),
        };
        let hook = SlackWebhook::from_config(&config, &app).unwrap();
        assert_eq!(hook.url(), "https://hooks.slack.com/services/T/B/X");
        assert_eq!(hook.channel.as_deref(), Some("#errors"));
        assert!(hook.app_label.starts_with("faultline "));
    }

    #[test]
    fn test_message_serialization_skips_missing_channel() {
        let msg = WebhookMessage {
            text: "hi".into(),
            channel: None,
            username: Some("app"),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("channel").is_none());
        assert_eq!(json["username"], "app");
    }
}
