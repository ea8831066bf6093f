//! Webhook command - Exercise the chat webhook
//!
//! `faultline webhook test` posts a plain message to the configured
//! webhook; `faultline webhook preview` prints the text an error report
//! would be sent as, after anonymization, without posting it.

use anyhow::{Context, Result};
use clap::Subcommand;
use faultline_core::domain::ReportTag;
use faultline_remote::{SlackWebhook, WebhookError};

use crate::output::get_formatter;
use crate::CliContext;

#[derive(Debug, Subcommand)]
pub enum WebhookCommand {
    /// Send a test message to the configured webhook
    Test {
        /// Post to this URL instead of the configured one
        #[arg(long)]
        url: Option<String>,
    },
    /// Print the message an error would be posted as
    Preview {
        /// Rendered error text
        error: String,
        /// Stack trace text
        #[arg(long)]
        stack: Option<String>,
        /// Render as a fatal report
        #[arg(long)]
        fatal: bool,
    },
}

impl WebhookCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);

        match self {
            WebhookCommand::Test { url } => {
                let mut webhook_config = ctx.config.chat_webhook.clone();
                if let Some(url) = url {
                    webhook_config.url = Some(url.clone());
                }

                let webhook = SlackWebhook::from_config(&webhook_config, &ctx.config.app)
                    .ok_or(WebhookError::NotConfigured)?;

                webhook
                    .send_test_message()
                    .await
                    .with_context(|| format!("Webhook test to {} failed", webhook.url()))?;

                if ctx.format.is_json() {
                    formatter.print_json(&serde_json::json!({
                        "success": true,
                        "url": webhook.url(),
                    }));
                } else {
                    formatter.success("Webhook accepted the test message");
                }
            }

            WebhookCommand::Preview {
                error,
                stack,
                fatal,
            } => {
                // Rendering needs no reachable URL
                let mut webhook_config = ctx.config.chat_webhook.clone();
                webhook_config.url.get_or_insert_with(String::new);
                let webhook = SlackWebhook::from_config(&webhook_config, &ctx.config.app)
                    .ok_or(WebhookError::NotConfigured)?;

                let tag = if *fatal {
                    ReportTag::Fatal
                } else {
                    ReportTag::NonFatal
                };
                let text = webhook.format_message(error, stack.as_deref(), tag);

                if ctx.format.is_json() {
                    formatter.print_json(&serde_json::json!({ "tag": tag, "text": text }));
                } else {
                    println!("{}", text);
                }
            }
        }

        Ok(())
    }
}
