//! Flag command - Fetch the remote routing flag
//!
//! Performs the same one-shot fetch the router does and prints the value
//! together with where it came from.

use anyhow::{Context, Result};
use faultline_remote::{FlagSource, RemoteConfigClient};
use tracing::info;

use crate::output::get_formatter;
use crate::CliContext;

#[derive(Debug, clap::Args)]
pub struct FlagCommand {
    /// Fetch from this URL instead of the configured one
    #[arg(long)]
    pub url: Option<String>,
}

impl FlagCommand {
    pub async fn execute(&self, ctx: &CliContext) -> Result<()> {
        let formatter = get_formatter(ctx.format);

        let url = self
            .url
            .clone()
            .unwrap_or_else(|| ctx.config.remote_config.url.clone());
        info!(url = %url, "Fetching remote flag");

        let client = RemoteConfigClient::new(url.clone());
        let state = client.initialize().await;

        if ctx.format.is_json() {
            let mut json =
                serde_json::to_value(state).context("Failed to serialize flag state")?;
            json["url"] = serde_json::Value::String(url);
            formatter.print_json(&json);
            return Ok(());
        }

        match &state.source {
            FlagSource::Remote => {
                formatter.success(&format!("isMoreData = {}", state.flag.is_more_data));
            }
            FlagSource::Default { reason } => {
                formatter.warn(&format!("Remote flag unavailable: {}", reason));
                formatter.success(&format!(
                    "isMoreData = {} (default)",
                    state.flag.is_more_data
                ));
            }
        }
        formatter.info(&format!("Source: {}", url));

        Ok(())
    }
}
