//! Faultline Remote - HTTP adapters
//!
//! Provides async clients for:
//! - The once-per-process remote routing flag (`{"isMoreData": bool}`)
//! - Forwarding error messages to a Slack-compatible incoming webhook
//!
//! ## Modules
//!
//! - [`flag`] - Fetch-and-cache client for the remote flag document
//! - [`webhook`] - Chat webhook adapter

pub mod flag;
pub mod webhook;

pub use flag::{parse_flag_body, resolve_flag, FlagSource, FlagState, RemoteConfigClient};
pub use webhook::SlackWebhook;

use thiserror::Error;

/// Errors that can occur while fetching the remote flag document
///
/// These never reach callers of [`RemoteConfigClient::flag`]; they are
/// converted to the default flag by [`resolve_flag`].
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a status other than 200
    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    /// The body was not a flag document
    #[error("Malformed flag document: {0}")]
    Malformed(String),
}

/// Errors that can occur when posting to the chat webhook
#[derive(Debug, Error)]
pub enum WebhookError {
    /// No webhook URL is configured
    #[error("No chat webhook URL configured")]
    NotConfigured,

    /// The request could not be sent
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The webhook answered with a non-success status
    #[error("Webhook returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}
