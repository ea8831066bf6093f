//! Integration tests for faultline-remote
//!
//! Uses wiremock to simulate the remote flag host and the chat webhook and
//! verifies end-to-end behavior of RemoteConfigClient and SlackWebhook.

mod common;

mod test_flag;
mod test_webhook;
