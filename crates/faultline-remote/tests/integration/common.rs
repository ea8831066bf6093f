//! Shared test helpers for remote adapter integration tests
//!
//! Provides wiremock-based mock server setup for the flag document and the
//! chat webhook endpoints.

use faultline_core::config::AnonymizeConfig;
use faultline_remote::{RemoteConfigClient, SlackWebhook};
use faultline_telemetry::Anonymizer;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the flag document is served from
pub const FLAG_PATH: &str = "/raw/flag.json";

/// Path the webhook accepts messages on
pub const WEBHOOK_PATH: &str = "/services/T000/B000/XXXX";

/// Starts a mock server serving `response` for the flag document exactly
/// once and returns a client pointed at it.
pub async fn setup_flag_mock(response: ResponseTemplate) -> (MockServer, RemoteConfigClient) {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(FLAG_PATH))
        .respond_with(response)
        .expect(1)
        .mount(&server)
        .await;

    let client = RemoteConfigClient::new(format!("{}{}", server.uri(), FLAG_PATH));
    (server, client)
}

/// Starts a mock webhook answering with `status` and returns an adapter
/// pointed at it.
pub async fn setup_webhook_mock(status: u16) -> (MockServer, SlackWebhook) {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(status).set_body_string("ok"))
        .mount(&server)
        .await;

    let anonymizer = Anonymizer::new(&AnonymizeConfig {
        strip_paths: false,
        strip_usernames: false,
        strip_filenames: false,
    });
    let webhook = SlackWebhook::new(
        format!("{}{}", server.uri(), WEBHOOK_PATH),
        "fieldapp 1.0.0",
        anonymizer,
    );
    (server, webhook)
}
