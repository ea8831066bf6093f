//! Integration tests for the remote flag client
//!
//! Each mock only answers once (`expect(1)`), so every test also checks
//! that initialization fetched the document a single time.

use std::sync::Arc;
use std::time::Duration;

use faultline_core::{domain::RemoteFlag, ports::IFlagSource};
use faultline_remote::{FlagSource, RemoteConfigClient};
use wiremock::ResponseTemplate;

use crate::common;

#[tokio::test]
async fn test_flag_true_over_200() {
    let (_server, client) = common::setup_flag_mock(
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "isMoreData": true })),
    )
    .await;

    assert!(client.flag().await.is_more_data);
    assert!(client.is_initialized());
    assert_eq!(client.cached().unwrap().source, FlagSource::Remote);
}

#[tokio::test]
async fn test_non_json_body_defaults_to_false() {
    let (_server, client) =
        common::setup_flag_mock(ResponseTemplate::new(200).set_body_string("not json")).await;

    assert!(!client.flag().await.is_more_data);
    assert!(client.is_initialized());
    assert!(client.cached().unwrap().is_default());
}

#[tokio::test]
async fn test_double_encoded_body_is_accepted() {
    let (_server, client) = common::setup_flag_mock(
        ResponseTemplate::new(200).set_body_string(r#""{\"isMoreData\":true}""#),
    )
    .await;

    assert!(client.flag().await.is_more_data);
}

#[tokio::test]
async fn test_non_200_defaults_and_initializes_once() {
    let (_server, client) = common::setup_flag_mock(
        ResponseTemplate::new(404).set_body_json(serde_json::json!({ "isMoreData": true })),
    )
    .await;

    assert_eq!(client.flag().await, RemoteFlag::default());
    // Second read comes from the cache; the mock would fail on a second hit.
    assert_eq!(client.flag().await, RemoteFlag::default());

    let state = client.cached().unwrap();
    assert_eq!(
        state.source,
        FlagSource::Default {
            reason: "Unexpected HTTP status 404".into()
        }
    );
}

#[tokio::test]
async fn test_other_success_codes_are_not_accepted() {
    let (_server, client) = common::setup_flag_mock(
        ResponseTemplate::new(204),
    )
    .await;

    assert!(!client.flag().await.is_more_data);
    assert!(client.cached().unwrap().is_default());
}

#[tokio::test]
async fn test_unreachable_host_defaults_to_false() {
    let client = RemoteConfigClient::new("http://127.0.0.1:1/flag.json");

    assert!(!client.flag().await.is_more_data);
    assert!(client.is_initialized());
    assert!(client.cached().unwrap().is_default());
}

#[tokio::test]
async fn test_concurrent_callers_converge_on_one_fetch() {
    let (_server, client) = common::setup_flag_mock(
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({ "isMoreData": true }))
            .set_delay(Duration::from_millis(100)),
    )
    .await;
    let client = Arc::new(client);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.flag().await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_more_data);
    }
    assert!(client.is_initialized());
}

#[tokio::test]
async fn test_client_as_flag_source() {
    let (_server, client) = common::setup_flag_mock(
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "isMoreData": false })),
    )
    .await;
    let source: Arc<dyn IFlagSource> = Arc::new(client);

    assert!(!source.flag().await.is_more_data);
}
