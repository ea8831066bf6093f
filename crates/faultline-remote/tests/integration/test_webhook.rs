//! Integration tests for the Slack webhook adapter

use faultline_core::{domain::ReportTag, ports::IChatWebhook};

use crate::common;

#[tokio::test]
async fn test_send_posts_tagged_message() {
    let (server, webhook) = common::setup_webhook_mock(200).await;

    webhook
        .send("StateError: boom", Some("#0 main"), ReportTag::Fatal)
        .await
        .expect("send failed");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);

    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let text = body["text"].as_str().unwrap();
    assert!(text.starts_with("[f] fieldapp 1.0.0: StateError: boom"));
    assert!(text.contains("#0 main"));
    assert_eq!(body["username"], "fieldapp 1.0.0");
    assert!(body.get("channel").is_none());
}

#[tokio::test]
async fn test_send_includes_channel_override() {
    let (server, webhook) = common::setup_webhook_mock(200).await;
    let webhook = webhook.with_channel("#app-errors");

    webhook
        .send("E: m", None, ReportTag::NonFatal)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["channel"], "#app-errors");
    assert!(body["text"].as_str().unwrap().starts_with("[nf]"));
}

#[tokio::test]
async fn test_send_fails_on_error_status() {
    let (_server, webhook) = common::setup_webhook_mock(500).await;

    let result = webhook.send("E: m", None, ReportTag::Fatal).await;
    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("HTTP 500"));
}

#[tokio::test]
async fn test_send_test_message() {
    let (server, webhook) = common::setup_webhook_mock(200).await;

    webhook.send_test_message().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body["text"].as_str().unwrap().contains("webhook test message"));
}
