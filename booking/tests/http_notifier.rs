//! `HttpNotifier` against a mock chat endpoint

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use busflow_booking::notifier::{HttpNotifier, NotifyError, Notifier};
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn notifier(server: &MockServer) -> HttpNotifier {
    HttpNotifier::new(format!("{}/send", server.uri()), "-1001", Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn posts_markdown_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .and(body_json(serde_json::json!({
            "chat_id": "-1001",
            "text": "*NEW BOOKING*",
            "parse_mode": "Markdown",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .expect(1)
        .mount(&server)
        .await;

    let result = notifier(&server).notify_booking("*NEW BOOKING*".to_string()).await;
    assert_eq!(result, Ok(()));
}

#[tokio::test]
async fn error_status_is_reported_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("bot was blocked"))
        .mount(&server)
        .await;

    let result = notifier(&server).notify_booking("hello".to_string()).await;
    assert_eq!(
        result,
        Err(NotifyError::Rejected {
            status: 403,
            body: "bot was blocked".to_string(),
        })
    );
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let notifier =
        HttpNotifier::new(format!("{}/send", server.uri()), "-1001", Duration::from_millis(100)).unwrap();
    let result = notifier.notify_booking("hello".to_string()).await;
    assert!(matches!(result, Err(NotifyError::Transport(_))));
}
