//! Tests for verify command

use httpmock::prelude::*;
use serde_json::json;

use dm_sender::commands::verify;
use dm_sender::{AccountId, Credentials, TransportConfig};

#[tokio::test]
async fn test_verify_returns_account() {
    let server = MockServer::start_async().await;
    let me = server.mock(|when, then| {
        when.method(GET).path("/2/users/me");
        then.status(200)
            .json_body(json!({ "data": { "id": "77", "username": "me" } }));
    });

    let transport = TransportConfig {
        base_url: server.base_url(),
        ..TransportConfig::default()
    };
    let creds = Credentials::new("k", "s", "t", "ts");

    let account = tokio_test::assert_ok!(verify::run(&creds, &transport).await);
    assert_eq!(account, AccountId::new("77"));
    me.assert_calls(1);
}

#[tokio::test]
async fn test_verify_reports_auth_failure() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/2/users/me");
        then.status(401).body("Unauthorized");
    });

    let transport = TransportConfig {
        base_url: server.base_url(),
        ..TransportConfig::default()
    };
    let creds = Credentials::new("k", "s", "t", "ts");

    let err = tokio_test::assert_err!(verify::run(&creds, &transport).await);
    assert!(matches!(err, dm_sender::Error::AuthenticationFailed(_)));
}

#[tokio::test]
async fn test_verify_timeout_is_not_auth_failure() {
    let server = MockServer::start_async().await;
    server.mock(|when, then| {
        when.method(GET).path("/2/users/me");
        then.status(200)
            .delay(std::time::Duration::from_secs(3))
            .json_body(json!({ "data": { "id": "77", "username": "me" } }));
    });

    let transport = TransportConfig {
        base_url: server.base_url(),
        timeout: std::time::Duration::from_secs(1),
        ..TransportConfig::default()
    };
    let creds = Credentials::new("k", "s", "t", "ts");

    let err = tokio_test::assert_err!(verify::run(&creds, &transport).await);
    assert!(matches!(
        err,
        dm_sender::Error::Transport(dm_sender::TransportError::Timeout)
    ));
}
