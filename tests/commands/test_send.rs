//! End-to-end bulk send against a mocked X API

use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use dm_sender::{
    BulkMessenger, Credentials, Recipient, RunConfig, SendResult, TokioSleeper, TransportConfig,
    XClient,
};

fn transport(server: &MockServer) -> TransportConfig {
    TransportConfig {
        base_url: server.base_url(),
        timeout: Duration::from_secs(5),
        wait_on_rate_limit: false,
        max_rate_limit_waits: 0,
    }
}

fn credentials() -> Credentials {
    Credentials::new("key", "secret", "token", "token_secret")
}

fn no_pauses() -> RunConfig {
    RunConfig {
        delay_min: 0,
        delay_max: 0,
        batch_size: 100,
        batch_delay: 0,
    }
}

#[tokio::test]
async fn test_bulk_send_over_http() {
    let server = MockServer::start_async().await;

    let me = server.mock(|when, then| {
        when.method(GET).path("/2/users/me");
        then.status(200)
            .json_body(json!({ "data": { "id": "1", "username": "sender" } }));
    });
    let alice = server.mock(|when, then| {
        when.method(GET).path("/2/users/by/username/alice");
        then.status(200)
            .json_body(json!({ "data": { "id": "1001", "username": "alice" } }));
    });
    let ghost = server.mock(|when, then| {
        when.method(GET).path("/2/users/by/username/ghost");
        then.status(200).json_body(json!({
            "errors": [{ "title": "Not Found Error", "value": "ghost" }]
        }));
    });
    let blocked = server.mock(|when, then| {
        when.method(GET).path("/2/users/by/username/blocked");
        then.status(200)
            .json_body(json!({ "data": { "id": "2002", "username": "blocked" } }));
    });
    let dm_alice = server.mock(|when, then| {
        when.method(POST)
            .path("/2/dm_conversations/with/1001/messages")
            .is_true(|req| {
                let body = String::from_utf8_lossy(req.body().as_ref());
                body.contains("Hi alice, from Acme!")
            });
        then.status(201)
            .json_body(json!({ "data": { "dm_event_id": "1" } }));
    });
    let dm_blocked = server.mock(|when, then| {
        when.method(POST).path("/2/dm_conversations/with/2002/messages");
        then.status(403).body("not permitted");
    });

    let mut messenger = BulkMessenger::from_config(&credentials(), &transport(&server))
        .await
        .expect("authenticated");

    let recipients = vec![
        Recipient::with_username("@alice").field("company", "Acme"),
        Recipient::with_username("ghost").field("company", "Nowhere"),
        Recipient::with_username("blocked").field("company", "Walled"),
    ];
    let summary = messenger
        .send_bulk(&recipients, "Hi {username}, from {company}!", &no_pauses())
        .await
        .expect("summary");

    assert_eq!(summary.counts(), (3, 1, 2));
    assert_eq!(summary.not_found, 1);
    assert_eq!(summary.send_errors, 1);

    me.assert_calls(1);
    alice.assert_calls(1);
    ghost.assert_calls(1);
    blocked.assert_calls(1);
    dm_alice.assert_calls(1);
    dm_blocked.assert_calls(1);
}

#[tokio::test]
async fn test_construction_fails_before_any_send_when_unauthorized() {
    let server = MockServer::start_async().await;

    let me = server.mock(|when, then| {
        when.method(GET).path("/2/users/me");
        then.status(401).body("Unauthorized");
    });
    let lookups = server.mock(|when, then| {
        when.method(GET).path("/2/users/by/username/alice");
        then.status(200).json_body(json!({ "data": { "id": "1" } }));
    });

    let result = BulkMessenger::from_config(&credentials(), &transport(&server)).await;

    assert!(matches!(result, Err(dm_sender::Error::AuthenticationFailed(_))));
    me.assert_calls(1);
    lookups.assert_calls(0);
}

#[tokio::test]
async fn test_slow_send_becomes_send_error() {
    let server = MockServer::start_async().await;

    server.mock(|when, then| {
        when.method(GET).path("/2/users/by/username/alice");
        then.status(200)
            .json_body(json!({ "data": { "id": "1001", "username": "alice" } }));
    });
    let dm = server.mock(|when, then| {
        when.method(POST).path("/2/dm_conversations/with/1001/messages");
        then.status(201)
            .delay(Duration::from_secs(3))
            .json_body(json!({ "data": { "dm_event_id": "1" } }));
    });

    let config = TransportConfig {
        timeout: Duration::from_secs(1),
        ..transport(&server)
    };
    let client = XClient::new(&credentials(), &config).expect("client");
    let messenger = BulkMessenger::new(client, TokioSleeper);

    let result = messenger.send_one("alice", "hello").await;

    assert_eq!(result, SendResult::SendError("request timed out".to_string()));
    dm.assert_calls(1);
}
