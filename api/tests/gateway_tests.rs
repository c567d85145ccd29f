//! Gateway and service behavior against the in-memory pipe transport.

use std::sync::Arc;

use serde_json::json;

use voxid_api::{
    Client, Error, Identity, PipeTransport, RecordedRequest, UploadKind, UploadTags, WxProfile,
};
use voxid_store::{keys, LocalStore, MemoryStore};

fn test_client(transport: &Arc<PipeTransport>, store: &MemoryStore) -> Client {
    Client::builder("http://svc.test/api")
        .transport(transport.clone())
        .store(Arc::new(store.clone()))
        .build()
        .unwrap()
}

fn sign_in(client: &Client) {
    client
        .session()
        .set(
            "tok-test".to_string(),
            Identity {
                id: Some("u-1".to_string()),
                nick_name: "Ada".to_string(),
                avatar_url: None,
            },
        )
        .unwrap();
}

#[tokio::test]
async fn test_bearer_attached_when_token_present() {
    let transport = PipeTransport::new();
    let store = MemoryStore::new();
    let client = test_client(&transport, &store);
    sign_in(&client);

    transport.push_response(200, json!({"success": true, "data": {"registered": true}}));
    let status = client.voiceprint().status().await.unwrap();
    assert!(status.registered);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].bearer(), Some("Bearer tok-test"));
    assert_eq!(requests[0].url(), "http://svc.test/api/voiceprint/status");
}

#[tokio::test]
async fn test_unauthenticated_call_sends_no_bearer() {
    let transport = PipeTransport::new();
    let store = MemoryStore::new();
    let client = test_client(&transport, &store);

    transport.push_response(
        200,
        json!({"success": true, "data": {"token": "t", "userInfo": {"nickName": "Ada"}}}),
    );
    let profile = WxProfile {
        nick_name: "Ada".to_string(),
        avatar_url: None,
    };
    client.auth().login("code-1", &profile).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests[0].bearer(), None);
}

#[tokio::test]
async fn test_expiry_clears_session_exactly_once() {
    let transport = PipeTransport::new();
    let store = MemoryStore::new();
    let client = test_client(&transport, &store);
    sign_in(&client);

    let watch = client.session().subscribe();

    transport.push_response(401, json!({"success": false, "message": "token expired"}));
    match client.voiceprint().status().await {
        Err(Error::AuthExpired) => {}
        other => panic!("expected AuthExpired, got {:?}", other.err()),
    }

    assert!(!client.session().is_authenticated());
    assert!(!watch.borrow().is_authenticated());
    assert_eq!(store.get(keys::TOKEN).unwrap(), None);
    assert_eq!(store.get(keys::IDENTITY).unwrap(), None);

    // the next session-dependent call fails fast without dispatch
    let before = transport.request_count();
    match client.voiceprint().status().await {
        Err(Error::AuthExpired) => {}
        other => panic!("expected AuthExpired, got {:?}", other.err()),
    }
    assert_eq!(transport.request_count(), before);
}

#[tokio::test]
async fn test_non_success_status_carries_body_message() {
    let transport = PipeTransport::new();
    let store = MemoryStore::new();
    let client = test_client(&transport, &store);
    sign_in(&client);

    transport.push_response(500, json!({"success": false, "message": "model offline"}));
    match client.voiceprint().status().await {
        Err(Error::RequestFailed { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "model offline");
        }
        other => panic!("expected RequestFailed, got {:?}", other.err()),
    }

    // a body without a message falls back to a generic one
    transport.push_raw(502, b"<html>bad gateway</html>");
    match client.voiceprint().status().await {
        Err(Error::RequestFailed { status, message }) => {
            assert_eq!(status, 502);
            assert_eq!(message, "request failed");
        }
        other => panic!("expected RequestFailed, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_network_failure_is_transient() {
    let transport = PipeTransport::new();
    let store = MemoryStore::new();
    let client = test_client(&transport, &store);
    sign_in(&client);

    transport.push_network_error("connection refused");
    let err = client.voiceprint().status().await.unwrap_err();
    assert!(err.is_transient());
    // a network failure does not touch the session
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_envelope_failure_on_success_status() {
    let transport = PipeTransport::new();
    let store = MemoryStore::new();
    let client = test_client(&transport, &store);
    sign_in(&client);

    transport.push_response(200, json!({"success": false, "message": "not registered"}));
    match client.voiceprint().verify("uploads/v.mp3").await {
        Err(Error::RequestFailed { message, .. }) => assert_eq!(message, "not registered"),
        other => panic!("expected RequestFailed, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_login_persists_and_logout_clears() {
    let transport = PipeTransport::new();
    let store = MemoryStore::new();
    let client = test_client(&transport, &store);

    transport.push_response(
        200,
        json!({
            "success": true,
            "data": {"token": "tok-login", "userInfo": {"nickName": "Grace", "id": "u-9"}}
        }),
    );
    let profile = WxProfile {
        nick_name: "Grace".to_string(),
        avatar_url: None,
    };
    let identity = client.auth().login("code-9", &profile).await.unwrap();
    assert_eq!(identity.nick_name, "Grace");
    assert_eq!(store.get(keys::TOKEN).unwrap(), Some(b"tok-login".to_vec()));

    client.auth().logout();
    assert!(!client.session().is_authenticated());
    assert_eq!(store.get(keys::TOKEN).unwrap(), None);
}

#[tokio::test]
async fn test_validate_failure_clears_session() {
    let transport = PipeTransport::new();
    let store = MemoryStore::new();
    let client = test_client(&transport, &store);
    sign_in(&client);

    transport.push_response(500, json!({"success": false, "message": "nope"}));
    assert!(!client.auth().validate().await.unwrap());
    assert!(!client.session().is_authenticated());

    // subsequent authenticated call fails fast without dispatch
    let before = transport.request_count();
    assert!(client.voiceprint().status().await.is_err());
    assert_eq!(transport.request_count(), before);
}

#[tokio::test]
async fn test_validate_ok_keeps_session() {
    let transport = PipeTransport::new();
    let store = MemoryStore::new();
    let client = test_client(&transport, &store);
    sign_in(&client);

    transport.push_response(200, json!({"success": true}));
    assert!(client.auth().validate().await.unwrap());
    assert!(client.session().is_authenticated());
}

#[tokio::test]
async fn test_upload_fields_and_result() {
    let transport = PipeTransport::new();
    let store = MemoryStore::new();
    let client = test_client(&transport, &store);
    sign_in(&client);

    transport.push_response(
        200,
        json!({"success": true, "data": {"filePath": "uploads/s0.mp3"}}),
    );
    let uploaded = client
        .upload()
        .upload(
            std::path::Path::new("local/s0.mp3"),
            UploadKind::Register,
            UploadTags {
                sample_index: Some(0),
                prompt_text: Some("first prompt".to_string()),
                subject_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(uploaded.file_path, "uploads/s0.mp3");

    match &transport.requests()[0] {
        RecordedRequest::Upload { fields, headers, .. } => {
            assert!(fields.contains(&("type".to_string(), "register".to_string())));
            assert!(fields.contains(&("sampleIndex".to_string(), "0".to_string())));
            assert!(fields.contains(&("text".to_string(), "first prompt".to_string())));
            assert!(headers
                .iter()
                .any(|(name, value)| name == "Authorization" && value == "Bearer tok-test"));
        }
        other => panic!("expected upload request, got {:?}", other),
    }
}

#[tokio::test]
async fn test_upload_failures_are_normalized() {
    let transport = PipeTransport::new();
    let store = MemoryStore::new();
    let client = test_client(&transport, &store);
    sign_in(&client);

    let target = std::path::Path::new("local/v.mp3");

    // unparsable body
    transport.push_raw(200, b"not json at all");
    match client
        .upload()
        .upload(target, UploadKind::Verify, UploadTags::default())
        .await
    {
        Err(Error::UploadFailed(reason)) => assert!(reason.contains("malformed response")),
        other => panic!("expected UploadFailed, got {:?}", other.err()),
    }

    // network failure
    transport.push_network_error("timed out");
    match client
        .upload()
        .upload(target, UploadKind::Verify, UploadTags::default())
        .await
    {
        Err(Error::UploadFailed(reason)) => assert!(reason.contains("timed out")),
        other => panic!("expected UploadFailed, got {:?}", other.err()),
    }

    // non-success status
    transport.push_response(413, json!({"success": false, "message": "too large"}));
    match client
        .upload()
        .upload(target, UploadKind::Verify, UploadTags::default())
        .await
    {
        Err(Error::UploadFailed(reason)) => assert!(reason.contains("too large")),
        other => panic!("expected UploadFailed, got {:?}", other.err()),
    }
}

#[tokio::test]
async fn test_upload_expiry_is_not_swallowed() {
    let transport = PipeTransport::new();
    let store = MemoryStore::new();
    let client = test_client(&transport, &store);
    sign_in(&client);

    transport.push_response(401, json!({"success": false, "message": "expired"}));
    match client
        .upload()
        .upload(
            std::path::Path::new("local/v.mp3"),
            UploadKind::Verify,
            UploadTags::default(),
        )
        .await
    {
        Err(Error::AuthExpired) => {}
        other => panic!("expected AuthExpired, got {:?}", other.err()),
    }
    assert!(!client.session().is_authenticated());
}

#[tokio::test]
async fn test_verify_confidence_preserved() {
    let transport = PipeTransport::new();
    let store = MemoryStore::new();
    let client = test_client(&transport, &store);
    sign_in(&client);

    transport.push_response(
        200,
        json!({
            "success": true,
            "data": {"match": true, "confidence": 0.8671, "userName": "Ada"}
        }),
    );
    let outcome = client.voiceprint().verify("uploads/v.mp3").await.unwrap();
    assert!(outcome.matched);
    assert_eq!(outcome.confidence, 0.8671);
    assert_eq!(outcome.user_name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn test_history_parses_entries() {
    let transport = PipeTransport::new();
    let store = MemoryStore::new();
    let client = test_client(&transport, &store);
    sign_in(&client);

    transport.push_response(
        200,
        json!({
            "success": true,
            "data": [
                {"createdAt": "2026-01-05T08:30:00Z", "matched": true, "confidence": 0.91},
                {"createdAt": "2026-01-04T17:02:11Z", "matched": false, "confidence": 0.32}
            ]
        }),
    );
    let history = client.voiceprint().history().await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history[0].matched);
    assert!(!history[1].matched);
}
