#![cfg(feature = "server")]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use fieldguard_database::DocumentStore;
use fieldguard_kernel::domain::config::ApiConfig;
use fieldguard_kernel::server::ApiState;
use fieldguard_protection::{api, is_encrypted};
use fieldguard_vault::{HexKeyProvider, KeyProvider, SecretKey, StaticKeyProvider};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn state(token: Option<&str>, keys: Arc<dyn KeyProvider>) -> ApiState {
    let mut config = ApiConfig::default();
    config.security.api_token = token.map(str::to_owned);
    ApiState::builder().config(config).keys(keys).build().unwrap()
}

fn static_keys() -> Arc<dyn KeyProvider> {
    Arc::new(StaticKeyProvider::new(SecretKey::from_bytes([8; 32])))
}

fn app(state: &ApiState) -> Router {
    let (router, _api) = api::router().split_for_parts();
    router.with_state(state.clone())
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn decrypt_request(body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post("/rpc/decrypt-user").header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn put_request(id: &str, body: Value) -> Request<Body> {
    Request::put(format!("/users/{id}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn write_then_decrypt_round_trip() {
    let state = state(None, static_keys());
    let worker = fieldguard_protection::init(&state).unwrap();

    let (status, body) =
        send(app(&state), put_request("u1", json!({ "name": "Kim", "email": "kim@x.io", "other": 42 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": "u1", "revision": 1 }));

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let doc = state.store.get("users", "u1").await.unwrap().unwrap();
            if is_encrypted(&doc.record) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("record encrypted in time");

    let (status, body) = send(app(&state), decrypt_request(json!({ "userId": "u1" }), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "name": "Kim", "email": "kim@x.io", "other": 42 }));

    worker.abort();
}

#[tokio::test]
async fn missing_user_is_not_found() {
    let state = state(None, static_keys());
    let (status, body) = send(app(&state), decrypt_request(json!({ "userId": "ghost" }), None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": { "code": "not-found", "message": "user not found" } }));
    assert!(state.store.is_empty("users"));
}

#[tokio::test]
async fn missing_user_id_is_invalid() {
    let state = state(None, static_keys());

    for body in [json!({}), json!({ "userId": "" }), json!({ "userId": "  " })] {
        let (status, body) = send(app(&state), decrypt_request(body, None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid-argument");
        assert_eq!(body["error"]["message"], "user id is required");
    }
}

#[tokio::test]
async fn malformed_json_is_invalid() {
    let state = state(None, static_keys());
    let request = Request::post("/rpc/decrypt-user")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(app(&state), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid-argument");
}

#[tokio::test]
async fn token_is_enforced_when_configured() {
    let state = state(Some("s3cret"), static_keys());

    let (status, body) = send(app(&state), decrypt_request(json!({ "userId": "u1" }), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthenticated");

    let (status, _) = send(app(&state), decrypt_request(json!({ "userId": "u1" }), Some("nope"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(app(&state), decrypt_request(json!({ "userId": "u1" }), Some("s3cret"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_key_is_failed_precondition() {
    let state = state(None, Arc::new(HexKeyProvider::new("abc")));
    state.store.put("users", "u1", serde_json::Map::new()).await.unwrap();

    let (status, body) = send(app(&state), decrypt_request(json!({ "userId": "u1" }), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "failed-precondition");
    assert_eq!(body["error"]["message"], "key must be 32-byte hex");
}

#[tokio::test]
async fn integrity_failure_is_data_loss() {
    let state = state(None, static_keys());
    let other = fieldguard_protection::FieldCodec::new(&SecretKey::from_bytes([9; 32])).unwrap();
    let foreign = fieldguard_protection::encrypt_record(
        &json!({ "email": "kim@x.io" }).as_object().cloned().unwrap(),
        &other,
    )
    .unwrap();
    state.store.put("users", "u1", foreign.clone()).await.unwrap();

    let (status, body) = send(app(&state), decrypt_request(json!({ "userId": "u1" }), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "data-loss");

    let ciphertext = foreign["email"]["data"].as_str().unwrap();
    assert!(!body.to_string().contains(ciphertext));
}

#[tokio::test]
async fn put_rejects_non_object_bodies_and_bad_ids() {
    let state = state(None, static_keys());

    let (status, _) = send(app(&state), put_request("u1", json!(["not", "an", "object"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(app(&state), put_request("%20", json!({ "name": "Kim" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "user id is required");
    assert!(state.store.is_empty("users"));
}
