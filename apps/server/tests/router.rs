use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use fieldguard_kernel::domain::config::ApiConfig;
use fieldguard_server::Server;
use fieldguard_vault::{HexKeyProvider, SecretKey, StaticKeyProvider};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn server(token: Option<&str>) -> Server {
    let mut cfg = ApiConfig::default();
    cfg.security.api_token = token.map(str::to_owned);
    Server::builder()
        .config(cfg)
        .keys(Arc::new(StaticKeyProvider::new(SecretKey::from_bytes([4; 32]))))
        .build()
        .expect("server builds")
}

async fn call(server: &Server, request: Request<Body>) -> (StatusCode, Value) {
    let response = server.router().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer t0ken")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn health_is_public() {
    let server = server(Some("t0ken"));
    let (status, body) = call(&server, Request::get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["guards"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn api_reference_is_served() {
    let server = server(None);
    let response = server.router().oneshot(Request::get("/api").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stored_records_are_encrypted_and_decryptable() {
    let server = server(Some("t0ken"));

    let (status, _) = call(
        &server,
        json_request("PUT", "/users/kim", &json!({ "name": "Kim", "phone": "555-0100", "dept": "ops" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let store = server.state().store.clone();
    let stored = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let doc = fieldguard_database::DocumentStore::get(&store, "users", "kim").await.unwrap().unwrap();
            if doc.revision == 2 {
                return doc.record;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("write guard encrypted the record");

    assert!(stored["name"]["iv"].is_string());
    assert!(stored["phone"]["tag"].is_string());
    assert_eq!(stored["dept"], "ops");

    let (status, body) =
        call(&server, json_request("POST", "/rpc/decrypt-user", &json!({ "userId": "kim" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "name": "Kim", "phone": "555-0100", "dept": "ops" }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_key_aborts_startup() {
    let result = Server::builder().keys(Arc::new(HexKeyProvider::new("0".repeat(63)))).build();

    let err = result.expect_err("63 hex characters must be rejected");
    assert!(format!("{err:#}").contains("key must be 32-byte hex"));
}
