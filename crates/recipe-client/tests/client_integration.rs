//! Integration tests for the authenticated client
//!
//! These tests use wiremock to stand in for the recipe service and check
//! credential injection, session teardown on 401, error mapping and
//! timeouts.

use async_trait::async_trait;
use mockall::mock;
use recipe_client::{ApiClient, ApiClientConfig, ApiError, ApiRequest, ApiResponse, RecipeApi};
use serde::Deserialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use storage::{keys, KeyValueStore, MemoryStore, StorageError};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mock! {
    pub Store {}

    #[async_trait]
    impl KeyValueStore for Store {
        async fn get(&self, key: &str) -> storage::Result<Option<String>>;
        async fn set(&self, key: &str, value: &str) -> storage::Result<()>;
        async fn remove(&self, key: &str) -> storage::Result<bool>;
    }
}

#[derive(Debug, Deserialize, PartialEq)]
struct Pong {
    ok: bool,
}

fn client_with(server: &MockServer, store: MemoryStore) -> ApiClient {
    ApiClient::new(ApiClientConfig::new(server.uri()), Arc::new(store)).unwrap()
}

// =============================================================================
// Credential Injection
// =============================================================================

#[tokio::test]
async fn test_bearer_token_attached_from_store() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .and(header("authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = MemoryStore::with_entries([(keys::TOKEN, "t1")]);
    let client = client_with(&mock_server, store);

    let response: ApiResponse<Pong> = client.send(ApiRequest::get("/ping")).await.unwrap();
    assert_eq!(response.data, Pong { ok: true });
}

#[tokio::test]
async fn test_token_is_reread_on_every_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let store = MemoryStore::new();
    let client = client_with(&mock_server, store.clone());

    let _: ApiResponse<Pong> = client.send(ApiRequest::get("/ping")).await.unwrap();
    store.set(keys::TOKEN, "late-token").await.unwrap();
    let _: ApiResponse<Pong> = client.send(ApiRequest::get("/ping")).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].headers.get("authorization").is_none());
    assert_eq!(
        requests[1].headers.get("authorization").unwrap().to_str().unwrap(),
        "Bearer late-token"
    );
}

#[tokio::test]
async fn test_store_read_failure_sends_unauthenticated_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut store = MockStore::new();
    store
        .expect_get()
        .returning(|_| Err(StorageError::Unavailable("keychain locked".to_string())));

    let client = ApiClient::new(ApiClientConfig::new(mock_server.uri()), Arc::new(store)).unwrap();

    let response: ApiResponse<Pong> = client.send(ApiRequest::get("/ping")).await.unwrap();
    assert!(response.is_success());

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}

// =============================================================================
// Session Expiry
// =============================================================================

#[tokio::test]
async fn test_unauthorized_clears_persisted_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/profile"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(serde_json::json!({"message": "Token expired"})),
        )
        .mount(&mock_server)
        .await;

    let store = MemoryStore::with_entries([
        (keys::TOKEN, "stale"),
        (keys::USER, r#"{"id":"u1"}"#),
        (keys::THEME, "light"),
    ]);
    let client = client_with(&mock_server, store.clone());

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    client.on_session_expired(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let result: Result<ApiResponse<serde_json::Value>, ApiError> =
        client.send(ApiRequest::get("/users/profile")).await;

    let error = result.unwrap_err();
    assert!(error.is_auth_expired());
    assert_eq!(error.server_message(), Some("Token expired"));
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    assert_eq!(store.get(keys::TOKEN).await.unwrap(), None);
    assert_eq!(store.get(keys::USER).await.unwrap(), None);
    assert_eq!(store.get(keys::THEME).await.unwrap(), Some("light".to_string()));
}

#[tokio::test]
async fn test_unauthorized_still_fires_callbacks_when_store_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/favorites"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let mut store = MockStore::new();
    store.expect_get().returning(|_| Ok(Some("stale".to_string())));
    store
        .expect_remove()
        .times(2)
        .returning(|_| Err(StorageError::Unavailable("disk full".to_string())));

    let client = ApiClient::new(ApiClientConfig::new(mock_server.uri()), Arc::new(store)).unwrap();

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    client.on_session_expired(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let result: Result<ApiResponse<serde_json::Value>, ApiError> =
        client.send(ApiRequest::get("/users/favorites")).await;

    assert!(matches!(result, Err(ApiError::AuthExpired { message: None })));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Error Handling
// =============================================================================

#[tokio::test]
async fn test_server_error_keeps_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/favorites/r1"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(serde_json::json!({"message": "Database down"})),
        )
        .expect(1) // no retry
        .mount(&mock_server)
        .await;

    let store = MemoryStore::with_entries([(keys::TOKEN, "t1")]);
    let api = RecipeApi::new(client_with(&mock_server, store.clone()));

    let error = api.add_favorite("r1").await.unwrap_err();
    assert_eq!(error.status(), Some(500));
    assert_eq!(error.server_message(), Some("Database down"));
    assert!(!error.is_network_error());

    assert_eq!(store.get(keys::TOKEN).await.unwrap(), Some("t1".to_string()));
}

#[tokio::test]
async fn test_server_error_without_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/recipes"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&mock_server)
        .await;

    let api = RecipeApi::new(client_with(&mock_server, MemoryStore::new()));

    let error = api.recipes().await.unwrap_err();
    assert!(matches!(error, ApiError::Server { status: 503, message: None }));
}

#[tokio::test]
async fn test_timeout_is_distinct() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/recipes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"data": {"recipes": []}}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let config = ApiClientConfig::new(mock_server.uri()).with_timeout(Duration::from_millis(100));
    let client = ApiClient::new(config, Arc::new(MemoryStore::new())).unwrap();
    let api = RecipeApi::new(client);

    let error = api.recipes().await.unwrap_err();
    assert!(error.is_timeout());
    assert!(error.status().is_none());
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let config = ApiClientConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2));
    let client = ApiClient::new(config, Arc::new(MemoryStore::new())).unwrap();

    let result: Result<ApiResponse<serde_json::Value>, ApiError> =
        client.send(ApiRequest::get("/recipes")).await;

    assert!(result.unwrap_err().is_network_error());
}

#[tokio::test]
async fn test_malformed_json_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not valid json"))
        .mount(&mock_server)
        .await;

    let client = client_with(&mock_server, MemoryStore::new());

    let result: Result<ApiResponse<Pong>, ApiError> = client.send(ApiRequest::get("/ping")).await;
    match result {
        Err(ApiError::Decode(message)) => assert!(message.contains("Failed to parse JSON")),
        other => panic!("expected decode error, got {:?}", other),
    }
}

// =============================================================================
// Endpoints
// =============================================================================

#[tokio::test]
async fn test_login_posts_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(serde_json::json!({"email": "a@b.com", "password": "secret1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token": "t1",
            "user": {"id": "u1", "name": "Ada"}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = RecipeApi::new(client_with(&mock_server, MemoryStore::new()));

    let response = api.login("a@b.com", "secret1").await.unwrap();
    assert_eq!(response.token, "t1");
    assert_eq!(response.user.unwrap().name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn test_register_accepts_empty_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&mock_server)
        .await;

    let api = RecipeApi::new(client_with(&mock_server, MemoryStore::new()));
    api.register("Ada", "a@b.com", "secret1").await.unwrap();
}

#[tokio::test]
async fn test_favorite_writes_accept_plain_text_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/favorites/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Added to favorites"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/users/favorites/r1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Removed"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/register"))
        .respond_with(ResponseTemplate::new(201).set_body_string("User created"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = RecipeApi::new(client_with(&mock_server, MemoryStore::new()));

    api.add_favorite("r1").await.unwrap();
    api.remove_favorite("r1").await.unwrap();
    api.register("Ada", "a@b.com", "secret1").await.unwrap();
}

#[tokio::test]
async fn test_send_unit_still_expires_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/users/favorites/r1"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&mock_server)
        .await;

    let store = MemoryStore::with_entries([(keys::TOKEN, "t1"), (keys::USER, "{}")]);
    let client = client_with(&mock_server, store.clone());

    let error = client.send_unit(ApiRequest::post("/users/favorites/r1")).await.unwrap_err();
    assert!(matches!(error, ApiError::AuthExpired { message: None }));
    assert!(store.get(keys::TOKEN).await.unwrap().is_none());
    assert!(store.get(keys::USER).await.unwrap().is_none());
}

#[tokio::test]
async fn test_favorites_unwraps_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/favorites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"recipes": [
                {"_id": "r1", "name": "Butter Chicken"},
                {"_id": "r2", "name": "Margherita Pizza"}
            ]}
        })))
        .mount(&mock_server)
        .await;

    let api = RecipeApi::new(client_with(&mock_server, MemoryStore::new()));

    let favorites = api.favorites().await.unwrap();
    let ids: Vec<&str> = favorites.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "r2"]);
}

#[tokio::test]
async fn test_missing_payload_yields_empty_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/recipes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": {}})))
        .mount(&mock_server)
        .await;

    let api = RecipeApi::new(client_with(&mock_server, MemoryStore::new()));
    assert!(api.recipes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_profile_unwraps_envelope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {"_id": "u1", "email": "a@b.com", "followersCount": 3}
        })))
        .mount(&mock_server)
        .await;

    let api = RecipeApi::new(client_with(&mock_server, MemoryStore::new()));

    let profile = api.profile().await.unwrap().unwrap();
    assert_eq!(profile.id, "u1");
    assert_eq!(profile.stats().unwrap().followers, 3);
}

#[tokio::test]
async fn test_remove_favorite_uses_delete() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/users/favorites/r9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = RecipeApi::new(client_with(&mock_server, MemoryStore::new()));
    api.remove_favorite("r9").await.unwrap();
}
