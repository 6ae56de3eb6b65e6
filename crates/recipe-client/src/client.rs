//! Authenticated HTTP client
//!
//! Every remote call goes through [`ApiClient`]. Before dispatch the client
//! re-reads the session token from the key-value store and attaches it as a
//! bearer credential. A 401 response clears the persisted session and
//! notifies the registered expiry callbacks before the error reaches the
//! caller. There is no retry or backoff; callers decide what to do with a
//! failure.

use parking_lot::RwLock;
use reqwest::{header, Client as ReqwestClient, Method, Response as ReqwestResponse, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use storage::{keys, KeyValueStore};

use crate::{ApiError, Result};

/// Default base URL of the recipe service
pub const DEFAULT_BASE_URL: &str = "http://localhost:5001/api";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Request Types
// =============================================================================

/// HTTP method for API requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET request
    Get,
    /// POST request
    Post,
    /// DELETE request
    Delete,
}

impl HttpMethod {
    /// Method name as sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Delete => Method::DELETE,
        }
    }
}

/// API request: method, path relative to the base URL, and optional JSON body
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Path relative to the base URL (e.g., "/users/favorites")
    pub path: String,
    /// JSON request body
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Create a request with the given method and path
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), body: None }
    }

    /// Create a GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    /// Create a POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    /// Create a DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    /// Set the request body from JSON
    pub fn json_body<T: Serialize>(mut self, value: &T) -> std::result::Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_vec(value)?);
        Ok(self)
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Decoded API response
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// HTTP status code
    pub status: u16,
    /// Response data
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Create a new response
    pub fn new(status: u16, data: T) -> Self {
        Self { status, data }
    }

    /// Check if the response is successful (2xx status)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Error payload returned by the recipe service
#[derive(Debug, Clone, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed.message.or(parsed.error).filter(|m| !m.trim().is_empty())
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL every path is joined onto
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Custom headers to include in all requests
    pub default_headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: format!("Recipe-Box/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
        }
    }
}

impl ApiClientConfig {
    /// Create a new config with a base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), ..Default::default() }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Client Implementation
// =============================================================================

/// Callback invoked after a 401 has cleared the persisted session
pub type SessionExpiredCallback = Arc<dyn Fn() + Send + Sync>;

/// HTTP client that authenticates every request from the key-value store
///
/// # Examples
/// ```
/// use recipe_client::{ApiClient, ApiClientConfig};
/// use std::sync::Arc;
/// use storage::MemoryStore;
///
/// let client = ApiClient::new(
///     ApiClientConfig::new("http://localhost:5001/api"),
///     Arc::new(MemoryStore::new()),
/// ).unwrap();
/// assert_eq!(client.base_url(), "http://localhost:5001/api");
/// ```
#[derive(Clone)]
pub struct ApiClient {
    client: ReqwestClient,
    config: ApiClientConfig,
    store: Arc<dyn KeyValueStore>,
    expiry_callbacks: Arc<RwLock<Vec<SessionExpiredCallback>>>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient").field("config", &self.config).finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new client reading credentials from `store`
    pub fn new(config: ApiClientConfig, store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ApiError::Client(e.to_string()))?;

        Ok(Self {
            client,
            config,
            store,
            expiry_callbacks: Arc::new(RwLock::new(Vec::new())),
        })
    }

    /// Register a callback fired whenever the server rejects the session
    ///
    /// Callbacks run after the persisted token and profile are removed and
    /// before the failing request returns.
    pub fn on_session_expired<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.expiry_callbacks.write().push(Arc::new(callback));
    }

    /// Send a request and decode the JSON response into `T`
    ///
    /// An empty success body decodes as JSON `null`, so `Option<_>` and
    /// `serde_json::Value` both accept it.
    pub async fn send<T>(&self, request: ApiRequest) -> Result<ApiResponse<T>>
    where
        T: DeserializeOwned,
    {
        let (status, body) = self.execute(request).await?;

        let text = if body.trim().is_empty() { "null" } else { body.as_str() };
        let data: T = serde_json::from_str(text)
            .map_err(|e| ApiError::Decode(format!("Failed to parse JSON: {}", e)))?;

        Ok(ApiResponse::new(status, data))
    }

    /// Send a request whose success body carries nothing the caller needs
    ///
    /// Only the status is checked; a 2xx with plain text or any other payload
    /// is success. A 401 still tears down the session.
    pub async fn send_unit(&self, request: ApiRequest) -> Result<u16> {
        let (status, _) = self.execute(request).await?;
        Ok(status)
    }

    /// Dispatch a request and return the status and raw body of a 2xx reply
    async fn execute(&self, request: ApiRequest) -> Result<(u16, String)> {
        let ApiRequest { method, path, body } = request;
        let url = self.url_for(&path);

        let mut req = self.client.request(method.into(), &url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }

        if let Some(token) = self.stored_token().await {
            req = req.bearer_auth(token);
        }

        if let Some(body) = body {
            req = req.header(header::CONTENT_TYPE, "application/json").body(body);
        }

        tracing::debug!(method = method.as_str(), %path, "dispatching request");

        let response = req.send().await.map_err(|e| self.transport_error(e))?;

        self.read_response(response).await
    }

    /// Token currently persisted, read fresh on every call
    ///
    /// A failed read is logged and treated as "no token" so the request still
    /// reaches the server, which decides whether to reject it.
    async fn stored_token(&self) -> Option<String> {
        match self.store.get(keys::TOKEN).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::error!("Failed to read stored token: {}", e);
                None
            }
        }
    }

    /// Map the status onto the error taxonomy and read the body of a success
    async fn read_response(&self, response: ReqwestResponse) -> Result<(u16, String)> {
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            self.expire_session().await;
            return Err(ApiError::AuthExpired { message: error_message(&body) });
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "request failed");
            return Err(ApiError::Server { status: status.as_u16(), message: error_message(&body) });
        }

        Ok((status.as_u16(), body))
    }

    /// Clear the persisted session and notify listeners
    async fn expire_session(&self) {
        tracing::warn!("server rejected the session, clearing stored credentials");

        for key in [keys::TOKEN, keys::USER] {
            if let Err(e) = self.store.remove(key).await {
                tracing::error!(key, "Failed to clear stored credential: {}", e);
            }
        }

        let callbacks = self.expiry_callbacks.read().clone();
        for callback in &callbacks {
            callback();
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout(self.config.timeout)
        } else {
            ApiError::Network(error.to_string())
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Get the client configuration
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

// =============================================================================
// Tests
// =============================================================================
