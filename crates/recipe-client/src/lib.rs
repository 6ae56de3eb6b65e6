//! Recipe API client library
//!
//! This crate provides the authenticated HTTP client used by every remote
//! call, the wire types of the recipe service, and typed endpoint wrappers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod client;
pub mod types;

pub use api::RecipeApi;
pub use client::{ApiClient, ApiClientConfig, ApiRequest, ApiResponse, HttpMethod};
pub use types::{LoginResponse, ProfileStats, Recipe, UserProfile};

use std::time::Duration;

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

/// Error types for API operations
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response was received
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the configured bound
    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Non-2xx response other than 401
    #[error("Server error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Server {
        /// HTTP status code
        status: u16,
        /// Message from the error payload, if any
        message: Option<String>,
    },

    /// 401 response; the persisted session has already been cleared
    #[error("Session expired: {}", .message.as_deref().unwrap_or("unauthorized"))]
    AuthExpired {
        /// Message from the error payload, if any
        message: Option<String>,
    },

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Request body could not be encoded
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client could not be constructed
    #[error("Client error: {0}")]
    Client(String),
}

impl ApiError {
    /// HTTP status carried by the error, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::AuthExpired { .. } => Some(401),
            _ => None,
        }
    }

    /// Message supplied by the server in the error payload
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Server { message, .. } | ApiError::AuthExpired { message } => {
                message.as_deref()
            }
            _ => None,
        }
    }

    /// Check if no response was received (transport failure or timeout)
    pub fn is_network_error(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Timeout(_))
    }

    /// Check if the request timed out
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout(_))
    }

    /// Check if the server rejected the session
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types() {
        let err = ApiError::Network("connection refused".to_string());
        assert!(err.to_string().contains("Network error"));
        assert!(err.is_network_error());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_server_error_message() {
        let err = ApiError::Server { status: 409, message: Some("Already saved".to_string()) };
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.server_message(), Some("Already saved"));
        assert!(!err.is_network_error());
        assert_eq!(err.to_string(), "Server error (409): Already saved");
    }

    #[test]
    fn test_timeout_is_distinct_from_server_error() {
        let err = ApiError::Timeout(Duration::from_secs(10));
        assert!(err.is_timeout());
        assert!(err.is_network_error());
        assert_eq!(err.status(), None);
        assert_eq!(err.to_string(), "Request timed out after 10s");
    }

    #[test]
    fn test_auth_expired() {
        let err = ApiError::AuthExpired { message: None };
        assert!(err.is_auth_expired());
        assert_eq!(err.status(), Some(401));
        assert_eq!(err.server_message(), None);
    }
}
