//! Error types surfaced to screens
//!
//! Validation failures never reach the network. Remote failures carry enough
//! detail for [`AppError::user_message`] to pick the most specific text: the
//! server's own message, then the transport message, then a generic
//! "server not reachable".

use recipe_client::ApiError;
use std::time::Duration;
use storage::StorageError;
use thiserror::Error;

/// Message shown when nothing more specific is known
pub const SERVER_NOT_REACHABLE: &str = "Server not reachable";

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// Local input validation failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Login form incomplete
    #[error("Please enter email and password")]
    MissingCredentials,

    /// Registration form incomplete
    #[error("Please fill all fields")]
    MissingFields,

    /// Password below the minimum length
    #[error("Password must be at least {min} characters")]
    PasswordTooShort {
        /// Required minimum
        min: usize,
    },

    /// Email lacks an `@`
    #[error("Please enter a valid email")]
    InvalidEmail,
}

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    /// Input rejected before any request was sent
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No response received
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded the client timeout
    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Server answered with an error status
    #[error("Server error ({status}): {}", .message.as_deref().unwrap_or("no message"))]
    Server {
        /// HTTP status code
        status: u16,
        /// Message from the error payload, if any
        message: Option<String>,
    },

    /// Session rejected by the server; local session already torn down
    #[error("Session expired")]
    AuthExpired {
        /// Message from the error payload, if any
        message: Option<String>,
    },

    /// Local persistence failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Response or stored value could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Result type for application state operations
pub type Result<T> = std::result::Result<T, AppError>;

impl From<ApiError> for AppError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Network(message) => AppError::Network(message),
            ApiError::Timeout(after) => AppError::Timeout(after),
            ApiError::Server { status, message } => AppError::Server { status, message },
            ApiError::AuthExpired { message } => AppError::AuthExpired { message },
            ApiError::Decode(message) => AppError::Decode(message),
            ApiError::Serialization(e) => AppError::Decode(e.to_string()),
            ApiError::Client(message) => AppError::Network(message),
        }
    }
}

impl AppError {
    /// Text to show the user
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::Server { message: Some(m), .. }
            | AppError::AuthExpired { message: Some(m) } => m.clone(),
            AppError::Server { status, message: None } => {
                format!("Request failed with status code {}", status)
            }
            AppError::AuthExpired { message: None } => {
                "Your session has expired. Please log in again.".to_string()
            }
            AppError::Network(m) if !m.trim().is_empty() => m.clone(),
            AppError::Network(_) => SERVER_NOT_REACHABLE.to_string(),
            AppError::Timeout(after) => format!("timeout of {}ms exceeded", after.as_millis()),
            AppError::Storage(_) => "Could not save data on this device".to_string(),
            AppError::Decode(_) => SERVER_NOT_REACHABLE.to_string(),
        }
    }

    /// Check if the input was rejected locally
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }

    /// Check if no response was received
    pub fn is_network(&self) -> bool {
        matches!(self, AppError::Network(_) | AppError::Timeout(_))
    }

    /// Check if the caller should route to the login flow
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, AppError::AuthExpired { .. })
    }
}
