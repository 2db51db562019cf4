//! Error types for Quill

use thiserror::Error;

/// The main error type for Quill operations
#[derive(Error, Debug)]
pub enum Error {
    /// Safe mode refused a destructive statement
    #[error("Blocked operation: {message}")]
    BlockedOperation { message: String },

    /// The active role lacks the action a raw statement needs
    #[error("Permission denied for {action} (role '{role}')")]
    PermissionDenied { role: String, action: String },

    /// Any failure surfaced by the underlying connection
    #[error("Database error: {0}")]
    Driver(#[from] sqlx::Error),

    /// Invalid query configuration
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be loaded or validated
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Convenience Result type for Quill operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a new blocked operation error
    pub fn blocked(message: impl Into<String>) -> Self {
        Self::BlockedOperation {
            message: message.into(),
        }
    }

    /// Create a new permission denied error
    pub fn permission_denied(role: impl Into<String>, action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            role: role.into(),
            action: action.into(),
        }
    }

    /// Create a new invalid query error
    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::InvalidQuery {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True for safety and permission refusals, false for infrastructure
    /// and usage failures.
    pub fn is_guard(&self) -> bool {
        matches!(
            self,
            Self::BlockedOperation { .. } | Self::PermissionDenied { .. }
        )
    }
}
