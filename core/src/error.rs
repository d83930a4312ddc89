//! Error types for the storefront client.
//!
//! # Design
//! Every failure the core can produce is one `ApiError` variant. The
//! gateway produces `Transport`, `HttpStatus`, `Serialization` and
//! `Deserialization`; the action layers fold any of those into `Domain`
//! with `into_domain`; the catalog store adds `Storage` when a snapshot
//! write fails. Callers that only need the user-facing shape use
//! `message()` and `status()`.

use thiserror::Error;

use crate::storage::StorageError;

/// Result alias used throughout the core.
pub type ApiResult<T> = Result<T, ApiError>;

/// Message used when a transport fails without describing why.
pub const NETWORK_FAILURE_MESSAGE: &str = "Network request failed";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response.
    #[error("{message}")]
    Transport { message: String },

    /// The server answered with a non-2xx status.
    #[error("{message}")]
    HttpStatus {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// Normalized error produced by the action layers.
    #[error("{message}")]
    Domain { message: String, status: Option<u16> },

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// A 2xx body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// A persisted snapshot could not be written.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn domain(message: impl Into<String>) -> Self {
        ApiError::Domain {
            message: message.into(),
            status: None,
        }
    }

    /// The user-facing message of this error.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            ApiError::Domain { status, .. } => *status,
            _ => None,
        }
    }

    /// Normalize into the `{message, status}` shape the stores record.
    ///
    /// The underlying message wins; `fallback` is used only when it is empty.
    pub fn into_domain(self, fallback: &str) -> ApiError {
        let status = self.status();
        let message = self.message();
        ApiError::Domain {
            message: if message.trim().is_empty() {
                fallback.to_string()
            } else {
                message
            },
            status,
        }
    }
}
