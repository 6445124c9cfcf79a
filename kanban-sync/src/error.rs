//! Error types for the sync engine

use crate::types::{EntityId, ScopeKey};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors from the remote API collaborator
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body was not the JSON we asked for
    #[error("undecodable response from {url}: {message}")]
    Decode { url: String, message: String },

    /// The remote is reachable in principle but refused service
    #[error("remote unavailable: {message}")]
    Unavailable { message: String },

    /// The base URL or an endpoint could not be built
    #[error("invalid remote URL: {message}")]
    InvalidUrl { message: String },
}

impl RemoteError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Worth trying again: transport failures, 5xx and 429
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Transport(_) | Self::Unavailable { .. } => true,
            Self::Decode { .. } | Self::InvalidUrl { .. } => false,
        }
    }
}

/// Errors from a key-value store backing the durable mirror
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Stored bytes are not valid JSON
    #[error("corrupt entry '{key}': {message}")]
    Corrupt { key: String, message: String },

    #[error("store rejected write for '{key}': {message}")]
    Rejected { key: String, message: String },
}

/// Errors that can occur in sync operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// Input rejected before any side effect
    #[error("invalid value for {field}: {message}")]
    Validation { field: String, message: String },

    /// Id absent from the scope it was expected in
    #[error("{id} not found in {scope}")]
    NotFoundLocal { scope: ScopeKey, id: EntityId },

    /// A remote write failed; local state has been rolled back
    #[error("{operation} failed: {source}")]
    RemoteWrite {
        operation: String,
        #[source]
        source: RemoteError,
    },

    /// A remote read failed
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Remote or mirrored data did not pass validation
    #[error("decode error: {message}")]
    Decode { message: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SyncError {
    /// Create a validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Wrap a remote failure from a write
    pub fn remote_write(operation: impl Into<String>, source: RemoteError) -> Self {
        Self::RemoteWrite {
            operation: operation.into(),
            source,
        }
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RemoteWrite { source, .. } | Self::Remote(source) => source.is_transient(),
            _ => false,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<figment::Error> for SyncError {
    fn from(error: figment::Error) -> Self {
        Self::Config(Box::new(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::NotFoundLocal {
            scope: ScopeKey::tasks("3"),
            id: EntityId::from("9"),
        };
        assert_eq!(err.to_string(), "9 not found in tasks:3");
    }

    #[test]
    fn test_validation_error() {
        let err = SyncError::validation("title", "title is required");
        assert!(err.is_validation());
        assert!(err.to_string().contains("title is required"));
    }

    #[test]
    fn test_retryable() {
        let transient = SyncError::remote_write(
            "move task",
            RemoteError::Status {
                status: 503,
                url: "http://x/tasks/1".into(),
            },
        );
        assert!(transient.is_retryable());
        assert!(transient.to_string().starts_with("move task failed"));

        let client_error = SyncError::Remote(RemoteError::Status {
            status: 404,
            url: "http://x/tasks/1".into(),
        });
        assert!(!client_error.is_retryable());
        assert!(!SyncError::decode("bad").is_retryable());
    }
}
