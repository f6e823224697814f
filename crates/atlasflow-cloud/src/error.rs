//! Cloud provider error types

use thiserror::Error;

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Failed to decode {resource_type} record: {source}")]
    Decode {
        resource_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("error {operation} ({id}): {message}")]
    Api {
        operation: String,
        id: String,
        message: String,
    },

    #[error("import format error: '{id}' is not valid, use the format {expected}")]
    IdentifierFormat { id: String, expected: String },

    #[error("Invalid attribute value: {0}")]
    Validation(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("State file error: {0}")]
    StateError(String),

    #[error("Lock acquisition failed: {0}")]
    LockError(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("unexpected state '{state}', wanted target '{target}'")]
    UnexpectedState { state: String, target: String },

    #[error("{resource} reached failure status '{status}'")]
    ResourceFailed { resource: String, status: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    /// Wrap a remote failure with the operation and entity it concerned
    pub fn api(
        operation: impl Into<String>,
        id: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        CloudError::Api {
            operation: operation.into(),
            id: id.into(),
            message: message.to_string(),
        }
    }

    pub fn identifier_format(id: impl Into<String>, expected: impl Into<String>) -> Self {
        CloudError::IdentifierFormat {
            id: id.into(),
            expected: expected.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
