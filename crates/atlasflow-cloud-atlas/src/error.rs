//! Atlas provider error types

use atlasflow_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Atlas API returned {status} ({error_code}): {detail}")]
    Api {
        status: u16,
        error_code: String,
        detail: String,
    },

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl AtlasError {
    /// Whether the API answered 404
    pub fn is_not_found(&self) -> bool {
        matches!(self, AtlasError::Api { status: 404, .. })
    }

    /// Attach the operation and entity identifier for reporting
    pub fn during(self, operation: &str, id: &str) -> CloudError {
        match self {
            AtlasError::Api { status: 401, detail, .. }
            | AtlasError::Api { status: 403, detail, .. } => {
                CloudError::AuthenticationFailed(format!("{} ({}): {}", operation, id, detail))
            }
            other => CloudError::api(operation, id, other),
        }
    }
}

pub type Result<T> = std::result::Result<T, AtlasError>;
