//! GKE provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GkeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GKE API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Service account authentication failed: {0}")]
    Auth(String),

    #[error("Invalid service account key: {0}")]
    InvalidKey(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GkeError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GkeError::Api { status: 404, .. })
    }
}

pub type Result<T> = std::result::Result<T, GkeError>;
