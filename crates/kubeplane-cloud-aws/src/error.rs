//! EKS provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EksError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("EKS service error {code}: {message}")]
    Service { code: String, message: String },

    #[error("AWS SDK error: {0}")]
    Sdk(String),

    #[error("Unexpected EKS response: {0}")]
    InvalidResponse(String),
}

impl EksError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EksError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, EksError>;
