//! Error types for cluster orchestration

use crate::model::Operation;
use std::time::Duration;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error("Operation {operation} is not supported by provider {provider}")]
    UnsupportedOperation {
        provider: String,
        operation: Operation,
    },

    #[error("Credential decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Credential for {provider} is missing field: {key}")]
    MissingCredentialField { provider: String, key: String },

    #[error("Authentication with {provider} failed: {reason}")]
    AuthenticationFailed { provider: String, reason: String },

    #[error("Network configuration is required for {provider} cluster {cluster}")]
    MissingNetworkConfig { provider: String, cluster: String },

    #[error("Node pool configuration is required for {provider} cluster {cluster}")]
    MissingNodePoolConfig { provider: String, cluster: String },

    #[error(
        "Invalid scaling for node group {node_group}: min={min} desired={desired} max={max} \
         (expected min <= desired <= max)"
    )]
    InvalidScalingConfig {
        node_group: String,
        min: i32,
        desired: i32,
        max: i32,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(
        "{resource} not found in any location (tried: {}){}",
        .candidates.join(", "),
        .last_error.as_ref().map(|e| format!("; last error: {}", e)).unwrap_or_default()
    )]
    NotFoundAnyLocation {
        provider: String,
        resource: String,
        candidates: Vec<String>,
        /// Most recent candidate failure that was not a plain miss
        last_error: Option<String>,
    },

    #[error("Cluster {cluster} is not ready: {reason}")]
    ClusterNotReady { cluster: String, reason: String },

    #[error("{provider} API error during {operation} on {resource} at {location}: {source}")]
    ProviderApi {
        provider: String,
        operation: Operation,
        resource: String,
        location: String,
        #[source]
        source: BoxError,
    },

    #[error("{operation} timed out after {}s", .elapsed.as_secs())]
    Timeout {
        operation: Operation,
        elapsed: Duration,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl ClusterError {
    /// Wraps a backend failure with the context needed to trace it back
    pub fn provider_api(
        provider: impl Into<String>,
        operation: Operation,
        resource: impl Into<String>,
        location: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::ProviderApi {
            provider: provider.into(),
            operation,
            resource: resource.into(),
            location: location.into(),
            source: source.into(),
        }
    }

    pub fn unsupported(provider: impl Into<String>, operation: Operation) -> Self {
        Self::UnsupportedOperation {
            provider: provider.into(),
            operation,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFoundAnyLocation { .. })
    }
}

impl From<serde_json::Error> for ClusterError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for ClusterError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ClusterError>;
