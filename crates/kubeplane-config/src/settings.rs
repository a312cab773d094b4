//! Settings file schema
//!
//! Every section is optional; missing keys fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_GKE_API_BASE: &str = "https://container.googleapis.com/v1";
pub const DEFAULT_AWS_REGION: &str = "us-east-1";
pub const DEFAULT_KEY_ENV: &str = "KUBEPLANE_CREDENTIAL_KEY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub probe: ProbeSettings,
    pub timeouts: TimeoutSettings,
    pub gcp: GcpSettings,
    pub aws: AwsSettings,
    pub credentials: CredentialSettings,
}

/// Location probing for providers with zonal resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub zone_suffixes: Vec<String>,
    pub parallel_enumeration: bool,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            zone_suffixes: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            parallel_enumeration: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub operation_secs: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self { operation_secs: 300 }
    }
}

impl TimeoutSettings {
    pub fn operation(&self) -> Duration {
        Duration::from_secs(self.operation_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcpSettings {
    pub api_base: String,
    /// OAuth2 token endpoint; the service-account key's `token_uri` is used when unset
    pub token_uri: Option<String>,
}

impl Default for GcpSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GKE_API_BASE.to_string(),
            token_uri: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsSettings {
    pub default_region: String,
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            default_region: DEFAULT_AWS_REGION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    /// Environment variable holding the base64 AES-256 key
    pub key_env: String,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            key_env: DEFAULT_KEY_ENV.to_string(),
        }
    }
}
