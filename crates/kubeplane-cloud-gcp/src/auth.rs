//! Service account authentication
//!
//! A GCP credential is the service account key JSON. The client signs an
//! RS256 assertion with the key and trades it for a short-lived OAuth2
//! access token (RFC 7523 JWT bearer grant).

use crate::error::{GkeError, Result};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use kubeplane_cloud::Secrets;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const ASSERTION_LIFETIME_SECS: i64 = 3600;
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Fields of a service account key file that token exchange needs
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl ServiceAccountKey {
    /// Reads key fields out of decrypted secrets, if present
    pub fn from_secrets(secrets: &Secrets) -> Option<Self> {
        Some(Self {
            client_email: secrets.get_str("client_email")?.to_string(),
            private_key: secrets.get_str("private_key")?.to_string(),
            token_uri: secrets.get_str("token_uri").map(str::to_string),
        })
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Signs the assertion sent to the token endpoint
pub fn sign_assertion(key: &ServiceAccountKey, token_uri: &str, now: i64) -> Result<String> {
    let claims = Claims {
        iss: &key.client_email,
        scope: CLOUD_PLATFORM_SCOPE,
        aud: token_uri,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };
    let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| GkeError::InvalidKey(e.to_string()))?;

    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
        .map_err(|e| GkeError::InvalidKey(e.to_string()))
}

/// Form-encoded token exchange request
fn token_request(
    client: &reqwest::Client,
    token_uri: &str,
    assertion: &str,
) -> reqwest::RequestBuilder {
    client
        .post(token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion)])
}

/// Exchanges a signed assertion for an access token
pub async fn fetch_access_token(
    client: &reqwest::Client,
    key: &ServiceAccountKey,
    token_uri_override: Option<&str>,
) -> Result<String> {
    let token_uri = token_uri_override
        .or(key.token_uri.as_deref())
        .unwrap_or(DEFAULT_TOKEN_URI);
    let assertion = sign_assertion(key, token_uri, chrono::Utc::now().timestamp())?;

    tracing::debug!("Requesting access token for {}", key.client_email);

    let response = token_request(client, token_uri, &assertion).send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await?;
        return Err(GkeError::Auth(format!(
            "token endpoint returned {}: {}",
            status, body
        )));
    }

    let token: TokenResponse = response.json().await?;
    Ok(token.access_token)
}
