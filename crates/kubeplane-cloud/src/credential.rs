//! Credential resolution
//!
//! Stored credentials are opaque encrypted blobs. A [`CredentialResolver`]
//! turns a blob into [`Secrets`], a flat key/value map whose keys depend on
//! the provider (`access_key`, `secret_key`, `project_id`, ...).

use crate::error::{ClusterError, Result};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde_json::{Map, Value};
use std::fmt;

const NONCE_LEN: usize = 12;

/// Encrypted credential bound to a provider id
#[derive(Clone)]
pub struct Credential {
    pub provider: String,
    pub encrypted: Vec<u8>,
}

impl Credential {
    pub fn new(provider: impl Into<String>, encrypted: impl Into<Vec<u8>>) -> Self {
        Self {
            provider: provider.into(),
            encrypted: encrypted.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("provider", &self.provider)
            .field("encrypted", &format_args!("<{} bytes>", self.encrypted.len()))
            .finish()
    }
}

/// Decrypted provider secrets. `Debug` prints key names only.
#[derive(Clone, Default, PartialEq)]
pub struct Secrets(Map<String, Value>);

impl Secrets {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Builder-style insert for string fields
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), Value::String(value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value of `key`, treating empty strings as absent
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn require(&self, provider: &str, key: &str) -> Result<&str> {
        self.get_str(key)
            .ok_or_else(|| ClusterError::MissingCredentialField {
                provider: provider.to_string(),
                key: key.to_string(),
            })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.0)?)
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("keys", &self.0.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Decrypts stored credential blobs into provider secrets
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn decrypt(&self, blob: &[u8]) -> Result<Secrets>;
}

/// AES-256-GCM resolver. Blob layout is `nonce (12 bytes) || ciphertext`,
/// plaintext is a JSON object.
pub struct AesGcmResolver {
    cipher: Aes256Gcm,
}

impl AesGcmResolver {
    pub fn new(key: &[u8; 32]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(key);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Builds a resolver from a base64-encoded 32-byte key
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| ClusterError::DecryptionFailed(format!("invalid key encoding: {}", e)))?;
        let key: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            ClusterError::DecryptionFailed(format!("key must be 32 bytes, got {}", b.len()))
        })?;
        Ok(Self::new(&key))
    }

    /// Encrypts secrets into a blob that [`CredentialResolver::decrypt`] accepts
    pub fn seal(&self, secrets: &Secrets) -> Result<Vec<u8>> {
        let plaintext = secrets.to_json()?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_ref())
            .map_err(|e| ClusterError::DecryptionFailed(format!("encryption failed: {}", e)))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    fn open(&self, blob: &[u8]) -> Result<Secrets> {
        if blob.is_empty() {
            return Err(ClusterError::DecryptionFailed(
                "credential blob is empty".to_string(),
            ));
        }
        if blob.len() <= NONCE_LEN {
            return Err(ClusterError::DecryptionFailed(format!(
                "credential blob too short: {} bytes",
                blob.len()
            )));
        }

        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| ClusterError::DecryptionFailed("authentication failed".to_string()))?;

        match serde_json::from_slice::<Value>(&plaintext) {
            Ok(Value::Object(map)) => Ok(Secrets(map)),
            Ok(_) => Err(ClusterError::DecryptionFailed(
                "credential payload is not a JSON object".to_string(),
            )),
            Err(e) => Err(ClusterError::DecryptionFailed(format!(
                "credential payload is not valid JSON: {}",
                e
            ))),
        }
    }
}

impl fmt::Debug for AesGcmResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesGcmResolver")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl CredentialResolver for AesGcmResolver {
    async fn decrypt(&self, blob: &[u8]) -> Result<Secrets> {
        self.open(blob)
    }
}
