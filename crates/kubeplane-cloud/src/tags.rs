//! Tag key normalization
//!
//! Each provider has its own rules for what a legal tag (or label) key looks
//! like. Values always pass through unchanged.

use crate::model::Tags;
use serde::{Deserialize, Serialize};

/// Key rules applied when tags are sent to a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagPolicy {
    /// GCP resource labels: `[a-z0-9_-]`, starting with a letter
    GcpLabels,
    /// No restrictions; keys are kept as given
    Passthrough,
}

impl TagPolicy {
    pub fn normalize(&self, tags: &Tags) -> Tags {
        match self {
            TagPolicy::Passthrough => tags.clone(),
            TagPolicy::GcpLabels => normalize_keys(tags, gcp_label_key),
        }
    }

    pub fn normalize_key(&self, key: &str) -> String {
        match self {
            TagPolicy::Passthrough => key.to_string(),
            TagPolicy::GcpLabels => gcp_label_key(key),
        }
    }
}

fn normalize_keys(tags: &Tags, rule: fn(&str) -> String) -> Tags {
    let mut out = Tags::new();
    for (key, value) in tags {
        let normalized = rule(key);
        if let Some(existing) = out.get(&normalized) {
            // BTreeMap iteration is sorted, so the lexically first key wins
            if existing != value {
                tracing::warn!(
                    "Tag key {} normalizes to {} which is already taken; dropping it",
                    key,
                    normalized
                );
            }
            continue;
        }
        out.insert(normalized, value.clone());
    }
    out
}

/// Converts a free-form key into a legal GCP label key
pub fn gcp_label_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.to_lowercase().chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' {
            c
        } else {
            '_'
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        return "tag".to_string();
    }
    if trimmed.starts_with(|c: char| c.is_ascii_lowercase()) {
        trimmed.to_string()
    } else {
        format!("tag_{}", trimmed)
    }
}
