//! Location probing
//!
//! Some providers register a cluster either at region scope or under one of
//! the region's zones, with no reverse index. The prober walks the candidate
//! locations in a fixed order:
//!
//! ```text
//!   region ─▶ region-a ─▶ region-b ─▶ region-c
//!
//!   locate()     stop at the first hit
//!   enumerate()  query every candidate, union the results
//! ```

use crate::error::{ClusterError, Result};
use crate::model::Operation;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Candidate generation and enumeration behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Zone letters appended to the region, in probe order
    pub zone_suffixes: Vec<String>,

    /// Query enumeration candidates concurrently
    pub parallel_enumeration: bool,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            zone_suffixes: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            parallel_enumeration: true,
        }
    }
}

/// A probe hit together with the candidate that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub location: String,
    pub value: T,
}

#[derive(Debug, Clone)]
pub struct LocationProber {
    provider: String,
    config: ProbeConfig,
}

impl LocationProber {
    pub fn new(provider: impl Into<String>, config: ProbeConfig) -> Self {
        Self {
            provider: provider.into(),
            config,
        }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Region first, then each configured zone under it
    pub fn candidates(&self, region: &str) -> Vec<String> {
        std::iter::once(region.to_string())
            .chain(
                self.config
                    .zone_suffixes
                    .iter()
                    .map(|suffix| format!("{}-{}", region, suffix)),
            )
            .collect()
    }

    /// Point lookup. Tries candidates in order and returns the first success.
    ///
    /// Any failure at a candidate counts as a miss; the lookup cannot tell
    /// "absent here" apart from "wrong scope" on every provider. Failures
    /// other than [`ClusterError::NotFoundAnyLocation`] are kept, and the most
    /// recent one is reported as `last_error` when every candidate misses.
    pub async fn locate<T, F, Fut>(
        &self,
        operation: Operation,
        region: &str,
        resource: &str,
        mut lookup: F,
    ) -> Result<Resolved<T>>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let candidates = self.candidates(region);
        let mut last_error = None;
        for location in &candidates {
            match lookup(location.clone()).await {
                Ok(value) => {
                    tracing::debug!(
                        "{} {}: found {} at {}",
                        self.provider,
                        operation,
                        resource,
                        location
                    );
                    return Ok(Resolved {
                        location: location.clone(),
                        value,
                    });
                }
                Err(e) => {
                    tracing::debug!(
                        "{} {}: {} not at {}: {}",
                        self.provider,
                        operation,
                        resource,
                        location,
                        e
                    );
                    if !e.is_not_found() {
                        last_error = Some(format!("{}: {}", location, e));
                    }
                }
            }
        }

        Err(ClusterError::NotFoundAnyLocation {
            provider: self.provider.clone(),
            resource: resource.to_string(),
            candidates,
            last_error,
        })
    }

    /// Enumeration. Queries every candidate and concatenates results in
    /// candidate order. Failing candidates are logged and dropped; only when
    /// every candidate fails is the first error returned.
    pub async fn enumerate<T, F, Fut>(
        &self,
        operation: Operation,
        region: &str,
        mut list: F,
    ) -> Result<Vec<Resolved<Vec<T>>>>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let candidates = self.candidates(region);

        let outcomes: Vec<Result<Vec<T>>> = if self.config.parallel_enumeration {
            join_all(candidates.iter().map(|location| list(location.clone()))).await
        } else {
            let mut outcomes = Vec::with_capacity(candidates.len());
            for location in &candidates {
                outcomes.push(list(location.clone()).await);
            }
            outcomes
        };

        let mut hits = Vec::new();
        let mut first_error = None;
        for (location, outcome) in candidates.into_iter().zip(outcomes) {
            match outcome {
                Ok(value) => hits.push(Resolved { location, value }),
                Err(e) => {
                    tracing::warn!(
                        "{} {}: skipping {} after error: {}",
                        self.provider,
                        operation,
                        location,
                        e
                    );
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) if hits.is_empty() => Err(e),
            _ => Ok(hits),
        }
    }
}
