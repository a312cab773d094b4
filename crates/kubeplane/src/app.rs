//! Orchestrator wiring and file helpers

use anyhow::Context;
use kubeplane_cloud::{AesGcmResolver, Credential, Orchestrator, ProbeConfig, UnimplementedDriver};
use kubeplane_cloud_aws::EksDriver;
use kubeplane_cloud_gcp::GkeDriver;
use kubeplane_config::Settings;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

pub fn probe_config(settings: &Settings) -> ProbeConfig {
    ProbeConfig {
        zone_suffixes: settings.probe.zone_suffixes.clone(),
        parallel_enumeration: settings.probe.parallel_enumeration,
    }
}

/// Reads the AES-256 key from the environment variable named in settings
pub fn resolver(settings: &Settings) -> anyhow::Result<AesGcmResolver> {
    let key_env = &settings.credentials.key_env;
    let encoded = std::env::var(key_env)
        .with_context(|| format!("{} is not set (base64 AES-256 key)", key_env))?;
    Ok(AesGcmResolver::from_base64(encoded.trim())?)
}

pub fn orchestrator(settings: &Settings, resolver: AesGcmResolver) -> Orchestrator {
    Orchestrator::new(Arc::new(resolver))
        .with_timeout(settings.timeouts.operation())
        .with_driver(Arc::new(GkeDriver::rest(
            settings.gcp.api_base.clone(),
            settings.gcp.token_uri.clone(),
            probe_config(settings),
        )))
        .with_driver(Arc::new(EksDriver::sdk(settings.aws.default_region.clone())))
        .with_driver(Arc::new(UnimplementedDriver::new("azure", "Azure Kubernetes Service")))
        .with_driver(Arc::new(UnimplementedDriver::new("ncp", "NAVER Cloud Kubernetes Service")))
}

pub fn read_credential(provider: &str, path: &Path) -> anyhow::Result<Credential> {
    let encrypted = std::fs::read(path)
        .with_context(|| format!("failed to read credential {}", path.display()))?;
    Ok(Credential::new(provider, encrypted))
}

/// Parses a spec file; `.json` files as JSON, everything else as YAML
pub fn read_spec<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let spec = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in {}", path.display()))?
    };
    Ok(spec)
}
