//! Google Kubernetes Engine provider for kubeplane
//!
//! This crate implements the ClusterDriver trait for GKE, talking to the
//! GKE v1 REST API with a service account credential.
//!
//! # Features
//!
//! - Regional and zonal clusters, found by probing region then zones
//! - Node pool management
//! - Autopilot clusters
//! - Kubeconfig using `gke-gcloud-auth-plugin`
//!
//! # Credential
//!
//! The decrypted credential is the service account key JSON
//! (`project_id`, `client_email`, `private_key`, optional `token_uri`).
//! A pre-minted `access_token` may be supplied instead of the key.
//!
//! # Example
//!
//! ```ignore
//! use kubeplane_cloud::{ClusterDriver, ClusterRef, ProbeConfig};
//! use kubeplane_cloud_gcp::GkeDriver;
//!
//! let driver = GkeDriver::rest(kubeplane_cloud_gcp::GKE_API_BASE, None, ProbeConfig::default());
//! let info = driver
//!     .get_cluster(&secrets, &ClusterRef::new("demo", "us-central1"))
//!     .await?;
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod convert;
pub mod driver;
pub mod error;
pub mod types;

pub use api::{GkeApi, GkeConnector};
pub use client::{GKE_API_BASE, GkeClient, PROVIDER, RestConnector};
pub use driver::GkeDriver;
pub use error::{GkeError, Result};
