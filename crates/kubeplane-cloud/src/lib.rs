//! Kubeplane Cloud
//!
//! Provider-agnostic lifecycle management for managed Kubernetes clusters
//! and their node groups.
//!
//! # Supported Providers
//!
//! - **GKE** (`gcp`): clusters and node pools via the GKE v1 REST API
//! - **EKS** (`aws`): clusters and managed node groups via the AWS SDK
//! - **AKS** (`azure`), **NKS** (`ncp`): registered, not implemented yet
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   kplane CLI                     │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                kubeplane-cloud                   │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   Orchestrator (dispatch by provider)    │   │
//! │  │   trait ClusterDriver { ... }            │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌────────────┐ ┌────────────┐ ┌────────────┐   │
//! │  │ Credential │ │ Tag policy │ │  Location  │   │
//! │  │  resolver  │ │            │ │   prober   │   │
//! │  └────────────┘ └────────────┘ └────────────┘   │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │      gke      │ │      eks      │
//! │    driver     │ │    driver     │
//! └───────────────┘ └───────────────┘
//! ```

pub mod credential;
pub mod error;
pub mod kubeconfig;
pub mod model;
pub mod orchestrator;
pub mod probe;
pub mod provider;
pub mod tags;

// Re-exports
pub use credential::{AesGcmResolver, Credential, CredentialResolver, Secrets};
pub use error::{BoxError, ClusterError, Result};
pub use kubeconfig::{ClusterAuth, ExecPlugin, Kubeconfig};
pub use model::{
    AccessSpec, ClusterInfo, ClusterRef, ClusterSpec, NetworkSpec, NetworkSummary, NodeGroupInfo,
    NodeGroupRef, NodeGroupSpec, NodeManagement, NodePoolSpec, NodePoolSummary, Operation,
    STATUS_CREATING, ScalingConfig, SecuritySpec, SecuritySummary, Tags, Taint, TaintEffect,
    UpgradeSettings,
};
pub use orchestrator::{ClusterRequest, ClusterResponse, DEFAULT_OPERATION_TIMEOUT, Orchestrator};
pub use probe::{LocationProber, ProbeConfig, Resolved};
pub use provider::{ClusterDriver, UnimplementedDriver};
pub use tags::TagPolicy;
