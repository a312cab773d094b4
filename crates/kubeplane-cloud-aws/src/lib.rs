//! Amazon EKS provider for kubeplane
//!
//! This crate implements the ClusterDriver trait for EKS on top of
//! `aws-sdk-eks`.
//!
//! # Features
//!
//! - Cluster create/list/get/delete with access entries (`API` auth mode)
//! - Managed node groups, including spot capacity and taints
//! - Kubeconfig using `aws eks get-token`
//!
//! # Credential
//!
//! The decrypted credential carries `access_key`, `secret_key`, and
//! optionally `session_token` and `region`.

pub mod api;
pub mod convert;
pub mod driver;
pub mod error;
pub mod sdk;
pub mod types;

pub use api::{EksApi, EksConnector};
pub use driver::{DEFAULT_REGION, EksDriver};
pub use error::{EksError, Result};
pub use sdk::{EksSdkClient, PROVIDER, SdkConnector};
