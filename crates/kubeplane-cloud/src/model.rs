//! Normalized cluster and node group model
//!
//! These shapes are what callers see regardless of backend. Provider-native
//! types never cross the driver boundary.

use crate::error::{ClusterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Free-form key/value tags. Ordered so that normalization and rendering are
/// deterministic.
pub type Tags = BTreeMap<String, String>;

/// Status reported by `CreateCluster` and `CreateNodeGroup` when the provider
/// call is asynchronous and returns no object state.
pub const STATUS_CREATING: &str = "creating";

/// Public operations exposed by the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    CreateCluster,
    ListClusters,
    GetCluster,
    DeleteCluster,
    GetKubeconfig,
    CreateNodeGroup,
    ListNodeGroups,
    GetNodeGroup,
    DeleteNodeGroup,
    ListVersions,
    ListRegions,
    ListZones,
}

impl Operation {
    pub const ALL: [Operation; 12] = [
        Operation::CreateCluster,
        Operation::ListClusters,
        Operation::GetCluster,
        Operation::DeleteCluster,
        Operation::GetKubeconfig,
        Operation::CreateNodeGroup,
        Operation::ListNodeGroups,
        Operation::GetNodeGroup,
        Operation::DeleteNodeGroup,
        Operation::ListVersions,
        Operation::ListRegions,
        Operation::ListZones,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateCluster => "CreateCluster",
            Operation::ListClusters => "ListClusters",
            Operation::GetCluster => "GetCluster",
            Operation::DeleteCluster => "DeleteCluster",
            Operation::GetKubeconfig => "GetKubeconfig",
            Operation::CreateNodeGroup => "CreateNodeGroup",
            Operation::ListNodeGroups => "ListNodeGroups",
            Operation::GetNodeGroup => "GetNodeGroup",
            Operation::DeleteNodeGroup => "DeleteNodeGroup",
            Operation::ListVersions => "ListVersions",
            Operation::ListRegions => "ListRegions",
            Operation::ListZones => "ListZones",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============ Input ============

/// Request to create a cluster
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub name: String,

    /// Kubernetes version requested from the provider
    pub version: String,

    pub region: String,

    /// Zonal placement. When unset the cluster is created at region scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_pool: Option<NodePoolSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecuritySpec>,

    /// Fully-managed mode where the provider owns node provisioning
    #[serde(default)]
    pub autopilot: bool,

    /// IAM role assumed by the control plane (EKS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_arn: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<AccessSpec>,

    #[serde(default)]
    pub tags: Tags,
}

impl ClusterSpec {
    /// Location the cluster is created at: the zone when given, the region otherwise
    pub fn location(&self) -> &str {
        match self.zone.as_deref() {
            Some(zone) if !zone.is_empty() => zone,
            _ => &self.region,
        }
    }
}

/// Provider-specific network reference plus optional networking options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// VPC id (EKS) or VPC network name (GKE)
    #[serde(default)]
    pub vpc_id: String,

    #[serde(default)]
    pub subnet_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security_group_ids: Vec<String>,

    #[serde(default)]
    pub private_nodes: bool,

    #[serde(default)]
    pub private_endpoint: bool,

    /// CIDR for the private control plane endpoint (GKE)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_cidr: Option<String>,

    /// CIDRs allowed to reach the control plane endpoint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorized_networks: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_cidr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_cidr: Option<String>,
}

impl NetworkSpec {
    pub fn first_subnet(&self) -> Option<&str> {
        self.subnet_ids
            .iter()
            .map(String::as_str)
            .find(|s| !s.is_empty())
    }
}

/// Node pool attached to a cluster at creation time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodePoolSpec {
    pub name: String,
    pub machine_type: String,

    #[serde(default)]
    pub disk_size_gb: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<String>,

    pub desired_nodes: i32,

    #[serde(default)]
    pub min_nodes: i32,

    #[serde(default)]
    pub max_nodes: i32,

    #[serde(default)]
    pub autoscaling: bool,

    #[serde(default)]
    pub preemptible: bool,

    #[serde(default)]
    pub spot: bool,

    #[serde(default)]
    pub labels: Tags,

    #[serde(default)]
    pub taints: Vec<Taint>,
}

impl NodePoolSpec {
    pub fn scaling(&self) -> ScalingConfig {
        ScalingConfig {
            min_size: self.min_nodes,
            max_size: self.max_nodes,
            desired_size: self.desired_nodes,
        }
    }

    /// Scaling bounds only constrain the pool when autoscaling is on
    pub fn validate(&self) -> Result<()> {
        if self.autoscaling {
            self.scaling().validate(&self.name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySpec {
    #[serde(default)]
    pub network_policy: bool,

    #[serde(default)]
    pub workload_identity: bool,

    #[serde(default)]
    pub binary_authorization: bool,
}

/// Control plane access configuration (EKS access entries)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessSpec {
    /// `API`, `CONFIG_MAP` or `API_AND_CONFIG_MAP`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_cluster_creator_admin: Option<bool>,
}

/// Request to create a node group on an existing cluster
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeGroupSpec {
    pub cluster_name: String,
    pub region: String,
    pub name: String,

    #[serde(default)]
    pub instance_types: Vec<String>,

    pub scaling: ScalingConfig,

    #[serde(default)]
    pub disk_size_gb: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<String>,

    /// `ON_DEMAND`, `SPOT` or `PREEMPTIBLE`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_type: Option<String>,

    #[serde(default)]
    pub subnet_ids: Vec<String>,

    /// IAM role for the worker nodes (EKS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_role: Option<String>,

    #[serde(default)]
    pub labels: Tags,

    #[serde(default)]
    pub taints: Vec<Taint>,

    #[serde(default)]
    pub tags: Tags,
}

/// Identifies a cluster by name within a region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRef {
    pub name: String,
    pub region: String,
}

impl ClusterRef {
    pub fn new(name: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: region.into(),
        }
    }
}

/// Identifies a node group within a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeGroupRef {
    pub cluster_name: String,
    pub name: String,
    pub region: String,
}

impl NodeGroupRef {
    pub fn new(
        cluster_name: impl Into<String>,
        name: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            name: name.into(),
            region: region.into(),
        }
    }

    pub fn cluster(&self) -> ClusterRef {
        ClusterRef::new(self.cluster_name.clone(), self.region.clone())
    }
}

// ============ Output ============

/// Normalized cluster state, built fresh from a provider read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub id: String,
    pub name: String,
    pub version: String,

    /// Provider-native status string, passed through as reported
    pub status: String,

    pub region: String,

    /// Empty when the cluster is region-scoped or the zone is unknown
    pub zone: String,

    pub endpoint: String,
    pub created_at: String,

    #[serde(default)]
    pub tags: Tags,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkSummary>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_pools: Option<NodePoolSummary>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<SecuritySummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkSummary {
    pub vpc_id: String,
    pub subnet_id: String,
    pub pod_cidr: String,
    pub service_cidr: String,
    pub private_nodes: bool,
    pub private_endpoint: bool,
}

/// Aggregate counts across every pool of a cluster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePoolSummary {
    pub total_node_pools: i32,
    pub total_nodes: i32,
    pub min_nodes: i32,
    pub max_nodes: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySummary {
    pub workload_identity: bool,
    pub binary_authorization: bool,
    pub network_policy: bool,
}

/// Normalized node group state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeGroupInfo {
    pub id: String,
    pub name: String,
    pub status: String,
    pub cluster_name: String,
    pub region: String,
    pub version: String,
    pub instance_types: Vec<String>,
    pub scaling: ScalingConfig,
    pub capacity_type: String,
    pub disk_size_gb: i32,
    pub disk_type: String,
    pub image_type: String,

    #[serde(default)]
    pub labels: Tags,

    #[serde(default)]
    pub taints: Vec<Taint>,

    #[serde(default)]
    pub tags: Tags,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management: Option<NodeManagement>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade: Option<UpgradeSettings>,

    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalingConfig {
    pub min_size: i32,
    pub max_size: i32,
    pub desired_size: i32,
}

impl ScalingConfig {
    pub fn new(min_size: i32, max_size: i32, desired_size: i32) -> Self {
        Self {
            min_size,
            max_size,
            desired_size,
        }
    }

    /// Checks `0 <= min <= desired <= max`
    pub fn validate(&self, node_group: &str) -> Result<()> {
        if self.min_size < 0
            || self.min_size > self.desired_size
            || self.desired_size > self.max_size
        {
            return Err(ClusterError::InvalidScalingConfig {
                node_group: node_group.to_string(),
                min: self.min_size,
                desired: self.desired_size,
                max: self.max_size,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeManagement {
    pub auto_repair: bool,
    pub auto_upgrade: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeSettings {
    pub max_surge: i32,
    pub max_unavailable: i32,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub strategy: String,
}

// ============ Taints ============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taint {
    pub key: String,

    #[serde(default)]
    pub value: String,

    pub effect: TaintEffect,
}

/// Taint effect in Kubernetes spelling. Providers spell these as
/// `NO_SCHEDULE` and friends; both forms parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaintEffect {
    NoSchedule,
    PreferNoSchedule,
    NoExecute,
}

impl TaintEffect {
    /// Upper snake case form used by the GKE and EKS APIs
    pub fn api_name(&self) -> &'static str {
        match self {
            TaintEffect::NoSchedule => "NO_SCHEDULE",
            TaintEffect::PreferNoSchedule => "PREFER_NO_SCHEDULE",
            TaintEffect::NoExecute => "NO_EXECUTE",
        }
    }
}

impl fmt::Display for TaintEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaintEffect::NoSchedule => write!(f, "NoSchedule"),
            TaintEffect::PreferNoSchedule => write!(f, "PreferNoSchedule"),
            TaintEffect::NoExecute => write!(f, "NoExecute"),
        }
    }
}

impl FromStr for TaintEffect {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NoSchedule" | "NO_SCHEDULE" => Ok(TaintEffect::NoSchedule),
            "PreferNoSchedule" | "PREFER_NO_SCHEDULE" => Ok(TaintEffect::PreferNoSchedule),
            "NoExecute" | "NO_EXECUTE" => Ok(TaintEffect::NoExecute),
            other => Err(ClusterError::InvalidRequest(format!(
                "unknown taint effect: {}",
                other
            ))),
        }
    }
}
