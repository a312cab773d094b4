//! GKE v1 REST resource types
//!
//! Only the fields kubeplane reads or writes are modeled. Every optional
//! block is skipped when unset so the API applies its own default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_cluster_version: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_master_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub location: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub self_link: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub create_time: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnetwork: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster_ipv4_cidr: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub services_ipv4_cidr: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resource_labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_pools: Vec<NodePool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_allocation_policy: Option<IpAllocationPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_cluster_config: Option<PrivateClusterConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_authorized_networks_config: Option<MasterAuthorizedNetworksConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workload_identity_config: Option<WorkloadIdentityConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_policy: Option<NetworkPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_authorization: Option<BinaryAuthorization>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autopilot: Option<Autopilot>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_auth: Option<MasterAuth>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePool {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<NodeConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_node_count: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<NodePoolAutoscaling>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management: Option<NodeManagement>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_settings: Option<UpgradeSettings>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub status: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub self_link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub machine_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_type: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_type: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub preemptible: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub spot: bool,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resource_labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taints: Vec<NodeTaint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTaint {
    pub key: String,
    #[serde(default)]
    pub value: String,
    /// `NO_SCHEDULE`, `PREFER_NO_SCHEDULE` or `NO_EXECUTE`
    pub effect: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePoolAutoscaling {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub min_node_count: i32,
    #[serde(default)]
    pub max_node_count: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeManagement {
    #[serde(default)]
    pub auto_upgrade: bool,
    #[serde(default)]
    pub auto_repair: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeSettings {
    #[serde(default)]
    pub max_surge: i32,
    #[serde(default)]
    pub max_unavailable: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub strategy: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpAllocationPolicy {
    #[serde(default)]
    pub use_ip_aliases: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_ipv4_cidr_block: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub services_ipv4_cidr_block: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateClusterConfig {
    #[serde(default)]
    pub enable_private_nodes: bool,

    #[serde(default)]
    pub enable_private_endpoint: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_ipv4_cidr_block: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterAuthorizedNetworksConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cidr_blocks: Vec<CidrBlock>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CidrBlock {
    pub cidr_block: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub display_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadIdentityConfig {
    pub workload_pool: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkPolicy {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provider: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryAuthorization {
    /// `DISABLED` or `PROJECT_SINGLETON_POLICY_ENFORCE`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub evaluation_mode: String,
}

impl BinaryAuthorization {
    pub const ENFORCE: &'static str = "PROJECT_SINGLETON_POLICY_ENFORCE";

    pub fn enabled(&self) -> bool {
        !self.evaluation_mode.is_empty() && self.evaluation_mode != "DISABLED"
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Autopilot {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterAuth {
    #[serde(default)]
    pub cluster_ca_certificate: String,
}

/// Long-running operation returned by mutating calls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub operation_type: String,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub target_link: String,
}

/// `projects.locations.getServerConfig` result
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default)]
    pub default_cluster_version: String,

    /// Newest first
    #[serde(default)]
    pub valid_master_versions: Vec<String>,

    #[serde(default)]
    pub valid_node_versions: Vec<String>,
}

/// Compute Engine region
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ComputeRegion {
    pub name: String,

    /// `UP` or `DOWN`
    #[serde(default)]
    pub status: String,
}

/// Compute Engine zone
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ComputeZone {
    pub name: String,

    /// URL of the parent region
    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub status: String,
}

impl ComputeZone {
    /// Region name, the last segment of the region URL
    pub fn region_name(&self) -> &str {
        self.region.rsplit('/').next().unwrap_or_default()
    }
}

// ============ Request / Response envelopes ============

#[derive(Debug, Serialize)]
pub(crate) struct CreateClusterRequest<'a> {
    pub cluster: &'a Cluster,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateNodePoolRequest<'a> {
    pub node_pool: &'a NodePool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListClustersResponse {
    #[serde(default)]
    pub clusters: Vec<Cluster>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListNodePoolsResponse {
    #[serde(default)]
    pub node_pools: Vec<NodePool>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RegionListResponse {
    #[serde(default)]
    pub items: Vec<ComputeRegion>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ZoneListResponse {
    #[serde(default)]
    pub items: Vec<ComputeZone>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}
