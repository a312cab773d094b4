//! EKS resource shapes used at the API seam
//!
//! These mirror the parts of the EKS API kubeplane uses, detached from the
//! SDK builders so drivers can be tested against an in-memory API.

use kubeplane_cloud::Tags;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EksCluster {
    pub name: String,
    pub arn: String,
    pub version: String,
    pub status: String,
    pub endpoint: String,
    /// Base64 PEM bundle of the cluster CA
    pub certificate_authority: String,
    pub created_at: String,
    pub role_arn: String,
    pub vpc_id: String,
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
    pub service_cidr: String,
    pub endpoint_public_access: bool,
    pub endpoint_private_access: bool,
    pub tags: Tags,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EksNodegroup {
    pub name: String,
    pub arn: String,
    pub cluster_name: String,
    pub version: String,
    pub status: String,
    pub capacity_type: String,
    pub instance_types: Vec<String>,
    pub ami_type: String,
    pub min_size: Option<i32>,
    pub max_size: Option<i32>,
    pub desired_size: Option<i32>,
    pub disk_size: Option<i32>,
    pub subnets: Vec<String>,
    pub node_role: String,
    pub labels: Tags,
    pub taints: Vec<EksTaint>,
    pub tags: Tags,
    pub max_unavailable: Option<i32>,
    pub created_at: String,
    pub modified_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EksTaint {
    pub key: String,
    pub value: String,
    /// `NO_SCHEDULE`, `PREFER_NO_SCHEDULE` or `NO_EXECUTE`
    pub effect: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateClusterInput {
    pub name: String,
    pub version: Option<String>,
    pub role_arn: String,
    pub subnet_ids: Vec<String>,
    pub security_group_ids: Vec<String>,
    pub endpoint_private_access: Option<bool>,
    pub endpoint_public_access: Option<bool>,
    pub public_access_cidrs: Vec<String>,
    pub service_cidr: Option<String>,
    /// `API`, `CONFIG_MAP` or `API_AND_CONFIG_MAP`
    pub authentication_mode: String,
    pub bootstrap_cluster_creator_admin: bool,
    pub tags: Tags,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateNodegroupInput {
    pub cluster_name: String,
    pub name: String,
    pub node_role: String,
    pub subnets: Vec<String>,
    pub instance_types: Vec<String>,
    pub min_size: i32,
    pub max_size: i32,
    pub desired_size: i32,
    pub disk_size: Option<i32>,
    pub capacity_type: Option<String>,
    pub labels: Tags,
    pub taints: Vec<EksTaint>,
    pub tags: Tags,
}
