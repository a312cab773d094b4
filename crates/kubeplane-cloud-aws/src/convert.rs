//! Translation between the normalized model and EKS shapes

use crate::types::{CreateClusterInput, CreateNodegroupInput, EksCluster, EksNodegroup, EksTaint};
use kubeplane_cloud::{
    ClusterError, ClusterInfo, ClusterSpec, NetworkSummary, NodeGroupInfo, NodeGroupSpec, Result,
    ScalingConfig, Tags, Taint, TaintEffect, UpgradeSettings,
};
use std::cmp::Reverse;

pub const DEFAULT_AUTHENTICATION_MODE: &str = "API";

/// Create input for a validated cluster spec. Network and role must already
/// be checked by the caller.
pub fn create_cluster_input(spec: &ClusterSpec, role_arn: &str, tags: Tags) -> CreateClusterInput {
    let network = spec.network.clone().unwrap_or_default();
    let access = spec.access.clone().unwrap_or_default();

    // Private endpoint without public access is what "private" means on EKS;
    // leave both unset otherwise so EKS keeps its defaults.
    let (private_access, public_access) = if network.private_endpoint {
        (Some(true), Some(false))
    } else if network.private_nodes {
        (Some(true), None)
    } else {
        (None, None)
    };

    CreateClusterInput {
        name: spec.name.clone(),
        version: (!spec.version.is_empty()).then(|| spec.version.clone()),
        role_arn: role_arn.to_string(),
        subnet_ids: network
            .subnet_ids
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect(),
        security_group_ids: network.security_group_ids.clone(),
        endpoint_private_access: private_access,
        endpoint_public_access: public_access,
        public_access_cidrs: network.authorized_networks.clone(),
        service_cidr: network.service_cidr.clone(),
        authentication_mode: access
            .authentication_mode
            .unwrap_or_else(|| DEFAULT_AUTHENTICATION_MODE.to_string()),
        bootstrap_cluster_creator_admin: access.bootstrap_cluster_creator_admin.unwrap_or(true),
        tags,
    }
}

pub fn create_nodegroup_input(
    spec: &NodeGroupSpec,
    node_role: &str,
) -> Result<CreateNodegroupInput> {
    let capacity_type = match spec.capacity_type.as_deref() {
        None | Some("") => None,
        Some(c @ ("ON_DEMAND" | "SPOT")) => Some(c.to_string()),
        Some(other) => {
            return Err(ClusterError::InvalidRequest(format!(
                "unsupported capacity type for EKS: {}",
                other
            )));
        }
    };

    Ok(CreateNodegroupInput {
        cluster_name: spec.cluster_name.clone(),
        name: spec.name.clone(),
        node_role: node_role.to_string(),
        subnets: spec.subnet_ids.clone(),
        instance_types: spec.instance_types.clone(),
        min_size: spec.scaling.min_size,
        max_size: spec.scaling.max_size,
        desired_size: spec.scaling.desired_size,
        disk_size: (spec.disk_size_gb > 0).then_some(spec.disk_size_gb),
        capacity_type,
        labels: spec.labels.clone(),
        taints: spec
            .taints
            .iter()
            .map(|t| EksTaint {
                key: t.key.clone(),
                value: t.value.clone(),
                effect: t.effect.api_name().to_string(),
            })
            .collect(),
        tags: spec.tags.clone(),
    })
}

pub fn cluster_info(cluster: &EksCluster, region: &str) -> ClusterInfo {
    let network = NetworkSummary {
        vpc_id: cluster.vpc_id.clone(),
        subnet_id: cluster.subnet_ids.first().cloned().unwrap_or_default(),
        pod_cidr: String::new(),
        service_cidr: cluster.service_cidr.clone(),
        private_nodes: false,
        private_endpoint: cluster.endpoint_private_access && !cluster.endpoint_public_access,
    };

    ClusterInfo {
        id: if cluster.arn.is_empty() {
            cluster.name.clone()
        } else {
            cluster.arn.clone()
        },
        name: cluster.name.clone(),
        version: cluster.version.clone(),
        status: cluster.status.clone(),
        region: region.to_string(),
        zone: String::new(),
        endpoint: cluster.endpoint.clone(),
        created_at: cluster.created_at.clone(),
        tags: cluster.tags.clone(),
        network: (network != NetworkSummary::default()).then_some(network),
        node_pools: None,
        security: None,
    }
}

pub fn node_group_info(nodegroup: &EksNodegroup, region: &str) -> NodeGroupInfo {
    NodeGroupInfo {
        id: nodegroup.arn.clone(),
        name: nodegroup.name.clone(),
        status: nodegroup.status.clone(),
        cluster_name: nodegroup.cluster_name.clone(),
        region: region.to_string(),
        version: nodegroup.version.clone(),
        instance_types: nodegroup.instance_types.clone(),
        scaling: ScalingConfig::new(
            nodegroup.min_size.unwrap_or_default(),
            nodegroup.max_size.unwrap_or_default(),
            nodegroup.desired_size.unwrap_or_default(),
        ),
        capacity_type: nodegroup.capacity_type.clone(),
        disk_size_gb: nodegroup.disk_size.unwrap_or_default(),
        disk_type: String::new(),
        image_type: nodegroup.ami_type.clone(),
        labels: nodegroup.labels.clone(),
        taints: nodegroup.taints.iter().filter_map(taint_from_api).collect(),
        tags: nodegroup.tags.clone(),
        management: None,
        upgrade: nodegroup.max_unavailable.map(|max_unavailable| UpgradeSettings {
            max_surge: 0,
            max_unavailable,
            strategy: String::new(),
        }),
        created_at: nodegroup.created_at.clone(),
        updated_at: nodegroup.modified_at.clone(),
    }
}

fn taint_from_api(taint: &EksTaint) -> Option<Taint> {
    match taint.effect.parse::<TaintEffect>() {
        Ok(effect) => Some(Taint {
            key: taint.key.clone(),
            value: taint.value.clone(),
            effect,
        }),
        Err(_) => {
            tracing::warn!("Ignoring taint {} with unknown effect {}", taint.key, taint.effect);
            None
        }
    }
}

/// Distinct Kubernetes versions, newest first by numeric `major.minor`
pub fn sort_versions(versions: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut versions: Vec<String> = versions.into_iter().filter(|v| !v.is_empty()).collect();
    versions.sort_by_key(|v| {
        Reverse(
            v.split('.')
                .map(|part| part.parse::<u32>().unwrap_or_default())
                .collect::<Vec<_>>(),
        )
    });
    versions.dedup();
    versions
}
