//! Translation between the normalized model and GKE resources

use crate::types::{
    Autopilot, BinaryAuthorization, CidrBlock, Cluster, IpAllocationPolicy,
    MasterAuthorizedNetworksConfig, NetworkPolicy, NodeConfig, NodePool, NodePoolAutoscaling,
    NodeTaint, PrivateClusterConfig, WorkloadIdentityConfig,
};
use kubeplane_cloud::{
    ClusterError, ClusterInfo, ClusterSpec, NetworkSpec, NetworkSummary, NodeGroupInfo,
    NodeGroupSpec, NodeManagement, NodePoolSpec, NodePoolSummary, Result, STATUS_CREATING,
    ScalingConfig, SecuritySpec, SecuritySummary, Tags, Taint, TaintEffect, UpgradeSettings,
};

/// `projects/<p>/locations/<loc>/clusters/<name>`
pub fn cluster_path(project: &str, location: &str, name: &str) -> String {
    format!("projects/{}/locations/{}/clusters/{}", project, location, name)
}

pub fn node_pool_path(project: &str, location: &str, cluster: &str, name: &str) -> String {
    format!("{}/nodePools/{}", cluster_path(project, location, cluster), name)
}

/// Zone named by a location or resource path, if it is zonal.
///
/// Zones end in a letter (`us-central1-b`), regions in a digit
/// (`us-central1`). Anything else yields `None`.
pub fn zone_from_location(location: &str) -> Option<&str> {
    let segment = location
        .trim_end_matches('/')
        .rsplit('/')
        .find(|s| !s.is_empty())?;
    let (_, suffix) = segment.rsplit_once('-')?;
    if suffix.len() == 1 && suffix.chars().all(|c| c.is_ascii_lowercase()) {
        Some(segment)
    } else {
        None
    }
}

/// Zone of a cluster read from GKE, preferring what GKE reports about itself
fn cluster_zone(cluster: &Cluster, resolved_location: &str) -> String {
    if let Some(zone) = zone_from_location(&cluster.location) {
        return zone.to_string();
    }
    if cluster.location.is_empty() {
        let location_segment = cluster
            .self_link
            .split("/locations/")
            .nth(1)
            .and_then(|rest| rest.split('/').next())
            .unwrap_or_default();
        if let Some(zone) = zone_from_location(location_segment) {
            return zone.to_string();
        }
        if let Some(zone) = zone_from_location(resolved_location) {
            return zone.to_string();
        }
    }
    String::new()
}

// ============ Create payloads ============

pub fn cluster_payload(spec: &ClusterSpec, project: &str, labels: Tags) -> Cluster {
    let network = spec.network.clone().unwrap_or_default();
    let security = spec.security.unwrap_or_default();

    Cluster {
        name: spec.name.clone(),
        initial_cluster_version: non_empty(&spec.version),
        network: non_empty(&network.vpc_id),
        subnetwork: network.first_subnet().map(str::to_string),
        resource_labels: labels,
        node_pools: match (&spec.node_pool, spec.autopilot) {
            (Some(pool), false) => vec![node_pool_from_pool_spec(pool)],
            _ => Vec::new(),
        },
        ip_allocation_policy: ip_allocation_policy(&network),
        private_cluster_config: private_cluster_config(&network),
        master_authorized_networks_config: authorized_networks(&network),
        workload_identity_config: security.workload_identity.then(|| WorkloadIdentityConfig {
            workload_pool: format!("{}.svc.id.goog", project),
        }),
        network_policy: security.network_policy.then(|| NetworkPolicy {
            enabled: true,
            provider: "CALICO".to_string(),
        }),
        binary_authorization: security.binary_authorization.then(|| BinaryAuthorization {
            evaluation_mode: BinaryAuthorization::ENFORCE.to_string(),
        }),
        autopilot: spec.autopilot.then_some(Autopilot { enabled: true }),
        ..Default::default()
    }
}

fn ip_allocation_policy(network: &NetworkSpec) -> Option<IpAllocationPolicy> {
    if network.pod_cidr.is_none() && network.service_cidr.is_none() {
        return None;
    }
    Some(IpAllocationPolicy {
        use_ip_aliases: true,
        cluster_ipv4_cidr_block: network.pod_cidr.clone(),
        services_ipv4_cidr_block: network.service_cidr.clone(),
    })
}

fn private_cluster_config(network: &NetworkSpec) -> Option<PrivateClusterConfig> {
    if !network.private_nodes && !network.private_endpoint {
        return None;
    }
    Some(PrivateClusterConfig {
        enable_private_nodes: network.private_nodes,
        enable_private_endpoint: network.private_endpoint,
        master_ipv4_cidr_block: network.master_cidr.clone(),
    })
}

fn authorized_networks(network: &NetworkSpec) -> Option<MasterAuthorizedNetworksConfig> {
    if network.authorized_networks.is_empty() {
        return None;
    }
    Some(MasterAuthorizedNetworksConfig {
        enabled: true,
        cidr_blocks: network
            .authorized_networks
            .iter()
            .map(|cidr| CidrBlock {
                cidr_block: cidr.clone(),
                display_name: String::new(),
            })
            .collect(),
    })
}

fn node_pool_from_pool_spec(pool: &NodePoolSpec) -> NodePool {
    NodePool {
        name: pool.name.clone(),
        config: Some(NodeConfig {
            machine_type: pool.machine_type.clone(),
            disk_size_gb: positive(pool.disk_size_gb),
            disk_type: pool.disk_type.clone(),
            preemptible: pool.preemptible,
            spot: pool.spot,
            labels: pool.labels.clone(),
            taints: pool.taints.iter().map(node_taint).collect(),
            ..Default::default()
        }),
        initial_node_count: Some(pool.desired_nodes),
        autoscaling: pool.autoscaling.then_some(NodePoolAutoscaling {
            enabled: true,
            min_node_count: pool.min_nodes,
            max_node_count: pool.max_nodes,
        }),
        ..Default::default()
    }
}

/// Node pool body for `CreateNodeGroup`. The first instance type becomes the
/// machine type; capacity type maps onto the spot/preemptible flags.
pub fn node_pool_payload(spec: &NodeGroupSpec, labels: Tags) -> Result<NodePool> {
    let machine_type = spec
        .instance_types
        .iter()
        .find(|t| !t.is_empty())
        .ok_or_else(|| {
            ClusterError::InvalidRequest(format!(
                "node pool {} needs at least one instance type",
                spec.name
            ))
        })?;

    let (preemptible, spot) = match spec.capacity_type.as_deref() {
        None | Some("") | Some("ON_DEMAND") => (false, false),
        Some("SPOT") => (false, true),
        Some("PREEMPTIBLE") => (true, false),
        Some(other) => {
            return Err(ClusterError::InvalidRequest(format!(
                "unsupported capacity type for GKE: {}",
                other
            )));
        }
    };

    let scaling = spec.scaling;
    Ok(NodePool {
        name: spec.name.clone(),
        config: Some(NodeConfig {
            machine_type: machine_type.clone(),
            disk_size_gb: positive(spec.disk_size_gb),
            disk_type: spec.disk_type.clone(),
            preemptible,
            spot,
            labels: spec.labels.clone(),
            resource_labels: labels,
            taints: spec.taints.iter().map(node_taint).collect(),
            ..Default::default()
        }),
        initial_node_count: Some(scaling.desired_size),
        autoscaling: (scaling.max_size > scaling.min_size).then_some(NodePoolAutoscaling {
            enabled: true,
            min_node_count: scaling.min_size,
            max_node_count: scaling.max_size,
        }),
        ..Default::default()
    })
}

fn node_taint(taint: &Taint) -> NodeTaint {
    NodeTaint {
        key: taint.key.clone(),
        value: taint.value.clone(),
        effect: taint.effect.api_name().to_string(),
    }
}

// ============ Normalized views ============

/// Optimistic view of a cluster whose create call was just accepted
pub fn created_cluster_info(spec: &ClusterSpec, project: &str, labels: Tags) -> ClusterInfo {
    ClusterInfo {
        id: cluster_path(project, spec.location(), &spec.name),
        name: spec.name.clone(),
        version: spec.version.clone(),
        status: STATUS_CREATING.to_string(),
        region: spec.region.clone(),
        zone: spec
            .zone
            .as_deref()
            .and_then(zone_from_location)
            .unwrap_or_default()
            .to_string(),
        tags: labels,
        security: requested_security(spec),
        ..Default::default()
    }
}

pub fn cluster_info(cluster: &Cluster, project: &str, region: &str, location: &str) -> ClusterInfo {
    let own_location = if cluster.location.is_empty() {
        location
    } else {
        &cluster.location
    };

    ClusterInfo {
        id: cluster_path(project, own_location, &cluster.name),
        name: cluster.name.clone(),
        version: cluster.current_master_version.clone(),
        status: cluster.status.clone(),
        region: region.to_string(),
        zone: cluster_zone(cluster, location),
        endpoint: cluster.endpoint.clone(),
        created_at: cluster.create_time.clone(),
        tags: cluster.resource_labels.clone(),
        network: network_summary(cluster),
        node_pools: node_pool_summary(&cluster.node_pools),
        security: Some(security_summary(cluster)),
    }
}

fn network_summary(cluster: &Cluster) -> Option<NetworkSummary> {
    let private = cluster.private_cluster_config.clone().unwrap_or_default();
    let summary = NetworkSummary {
        vpc_id: cluster.network.clone().unwrap_or_default(),
        subnet_id: cluster.subnetwork.clone().unwrap_or_default(),
        pod_cidr: cluster.cluster_ipv4_cidr.clone(),
        service_cidr: cluster.services_ipv4_cidr.clone(),
        private_nodes: private.enable_private_nodes,
        private_endpoint: private.enable_private_endpoint,
    };
    (summary != NetworkSummary::default()).then_some(summary)
}

pub fn node_pool_summary(pools: &[NodePool]) -> Option<NodePoolSummary> {
    if pools.is_empty() {
        return None;
    }
    let mut summary = NodePoolSummary {
        total_node_pools: pools.len() as i32,
        ..Default::default()
    };
    for pool in pools {
        summary.total_nodes += pool.initial_node_count.unwrap_or_default();
        if let Some(autoscaling) = pool.autoscaling.filter(|a| a.enabled) {
            summary.min_nodes += autoscaling.min_node_count;
            summary.max_nodes += autoscaling.max_node_count;
        }
    }
    Some(summary)
}

fn security_summary(cluster: &Cluster) -> SecuritySummary {
    SecuritySummary {
        workload_identity: cluster
            .workload_identity_config
            .as_ref()
            .is_some_and(|w| !w.workload_pool.is_empty()),
        binary_authorization: cluster
            .binary_authorization
            .as_ref()
            .is_some_and(BinaryAuthorization::enabled),
        network_policy: cluster.network_policy.as_ref().is_some_and(|n| n.enabled),
    }
}

fn requested_security(spec: &ClusterSpec) -> Option<SecuritySummary> {
    spec.security.map(|s: SecuritySpec| SecuritySummary {
        workload_identity: s.workload_identity,
        binary_authorization: s.binary_authorization,
        network_policy: s.network_policy,
    })
}

pub fn created_node_group_info(
    spec: &NodeGroupSpec,
    pool: &NodePool,
    project: &str,
    location: &str,
) -> NodeGroupInfo {
    NodeGroupInfo {
        id: node_pool_path(project, location, &spec.cluster_name, &spec.name),
        status: STATUS_CREATING.to_string(),
        region: spec.region.clone(),
        ..node_group_info(pool, &spec.cluster_name, &spec.region)
    }
}

pub fn node_group_info(pool: &NodePool, cluster_name: &str, region: &str) -> NodeGroupInfo {
    let config = pool.config.clone().unwrap_or_default();
    let autoscaling = pool.autoscaling.unwrap_or_default();
    let desired = pool.initial_node_count.unwrap_or_default();

    let capacity_type = match &pool.config {
        Some(c) if c.spot => "SPOT",
        Some(c) if c.preemptible => "PREEMPTIBLE",
        Some(_) => "ON_DEMAND",
        None => "",
    };

    NodeGroupInfo {
        id: pool.self_link.clone(),
        name: pool.name.clone(),
        status: pool.status.clone(),
        cluster_name: cluster_name.to_string(),
        region: region.to_string(),
        version: pool.version.clone(),
        instance_types: non_empty(&config.machine_type).into_iter().collect(),
        scaling: if autoscaling.enabled {
            ScalingConfig::new(autoscaling.min_node_count, autoscaling.max_node_count, desired)
        } else {
            ScalingConfig::new(desired, desired, desired)
        },
        capacity_type: capacity_type.to_string(),
        disk_size_gb: config.disk_size_gb.unwrap_or_default(),
        disk_type: config.disk_type.clone().unwrap_or_default(),
        image_type: config.image_type.clone(),
        labels: config.labels.clone(),
        taints: config.taints.iter().filter_map(taint_from_api).collect(),
        tags: config.resource_labels.clone(),
        management: pool.management.map(|m| NodeManagement {
            auto_repair: m.auto_repair,
            auto_upgrade: m.auto_upgrade,
        }),
        upgrade: pool.upgrade_settings.as_ref().map(|u| UpgradeSettings {
            max_surge: u.max_surge,
            max_unavailable: u.max_unavailable,
            strategy: u.strategy.clone(),
        }),
        created_at: String::new(),
        updated_at: String::new(),
    }
}

fn taint_from_api(taint: &NodeTaint) -> Option<Taint> {
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

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn positive(n: i32) -> Option<i32> {
    (n > 0).then_some(n)
}
