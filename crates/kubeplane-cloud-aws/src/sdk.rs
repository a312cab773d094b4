//! `aws-sdk-eks` backed implementation of [`EksApi`]
//!
//! Region and zone lookups go through `aws-sdk-ec2` on the same config.

use crate::api::{EksApi, EksConnector};
use crate::error::{EksError, Result};
use crate::types::{CreateClusterInput, CreateNodegroupInput, EksCluster, EksNodegroup, EksTaint};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_ec2::types::Filter;
use aws_sdk_eks::Client;
use aws_sdk_eks::config::{Credentials, Region};
use aws_sdk_eks::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_eks::primitives::{DateTime, DateTimeFormat};
use aws_sdk_eks::types::{
    AuthenticationMode, CapacityTypes, Cluster, CreateAccessConfigRequest,
    KubernetesNetworkConfigRequest, Nodegroup, NodegroupScalingConfig, Taint, TaintEffect,
    VpcConfigRequest,
};
use kubeplane_cloud::{Secrets, Tags};
use std::collections::HashMap;

pub const PROVIDER: &str = "aws";

/// Add-on present on every EKS version; its compatibility list doubles as
/// the version catalog
const VERSION_CATALOG_ADDON: &str = "vpc-cni";

fn map_sdk_error<E, R>(err: SdkError<E, R>) -> EksError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    if let Some(service) = err.as_service_error() {
        let code = service.code().unwrap_or("Unknown").to_string();
        let message = service.message().unwrap_or_default().to_string();
        if code == "ResourceNotFoundException" {
            return EksError::NotFound(message);
        }
        return EksError::Service { code, message };
    }
    EksError::Sdk(DisplayErrorContext(&err).to_string())
}

fn to_tags(map: Option<&HashMap<String, String>>) -> Tags {
    map.map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

fn to_hash_map(tags: &Tags) -> Option<HashMap<String, String>> {
    (!tags.is_empty()).then(|| tags.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

fn format_time(time: Option<&DateTime>) -> String {
    time.and_then(|t| t.fmt(DateTimeFormat::DateTime).ok())
        .unwrap_or_default()
}

fn cluster_from_sdk(cluster: &Cluster) -> EksCluster {
    let vpc = cluster.resources_vpc_config();
    EksCluster {
        name: cluster.name().unwrap_or_default().to_string(),
        arn: cluster.arn().unwrap_or_default().to_string(),
        version: cluster.version().unwrap_or_default().to_string(),
        status: cluster
            .status()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default(),
        endpoint: cluster.endpoint().unwrap_or_default().to_string(),
        certificate_authority: cluster
            .certificate_authority()
            .and_then(|c| c.data())
            .unwrap_or_default()
            .to_string(),
        created_at: format_time(cluster.created_at()),
        role_arn: cluster.role_arn().unwrap_or_default().to_string(),
        vpc_id: vpc
            .and_then(|v| v.vpc_id())
            .unwrap_or_default()
            .to_string(),
        subnet_ids: vpc.map(|v| v.subnet_ids().to_vec()).unwrap_or_default(),
        security_group_ids: vpc
            .map(|v| v.security_group_ids().to_vec())
            .unwrap_or_default(),
        service_cidr: cluster
            .kubernetes_network_config()
            .and_then(|k| k.service_ipv4_cidr())
            .unwrap_or_default()
            .to_string(),
        endpoint_public_access: vpc.is_some_and(|v| v.endpoint_public_access()),
        endpoint_private_access: vpc.is_some_and(|v| v.endpoint_private_access()),
        tags: to_tags(cluster.tags()),
    }
}

fn nodegroup_from_sdk(nodegroup: &Nodegroup) -> EksNodegroup {
    let scaling = nodegroup.scaling_config();
    EksNodegroup {
        name: nodegroup.nodegroup_name().unwrap_or_default().to_string(),
        arn: nodegroup.nodegroup_arn().unwrap_or_default().to_string(),
        cluster_name: nodegroup.cluster_name().unwrap_or_default().to_string(),
        version: nodegroup.version().unwrap_or_default().to_string(),
        status: nodegroup
            .status()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default(),
        capacity_type: nodegroup
            .capacity_type()
            .map(|c| c.as_str().to_string())
            .unwrap_or_default(),
        instance_types: nodegroup.instance_types().to_vec(),
        ami_type: nodegroup
            .ami_type()
            .map(|a| a.as_str().to_string())
            .unwrap_or_default(),
        min_size: scaling.and_then(|s| s.min_size()),
        max_size: scaling.and_then(|s| s.max_size()),
        desired_size: scaling.and_then(|s| s.desired_size()),
        disk_size: nodegroup.disk_size(),
        subnets: nodegroup.subnets().to_vec(),
        node_role: nodegroup.node_role().unwrap_or_default().to_string(),
        labels: to_tags(nodegroup.labels()),
        taints: nodegroup
            .taints()
            .iter()
            .map(|t| EksTaint {
                key: t.key().unwrap_or_default().to_string(),
                value: t.value().unwrap_or_default().to_string(),
                effect: t
                    .effect()
                    .map(|e| e.as_str().to_string())
                    .unwrap_or_default(),
            })
            .collect(),
        tags: to_tags(nodegroup.tags()),
        max_unavailable: nodegroup.update_config().and_then(|u| u.max_unavailable()),
        created_at: format_time(nodegroup.created_at()),
        modified_at: format_time(nodegroup.modified_at()),
    }
}

/// EKS client for a single region
pub struct EksSdkClient {
    client: Client,
    ec2: aws_sdk_ec2::Client,
    region: String,
}

impl EksSdkClient {
    pub fn new(client: Client, ec2: aws_sdk_ec2::Client, region: impl Into<String>) -> Self {
        Self {
            client,
            ec2,
            region: region.into(),
        }
    }
}

#[async_trait]
impl EksApi for EksSdkClient {
    fn region(&self) -> &str {
        &self.region
    }

    async fn create_cluster(&self, input: &CreateClusterInput) -> Result<EksCluster> {
        let vpc = VpcConfigRequest::builder()
            .set_subnet_ids(Some(input.subnet_ids.clone()))
            .set_security_group_ids(
                (!input.security_group_ids.is_empty()).then(|| input.security_group_ids.clone()),
            )
            .set_endpoint_private_access(input.endpoint_private_access)
            .set_endpoint_public_access(input.endpoint_public_access)
            .set_public_access_cidrs(
                (!input.public_access_cidrs.is_empty()).then(|| input.public_access_cidrs.clone()),
            )
            .build();

        let access = CreateAccessConfigRequest::builder()
            .authentication_mode(AuthenticationMode::from(input.authentication_mode.as_str()))
            .bootstrap_cluster_creator_admin_permissions(input.bootstrap_cluster_creator_admin)
            .build();

        let network = input.service_cidr.as_ref().map(|cidr| {
            KubernetesNetworkConfigRequest::builder()
                .service_ipv4_cidr(cidr)
                .build()
        });

        let output = self
            .client
            .create_cluster()
            .name(&input.name)
            .set_version(input.version.clone())
            .role_arn(&input.role_arn)
            .resources_vpc_config(vpc)
            .set_kubernetes_network_config(network)
            .access_config(access)
            .set_tags(to_hash_map(&input.tags))
            .send()
            .await
            .map_err(map_sdk_error)?;

        output
            .cluster()
            .map(cluster_from_sdk)
            .ok_or_else(|| {
                EksError::InvalidResponse("CreateCluster returned no cluster".to_string())
            })
    }

    async fn describe_cluster(&self, name: &str) -> Result<EksCluster> {
        let output = self
            .client
            .describe_cluster()
            .name(name)
            .send()
            .await
            .map_err(map_sdk_error)?;

        output
            .cluster()
            .map(cluster_from_sdk)
            .ok_or_else(|| EksError::NotFound(name.to_string()))
    }

    async fn list_clusters(&self) -> Result<Vec<String>> {
        self.client
            .list_clusters()
            .into_paginator()
            .items()
            .send()
            .try_collect()
            .await
            .map_err(map_sdk_error)
    }

    async fn delete_cluster(&self, name: &str) -> Result<()> {
        self.client
            .delete_cluster()
            .name(name)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn create_nodegroup(&self, input: &CreateNodegroupInput) -> Result<EksNodegroup> {
        let scaling = NodegroupScalingConfig::builder()
            .min_size(input.min_size)
            .max_size(input.max_size)
            .desired_size(input.desired_size)
            .build();

        let taints: Vec<Taint> = input
            .taints
            .iter()
            .map(|t| {
                Taint::builder()
                    .key(&t.key)
                    .value(&t.value)
                    .effect(TaintEffect::from(t.effect.as_str()))
                    .build()
            })
            .collect();

        let output = self
            .client
            .create_nodegroup()
            .cluster_name(&input.cluster_name)
            .nodegroup_name(&input.name)
            .node_role(&input.node_role)
            .set_subnets(Some(input.subnets.clone()))
            .set_instance_types(Some(input.instance_types.clone()))
            .scaling_config(scaling)
            .set_disk_size(input.disk_size)
            .set_capacity_type(input.capacity_type.as_deref().map(CapacityTypes::from))
            .set_labels(to_hash_map(&input.labels))
            .set_taints((!taints.is_empty()).then_some(taints))
            .set_tags(to_hash_map(&input.tags))
            .send()
            .await
            .map_err(map_sdk_error)?;

        output
            .nodegroup()
            .map(nodegroup_from_sdk)
            .ok_or_else(|| {
                EksError::InvalidResponse("CreateNodegroup returned no nodegroup".to_string())
            })
    }

    async fn describe_nodegroup(&self, cluster: &str, name: &str) -> Result<EksNodegroup> {
        let output = self
            .client
            .describe_nodegroup()
            .cluster_name(cluster)
            .nodegroup_name(name)
            .send()
            .await
            .map_err(map_sdk_error)?;

        output
            .nodegroup()
            .map(nodegroup_from_sdk)
            .ok_or_else(|| EksError::NotFound(name.to_string()))
    }

    async fn list_nodegroups(&self, cluster: &str) -> Result<Vec<String>> {
        self.client
            .list_nodegroups()
            .cluster_name(cluster)
            .into_paginator()
            .items()
            .send()
            .try_collect()
            .await
            .map_err(map_sdk_error)
    }

    async fn delete_nodegroup(&self, cluster: &str, name: &str) -> Result<()> {
        self.client
            .delete_nodegroup()
            .cluster_name(cluster)
            .nodegroup_name(name)
            .send()
            .await
            .map_err(map_sdk_error)?;
        Ok(())
    }

    async fn list_versions(&self) -> Result<Vec<String>> {
        let addons = self
            .client
            .describe_addon_versions()
            .addon_name(VERSION_CATALOG_ADDON)
            .into_paginator()
            .items()
            .send()
            .try_collect()
            .await
            .map_err(map_sdk_error)?;

        Ok(addons
            .iter()
            .flat_map(|addon| addon.addon_versions())
            .flat_map(|version| version.compatibilities())
            .filter_map(|compat| compat.cluster_version())
            .map(str::to_string)
            .collect())
    }

    async fn list_regions(&self) -> Result<Vec<String>> {
        let output = self
            .ec2
            .describe_regions()
            .all_regions(false)
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(output
            .regions()
            .iter()
            .filter_map(|r| r.region_name())
            .map(str::to_string)
            .collect())
    }

    async fn list_zones(&self) -> Result<Vec<String>> {
        let output = self
            .ec2
            .describe_availability_zones()
            .filters(Filter::builder().name("state").values("available").build())
            .filters(
                Filter::builder()
                    .name("zone-type")
                    .values("availability-zone")
                    .build(),
            )
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(output
            .availability_zones()
            .iter()
            .filter_map(|z| z.zone_name())
            .map(str::to_string)
            .collect())
    }
}

/// Builds region-bound SDK clients from static access keys
#[derive(Debug, Clone, Default)]
pub struct SdkConnector;

#[async_trait]
impl EksConnector for SdkConnector {
    async fn connect(
        &self,
        secrets: &Secrets,
        region: &str,
    ) -> kubeplane_cloud::Result<Box<dyn EksApi>> {
        let access_key = secrets.require(PROVIDER, "access_key")?;
        let secret_key = secrets.require(PROVIDER, "secret_key")?;
        let session_token = secrets.get_str("session_token").map(str::to_string);

        let credentials =
            Credentials::new(access_key, secret_key, session_token, None, "kubeplane");
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(credentials)
            .load()
            .await;

        tracing::debug!("Connected EKS client for {}", region);

        Ok(Box::new(EksSdkClient::new(
            Client::new(&config),
            aws_sdk_ec2::Client::new(&config),
            region,
        )))
    }
}
