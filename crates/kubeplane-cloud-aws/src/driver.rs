//! EKS cluster driver

use crate::api::{EksApi, EksConnector};
use crate::convert;
use crate::error::EksError;
use crate::sdk::{PROVIDER, SdkConnector};
use async_trait::async_trait;
use kubeplane_cloud::kubeconfig::{self, ClusterAuth, ExecPlugin};
use kubeplane_cloud::{
    ClusterDriver, ClusterError, ClusterInfo, ClusterRef, ClusterSpec, NodeGroupInfo,
    NodeGroupRef, NodeGroupSpec, Operation, Result, STATUS_CREATING, Secrets, TagPolicy,
};
use std::sync::Arc;

pub const DEFAULT_REGION: &str = "us-east-1";

/// Maps an EKS failure. A missing resource becomes `NotFoundAnyLocation`
/// with the single region that was searched.
fn api_error(operation: Operation, resource: &str, region: &str, err: EksError) -> ClusterError {
    if err.is_not_found() {
        return ClusterError::NotFoundAnyLocation {
            provider: PROVIDER.to_string(),
            resource: resource.to_string(),
            candidates: vec![region.to_string()],
            last_error: None,
        };
    }
    ClusterError::provider_api(PROVIDER, operation, resource, region, err)
}

/// Amazon EKS driver
///
/// EKS clusters are addressed by name within a region, so no probing is
/// needed. Tags are passed through unchanged.
pub struct EksDriver {
    connector: Arc<dyn EksConnector>,
    default_region: String,
}

impl EksDriver {
    pub fn new(connector: Arc<dyn EksConnector>, default_region: impl Into<String>) -> Self {
        Self {
            connector,
            default_region: default_region.into(),
        }
    }

    /// Driver backed by `aws-sdk-eks`
    pub fn sdk(default_region: impl Into<String>) -> Self {
        Self::new(Arc::new(SdkConnector), default_region)
    }

    /// Request region, then the credential's `region`, then the default
    pub fn resolve_region(&self, requested: &str, secrets: &Secrets) -> String {
        if !requested.is_empty() {
            return requested.to_string();
        }
        secrets
            .get_str("region")
            .unwrap_or(&self.default_region)
            .to_string()
    }

    async fn connect(&self, secrets: &Secrets, requested: &str) -> Result<Box<dyn EksApi>> {
        let region = self.resolve_region(requested, secrets);
        self.connector.connect(secrets, &region).await
    }
}

#[async_trait]
impl ClusterDriver for EksDriver {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn display_name(&self) -> &str {
        "Amazon Elastic Kubernetes Service"
    }

    async fn create_cluster(&self, secrets: &Secrets, spec: &ClusterSpec) -> Result<ClusterInfo> {
        if spec
            .network
            .as_ref()
            .and_then(|n| n.first_subnet())
            .is_none()
        {
            return Err(ClusterError::MissingNetworkConfig {
                provider: PROVIDER.to_string(),
                cluster: spec.name.clone(),
            });
        }
        if spec.autopilot {
            return Err(ClusterError::InvalidRequest(
                "EKS has no autopilot mode; create node groups explicitly".to_string(),
            ));
        }
        if spec.node_pool.is_some() {
            return Err(ClusterError::InvalidRequest(format!(
                "EKS cluster {} cannot declare a node pool; \
                 use CreateNodeGroup once the cluster is active",
                spec.name
            )));
        }
        let role_arn = spec
            .role_arn
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| {
                ClusterError::InvalidRequest(format!(
                    "EKS cluster {} requires role_arn",
                    spec.name
                ))
            })?;

        let tags = TagPolicy::Passthrough.normalize(&spec.tags);
        let input = convert::create_cluster_input(spec, role_arn, tags.clone());

        let api = self.connect(secrets, &spec.region).await?;
        let region = api.region().to_string();

        tracing::info!("Creating EKS cluster {} in {}", spec.name, region);

        let created = api
            .create_cluster(&input)
            .await
            .map_err(|e| api_error(Operation::CreateCluster, &spec.name, &region, e))?;

        Ok(ClusterInfo {
            id: if created.arn.is_empty() {
                spec.name.clone()
            } else {
                created.arn
            },
            name: spec.name.clone(),
            version: spec.version.clone(),
            status: STATUS_CREATING.to_string(),
            region,
            tags,
            ..Default::default()
        })
    }

    async fn list_clusters(&self, secrets: &Secrets, region: &str) -> Result<Vec<ClusterInfo>> {
        let api = self.connect(secrets, region).await?;
        let region = api.region().to_string();

        let names = api
            .list_clusters()
            .await
            .map_err(|e| api_error(Operation::ListClusters, "clusters", &region, e))?;

        let mut clusters = Vec::with_capacity(names.len());
        for name in names {
            match api.describe_cluster(&name).await {
                Ok(cluster) => clusters.push(convert::cluster_info(&cluster, &region)),
                Err(e) => tracing::warn!("Skipping EKS cluster {} in {}: {}", name, region, e),
            }
        }
        Ok(clusters)
    }

    async fn get_cluster(&self, secrets: &Secrets, cluster: &ClusterRef) -> Result<ClusterInfo> {
        let api = self.connect(secrets, &cluster.region).await?;
        let region = api.region().to_string();
        let found = api
            .describe_cluster(&cluster.name)
            .await
            .map_err(|e| api_error(Operation::GetCluster, &cluster.name, &region, e))?;
        Ok(convert::cluster_info(&found, &region))
    }

    async fn delete_cluster(&self, secrets: &Secrets, cluster: &ClusterRef) -> Result<()> {
        let api = self.connect(secrets, &cluster.region).await?;
        let region = api.region().to_string();

        tracing::info!("Deleting EKS cluster {} in {}", cluster.name, region);

        api.delete_cluster(&cluster.name)
            .await
            .map_err(|e| api_error(Operation::DeleteCluster, &cluster.name, &region, e))
    }

    async fn kubeconfig(&self, secrets: &Secrets, cluster: &ClusterRef) -> Result<String> {
        let api = self.connect(secrets, &cluster.region).await?;
        let region = api.region().to_string();
        let found = api
            .describe_cluster(&cluster.name)
            .await
            .map_err(|e| api_error(Operation::GetKubeconfig, &cluster.name, &region, e))?;

        if found.endpoint.is_empty() || found.certificate_authority.is_empty() {
            return Err(ClusterError::ClusterNotReady {
                cluster: cluster.name.clone(),
                reason: format!(
                    "endpoint or CA certificate not yet published (status {})",
                    found.status
                ),
            });
        }

        let context = kubeconfig::context_name("eks", &region, &cluster.name);
        let auth = ClusterAuth::Exec(ExecPlugin::new("aws").args([
            "eks",
            "get-token",
            "--cluster-name",
            cluster.name.as_str(),
            "--region",
            region.as_str(),
        ]));
        kubeconfig::render(&context, &found.endpoint, &found.certificate_authority, &auth)
    }

    async fn create_node_group(
        &self,
        secrets: &Secrets,
        spec: &NodeGroupSpec,
    ) -> Result<NodeGroupInfo> {
        spec.scaling.validate(&spec.name)?;
        let node_role = spec
            .node_role
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| {
                ClusterError::InvalidRequest(format!(
                    "EKS node group {} requires node_role",
                    spec.name
                ))
            })?;
        if spec.subnet_ids.is_empty() {
            return Err(ClusterError::MissingNetworkConfig {
                provider: PROVIDER.to_string(),
                cluster: spec.cluster_name.clone(),
            });
        }
        if spec.instance_types.is_empty() {
            return Err(ClusterError::InvalidRequest(format!(
                "EKS node group {} needs at least one instance type",
                spec.name
            )));
        }
        let input = convert::create_nodegroup_input(spec, node_role)?;

        let api = self.connect(secrets, &spec.region).await?;
        let region = api.region().to_string();

        tracing::info!(
            "Creating EKS node group {} in cluster {} ({})",
            spec.name,
            spec.cluster_name,
            region
        );

        let created = api
            .create_nodegroup(&input)
            .await
            .map_err(|e| api_error(Operation::CreateNodeGroup, &spec.name, &region, e))?;

        Ok(NodeGroupInfo {
            status: STATUS_CREATING.to_string(),
            cluster_name: spec.cluster_name.clone(),
            name: spec.name.clone(),
            instance_types: spec.instance_types.clone(),
            scaling: spec.scaling,
            ..convert::node_group_info(&created, &region)
        })
    }

    async fn list_node_groups(
        &self,
        secrets: &Secrets,
        cluster: &ClusterRef,
    ) -> Result<Vec<NodeGroupInfo>> {
        let api = self.connect(secrets, &cluster.region).await?;
        let region = api.region().to_string();
        let resource = format!("cluster {}", cluster.name);

        let names = api
            .list_nodegroups(&cluster.name)
            .await
            .map_err(|e| api_error(Operation::ListNodeGroups, &resource, &region, e))?;

        let mut node_groups = Vec::with_capacity(names.len());
        for name in names {
            match api.describe_nodegroup(&cluster.name, &name).await {
                Ok(nodegroup) => node_groups.push(convert::node_group_info(&nodegroup, &region)),
                Err(e) => tracing::warn!(
                    "Skipping EKS node group {} of {}: {}",
                    name,
                    cluster.name,
                    e
                ),
            }
        }
        Ok(node_groups)
    }

    async fn get_node_group(
        &self,
        secrets: &Secrets,
        node_group: &NodeGroupRef,
    ) -> Result<NodeGroupInfo> {
        let api = self.connect(secrets, &node_group.region).await?;
        let region = api.region().to_string();
        let resource = format!(
            "node group {} in cluster {}",
            node_group.name, node_group.cluster_name
        );

        let found = api
            .describe_nodegroup(&node_group.cluster_name, &node_group.name)
            .await
            .map_err(|e| api_error(Operation::GetNodeGroup, &resource, &region, e))?;
        Ok(convert::node_group_info(&found, &region))
    }

    async fn delete_node_group(&self, secrets: &Secrets, node_group: &NodeGroupRef) -> Result<()> {
        let api = self.connect(secrets, &node_group.region).await?;
        let region = api.region().to_string();
        let resource = format!(
            "node group {} in cluster {}",
            node_group.name, node_group.cluster_name
        );

        tracing::info!("Deleting EKS {} ({})", resource, region);

        api.delete_nodegroup(&node_group.cluster_name, &node_group.name)
            .await
            .map_err(|e| api_error(Operation::DeleteNodeGroup, &resource, &region, e))
    }

    async fn list_versions(&self, secrets: &Secrets, region: &str) -> Result<Vec<String>> {
        let api = self.connect(secrets, region).await?;
        let region = api.region().to_string();
        let versions = api
            .list_versions()
            .await
            .map_err(|e| api_error(Operation::ListVersions, "cluster versions", &region, e))?;
        Ok(convert::sort_versions(versions))
    }

    /// Asks the credential's region, or the default one, for the region list
    async fn list_regions(&self, secrets: &Secrets) -> Result<Vec<String>> {
        let api = self.connect(secrets, "").await?;
        let region = api.region().to_string();
        let mut regions = api
            .list_regions()
            .await
            .map_err(|e| api_error(Operation::ListRegions, "regions", &region, e))?;
        regions.sort();
        Ok(regions)
    }

    async fn list_zones(&self, secrets: &Secrets, region: &str) -> Result<Vec<String>> {
        let api = self.connect(secrets, region).await?;
        let region = api.region().to_string();
        let mut zones = api
            .list_zones()
            .await
            .map_err(|e| api_error(Operation::ListZones, "zones", &region, e))?;
        zones.sort();
        Ok(zones)
    }
}
