//! GKE cluster driver

use crate::api::{GkeApi, GkeConnector};
use crate::client::{PROVIDER, RestConnector};
use crate::convert;
use crate::error::GkeError;
use async_trait::async_trait;
use kubeplane_cloud::kubeconfig::{self, ClusterAuth, ExecPlugin};
use kubeplane_cloud::{
    ClusterDriver, ClusterError, ClusterInfo, ClusterRef, ClusterSpec, LocationProber,
    NodeGroupInfo, NodeGroupRef, NodeGroupSpec, Operation, ProbeConfig, Result, Secrets,
    TagPolicy,
};
use std::collections::HashSet;
use std::sync::Arc;

const AUTH_PLUGIN: &str = "gke-gcloud-auth-plugin";
const AUTH_PLUGIN_INSTALL_HINT: &str = concat!(
    "Install gke-gcloud-auth-plugin for use with kubectl by following ",
    "https://cloud.google.com/kubernetes-engine/docs/how-to/cluster-access-for-kubectl",
    "#install_plugin"
);

/// Compute Engine reports usable regions and zones as `UP`
const LOCATION_UP: &str = "UP";

/// Maps a GKE failure. A 404 becomes `NotFoundAnyLocation` for the one
/// location asked, so probing can tell a miss from a real failure.
fn api_error(operation: Operation, resource: &str, location: &str, err: GkeError) -> ClusterError {
    if err.is_not_found() {
        return ClusterError::NotFoundAnyLocation {
            provider: PROVIDER.to_string(),
            resource: resource.to_string(),
            candidates: vec![location.to_string()],
            last_error: None,
        };
    }
    ClusterError::provider_api(PROVIDER, operation, resource, location, err)
}

/// Google Kubernetes Engine driver
///
/// GKE clusters live either at a region or at one of its zones, so every
/// named lookup goes through the [`LocationProber`].
pub struct GkeDriver {
    connector: Arc<dyn GkeConnector>,
    prober: LocationProber,
}

impl GkeDriver {
    pub fn new(connector: Arc<dyn GkeConnector>, probe: ProbeConfig) -> Self {
        Self {
            connector,
            prober: LocationProber::new(PROVIDER, probe),
        }
    }

    /// Driver backed by the GKE REST API
    pub fn rest(
        api_base: impl Into<String>,
        token_uri: Option<String>,
        probe: ProbeConfig,
    ) -> Self {
        Self::new(Arc::new(RestConnector::new(api_base, token_uri)), probe)
    }

    /// Finds the cluster and the location it answered at
    async fn locate_cluster(
        &self,
        api: &dyn GkeApi,
        operation: Operation,
        cluster: &ClusterRef,
    ) -> Result<(String, crate::types::Cluster)> {
        let name = cluster.name.as_str();
        let resource = format!("cluster {}", name);
        let resolved = self
            .prober
            .locate(operation, &cluster.region, &resource, |location| async move {
                api.get_cluster(&location, name)
                    .await
                    .map_err(|e| api_error(operation, name, &location, e))
            })
            .await?;
        Ok((resolved.location, resolved.value))
    }
}

#[async_trait]
impl ClusterDriver for GkeDriver {
    fn provider(&self) -> &str {
        PROVIDER
    }

    fn display_name(&self) -> &str {
        "Google Kubernetes Engine"
    }

    async fn create_cluster(&self, secrets: &Secrets, spec: &ClusterSpec) -> Result<ClusterInfo> {
        let has_network = spec
            .network
            .as_ref()
            .is_some_and(|n| !n.vpc_id.is_empty() || n.first_subnet().is_some());
        if !has_network {
            return Err(ClusterError::MissingNetworkConfig {
                provider: PROVIDER.to_string(),
                cluster: spec.name.clone(),
            });
        }
        match (&spec.node_pool, spec.autopilot) {
            (None, false) => {
                return Err(ClusterError::MissingNodePoolConfig {
                    provider: PROVIDER.to_string(),
                    cluster: spec.name.clone(),
                });
            }
            (Some(_), true) => {
                return Err(ClusterError::InvalidRequest(format!(
                    "autopilot cluster {} cannot declare a node pool",
                    spec.name
                )));
            }
            (Some(pool), false) => pool.validate()?,
            (None, true) => {}
        }

        let labels = TagPolicy::GcpLabels.normalize(&spec.tags);
        let api = self.connector.connect(secrets).await?;
        let project = api.project_id().to_string();
        let location = spec.location();
        let payload = convert::cluster_payload(spec, &project, labels.clone());

        tracing::info!("Creating GKE cluster {} at {}", spec.name, location);

        let operation = api
            .create_cluster(location, &payload)
            .await
            .map_err(|e| api_error(Operation::CreateCluster, &spec.name, location, e))?;

        tracing::debug!("GKE operation {} started", operation.name);

        Ok(convert::created_cluster_info(spec, &project, labels))
    }

    async fn list_clusters(&self, secrets: &Secrets, region: &str) -> Result<Vec<ClusterInfo>> {
        let api = self.connector.connect(secrets).await?;
        let api = api.as_ref();
        let project = api.project_id().to_string();

        let hits = self
            .prober
            .enumerate(Operation::ListClusters, region, |location| async move {
                api.list_clusters(&location)
                    .await
                    .map_err(|e| api_error(Operation::ListClusters, "clusters", &location, e))
            })
            .await?;

        let mut seen = HashSet::new();
        let mut clusters = Vec::new();
        for hit in hits {
            for cluster in &hit.value {
                let info = convert::cluster_info(cluster, &project, region, &hit.location);
                if seen.insert(info.id.clone()) {
                    clusters.push(info);
                }
            }
        }
        Ok(clusters)
    }

    async fn get_cluster(&self, secrets: &Secrets, cluster: &ClusterRef) -> Result<ClusterInfo> {
        let api = self.connector.connect(secrets).await?;
        let (location, found) = self
            .locate_cluster(api.as_ref(), Operation::GetCluster, cluster)
            .await?;
        Ok(convert::cluster_info(
            &found,
            api.project_id(),
            &cluster.region,
            &location,
        ))
    }

    async fn delete_cluster(&self, secrets: &Secrets, cluster: &ClusterRef) -> Result<()> {
        let api = self.connector.connect(secrets).await?;
        let (location, _) = self
            .locate_cluster(api.as_ref(), Operation::DeleteCluster, cluster)
            .await?;

        tracing::info!("Deleting GKE cluster {} at {}", cluster.name, location);

        api.delete_cluster(&location, &cluster.name)
            .await
            .map_err(|e| api_error(Operation::DeleteCluster, &cluster.name, &location, e))?;
        Ok(())
    }

    async fn kubeconfig(&self, secrets: &Secrets, cluster: &ClusterRef) -> Result<String> {
        let api = self.connector.connect(secrets).await?;
        let (location, found) = self
            .locate_cluster(api.as_ref(), Operation::GetKubeconfig, cluster)
            .await?;

        let ca_data = found
            .master_auth
            .as_ref()
            .map(|m| m.cluster_ca_certificate.as_str())
            .unwrap_or_default();
        if found.endpoint.is_empty() || ca_data.is_empty() {
            return Err(ClusterError::ClusterNotReady {
                cluster: cluster.name.clone(),
                reason: format!(
                    "endpoint or CA certificate not yet published (status {})",
                    found.status
                ),
            });
        }

        let context_location = if found.location.is_empty() {
            location.as_str()
        } else {
            found.location.as_str()
        };
        let context = kubeconfig::context_name(
            &format!("gke_{}", api.project_id()),
            context_location,
            &cluster.name,
        );
        let auth = ClusterAuth::Exec(
            ExecPlugin::new(AUTH_PLUGIN)
                .install_hint(AUTH_PLUGIN_INSTALL_HINT)
                .provide_cluster_info(true),
        );
        kubeconfig::render(&context, &found.endpoint, ca_data, &auth)
    }

    async fn create_node_group(
        &self,
        secrets: &Secrets,
        spec: &NodeGroupSpec,
    ) -> Result<NodeGroupInfo> {
        spec.scaling.validate(&spec.name)?;
        let labels = TagPolicy::GcpLabels.normalize(&spec.tags);
        let payload = convert::node_pool_payload(spec, labels)?;

        let api = self.connector.connect(secrets).await?;
        let cluster = ClusterRef::new(spec.cluster_name.clone(), spec.region.clone());
        let (location, _) = self
            .locate_cluster(api.as_ref(), Operation::CreateNodeGroup, &cluster)
            .await?;

        tracing::info!(
            "Creating GKE node pool {} in cluster {} at {}",
            spec.name,
            spec.cluster_name,
            location
        );

        api.create_node_pool(&location, &spec.cluster_name, &payload)
            .await
            .map_err(|e| api_error(Operation::CreateNodeGroup, &spec.name, &location, e))?;

        Ok(convert::created_node_group_info(
            spec,
            &payload,
            api.project_id(),
            &location,
        ))
    }

    async fn list_node_groups(
        &self,
        secrets: &Secrets,
        cluster: &ClusterRef,
    ) -> Result<Vec<NodeGroupInfo>> {
        let api = self.connector.connect(secrets).await?;
        let api = api.as_ref();
        let name = cluster.name.as_str();
        let resource = format!("cluster {}", name);

        let resolved = self
            .prober
            .locate(
                Operation::ListNodeGroups,
                &cluster.region,
                &resource,
                |location| async move {
                    api.list_node_pools(&location, name)
                        .await
                        .map_err(|e| api_error(Operation::ListNodeGroups, name, &location, e))
                },
            )
            .await?;

        Ok(resolved
            .value
            .iter()
            .map(|pool| convert::node_group_info(pool, name, &cluster.region))
            .collect())
    }

    async fn get_node_group(
        &self,
        secrets: &Secrets,
        node_group: &NodeGroupRef,
    ) -> Result<NodeGroupInfo> {
        let api = self.connector.connect(secrets).await?;
        let api = api.as_ref();
        let cluster = node_group.cluster_name.as_str();
        let name = node_group.name.as_str();
        let resource = format!("node pool {} in cluster {}", name, cluster);

        let resolved = self
            .prober
            .locate(
                Operation::GetNodeGroup,
                &node_group.region,
                &resource,
                |location| async move {
                    api.get_node_pool(&location, cluster, name)
                        .await
                        .map_err(|e| api_error(Operation::GetNodeGroup, name, &location, e))
                },
            )
            .await?;

        Ok(convert::node_group_info(
            &resolved.value,
            cluster,
            &node_group.region,
        ))
    }

    async fn delete_node_group(&self, secrets: &Secrets, node_group: &NodeGroupRef) -> Result<()> {
        let api = self.connector.connect(secrets).await?;
        let api = api.as_ref();
        let cluster = node_group.cluster_name.as_str();
        let name = node_group.name.as_str();
        let resource = format!("node pool {} in cluster {}", name, cluster);

        let resolved = self
            .prober
            .locate(
                Operation::DeleteNodeGroup,
                &node_group.region,
                &resource,
                |location| async move {
                    api.get_node_pool(&location, cluster, name)
                        .await
                        .map_err(|e| api_error(Operation::DeleteNodeGroup, name, &location, e))
                },
            )
            .await?;

        tracing::info!(
            "Deleting GKE node pool {} in cluster {} at {}",
            name,
            cluster,
            resolved.location
        );

        api.delete_node_pool(&resolved.location, cluster, name)
            .await
            .map_err(|e| api_error(Operation::DeleteNodeGroup, name, &resolved.location, e))?;
        Ok(())
    }

    async fn list_versions(&self, secrets: &Secrets, region: &str) -> Result<Vec<String>> {
        if region.is_empty() {
            return Err(ClusterError::InvalidRequest(
                "GKE version lookup needs a region or zone".to_string(),
            ));
        }
        let api = self.connector.connect(secrets).await?;
        let config = api
            .get_server_config(region)
            .await
            .map_err(|e| api_error(Operation::ListVersions, "server config", region, e))?;

        tracing::debug!(
            "GKE default version at {} is {}",
            region,
            config.default_cluster_version
        );
        Ok(config.valid_master_versions)
    }

    async fn list_regions(&self, secrets: &Secrets) -> Result<Vec<String>> {
        let api = self.connector.connect(secrets).await?;
        let project = api.project_id().to_string();
        let regions = api
            .list_regions()
            .await
            .map_err(|e| api_error(Operation::ListRegions, "regions", &project, e))?;

        let mut names: Vec<String> = regions
            .into_iter()
            .filter(|r| r.status == LOCATION_UP)
            .map(|r| r.name)
            .collect();
        names.sort();
        Ok(names)
    }

    async fn list_zones(&self, secrets: &Secrets, region: &str) -> Result<Vec<String>> {
        let api = self.connector.connect(secrets).await?;
        let zones = api
            .list_zones()
            .await
            .map_err(|e| api_error(Operation::ListZones, "zones", region, e))?;

        let mut names: Vec<String> = zones
            .into_iter()
            .filter(|z| z.status == LOCATION_UP && (region.is_empty() || z.region_name() == region))
            .map(|z| z.name)
            .collect();
        names.sort();
        Ok(names)
    }
}
