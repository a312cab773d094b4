//! Cluster driver trait definition

use crate::credential::Secrets;
use crate::error::{ClusterError, Result};
use crate::model::{
    ClusterInfo, ClusterRef, ClusterSpec, NodeGroupInfo, NodeGroupRef, NodeGroupSpec, Operation,
};
use async_trait::async_trait;

/// Cluster lifecycle driver
///
/// Every backend (GKE, EKS, ...) implements this trait. Drivers translate the
/// normalized model to provider-native calls and back; native types never
/// leave the driver. Secrets are passed per call and must not be retained.
#[async_trait]
pub trait ClusterDriver: Send + Sync {
    /// Provider identifier used for dispatch (e.g., "gcp", "aws")
    fn provider(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    async fn create_cluster(&self, secrets: &Secrets, spec: &ClusterSpec) -> Result<ClusterInfo>;

    /// Lists every cluster visible in the region, zonal ones included
    async fn list_clusters(&self, secrets: &Secrets, region: &str) -> Result<Vec<ClusterInfo>>;

    async fn get_cluster(&self, secrets: &Secrets, cluster: &ClusterRef) -> Result<ClusterInfo>;

    async fn delete_cluster(&self, secrets: &Secrets, cluster: &ClusterRef) -> Result<()>;

    /// Renders a kubeconfig document for the cluster
    async fn kubeconfig(&self, secrets: &Secrets, cluster: &ClusterRef) -> Result<String>;

    async fn create_node_group(
        &self,
        secrets: &Secrets,
        spec: &NodeGroupSpec,
    ) -> Result<NodeGroupInfo>;

    async fn list_node_groups(
        &self,
        secrets: &Secrets,
        cluster: &ClusterRef,
    ) -> Result<Vec<NodeGroupInfo>>;

    async fn get_node_group(
        &self,
        secrets: &Secrets,
        node_group: &NodeGroupRef,
    ) -> Result<NodeGroupInfo>;

    async fn delete_node_group(&self, secrets: &Secrets, node_group: &NodeGroupRef) -> Result<()>;

    /// Kubernetes versions the provider accepts for new clusters, newest first
    async fn list_versions(&self, secrets: &Secrets, region: &str) -> Result<Vec<String>>;

    /// Regions enabled for the account or project
    async fn list_regions(&self, secrets: &Secrets) -> Result<Vec<String>>;

    /// Zones available under the region
    async fn list_zones(&self, secrets: &Secrets, region: &str) -> Result<Vec<String>>;
}

/// Placeholder for providers that are registered but not built yet.
/// Every operation fails with [`ClusterError::UnsupportedOperation`].
#[derive(Debug, Clone)]
pub struct UnimplementedDriver {
    provider: String,
    display_name: String,
}

impl UnimplementedDriver {
    pub fn new(provider: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            display_name: display_name.into(),
        }
    }

    fn unsupported<T>(&self, operation: Operation) -> Result<T> {
        tracing::debug!("{} does not implement {}", self.provider, operation);
        Err(ClusterError::unsupported(self.provider.clone(), operation))
    }
}

#[async_trait]
impl ClusterDriver for UnimplementedDriver {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    async fn create_cluster(&self, _secrets: &Secrets, _spec: &ClusterSpec) -> Result<ClusterInfo> {
        self.unsupported(Operation::CreateCluster)
    }

    async fn list_clusters(&self, _secrets: &Secrets, _region: &str) -> Result<Vec<ClusterInfo>> {
        self.unsupported(Operation::ListClusters)
    }

    async fn get_cluster(&self, _secrets: &Secrets, _cluster: &ClusterRef) -> Result<ClusterInfo> {
        self.unsupported(Operation::GetCluster)
    }

    async fn delete_cluster(&self, _secrets: &Secrets, _cluster: &ClusterRef) -> Result<()> {
        self.unsupported(Operation::DeleteCluster)
    }

    async fn kubeconfig(&self, _secrets: &Secrets, _cluster: &ClusterRef) -> Result<String> {
        self.unsupported(Operation::GetKubeconfig)
    }

    async fn create_node_group(
        &self,
        _secrets: &Secrets,
        _spec: &NodeGroupSpec,
    ) -> Result<NodeGroupInfo> {
        self.unsupported(Operation::CreateNodeGroup)
    }

    async fn list_node_groups(
        &self,
        _secrets: &Secrets,
        _cluster: &ClusterRef,
    ) -> Result<Vec<NodeGroupInfo>> {
        self.unsupported(Operation::ListNodeGroups)
    }

    async fn get_node_group(
        &self,
        _secrets: &Secrets,
        _node_group: &NodeGroupRef,
    ) -> Result<NodeGroupInfo> {
        self.unsupported(Operation::GetNodeGroup)
    }

    async fn delete_node_group(
        &self,
        _secrets: &Secrets,
        _node_group: &NodeGroupRef,
    ) -> Result<()> {
        self.unsupported(Operation::DeleteNodeGroup)
    }

    async fn list_versions(&self, _secrets: &Secrets, _region: &str) -> Result<Vec<String>> {
        self.unsupported(Operation::ListVersions)
    }

    async fn list_regions(&self, _secrets: &Secrets) -> Result<Vec<String>> {
        self.unsupported(Operation::ListRegions)
    }

    async fn list_zones(&self, _secrets: &Secrets, _region: &str) -> Result<Vec<String>> {
        self.unsupported(Operation::ListZones)
    }
}
