//! GKE API seam
//!
//! The driver talks to GKE only through [`GkeApi`]. A [`GkeConnector`] builds
//! an authenticated client from decrypted secrets once per operation.

use crate::error::Result;
use crate::types::{Cluster, ComputeRegion, ComputeZone, NodePool, Operation, ServerConfig};
use async_trait::async_trait;
use kubeplane_cloud::Secrets;

/// Location-scoped GKE calls for a single project
#[async_trait]
pub trait GkeApi: Send + Sync {
    fn project_id(&self) -> &str;

    async fn get_cluster(&self, location: &str, name: &str) -> Result<Cluster>;

    async fn list_clusters(&self, location: &str) -> Result<Vec<Cluster>>;

    async fn create_cluster(&self, location: &str, cluster: &Cluster) -> Result<Operation>;

    async fn delete_cluster(&self, location: &str, name: &str) -> Result<Operation>;

    async fn list_node_pools(&self, location: &str, cluster: &str) -> Result<Vec<NodePool>>;

    async fn get_node_pool(&self, location: &str, cluster: &str, name: &str) -> Result<NodePool>;

    async fn create_node_pool(
        &self,
        location: &str,
        cluster: &str,
        node_pool: &NodePool,
    ) -> Result<Operation>;

    async fn delete_node_pool(&self, location: &str, cluster: &str, name: &str)
    -> Result<Operation>;

    /// Supported Kubernetes versions at a location
    async fn get_server_config(&self, location: &str) -> Result<ServerConfig>;

    /// Compute Engine regions of the project
    async fn list_regions(&self) -> Result<Vec<ComputeRegion>>;

    /// Compute Engine zones of the project, every region
    async fn list_zones(&self) -> Result<Vec<ComputeZone>>;
}

#[async_trait]
pub trait GkeConnector: Send + Sync {
    async fn connect(&self, secrets: &Secrets) -> kubeplane_cloud::Result<Box<dyn GkeApi>>;
}
