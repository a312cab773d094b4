//! EKS API seam

use crate::error::Result;
use crate::types::{CreateClusterInput, CreateNodegroupInput, EksCluster, EksNodegroup};
use async_trait::async_trait;
use kubeplane_cloud::Secrets;

/// Region-bound EKS calls, plus the EC2 location lookups made with the
/// same credentials
#[async_trait]
pub trait EksApi: Send + Sync {
    fn region(&self) -> &str;

    async fn create_cluster(&self, input: &CreateClusterInput) -> Result<EksCluster>;

    async fn describe_cluster(&self, name: &str) -> Result<EksCluster>;

    /// Cluster names, every page
    async fn list_clusters(&self) -> Result<Vec<String>>;

    async fn delete_cluster(&self, name: &str) -> Result<()>;

    async fn create_nodegroup(&self, input: &CreateNodegroupInput) -> Result<EksNodegroup>;

    async fn describe_nodegroup(&self, cluster: &str, name: &str) -> Result<EksNodegroup>;

    async fn list_nodegroups(&self, cluster: &str) -> Result<Vec<String>>;

    async fn delete_nodegroup(&self, cluster: &str, name: &str) -> Result<()>;

    /// Cluster versions named by add-on compatibility, unsorted and possibly repeated
    async fn list_versions(&self) -> Result<Vec<String>>;

    /// Regions enabled for the account
    async fn list_regions(&self) -> Result<Vec<String>>;

    /// Available zones in this client's region
    async fn list_zones(&self) -> Result<Vec<String>>;
}

#[async_trait]
pub trait EksConnector: Send + Sync {
    async fn connect(&self, secrets: &Secrets, region: &str)
    -> kubeplane_cloud::Result<Box<dyn EksApi>>;
}
