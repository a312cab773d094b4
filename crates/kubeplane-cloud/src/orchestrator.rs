//! Provider dispatch
//!
//! The orchestrator is the single entry point callers use. It picks the
//! driver registered for the credential's provider, decrypts the credential
//! and runs the operation under a deadline. Deeper validation belongs to the
//! drivers.

use crate::credential::{Credential, CredentialResolver, Secrets};
use crate::error::{ClusterError, Result};
use crate::model::{
    ClusterInfo, ClusterRef, ClusterSpec, NodeGroupInfo, NodeGroupRef, NodeGroupSpec, Operation,
};
use crate::provider::ClusterDriver;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(300);

/// Operation plus its input
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", content = "input")]
pub enum ClusterRequest {
    CreateCluster(ClusterSpec),
    ListClusters { region: String },
    GetCluster(ClusterRef),
    DeleteCluster(ClusterRef),
    GetKubeconfig(ClusterRef),
    CreateNodeGroup(NodeGroupSpec),
    ListNodeGroups(ClusterRef),
    GetNodeGroup(NodeGroupRef),
    DeleteNodeGroup(NodeGroupRef),
    ListVersions { region: String },
    ListRegions,
    ListZones { region: String },
}

impl ClusterRequest {
    pub fn operation(&self) -> Operation {
        match self {
            ClusterRequest::CreateCluster(_) => Operation::CreateCluster,
            ClusterRequest::ListClusters { .. } => Operation::ListClusters,
            ClusterRequest::GetCluster(_) => Operation::GetCluster,
            ClusterRequest::DeleteCluster(_) => Operation::DeleteCluster,
            ClusterRequest::GetKubeconfig(_) => Operation::GetKubeconfig,
            ClusterRequest::CreateNodeGroup(_) => Operation::CreateNodeGroup,
            ClusterRequest::ListNodeGroups(_) => Operation::ListNodeGroups,
            ClusterRequest::GetNodeGroup(_) => Operation::GetNodeGroup,
            ClusterRequest::DeleteNodeGroup(_) => Operation::DeleteNodeGroup,
            ClusterRequest::ListVersions { .. } => Operation::ListVersions,
            ClusterRequest::ListRegions => Operation::ListRegions,
            ClusterRequest::ListZones { .. } => Operation::ListZones,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClusterResponse {
    Cluster(ClusterInfo),
    Clusters(Vec<ClusterInfo>),
    NodeGroup(NodeGroupInfo),
    NodeGroups(Vec<NodeGroupInfo>),
    Kubeconfig(String),
    /// Kubernetes version strings, newest first
    Versions(Vec<String>),
    /// Region or zone names
    Locations(Vec<String>),
    Deleted,
}

pub struct Orchestrator {
    resolver: Arc<dyn CredentialResolver>,
    drivers: HashMap<String, Arc<dyn ClusterDriver>>,
    operation_timeout: Duration,
}

impl Orchestrator {
    pub fn new(resolver: Arc<dyn CredentialResolver>) -> Self {
        Self {
            resolver,
            drivers: HashMap::new(),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Registers a driver under its provider id, replacing any previous one
    pub fn register(&mut self, driver: Arc<dyn ClusterDriver>) -> &mut Self {
        let provider = driver.provider().to_string();
        if self.drivers.insert(provider.clone(), driver).is_some() {
            tracing::warn!("Replacing driver for provider {}", provider);
        }
        self
    }

    pub fn with_driver(mut self, driver: Arc<dyn ClusterDriver>) -> Self {
        self.register(driver);
        self
    }

    /// Registered provider ids, sorted
    pub fn providers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.drivers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn driver(&self, provider: &str) -> Result<&Arc<dyn ClusterDriver>> {
        self.drivers
            .get(provider)
            .ok_or_else(|| ClusterError::UnsupportedProvider(provider.to_string()))
    }

    /// Runs one operation against the credential's provider
    pub async fn execute(
        &self,
        credential: &Credential,
        request: ClusterRequest,
    ) -> Result<ClusterResponse> {
        let operation = request.operation();
        let driver = self.driver(&credential.provider)?;

        tracing::debug!("Dispatching {} to {}", operation, driver.provider());

        let call = async {
            let secrets = self.resolver.decrypt(&credential.encrypted).await?;
            dispatch(driver.as_ref(), &secrets, request).await
        };

        match tokio::time::timeout(self.operation_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ClusterError::Timeout {
                operation,
                elapsed: self.operation_timeout,
            }),
        }
    }

    pub async fn create_cluster(
        &self,
        credential: &Credential,
        spec: ClusterSpec,
    ) -> Result<ClusterInfo> {
        match self
            .execute(credential, ClusterRequest::CreateCluster(spec))
            .await?
        {
            ClusterResponse::Cluster(info) => Ok(info),
            other => Err(unexpected(Operation::CreateCluster, &other)),
        }
    }

    pub async fn list_clusters(
        &self,
        credential: &Credential,
        region: impl Into<String>,
    ) -> Result<Vec<ClusterInfo>> {
        let request = ClusterRequest::ListClusters {
            region: region.into(),
        };
        match self.execute(credential, request).await? {
            ClusterResponse::Clusters(list) => Ok(list),
            other => Err(unexpected(Operation::ListClusters, &other)),
        }
    }

    pub async fn get_cluster(
        &self,
        credential: &Credential,
        cluster: ClusterRef,
    ) -> Result<ClusterInfo> {
        match self
            .execute(credential, ClusterRequest::GetCluster(cluster))
            .await?
        {
            ClusterResponse::Cluster(info) => Ok(info),
            other => Err(unexpected(Operation::GetCluster, &other)),
        }
    }

    pub async fn delete_cluster(&self, credential: &Credential, cluster: ClusterRef) -> Result<()> {
        self.execute(credential, ClusterRequest::DeleteCluster(cluster))
            .await
            .map(|_| ())
    }

    pub async fn kubeconfig(&self, credential: &Credential, cluster: ClusterRef) -> Result<String> {
        match self
            .execute(credential, ClusterRequest::GetKubeconfig(cluster))
            .await?
        {
            ClusterResponse::Kubeconfig(yaml) => Ok(yaml),
            other => Err(unexpected(Operation::GetKubeconfig, &other)),
        }
    }

    pub async fn create_node_group(
        &self,
        credential: &Credential,
        spec: NodeGroupSpec,
    ) -> Result<NodeGroupInfo> {
        match self
            .execute(credential, ClusterRequest::CreateNodeGroup(spec))
            .await?
        {
            ClusterResponse::NodeGroup(info) => Ok(info),
            other => Err(unexpected(Operation::CreateNodeGroup, &other)),
        }
    }

    pub async fn list_node_groups(
        &self,
        credential: &Credential,
        cluster: ClusterRef,
    ) -> Result<Vec<NodeGroupInfo>> {
        match self
            .execute(credential, ClusterRequest::ListNodeGroups(cluster))
            .await?
        {
            ClusterResponse::NodeGroups(list) => Ok(list),
            other => Err(unexpected(Operation::ListNodeGroups, &other)),
        }
    }

    pub async fn get_node_group(
        &self,
        credential: &Credential,
        node_group: NodeGroupRef,
    ) -> Result<NodeGroupInfo> {
        match self
            .execute(credential, ClusterRequest::GetNodeGroup(node_group))
            .await?
        {
            ClusterResponse::NodeGroup(info) => Ok(info),
            other => Err(unexpected(Operation::GetNodeGroup, &other)),
        }
    }

    pub async fn delete_node_group(
        &self,
        credential: &Credential,
        node_group: NodeGroupRef,
    ) -> Result<()> {
        self.execute(credential, ClusterRequest::DeleteNodeGroup(node_group))
            .await
            .map(|_| ())
    }

    pub async fn list_versions(
        &self,
        credential: &Credential,
        region: impl Into<String>,
    ) -> Result<Vec<String>> {
        let request = ClusterRequest::ListVersions {
            region: region.into(),
        };
        match self.execute(credential, request).await? {
            ClusterResponse::Versions(versions) => Ok(versions),
            other => Err(unexpected(Operation::ListVersions, &other)),
        }
    }

    pub async fn list_regions(&self, credential: &Credential) -> Result<Vec<String>> {
        match self.execute(credential, ClusterRequest::ListRegions).await? {
            ClusterResponse::Locations(regions) => Ok(regions),
            other => Err(unexpected(Operation::ListRegions, &other)),
        }
    }

    pub async fn list_zones(
        &self,
        credential: &Credential,
        region: impl Into<String>,
    ) -> Result<Vec<String>> {
        let request = ClusterRequest::ListZones {
            region: region.into(),
        };
        match self.execute(credential, request).await? {
            ClusterResponse::Locations(zones) => Ok(zones),
            other => Err(unexpected(Operation::ListZones, &other)),
        }
    }
}

async fn dispatch(
    driver: &dyn ClusterDriver,
    secrets: &Secrets,
    request: ClusterRequest,
) -> Result<ClusterResponse> {
    let response = match request {
        ClusterRequest::CreateCluster(spec) => {
            ClusterResponse::Cluster(driver.create_cluster(secrets, &spec).await?)
        }
        ClusterRequest::ListClusters { region } => {
            ClusterResponse::Clusters(driver.list_clusters(secrets, &region).await?)
        }
        ClusterRequest::GetCluster(cluster) => {
            ClusterResponse::Cluster(driver.get_cluster(secrets, &cluster).await?)
        }
        ClusterRequest::DeleteCluster(cluster) => {
            driver.delete_cluster(secrets, &cluster).await?;
            ClusterResponse::Deleted
        }
        ClusterRequest::GetKubeconfig(cluster) => {
            ClusterResponse::Kubeconfig(driver.kubeconfig(secrets, &cluster).await?)
        }
        ClusterRequest::CreateNodeGroup(spec) => {
            ClusterResponse::NodeGroup(driver.create_node_group(secrets, &spec).await?)
        }
        ClusterRequest::ListNodeGroups(cluster) => {
            ClusterResponse::NodeGroups(driver.list_node_groups(secrets, &cluster).await?)
        }
        ClusterRequest::GetNodeGroup(node_group) => {
            ClusterResponse::NodeGroup(driver.get_node_group(secrets, &node_group).await?)
        }
        ClusterRequest::DeleteNodeGroup(node_group) => {
            driver.delete_node_group(secrets, &node_group).await?;
            ClusterResponse::Deleted
        }
        ClusterRequest::ListVersions { region } => {
            ClusterResponse::Versions(driver.list_versions(secrets, &region).await?)
        }
        ClusterRequest::ListRegions => {
            ClusterResponse::Locations(driver.list_regions(secrets).await?)
        }
        ClusterRequest::ListZones { region } => {
            ClusterResponse::Locations(driver.list_zones(secrets, &region).await?)
        }
    };
    Ok(response)
}

fn unexpected(operation: Operation, response: &ClusterResponse) -> ClusterError {
    ClusterError::InvalidRequest(format!(
        "{} returned an unexpected response: {:?}",
        operation, response
    ))
}
