//! GKE v1 REST client

use crate::api::{GkeApi, GkeConnector};
use crate::auth::{self, ServiceAccountKey};
use crate::error::{GkeError, Result};
use crate::types::{
    Cluster, ComputeRegion, ComputeZone, CreateClusterRequest, CreateNodePoolRequest,
    ErrorResponse, ListClustersResponse, ListNodePoolsResponse, NodePool, Operation,
    RegionListResponse, ServerConfig, ZoneListResponse,
};
use async_trait::async_trait;
use kubeplane_cloud::{ClusterError, Secrets};
use serde::de::DeserializeOwned;

pub const GKE_API_BASE: &str = "https://container.googleapis.com/v1";

/// Regions and zones come from Compute Engine
pub const COMPUTE_API_BASE: &str = "https://compute.googleapis.com/compute/v1";

/// Compute list page size; one page covers every region and zone
const COMPUTE_MAX_RESULTS: &str = "500";

pub const PROVIDER: &str = "gcp";

/// Authenticated client for one project
pub struct GkeClient {
    client: reqwest::Client,
    api_base: String,
    compute_base: String,
    project_id: String,
    access_token: String,
}

impl GkeClient {
    pub fn new(
        client: reqwest::Client,
        api_base: impl Into<String>,
        project_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            compute_base: COMPUTE_API_BASE.to_string(),
            project_id: project_id.into(),
            access_token: access_token.into(),
        }
    }

    pub fn with_compute_base(mut self, compute_base: impl Into<String>) -> Self {
        self.compute_base = compute_base.into().trim_end_matches('/').to_string();
        self
    }

    fn location_url(&self, location: &str) -> String {
        format!(
            "{}/projects/{}/locations/{}",
            self.api_base, self.project_id, location
        )
    }

    fn cluster_url(&self, location: &str, cluster: &str) -> String {
        format!("{}/clusters/{}", self.location_url(location), cluster)
    }

    fn node_pool_url(&self, location: &str, cluster: &str, node_pool: &str) -> String {
        format!(
            "{}/nodePools/{}",
            self.cluster_url(location, cluster),
            node_pool
        )
    }

    fn compute_url(&self, collection: &str) -> String {
        format!(
            "{}/projects/{}/{}",
            self.compute_base, self.project_id, collection
        )
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.bearer_auth(&self.access_token).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(GkeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl GkeApi for GkeClient {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    async fn get_cluster(&self, location: &str, name: &str) -> Result<Cluster> {
        let url = self.cluster_url(location, name);
        self.send(self.client.get(&url)).await
    }

    async fn list_clusters(&self, location: &str) -> Result<Vec<Cluster>> {
        let url = format!("{}/clusters", self.location_url(location));
        let response: ListClustersResponse = self.send(self.client.get(&url)).await?;
        Ok(response.clusters)
    }

    async fn create_cluster(&self, location: &str, cluster: &Cluster) -> Result<Operation> {
        let url = format!("{}/clusters", self.location_url(location));
        let body = CreateClusterRequest { cluster };
        self.send(self.client.post(&url).json(&body)).await
    }

    async fn delete_cluster(&self, location: &str, name: &str) -> Result<Operation> {
        let url = self.cluster_url(location, name);
        self.send(self.client.delete(&url)).await
    }

    async fn list_node_pools(&self, location: &str, cluster: &str) -> Result<Vec<NodePool>> {
        let url = format!("{}/nodePools", self.cluster_url(location, cluster));
        let response: ListNodePoolsResponse = self.send(self.client.get(&url)).await?;
        Ok(response.node_pools)
    }

    async fn get_node_pool(&self, location: &str, cluster: &str, name: &str) -> Result<NodePool> {
        let url = self.node_pool_url(location, cluster, name);
        self.send(self.client.get(&url)).await
    }

    async fn create_node_pool(
        &self,
        location: &str,
        cluster: &str,
        node_pool: &NodePool,
    ) -> Result<Operation> {
        let url = format!("{}/nodePools", self.cluster_url(location, cluster));
        let body = CreateNodePoolRequest { node_pool };
        self.send(self.client.post(&url).json(&body)).await
    }

    async fn delete_node_pool(
        &self,
        location: &str,
        cluster: &str,
        name: &str,
    ) -> Result<Operation> {
        let url = self.node_pool_url(location, cluster, name);
        self.send(self.client.delete(&url)).await
    }

    async fn get_server_config(&self, location: &str) -> Result<ServerConfig> {
        let url = format!("{}/serverConfig", self.location_url(location));
        self.send(self.client.get(&url)).await
    }

    async fn list_regions(&self) -> Result<Vec<ComputeRegion>> {
        let request = self
            .client
            .get(self.compute_url("regions"))
            .query(&[("maxResults", COMPUTE_MAX_RESULTS)]);
        let response: RegionListResponse = self.send(request).await?;
        Ok(response.items)
    }

    async fn list_zones(&self) -> Result<Vec<ComputeZone>> {
        let request = self
            .client
            .get(self.compute_url("zones"))
            .query(&[("maxResults", COMPUTE_MAX_RESULTS)]);
        let response: ZoneListResponse = self.send(request).await?;
        Ok(response.items)
    }
}

/// Builds [`GkeClient`]s from decrypted service account secrets
#[derive(Debug, Clone)]
pub struct RestConnector {
    client: reqwest::Client,
    api_base: String,
    compute_base: String,
    token_uri: Option<String>,
}

impl RestConnector {
    pub fn new(api_base: impl Into<String>, token_uri: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            compute_base: COMPUTE_API_BASE.to_string(),
            token_uri,
        }
    }

    pub fn with_compute_base(mut self, compute_base: impl Into<String>) -> Self {
        self.compute_base = compute_base.into();
        self
    }
}

impl Default for RestConnector {
    fn default() -> Self {
        Self::new(GKE_API_BASE, None)
    }
}

#[async_trait]
impl GkeConnector for RestConnector {
    async fn connect(&self, secrets: &Secrets) -> kubeplane_cloud::Result<Box<dyn GkeApi>> {
        let project_id = secrets.require(PROVIDER, "project_id")?.to_string();

        let access_token = match secrets.get_str("access_token") {
            Some(token) => token.to_string(),
            None => {
                let key = ServiceAccountKey::from_secrets(secrets).ok_or_else(|| {
                    ClusterError::MissingCredentialField {
                        provider: PROVIDER.to_string(),
                        key: "private_key".to_string(),
                    }
                })?;
                auth::fetch_access_token(&self.client, &key, self.token_uri.as_deref())
                    .await
                    .map_err(|e| ClusterError::AuthenticationFailed {
                        provider: PROVIDER.to_string(),
                        reason: e.to_string(),
                    })?
            }
        };

        Ok(Box::new(
            GkeClient::new(
                self.client.clone(),
                self.api_base.clone(),
                project_id,
                access_token,
            )
            .with_compute_base(self.compute_base.clone()),
        ))
    }
}
