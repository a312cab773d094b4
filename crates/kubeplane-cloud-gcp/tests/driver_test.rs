use async_trait::async_trait;
use kubeplane_cloud::{
    ClusterDriver, ClusterError, ClusterRef, ClusterSpec, NetworkSpec, NodeGroupRef,
    NodeGroupSpec, NodePoolSpec, ProbeConfig, ScalingConfig, Secrets, Tags,
};
use kubeplane_cloud_gcp::types::{
    Cluster, ComputeRegion, ComputeZone, MasterAuth, NodeConfig, NodePool, Operation, ServerConfig,
};
use kubeplane_cloud_gcp::{GkeApi, GkeConnector, GkeDriver, GkeError};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const PROJECT: &str = "p1";

/// In-memory GKE that records every call as `"<verb> <location>"`
#[derive(Default)]
struct FakeGke {
    clusters: Mutex<HashMap<String, Vec<Cluster>>>,
    node_pools: Mutex<HashMap<(String, String), Vec<NodePool>>>,
    failing: Mutex<HashSet<String>>,
    fail_deletes: bool,
    calls: Mutex<Vec<String>>,
    created: Mutex<Vec<(String, Cluster)>>,
    regions: Vec<ComputeRegion>,
    zones: Vec<ComputeZone>,
    connects: AtomicUsize,
}

impl FakeGke {
    fn add_cluster(&self, location: &str, cluster: Cluster) {
        self.clusters
            .lock()
            .unwrap()
            .entry(location.to_string())
            .or_default()
            .push(cluster);
    }

    fn add_node_pool(&self, location: &str, cluster: &str, pool: NodePool) {
        self.node_pools
            .lock()
            .unwrap()
            .entry((location.to_string(), cluster.to_string()))
            .or_default()
            .push(pool);
    }

    fn fail_at(&self, location: &str) {
        self.failing.lock().unwrap().insert(location.to_string());
    }

    fn record(&self, verb: &str, location: &str) -> Result<(), GkeError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", verb, location));
        if self.failing.lock().unwrap().contains(location) {
            return Err(GkeError::Api {
                status: 500,
                message: "backend error".to_string(),
            });
        }
        Ok(())
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

fn not_found() -> GkeError {
    GkeError::Api {
        status: 404,
        message: "not found".to_string(),
    }
}

fn operation() -> Operation {
    Operation {
        name: "operation-1".to_string(),
        ..Default::default()
    }
}

struct Handle(Arc<FakeGke>);

#[async_trait]
impl GkeApi for Handle {
    fn project_id(&self) -> &str {
        PROJECT
    }

    async fn get_cluster(&self, location: &str, name: &str) -> Result<Cluster, GkeError> {
        self.0.record("get", location)?;
        self.0
            .clusters
            .lock()
            .unwrap()
            .get(location)
            .and_then(|list| list.iter().find(|c| c.name == name).cloned())
            .ok_or_else(not_found)
    }

    async fn list_clusters(&self, location: &str) -> Result<Vec<Cluster>, GkeError> {
        self.0.record("list", location)?;
        Ok(self
            .0
            .clusters
            .lock()
            .unwrap()
            .get(location)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_cluster(
        &self,
        location: &str,
        cluster: &Cluster,
    ) -> Result<Operation, GkeError> {
        self.0.record("create", location)?;
        self.0
            .created
            .lock()
            .unwrap()
            .push((location.to_string(), cluster.clone()));
        Ok(operation())
    }

    async fn delete_cluster(&self, location: &str, _name: &str) -> Result<Operation, GkeError> {
        self.0.record("delete", location)?;
        if self.0.fail_deletes {
            return Err(GkeError::Api {
                status: 400,
                message: "cluster is busy".to_string(),
            });
        }
        Ok(operation())
    }

    async fn list_node_pools(
        &self,
        location: &str,
        cluster: &str,
    ) -> Result<Vec<NodePool>, GkeError> {
        self.0.record("list-pools", location)?;
        self.0
            .node_pools
            .lock()
            .unwrap()
            .get(&(location.to_string(), cluster.to_string()))
            .cloned()
            .ok_or_else(not_found)
    }

    async fn get_node_pool(
        &self,
        location: &str,
        cluster: &str,
        name: &str,
    ) -> Result<NodePool, GkeError> {
        self.0.record("get-pool", location)?;
        self.0
            .node_pools
            .lock()
            .unwrap()
            .get(&(location.to_string(), cluster.to_string()))
            .and_then(|pools| pools.iter().find(|p| p.name == name).cloned())
            .ok_or_else(not_found)
    }

    async fn create_node_pool(
        &self,
        location: &str,
        _cluster: &str,
        _node_pool: &NodePool,
    ) -> Result<Operation, GkeError> {
        self.0.record("create-pool", location)?;
        Ok(operation())
    }

    async fn delete_node_pool(
        &self,
        location: &str,
        _cluster: &str,
        _name: &str,
    ) -> Result<Operation, GkeError> {
        self.0.record("delete-pool", location)?;
        Ok(operation())
    }

    async fn get_server_config(&self, location: &str) -> Result<ServerConfig, GkeError> {
        self.0.record("server-config", location)?;
        Ok(ServerConfig {
            default_cluster_version: "1.30.5-gke.1014001".to_string(),
            valid_master_versions: vec![
                "1.31.1-gke.1678000".to_string(),
                "1.30.5-gke.1014001".to_string(),
            ],
            ..Default::default()
        })
    }

    async fn list_regions(&self) -> Result<Vec<ComputeRegion>, GkeError> {
        self.0.record("regions", PROJECT)?;
        Ok(self.0.regions.clone())
    }

    async fn list_zones(&self) -> Result<Vec<ComputeZone>, GkeError> {
        self.0.record("zones", PROJECT)?;
        Ok(self.0.zones.clone())
    }
}

struct FakeConnector(Arc<FakeGke>);

#[async_trait]
impl GkeConnector for FakeConnector {
    async fn connect(&self, _secrets: &Secrets) -> kubeplane_cloud::Result<Box<dyn GkeApi>> {
        self.0.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(Handle(self.0.clone())))
    }
}

fn driver(fake: &Arc<FakeGke>) -> GkeDriver {
    GkeDriver::new(
        Arc::new(FakeConnector(fake.clone())),
        ProbeConfig {
            parallel_enumeration: false,
            ..Default::default()
        },
    )
}

fn secrets() -> Secrets {
    Secrets::default()
        .with("project_id", PROJECT)
        .with("access_token", "t")
}

fn cluster(name: &str, location: &str) -> Cluster {
    Cluster {
        name: name.to_string(),
        location: location.to_string(),
        status: "RUNNING".to_string(),
        current_master_version: "1.30.2-gke.1".to_string(),
        ..Default::default()
    }
}

fn cluster_spec() -> ClusterSpec {
    ClusterSpec {
        name: "demo".to_string(),
        version: "1.30".to_string(),
        region: "r1".to_string(),
        network: Some(NetworkSpec {
            vpc_id: "default".to_string(),
            ..Default::default()
        }),
        node_pool: Some(NodePoolSpec {
            name: "default-pool".to_string(),
            machine_type: "e2-medium".to_string(),
            desired_nodes: 1,
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_point_lookup_stops_at_zone_b() {
    let fake = Arc::new(FakeGke::default());
    fake.add_cluster("r1-b", cluster("demo", "r1-b"));
    fake.add_cluster("r1-c", cluster("demo", "r1-c"));

    let info = driver(&fake)
        .get_cluster(&secrets(), &ClusterRef::new("demo", "r1"))
        .await
        .unwrap();

    assert_eq!(info.zone, "r1-b");
    assert_eq!(info.region, "r1");
    assert_eq!(info.id, "projects/p1/locations/r1-b/clusters/demo");
    assert_eq!(fake.calls(), vec!["get r1", "get r1-a", "get r1-b"]);
}

#[tokio::test]
async fn test_create_then_get_at_zone() {
    let fake = Arc::new(FakeGke::default());
    let driver = driver(&fake);

    let created = driver.create_cluster(&secrets(), &cluster_spec()).await.unwrap();
    assert_eq!(created.status, "creating");
    assert_eq!(created.zone, "");
    assert_eq!(created.name, "demo");
    assert_eq!(created.id, "projects/p1/locations/r1/clusters/demo");
    assert_eq!(fake.calls(), vec!["create r1"]);

    // GKE later reports the cluster under zone b
    fake.add_cluster("r1-b", cluster("demo", "r1-b"));

    let fetched = driver
        .get_cluster(&secrets(), &ClusterRef::new("demo", "r1"))
        .await
        .unwrap();
    assert_eq!(fetched.name, created.name);
    assert_eq!(fetched.zone, "r1-b");
    assert_eq!(fetched.status, "RUNNING");
}

#[tokio::test]
async fn test_create_targets_zone_and_normalizes_labels() {
    let fake = Arc::new(FakeGke::default());
    let mut spec = cluster_spec();
    spec.zone = Some("r1-c".to_string());
    spec.tags = Tags::from([
        ("Cost Center".to_string(), "R&D".to_string()),
        ("9lives".to_string(), "cat".to_string()),
    ]);

    let created = driver(&fake).create_cluster(&secrets(), &spec).await.unwrap();
    assert_eq!(created.zone, "r1-c");

    let created_calls = fake.created.lock().unwrap();
    let (location, payload) = &created_calls[0];
    assert_eq!(location, "r1-c");
    assert_eq!(
        payload.resource_labels.get("cost_center").map(String::as_str),
        Some("R&D")
    );
    assert_eq!(
        payload.resource_labels.get("tag_9lives").map(String::as_str),
        Some("cat")
    );
    assert!(payload.ip_allocation_policy.is_none());
    assert!(payload.private_cluster_config.is_none());
}

#[tokio::test]
async fn test_create_validation_happens_before_any_call() {
    let fake = Arc::new(FakeGke::default());
    let driver = driver(&fake);

    let mut spec = cluster_spec();
    spec.network = None;
    let err = driver.create_cluster(&secrets(), &spec).await.unwrap_err();
    assert!(matches!(err, ClusterError::MissingNetworkConfig { .. }));

    let mut spec = cluster_spec();
    spec.node_pool = None;
    let err = driver.create_cluster(&secrets(), &spec).await.unwrap_err();
    assert!(matches!(err, ClusterError::MissingNodePoolConfig { .. }));

    spec.autopilot = true;
    driver.create_cluster(&secrets(), &spec).await.unwrap();

    assert_eq!(fake.connects.load(Ordering::SeqCst), 1);
    assert_eq!(fake.calls(), vec!["create r1"]);
}

#[tokio::test]
async fn test_list_is_union_of_zones() {
    let fake = Arc::new(FakeGke::default());
    fake.add_cluster("r1-a", cluster("alpha", "r1-a"));
    fake.add_cluster("r1-c", cluster("gamma", "r1-c"));
    fake.add_cluster("r1-c", cluster("delta", "r1-c"));

    let clusters = driver(&fake).list_clusters(&secrets(), "r1").await.unwrap();

    let mut names: Vec<_> = clusters.iter().map(|c| c.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, vec!["alpha", "delta", "gamma"]);
    assert_eq!(
        fake.calls(),
        vec!["list r1", "list r1-a", "list r1-b", "list r1-c"]
    );
}

#[tokio::test]
async fn test_list_dedups_and_survives_failed_zone() {
    let fake = Arc::new(FakeGke::default());
    // a zonal cluster reported both by its zone and by the region listing
    fake.add_cluster("r1", cluster("alpha", "r1-a"));
    fake.add_cluster("r1-a", cluster("alpha", "r1-a"));
    fake.add_cluster("r1-c", cluster("gamma", "r1-c"));
    fake.fail_at("r1-b");

    let parallel = GkeDriver::new(
        Arc::new(FakeConnector(fake.clone())),
        ProbeConfig::default(),
    );
    let clusters = parallel.list_clusters(&secrets(), "r1").await.unwrap();

    let names: Vec<_> = clusters.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "gamma"]);
    assert_eq!(clusters[0].zone, "r1-a");
}

#[tokio::test]
async fn test_delete_not_found_vs_server_failure() {
    let fake = Arc::new(FakeGke::default());
    let err = driver(&fake)
        .delete_cluster(&secrets(), &ClusterRef::new("ghost", "r1"))
        .await
        .unwrap_err();
    match err {
        ClusterError::NotFoundAnyLocation {
            candidates,
            last_error,
            ..
        } => {
            assert_eq!(candidates, vec!["r1", "r1-a", "r1-b", "r1-c"]);
            assert_eq!(last_error, None);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let fake = Arc::new(FakeGke {
        fail_deletes: true,
        ..Default::default()
    });
    fake.add_cluster("r1-a", cluster("demo", "r1-a"));
    let err = driver(&fake)
        .delete_cluster(&secrets(), &ClusterRef::new("demo", "r1"))
        .await
        .unwrap_err();
    match err {
        ClusterError::ProviderApi {
            location, resource, ..
        } => {
            assert_eq!(location, "r1-a");
            assert_eq!(resource, "demo");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(fake.calls(), vec!["get r1", "get r1-a", "delete r1-a"]);
}

#[tokio::test]
async fn test_invalid_scaling_issues_no_call() {
    let fake = Arc::new(FakeGke::default());
    let spec = NodeGroupSpec {
        cluster_name: "demo".to_string(),
        region: "r1".to_string(),
        name: "pool".to_string(),
        instance_types: vec!["e2-medium".to_string()],
        scaling: ScalingConfig::new(5, 3, 4),
        ..Default::default()
    };

    let err = driver(&fake)
        .create_node_group(&secrets(), &spec)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClusterError::InvalidScalingConfig {
            min: 5,
            max: 3,
            desired: 4,
            ..
        }
    ));
    assert_eq!(fake.connects.load(Ordering::SeqCst), 0);
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_node_group_lifecycle() {
    let fake = Arc::new(FakeGke::default());
    fake.add_cluster("r1-a", cluster("demo", "r1-a"));
    fake.add_node_pool(
        "r1-a",
        "demo",
        NodePool {
            name: "default-pool".to_string(),
            initial_node_count: Some(3),
            config: Some(NodeConfig {
                machine_type: "e2-standard-4".to_string(),
                spot: true,
                ..Default::default()
            }),
            ..Default::default()
        },
    );
    let driver = driver(&fake);

    let spec = NodeGroupSpec {
        cluster_name: "demo".to_string(),
        region: "r1".to_string(),
        name: "batch".to_string(),
        instance_types: vec!["n2-standard-8".to_string()],
        scaling: ScalingConfig::new(0, 4, 1),
        ..Default::default()
    };
    let created = driver.create_node_group(&secrets(), &spec).await.unwrap();
    assert_eq!(created.status, "creating");
    assert_eq!(created.id, "projects/p1/locations/r1-a/clusters/demo/nodePools/batch");
    assert_eq!(created.instance_types, vec!["n2-standard-8"]);

    let pools = driver
        .list_node_groups(&secrets(), &ClusterRef::new("demo", "r1"))
        .await
        .unwrap();
    assert_eq!(pools.len(), 1);
    assert_eq!(pools[0].capacity_type, "SPOT");
    assert_eq!(pools[0].cluster_name, "demo");

    let pool = driver
        .get_node_group(&secrets(), &NodeGroupRef::new("demo", "default-pool", "r1"))
        .await
        .unwrap();
    assert_eq!(pool.scaling, ScalingConfig::new(3, 3, 3));

    driver
        .delete_node_group(&secrets(), &NodeGroupRef::new("demo", "default-pool", "r1"))
        .await
        .unwrap();
    assert_eq!(fake.calls().last().map(String::as_str), Some("delete-pool r1-a"));
}

#[tokio::test]
async fn test_kubeconfig_uses_auth_plugin() {
    let fake = Arc::new(FakeGke::default());
    let mut ready = cluster("demo", "r1-a");
    ready.endpoint = "34.1.2.3".to_string();
    ready.master_auth = Some(MasterAuth {
        cluster_ca_certificate: "Q0EK".to_string(),
    });
    fake.add_cluster("r1-a", ready);
    fake.add_cluster("r1", cluster("pending", "r1"));
    let driver = driver(&fake);

    let yaml = driver
        .kubeconfig(&secrets(), &ClusterRef::new("demo", "r1"))
        .await
        .unwrap();
    let again = driver
        .kubeconfig(&secrets(), &ClusterRef::new("demo", "r1"))
        .await
        .unwrap();
    assert_eq!(yaml, again);

    let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(doc["current-context"].as_str(), Some("gke_p1_r1-a_demo"));
    assert_eq!(
        doc["clusters"][0]["cluster"]["server"].as_str(),
        Some("https://34.1.2.3")
    );
    let exec = &doc["users"][0]["user"]["exec"];
    assert_eq!(exec["command"].as_str(), Some("gke-gcloud-auth-plugin"));
    assert_eq!(exec["provideClusterInfo"].as_bool(), Some(true));
    assert!(!yaml.contains("access_token"));

    let err = driver
        .kubeconfig(&secrets(), &ClusterRef::new("pending", "r1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClusterError::ClusterNotReady { .. }));
}

#[tokio::test]
async fn test_lookup_miss_keeps_last_server_failure() {
    let fake = Arc::new(FakeGke::default());
    fake.fail_at("r1-a");

    let err = driver(&fake)
        .get_cluster(&secrets(), &ClusterRef::new("demo", "r1"))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    match &err {
        ClusterError::NotFoundAnyLocation {
            candidates,
            last_error,
            ..
        } => {
            assert_eq!(candidates.len(), 4);
            let last_error = last_error.as_deref().unwrap();
            assert!(last_error.starts_with("r1-a: "));
            assert!(last_error.contains("backend error"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        fake.calls(),
        vec!["get r1", "get r1-a", "get r1-b", "get r1-c"]
    );
}

#[tokio::test]
async fn test_versions_come_from_server_config() {
    let fake = Arc::new(FakeGke::default());
    let driver = driver(&fake);

    let versions = driver.list_versions(&secrets(), "r1-b").await.unwrap();
    assert_eq!(versions, vec!["1.31.1-gke.1678000", "1.30.5-gke.1014001"]);
    assert_eq!(fake.calls(), vec!["server-config r1-b"]);

    let err = driver.list_versions(&secrets(), "").await.unwrap_err();
    assert!(matches!(err, ClusterError::InvalidRequest(_)));
    assert_eq!(fake.connects.load(Ordering::SeqCst), 1);

    fake.fail_at("r2");
    let err = driver.list_versions(&secrets(), "r2").await.unwrap_err();
    assert!(matches!(
        err,
        ClusterError::ProviderApi {
            operation: kubeplane_cloud::Operation::ListVersions,
            ..
        }
    ));
}

fn region(name: &str, status: &str) -> ComputeRegion {
    ComputeRegion {
        name: name.to_string(),
        status: status.to_string(),
    }
}

fn zone(name: &str, region: &str, status: &str) -> ComputeZone {
    ComputeZone {
        name: name.to_string(),
        region: format!(
            "https://www.googleapis.com/compute/v1/projects/{}/regions/{}",
            PROJECT, region
        ),
        status: status.to_string(),
    }
}

#[tokio::test]
async fn test_regions_and_zones_skip_down_locations() {
    let fake = Arc::new(FakeGke {
        regions: vec![
            region("us-west1", "UP"),
            region("asia-east1", "UP"),
            region("us-south9", "DOWN"),
        ],
        zones: vec![
            zone("us-west1-b", "us-west1", "UP"),
            zone("us-west1-a", "us-west1", "UP"),
            zone("us-west1-c", "us-west1", "DOWN"),
            zone("asia-east1-a", "asia-east1", "UP"),
        ],
        ..Default::default()
    });
    let driver = driver(&fake);

    let regions = driver.list_regions(&secrets()).await.unwrap();
    assert_eq!(regions, vec!["asia-east1", "us-west1"]);

    let zones = driver.list_zones(&secrets(), "us-west1").await.unwrap();
    assert_eq!(zones, vec!["us-west1-a", "us-west1-b"]);

    let all = driver.list_zones(&secrets(), "").await.unwrap();
    assert_eq!(all, vec!["asia-east1-a", "us-west1-a", "us-west1-b"]);

    assert_eq!(fake.calls(), vec!["regions p1", "zones p1", "zones p1"]);
}
