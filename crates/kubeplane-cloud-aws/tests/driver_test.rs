use async_trait::async_trait;
use kubeplane_cloud::{
    ClusterDriver, ClusterError, ClusterRef, ClusterSpec, NetworkSpec, NodeGroupRef,
    NodeGroupSpec, NodePoolSpec, ScalingConfig, Secrets, Tags,
};
use kubeplane_cloud_aws::types::{
    CreateClusterInput, CreateNodegroupInput, EksCluster, EksNodegroup,
};
use kubeplane_cloud_aws::{EksApi, EksConnector, EksDriver, EksError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory EKS for one account, recording `"<verb> <region>"` per call
#[derive(Default)]
struct FakeEks {
    clusters: Mutex<HashMap<String, EksCluster>>,
    nodegroups: Mutex<HashMap<(String, String), EksNodegroup>>,
    broken_describe: Mutex<Vec<String>>,
    calls: Mutex<Vec<String>>,
    created_clusters: Mutex<Vec<CreateClusterInput>>,
    created_nodegroups: Mutex<Vec<CreateNodegroupInput>>,
    connected_regions: Mutex<Vec<String>>,
    addon_versions: Vec<String>,
    regions: Vec<String>,
    zones: HashMap<String, Vec<String>>,
}

impl FakeEks {
    fn add_cluster(&self, cluster: EksCluster) {
        self.clusters
            .lock()
            .unwrap()
            .insert(cluster.name.clone(), cluster);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

struct Handle {
    fake: Arc<FakeEks>,
    region: String,
}

impl Handle {
    fn record(&self, verb: &str) {
        self.fake
            .calls
            .lock()
            .unwrap()
            .push(format!("{} {}", verb, self.region));
    }
}

fn not_found(what: &str) -> EksError {
    EksError::NotFound(format!("No cluster found for name: {}.", what))
}

#[async_trait]
impl EksApi for Handle {
    fn region(&self) -> &str {
        &self.region
    }

    async fn create_cluster(&self, input: &CreateClusterInput) -> Result<EksCluster, EksError> {
        self.record("create");
        self.fake.created_clusters.lock().unwrap().push(input.clone());
        Ok(EksCluster {
            name: input.name.clone(),
            arn: format!(
                "arn:aws:eks:{}:123456789012:cluster/{}",
                self.region, input.name
            ),
            status: "CREATING".to_string(),
            ..Default::default()
        })
    }

    async fn describe_cluster(&self, name: &str) -> Result<EksCluster, EksError> {
        self.record("describe");
        if self.fake.broken_describe.lock().unwrap().iter().any(|n| n == name) {
            return Err(EksError::Service {
                code: "AccessDeniedException".to_string(),
                message: "denied".to_string(),
            });
        }
        self.fake
            .clusters
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    async fn list_clusters(&self) -> Result<Vec<String>, EksError> {
        self.record("list");
        let mut names: Vec<String> = self.fake.clusters.lock().unwrap().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete_cluster(&self, name: &str) -> Result<(), EksError> {
        self.record("delete");
        match self.fake.clusters.lock().unwrap().get(name) {
            Some(cluster) if cluster.status == "CREATING" => Err(EksError::Service {
                code: "ResourceInUseException".to_string(),
                message: "Cluster is still creating".to_string(),
            }),
            Some(_) => Ok(()),
            None => Err(not_found(name)),
        }
    }

    async fn create_nodegroup(
        &self,
        input: &CreateNodegroupInput,
    ) -> Result<EksNodegroup, EksError> {
        self.record("create-nodegroup");
        self.fake.created_nodegroups.lock().unwrap().push(input.clone());
        Ok(EksNodegroup {
            name: input.name.clone(),
            arn: format!(
                "arn:aws:eks:{}:123456789012:nodegroup/{}/{}",
                self.region, input.cluster_name, input.name
            ),
            cluster_name: input.cluster_name.clone(),
            status: "CREATING".to_string(),
            ..Default::default()
        })
    }

    async fn describe_nodegroup(
        &self,
        cluster: &str,
        name: &str,
    ) -> Result<EksNodegroup, EksError> {
        self.record("describe-nodegroup");
        self.fake
            .nodegroups
            .lock()
            .unwrap()
            .get(&(cluster.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| not_found(name))
    }

    async fn list_nodegroups(&self, cluster: &str) -> Result<Vec<String>, EksError> {
        self.record("list-nodegroups");
        if !self.fake.clusters.lock().unwrap().contains_key(cluster) {
            return Err(not_found(cluster));
        }
        let mut names: Vec<String> = self
            .fake
            .nodegroups
            .lock()
            .unwrap()
            .keys()
            .filter(|(c, _)| c == cluster)
            .map(|(_, n)| n.clone())
            .collect();
        names.sort();
        Ok(names)
    }

    async fn delete_nodegroup(&self, cluster: &str, name: &str) -> Result<(), EksError> {
        self.record("delete-nodegroup");
        self.fake
            .nodegroups
            .lock()
            .unwrap()
            .remove(&(cluster.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| not_found(name))
    }

    async fn list_versions(&self) -> Result<Vec<String>, EksError> {
        self.record("versions");
        Ok(self.fake.addon_versions.clone())
    }

    async fn list_regions(&self) -> Result<Vec<String>, EksError> {
        self.record("regions");
        Ok(self.fake.regions.clone())
    }

    async fn list_zones(&self) -> Result<Vec<String>, EksError> {
        self.record("zones");
        self.fake
            .zones
            .get(&self.region)
            .cloned()
            .ok_or_else(|| EksError::Service {
                code: "InvalidParameterValue".to_string(),
                message: format!("Invalid region: {}", self.region),
            })
    }
}

struct FakeConnector(Arc<FakeEks>);

#[async_trait]
impl EksConnector for FakeConnector {
    async fn connect(
        &self,
        secrets: &Secrets,
        region: &str,
    ) -> kubeplane_cloud::Result<Box<dyn EksApi>> {
        secrets.require("aws", "access_key")?;
        self.0
            .connected_regions
            .lock()
            .unwrap()
            .push(region.to_string());
        Ok(Box::new(Handle {
            fake: self.0.clone(),
            region: region.to_string(),
        }))
    }
}

fn driver(fake: &Arc<FakeEks>) -> EksDriver {
    EksDriver::new(Arc::new(FakeConnector(fake.clone())), "us-east-1")
}

fn secrets() -> Secrets {
    Secrets::default()
        .with("access_key", "AKIAEXAMPLE")
        .with("secret_key", "wJalrXUtnFEMIEXAMPLEKEY")
}

fn active(name: &str) -> EksCluster {
    EksCluster {
        name: name.to_string(),
        arn: format!("arn:aws:eks:eu-west-1:123456789012:cluster/{}", name),
        version: "1.31".to_string(),
        status: "ACTIVE".to_string(),
        endpoint: "https://ABC.gr7.eu-west-1.eks.amazonaws.com".to_string(),
        certificate_authority: "Q0EK".to_string(),
        vpc_id: "vpc-1".to_string(),
        subnet_ids: vec!["subnet-a".to_string()],
        ..Default::default()
    }
}

fn cluster_spec() -> ClusterSpec {
    ClusterSpec {
        name: "demo".to_string(),
        version: "1.31".to_string(),
        region: "eu-west-1".to_string(),
        role_arn: Some("arn:aws:iam::123456789012:role/eks-cluster".to_string()),
        network: Some(NetworkSpec {
            vpc_id: "vpc-1".to_string(),
            subnet_ids: vec!["subnet-a".to_string(), "subnet-b".to_string()],
            ..Default::default()
        }),
        tags: Tags::from([("Cost Center".to_string(), "R&D".to_string())]),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_passes_tags_through() {
    let fake = Arc::new(FakeEks::default());
    let info = driver(&fake)
        .create_cluster(&secrets(), &cluster_spec())
        .await
        .unwrap();

    assert_eq!(info.status, "creating");
    assert_eq!(info.zone, "");
    assert_eq!(info.region, "eu-west-1");
    assert_eq!(info.id, "arn:aws:eks:eu-west-1:123456789012:cluster/demo");

    let inputs = fake.created_clusters.lock().unwrap();
    assert_eq!(inputs[0].tags.get("Cost Center").map(String::as_str), Some("R&D"));
    assert_eq!(inputs[0].authentication_mode, "API");
    assert_eq!(inputs[0].subnet_ids, vec!["subnet-a", "subnet-b"]);
}

#[tokio::test]
async fn test_create_validation() {
    let fake = Arc::new(FakeEks::default());
    let driver = driver(&fake);

    let mut spec = cluster_spec();
    spec.network = Some(NetworkSpec::default());
    let err = driver.create_cluster(&secrets(), &spec).await.unwrap_err();
    assert!(matches!(err, ClusterError::MissingNetworkConfig { .. }));

    let mut spec = cluster_spec();
    spec.role_arn = None;
    let err = driver.create_cluster(&secrets(), &spec).await.unwrap_err();
    assert!(matches!(err, ClusterError::InvalidRequest(_)));

    let mut spec = cluster_spec();
    spec.node_pool = Some(NodePoolSpec::default());
    let err = driver.create_cluster(&secrets(), &spec).await.unwrap_err();
    assert!(matches!(err, ClusterError::InvalidRequest(_)));

    assert!(fake.connected_regions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_region_precedence() {
    let fake = Arc::new(FakeEks::default());
    let driver = driver(&fake);

    driver.list_clusters(&secrets(), "ap-northeast-2").await.unwrap();
    driver
        .list_clusters(&secrets().with("region", "eu-central-1"), "")
        .await
        .unwrap();
    driver.list_clusters(&secrets(), "").await.unwrap();

    assert_eq!(
        *fake.connected_regions.lock().unwrap(),
        vec!["ap-northeast-2", "eu-central-1", "us-east-1"]
    );
}

#[tokio::test]
async fn test_list_skips_failed_describe() {
    let fake = Arc::new(FakeEks::default());
    fake.add_cluster(active("alpha"));
    fake.add_cluster(active("beta"));
    fake.add_cluster(active("gamma"));
    fake.broken_describe.lock().unwrap().push("beta".to_string());

    let clusters = driver(&fake)
        .list_clusters(&secrets(), "eu-west-1")
        .await
        .unwrap();

    let names: Vec<_> = clusters.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "gamma"]);
    assert_eq!(clusters[0].status, "ACTIVE");
    assert_eq!(clusters[0].network.as_ref().unwrap().vpc_id, "vpc-1");
}

#[tokio::test]
async fn test_missing_cluster_is_not_found_in_region() {
    let fake = Arc::new(FakeEks::default());
    let err = driver(&fake)
        .get_cluster(&secrets(), &ClusterRef::new("ghost", "eu-west-1"))
        .await
        .unwrap_err();
    match err {
        ClusterError::NotFoundAnyLocation {
            candidates,
            last_error,
            ..
        } => {
            assert_eq!(candidates, vec!["eu-west-1"]);
            assert_eq!(last_error, None);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = driver(&fake)
        .delete_cluster(&secrets(), &ClusterRef::new("ghost", "eu-west-1"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_server_failure_is_provider_error() {
    let fake = Arc::new(FakeEks::default());
    fake.add_cluster(EksCluster {
        status: "CREATING".to_string(),
        ..active("demo")
    });

    let err = driver(&fake)
        .delete_cluster(&secrets(), &ClusterRef::new("demo", "eu-west-1"))
        .await
        .unwrap_err();
    match err {
        ClusterError::ProviderApi {
            provider,
            location,
            resource,
            ..
        } => {
            assert_eq!(provider, "aws");
            assert_eq!(location, "eu-west-1");
            assert_eq!(resource, "demo");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_kubeconfig_exec_has_no_secrets() {
    let fake = Arc::new(FakeEks::default());
    fake.add_cluster(active("demo"));

    let yaml = driver(&fake)
        .kubeconfig(&secrets(), &ClusterRef::new("demo", "eu-west-1"))
        .await
        .unwrap();
    let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

    assert_eq!(doc["current-context"].as_str(), Some("eks_eu-west-1_demo"));
    let exec = &doc["users"][0]["user"]["exec"];
    assert_eq!(exec["command"].as_str(), Some("aws"));
    let args: Vec<_> = exec["args"]
        .as_sequence()
        .unwrap()
        .iter()
        .filter_map(|a| a.as_str())
        .collect();
    assert_eq!(
        args,
        vec!["eks", "get-token", "--cluster-name", "demo", "--region", "eu-west-1"]
    );
    assert!(!yaml.contains("AKIAEXAMPLE"));
    assert!(!yaml.contains("wJalrXUtnFEMIEXAMPLEKEY"));
}

#[tokio::test]
async fn test_kubeconfig_before_ready() {
    let fake = Arc::new(FakeEks::default());
    fake.add_cluster(EksCluster {
        name: "demo".to_string(),
        status: "CREATING".to_string(),
        ..Default::default()
    });
    let err = driver(&fake)
        .kubeconfig(&secrets(), &ClusterRef::new("demo", "eu-west-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClusterError::ClusterNotReady { .. }));
}

#[tokio::test]
async fn test_invalid_scaling_issues_no_call() {
    let fake = Arc::new(FakeEks::default());
    let spec = NodeGroupSpec {
        cluster_name: "demo".to_string(),
        region: "eu-west-1".to_string(),
        name: "ng".to_string(),
        instance_types: vec!["m5.large".to_string()],
        subnet_ids: vec!["subnet-a".to_string()],
        node_role: Some("arn:aws:iam::123456789012:role/node".to_string()),
        scaling: ScalingConfig::new(5, 3, 4),
        ..Default::default()
    };

    let err = driver(&fake)
        .create_node_group(&secrets(), &spec)
        .await
        .unwrap_err();
    assert!(matches!(err, ClusterError::InvalidScalingConfig { .. }));
    assert!(fake.connected_regions.lock().unwrap().is_empty());
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_node_group_lifecycle() {
    let fake = Arc::new(FakeEks::default());
    fake.add_cluster(active("demo"));
    fake.nodegroups.lock().unwrap().insert(
        ("demo".to_string(), "system".to_string()),
        EksNodegroup {
            name: "system".to_string(),
            cluster_name: "demo".to_string(),
            status: "ACTIVE".to_string(),
            capacity_type: "ON_DEMAND".to_string(),
            instance_types: vec!["m5.large".to_string()],
            min_size: Some(1),
            max_size: Some(3),
            desired_size: Some(2),
            max_unavailable: Some(1),
            ..Default::default()
        },
    );
    let driver = driver(&fake);

    let spec = NodeGroupSpec {
        cluster_name: "demo".to_string(),
        region: "eu-west-1".to_string(),
        name: "spot".to_string(),
        instance_types: vec!["m5.large".to_string(), "m5a.large".to_string()],
        subnet_ids: vec!["subnet-a".to_string()],
        node_role: Some("arn:aws:iam::123456789012:role/node".to_string()),
        capacity_type: Some("SPOT".to_string()),
        scaling: ScalingConfig::new(0, 10, 2),
        ..Default::default()
    };
    let created = driver.create_node_group(&secrets(), &spec).await.unwrap();
    assert_eq!(created.status, "creating");
    assert_eq!(created.scaling, ScalingConfig::new(0, 10, 2));
    assert_eq!(
        fake.created_nodegroups.lock().unwrap()[0].capacity_type.as_deref(),
        Some("SPOT")
    );

    let groups = driver
        .list_node_groups(&secrets(), &ClusterRef::new("demo", "eu-west-1"))
        .await
        .unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].scaling, ScalingConfig::new(1, 3, 2));
    assert_eq!(groups[0].upgrade.as_ref().unwrap().max_unavailable, 1);

    let group = driver
        .get_node_group(&secrets(), &NodeGroupRef::new("demo", "system", "eu-west-1"))
        .await
        .unwrap();
    assert_eq!(group.capacity_type, "ON_DEMAND");

    driver
        .delete_node_group(&secrets(), &NodeGroupRef::new("demo", "system", "eu-west-1"))
        .await
        .unwrap();
    let err = driver
        .get_node_group(&secrets(), &NodeGroupRef::new("demo", "system", "eu-west-1"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_missing_access_key() {
    let fake = Arc::new(FakeEks::default());
    let err = driver(&fake)
        .list_clusters(&Secrets::default().with("secret_key", "s"), "eu-west-1")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ClusterError::MissingCredentialField { ref key, .. } if key == "access_key"
    ));
}

#[tokio::test]
async fn test_versions_are_distinct_and_newest_first() {
    let fake = Arc::new(FakeEks {
        addon_versions: ["1.29", "1.31", "1.30", "1.31", "1.29", "1.32"]
            .into_iter()
            .map(String::from)
            .collect(),
        ..Default::default()
    });

    let versions = driver(&fake)
        .list_versions(&secrets(), "eu-west-1")
        .await
        .unwrap();
    assert_eq!(versions, vec!["1.32", "1.31", "1.30", "1.29"]);
    assert_eq!(fake.calls(), vec!["versions eu-west-1"]);
}

#[tokio::test]
async fn test_regions_use_credential_region() {
    let fake = Arc::new(FakeEks {
        regions: vec![
            "us-west-2".to_string(),
            "ap-northeast-1".to_string(),
            "eu-west-1".to_string(),
        ],
        ..Default::default()
    });
    let driver = driver(&fake);

    let regions = driver.list_regions(&secrets()).await.unwrap();
    assert_eq!(regions, vec!["ap-northeast-1", "eu-west-1", "us-west-2"]);

    driver
        .list_regions(&secrets().with("region", "eu-central-1"))
        .await
        .unwrap();
    assert_eq!(
        fake.calls(),
        vec!["regions us-east-1", "regions eu-central-1"]
    );
}

#[tokio::test]
async fn test_zones_for_region() {
    let fake = Arc::new(FakeEks {
        zones: HashMap::from([(
            "eu-west-1".to_string(),
            vec![
                "eu-west-1c".to_string(),
                "eu-west-1a".to_string(),
                "eu-west-1b".to_string(),
            ],
        )]),
        ..Default::default()
    });
    let driver = driver(&fake);

    let zones = driver.list_zones(&secrets(), "eu-west-1").await.unwrap();
    assert_eq!(zones, vec!["eu-west-1a", "eu-west-1b", "eu-west-1c"]);

    let err = driver.list_zones(&secrets(), "xx-nowhere-1").await.unwrap_err();
    match err {
        ClusterError::ProviderApi {
            operation,
            location,
            ..
        } => {
            assert_eq!(operation, kubeplane_cloud::Operation::ListZones);
            assert_eq!(location, "xx-nowhere-1");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
