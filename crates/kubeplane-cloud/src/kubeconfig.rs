//! Kubeconfig rendering
//!
//! Output follows the `clientcmd` v1 schema that kubectl reads. Rendering is
//! a pure function of its inputs, so the same cluster always produces the
//! same text.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// How the generated user entry authenticates
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterAuth {
    /// Token fetched on demand by an exec plugin
    Exec(ExecPlugin),
    /// Static bearer token, for providers with no exec tooling
    Token(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecPlugin {
    pub api_version: String,
    pub command: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<ExecEnvVar>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_hint: Option<String>,

    #[serde(default)]
    pub provide_cluster_info: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interactive_mode: Option<String>,
}

impl ExecPlugin {
    pub const API_VERSION: &'static str = "client.authentication.k8s.io/v1beta1";

    pub fn new(command: impl Into<String>) -> Self {
        Self {
            api_version: Self::API_VERSION.to_string(),
            command: command.into(),
            args: Vec::new(),
            env: Vec::new(),
            install_hint: None,
            provide_cluster_info: false,
            interactive_mode: None,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push(ExecEnvVar {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn install_hint(mut self, hint: impl Into<String>) -> Self {
        self.install_hint = Some(hint.into());
        self
    }

    pub fn provide_cluster_info(mut self, provide: bool) -> Self {
        self.provide_cluster_info = provide;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecEnvVar {
    pub name: String,
    pub value: String,
}

// ============ Document ============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kubeconfig {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub clusters: Vec<NamedCluster>,
    pub contexts: Vec<NamedContext>,
    #[serde(rename = "current-context")]
    pub current_context: String,
    pub preferences: Preferences,
    pub users: Vec<NamedUser>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterEntry {
    pub server: String,
    #[serde(rename = "certificate-authority-data")]
    pub certificate_authority_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextEntry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub cluster: String,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedUser {
    pub name: String,
    pub user: UserEntry,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecPlugin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// `<prefix>_<location>_<cluster>`, e.g. `gke_my-project_us-central1-b_demo`
pub fn context_name(prefix: &str, location: &str, cluster: &str) -> String {
    format!("{}_{}_{}", prefix, location, cluster)
}

/// Prepends `https://` when the provider reports a bare host
pub fn server_url(endpoint: &str) -> String {
    if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
        endpoint.to_string()
    } else {
        format!("https://{}", endpoint)
    }
}

impl Kubeconfig {
    /// Single-cluster config where cluster, context and user share one name
    pub fn new(context: &str, endpoint: &str, ca_data: &str, auth: &ClusterAuth) -> Self {
        let user = match auth {
            ClusterAuth::Exec(plugin) => UserEntry {
                exec: Some(plugin.clone()),
                token: None,
            },
            ClusterAuth::Token(token) => UserEntry {
                exec: None,
                token: Some(token.clone()),
            },
        };

        Self {
            api_version: "v1".to_string(),
            kind: "Config".to_string(),
            clusters: vec![NamedCluster {
                name: context.to_string(),
                cluster: ClusterEntry {
                    server: server_url(endpoint),
                    certificate_authority_data: ca_data.to_string(),
                },
            }],
            contexts: vec![NamedContext {
                name: context.to_string(),
                context: ContextEntry {
                    cluster: context.to_string(),
                    user: context.to_string(),
                },
            }],
            current_context: context.to_string(),
            preferences: Preferences::default(),
            users: vec![NamedUser {
                name: context.to_string(),
                user,
            }],
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Renders kubeconfig YAML for one cluster
pub fn render(context: &str, endpoint: &str, ca_data: &str, auth: &ClusterAuth) -> Result<String> {
    Kubeconfig::new(context, endpoint, ca_data, auth).to_yaml()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec_auth() -> ClusterAuth {
        ClusterAuth::Exec(
            ExecPlugin::new("aws")
                .args(["eks", "get-token", "--cluster-name", "demo", "--region", "us-east-1"])
                .provide_cluster_info(false),
        )
    }

    #[test]
    fn test_render_is_deterministic() {
        let ctx = context_name("eks", "us-east-1", "demo");
        let a = render(&ctx, "ABC.gr7.us-east-1.eks.amazonaws.com", "Q0EK", &exec_auth()).unwrap();
        let b = render(&ctx, "ABC.gr7.us-east-1.eks.amazonaws.com", "Q0EK", &exec_auth()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_render_schema() {
        let ctx = context_name("gke", "us-central1-b", "demo");
        let auth = ClusterAuth::Exec(
            ExecPlugin::new("gke-gcloud-auth-plugin")
                .install_hint("install it")
                .provide_cluster_info(true),
        );
        let yaml = render(&ctx, "34.1.2.3", "Q0EK", &auth).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(doc["apiVersion"].as_str(), Some("v1"));
        assert_eq!(doc["kind"].as_str(), Some("Config"));
        assert_eq!(doc["current-context"].as_str(), Some("gke_us-central1-b_demo"));
        assert_eq!(doc["clusters"][0]["cluster"]["server"].as_str(), Some("https://34.1.2.3"));
        assert_eq!(
            doc["clusters"][0]["cluster"]["certificate-authority-data"].as_str(),
            Some("Q0EK")
        );
        assert_eq!(doc["contexts"][0]["context"]["user"].as_str(), Some(ctx.as_str()));

        let exec = &doc["users"][0]["user"]["exec"];
        assert_eq!(exec["apiVersion"].as_str(), Some(ExecPlugin::API_VERSION));
        assert_eq!(exec["command"].as_str(), Some("gke-gcloud-auth-plugin"));
        assert_eq!(exec["installHint"].as_str(), Some("install it"));
        assert_eq!(exec["provideClusterInfo"].as_bool(), Some(true));
        assert!(doc["users"][0]["user"]["token"].is_null());

        let parsed: Kubeconfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.users[0].user.exec, Some(match auth {
            ClusterAuth::Exec(p) => p,
            ClusterAuth::Token(_) => unreachable!(),
        }));
    }

    #[test]
    fn test_token_fallback() {
        let auth = ClusterAuth::Token("t0k".into());
        let yaml = render("ncp_kr_demo", "https://api.example", "Q0EK", &auth).unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(doc["users"][0]["user"]["token"].as_str(), Some("t0k"));
        assert!(doc["users"][0]["user"]["exec"].is_null());
        assert_eq!(
            doc["clusters"][0]["cluster"]["server"].as_str(),
            Some("https://api.example")
        );
    }
}
