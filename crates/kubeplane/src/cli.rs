use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kplane")]
#[command(
    version,
    about = "Create, inspect and delete managed Kubernetes clusters across clouds",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Which cloud account to act as
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Provider id (gcp, aws, azure, ncp)
    #[arg(short, long, env = "KUBEPLANE_PROVIDER")]
    pub provider: String,

    /// Sealed credential file produced by `kplane seal`
    #[arg(short, long, env = "KUBEPLANE_CREDENTIAL")]
    pub credential: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cluster lifecycle
    #[command(subcommand)]
    Clusters(ClusterCommand),

    /// Node group lifecycle
    #[command(name = "node-groups", subcommand)]
    NodeGroups(NodeGroupCommand),

    /// Kubernetes versions, regions and zones offered by a provider
    #[command(subcommand)]
    Info(InfoCommand),

    /// Encrypt a plaintext secrets JSON file into a sealed credential
    Seal {
        /// Plaintext JSON object with provider secrets
        input: PathBuf,
        /// Where to write the sealed credential
        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Subcommand)]
pub enum ClusterCommand {
    /// List clusters in a region
    List {
        #[command(flatten)]
        target: Target,
        /// Region; providers fall back to their default when empty
        #[arg(short, long, default_value = "")]
        region: String,
    },
    /// Show one cluster
    Get {
        #[command(flatten)]
        target: Target,
        name: String,
        #[arg(short, long, default_value = "")]
        region: String,
    },
    /// Create a cluster from a YAML or JSON spec file
    Create {
        #[command(flatten)]
        target: Target,
        spec: PathBuf,
    },
    /// Delete a cluster
    Delete {
        #[command(flatten)]
        target: Target,
        name: String,
        #[arg(short, long, default_value = "")]
        region: String,
    },
    /// Print a kubeconfig for a cluster
    Kubeconfig {
        #[command(flatten)]
        target: Target,
        name: String,
        #[arg(short, long, default_value = "")]
        region: String,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum NodeGroupCommand {
    /// List node groups of a cluster
    List {
        #[command(flatten)]
        target: Target,
        cluster: String,
        #[arg(short, long, default_value = "")]
        region: String,
    },
    /// Show one node group
    Get {
        #[command(flatten)]
        target: Target,
        cluster: String,
        name: String,
        #[arg(short, long, default_value = "")]
        region: String,
    },
    /// Create a node group from a YAML or JSON spec file
    Create {
        #[command(flatten)]
        target: Target,
        spec: PathBuf,
    },
    /// Delete a node group
    Delete {
        #[command(flatten)]
        target: Target,
        cluster: String,
        name: String,
        #[arg(short, long, default_value = "")]
        region: String,
    },
}

#[derive(Subcommand)]
pub enum InfoCommand {
    /// Kubernetes versions available for new clusters
    Versions {
        #[command(flatten)]
        target: Target,
        #[arg(short, long, default_value = "")]
        region: String,
    },
    /// Regions enabled for the account
    Regions {
        #[command(flatten)]
        target: Target,
    },
    /// Zones in a region
    Zones {
        #[command(flatten)]
        target: Target,
        #[arg(short, long, default_value = "")]
        region: String,
    },
}
