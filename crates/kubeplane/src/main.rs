mod app;
mod cli;

use clap::Parser;
use cli::{Cli, ClusterCommand, Commands, InfoCommand, NodeGroupCommand, Target};
use colored::Colorize;
use kubeplane_cloud::{
    ClusterRef, ClusterRequest, ClusterResponse, ClusterSpec, NodeGroupRef, NodeGroupSpec,
    Secrets,
};
use std::path::PathBuf;

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Sends one request and prints its result. Kubeconfigs are written raw.
async fn run(
    settings: &kubeplane_config::Settings,
    target: Target,
    request: ClusterRequest,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let orchestrator = app::orchestrator(settings, app::resolver(settings)?);
    let credential = app::read_credential(&target.provider, &target.credential)?;
    let operation = request.operation();

    tracing::debug!("{} via {}", operation, target.provider);

    match orchestrator.execute(&credential, request).await? {
        ClusterResponse::Kubeconfig(yaml) => match output {
            Some(path) => {
                std::fs::write(&path, yaml)?;
                eprintln!(
                    "{} kubeconfig written to {}",
                    "✓".green(),
                    path.display().to_string().cyan()
                );
            }
            None => print!("{}", yaml),
        },
        ClusterResponse::Deleted => {
            eprintln!("{} {} accepted", "✓".green(), operation.to_string().cyan());
        }
        response => print_json(&response)?,
    }
    Ok(())
}

fn seal(
    settings: &kubeplane_config::Settings,
    input: PathBuf,
    output: PathBuf,
) -> anyhow::Result<()> {
    let resolver = app::resolver(settings)?;
    let secrets: Secrets = Secrets::new(app::read_spec(&input)?);
    if secrets.is_empty() {
        anyhow::bail!("{} contains no secrets", input.display());
    }
    let sealed = resolver.seal(&secrets)?;
    std::fs::write(&output, sealed)?;

    let keys: Vec<&str> = secrets.keys().collect();
    eprintln!(
        "{} sealed {} ({}) into {}",
        "✓".green(),
        input.display(),
        keys.join(", "),
        output.display().to_string().cyan()
    );
    Ok(())
}

fn cluster_request(
    command: ClusterCommand,
) -> anyhow::Result<(Target, ClusterRequest, Option<PathBuf>)> {
    Ok(match command {
        ClusterCommand::List { target, region } => {
            (target, ClusterRequest::ListClusters { region }, None)
        }
        ClusterCommand::Get {
            target,
            name,
            region,
        } => (target, ClusterRequest::GetCluster(ClusterRef::new(name, region)), None),
        ClusterCommand::Create { target, spec } => {
            let spec: ClusterSpec = app::read_spec(&spec)?;
            (target, ClusterRequest::CreateCluster(spec), None)
        }
        ClusterCommand::Delete {
            target,
            name,
            region,
        } => (target, ClusterRequest::DeleteCluster(ClusterRef::new(name, region)), None),
        ClusterCommand::Kubeconfig {
            target,
            name,
            region,
            output,
        } => (
            target,
            ClusterRequest::GetKubeconfig(ClusterRef::new(name, region)),
            output,
        ),
    })
}

fn node_group_request(command: NodeGroupCommand) -> anyhow::Result<(Target, ClusterRequest)> {
    Ok(match command {
        NodeGroupCommand::List {
            target,
            cluster,
            region,
        } => (target, ClusterRequest::ListNodeGroups(ClusterRef::new(cluster, region))),
        NodeGroupCommand::Get {
            target,
            cluster,
            name,
            region,
        } => (
            target,
            ClusterRequest::GetNodeGroup(NodeGroupRef::new(cluster, name, region)),
        ),
        NodeGroupCommand::Create { target, spec } => {
            let spec: NodeGroupSpec = app::read_spec(&spec)?;
            (target, ClusterRequest::CreateNodeGroup(spec))
        }
        NodeGroupCommand::Delete {
            target,
            cluster,
            name,
            region,
        } => (
            target,
            ClusterRequest::DeleteNodeGroup(NodeGroupRef::new(cluster, name, region)),
        ),
    })
}

fn info_request(command: InfoCommand) -> (Target, ClusterRequest) {
    match command {
        InfoCommand::Versions { target, region } => {
            (target, ClusterRequest::ListVersions { region })
        }
        InfoCommand::Regions { target } => (target, ClusterRequest::ListRegions),
        InfoCommand::Zones { target, region } => (target, ClusterRequest::ListZones { region }),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries JSON, logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = kubeplane_config::load()?;

    match cli.command {
        Commands::Clusters(command) => {
            let (target, request, output) = cluster_request(command)?;
            run(&settings, target, request, output).await
        }
        Commands::NodeGroups(command) => {
            let (target, request) = node_group_request(command)?;
            run(&settings, target, request, None).await
        }
        Commands::Info(command) => {
            let (target, request) = info_request(command);
            run(&settings, target, request, None).await
        }
        Commands::Seal { input, output } => seal(&settings, input, output),
    }
}
