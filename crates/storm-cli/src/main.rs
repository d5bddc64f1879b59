//! CLI binary for stormcatchments: orient drainage networks and query flow across catchments.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use storm_core::config::StormConfig;
use storm_core::{FeatureId, Network, ResolveMethod, storage};

#[derive(Parser)]
#[command(
    name = "stormcatchments",
    about = "Stormwater network flow directions and catchment boundaries"
)]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Storm lines layer (overrides [inputs] lines)
    #[arg(long, global = true)]
    lines: Option<PathBuf>,

    /// Storm points layer (overrides [inputs] points)
    #[arg(long, global = true)]
    points: Option<PathBuf>,

    /// Load a previously exported network snapshot instead of the layers
    #[arg(long, global = true, conflicts_with_all = ["lines", "points"])]
    snapshot: Option<PathBuf>,

    /// Direction resolution method: from_sources, vertex_order, vertex_order_r
    #[arg(short, long, global = true)]
    method: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show network statistics
    Info,

    /// Resolve flow directions and report what changed
    Resolve,

    /// Find the first flow source downstream of a point, using the current edge directions
    Downstream {
        /// Point identifier
        id: String,
    },

    /// Find the point where flow from a point leaves the network
    Outlet {
        /// Point identifier
        id: String,
    },

    /// List outlets outside a catchment that receive flow from sinks inside it
    OutletPoints {
        /// Catchment polygon layer
        #[arg(short, long)]
        catchment: PathBuf,
    },

    /// List points outside a catchment that drain into sources inside it
    InletPoints {
        /// Catchment polygon layer
        #[arg(short, long)]
        catchment: PathBuf,
    },

    /// Resolve directions and write a network snapshot
    Export {
        /// Output file (defaults to .storm/network.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;
    let config = load_config(&cli, &project_root)?;
    let method = config.resolve.method()?;

    match &cli.command {
        Commands::Info => cmd_info(&cli, &project_root, &config),
        Commands::Resolve => cmd_resolve(&cli, &project_root, &config, method),
        Commands::Downstream { id } => cmd_downstream(&cli, &project_root, &config, id),
        Commands::Outlet { id } => cmd_outlet(&cli, &project_root, &config, method, id),
        Commands::OutletPoints { catchment } => {
            cmd_outlet_points(&cli, &project_root, &config, method, catchment)
        }
        Commands::InletPoints { catchment } => {
            cmd_inlet_points(&cli, &project_root, &config, method, catchment)
        }
        Commands::Export { output } => {
            cmd_export(&cli, &project_root, &config, method, output.as_deref())
        }
    }
}

/// Project config with command-line overrides applied on top.
fn load_config(cli: &Cli, project_root: &Path) -> Result<StormConfig> {
    let mut config = StormConfig::load(project_root).with_context(|| {
        format!("failed to load config from {}", project_root.display())
    })?;
    if let Some(lines) = &cli.lines {
        config.inputs.lines.clone_from(lines);
    }
    if let Some(points) = &cli.points {
        config.inputs.points.clone_from(points);
    }
    if let Some(method) = &cli.method {
        config.resolve.method.clone_from(method);
    }
    Ok(config)
}

fn load_network(cli: &Cli, project_root: &Path, config: &StormConfig) -> Result<Network> {
    match &cli.snapshot {
        Some(path) => storage::load_snapshot(&project_root.join(path)),
        None => storage::load_network(project_root, config),
    }
}

/// Load the network and orient it unless the snapshot already was.
fn load_resolved(
    cli: &Cli,
    project_root: &Path,
    config: &StormConfig,
    method: ResolveMethod,
) -> Result<Network> {
    let mut network = load_network(cli, project_root, config)?;
    if !network.directions_resolved() {
        network.resolve_directions(method)?;
    }
    Ok(network)
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_id(id: &str) -> FeatureId {
    match id.parse() {
        Ok(id) => id,
        Err(never) => match never {},
    }
}

fn cmd_info(cli: &Cli, project_root: &Path, config: &StormConfig) -> Result<()> {
    let network = load_network(cli, project_root, config)?;
    print_json(&network.summary())
}

fn cmd_resolve(
    cli: &Cli,
    project_root: &Path,
    config: &StormConfig,
    method: ResolveMethod,
) -> Result<()> {
    let mut network = load_network(cli, project_root, config)?;
    let report = network.resolve_directions(method)?;
    print_json(&json!({
        "report": report,
        "summary": network.summary(),
    }))
}

/// Follows the network as loaded: unresolved layers are searched in both directions.
fn cmd_downstream(cli: &Cli, project_root: &Path, config: &StormConfig, id: &str) -> Result<()> {
    let network = load_network(cli, project_root, config)?;
    let found = network.find_downstream(&parse_id(id))?;
    print_json(&found)
}

fn cmd_outlet(
    cli: &Cli,
    project_root: &Path,
    config: &StormConfig,
    method: ResolveMethod,
    id: &str,
) -> Result<()> {
    let network = load_resolved(cli, project_root, config, method)?;
    let outlet = network.get_outlet(&parse_id(id))?;
    print_json(&outlet)
}

fn cmd_outlet_points(
    cli: &Cli,
    project_root: &Path,
    config: &StormConfig,
    method: ResolveMethod,
    catchment: &Path,
) -> Result<()> {
    let network = load_resolved(cli, project_root, config, method)?;
    let catchment = storage::read_catchment(&project_root.join(catchment))?;
    print_json(&network.get_outlet_points(&catchment)?)
}

fn cmd_inlet_points(
    cli: &Cli,
    project_root: &Path,
    config: &StormConfig,
    method: ResolveMethod,
    catchment: &Path,
) -> Result<()> {
    let network = load_resolved(cli, project_root, config, method)?;
    let catchment = storage::read_catchment(&project_root.join(catchment))?;
    print_json(&network.get_inlet_points(&catchment)?)
}

fn cmd_export(
    cli: &Cli,
    project_root: &Path,
    config: &StormConfig,
    method: ResolveMethod,
    output: Option<&Path>,
) -> Result<()> {
    let network = load_resolved(cli, project_root, config, method)?;
    let path = match output {
        Some(p) => project_root.join(p),
        None => storage::snapshot_file(project_root),
    };
    storage::save_snapshot(&path, &network)?;
    tracing::info!("wrote network snapshot to {}", path.display());
    print_json(&json!({ "snapshot": path, "summary": network.summary() }))
}
