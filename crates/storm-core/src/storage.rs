//! Read layers and network snapshots from disk.

use crate::config::StormConfig;
use crate::layer::{Catchment, CatchmentLayer, LineLayer, PointLayer};
use crate::network::Network;
use crate::schema;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

const STORM_DIR: &str = ".storm";
const SNAPSHOT_FILE: &str = "network.json";

/// Get the path to the `.storm` directory for a given project root.
pub fn storm_dir(project_root: &Path) -> PathBuf {
    project_root.join(STORM_DIR)
}

/// Default location of an exported snapshot.
pub fn snapshot_file(project_root: &Path) -> PathBuf {
    storm_dir(project_root).join(SNAPSHOT_FILE)
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {} from {}", what, path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("failed to parse {} in {}", what, path.display()))
}

pub fn read_lines(path: &Path) -> Result<LineLayer> {
    read_json(path, "storm lines")
}

pub fn read_points(path: &Path) -> Result<PointLayer> {
    read_json(path, "storm points")
}

pub fn read_catchment(path: &Path) -> Result<Catchment> {
    let layer: CatchmentLayer = read_json(path, "catchment")?;
    Ok(layer.into())
}

/// Build the unresolved network from the input layers named in the config.
/// Relative input paths resolve against the project root.
pub fn load_network(project_root: &Path, config: &StormConfig) -> Result<Network> {
    let lines_path = project_root.join(&config.inputs.lines);
    let points_path = project_root.join(&config.inputs.points);
    let lines = read_lines(&lines_path)?;
    let points = read_points(&points_path)?;
    Network::new(&lines, &points, &config.network).with_context(|| {
        format!(
            "failed to build network from {} and {}",
            lines_path.display(),
            points_path.display()
        )
    })
}

/// Write a snapshot, creating parent directories if needed.
pub fn save_snapshot(path: &Path, network: &Network) -> Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }
    let json = schema::to_json(network)?;
    fs::write(path, json)
        .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<Network> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot from {}", path.display()))?;
    schema::from_json(&json)
}
