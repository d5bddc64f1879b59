//! Configuration for network construction, direction resolution and inputs.
//!
//! Load order: `.storm/config.toml` → environment variables → defaults.

use crate::points::{SINK_TYPES_VT, SOURCE_TYPES_VT, TypeCodeMapping};
use crate::resolve::ResolveMethod;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StormConfig {
    pub network: NetworkConfig,
    pub resolve: ResolveConfig,
    pub inputs: InputConfig,
}

/// How line and point features become a graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Decimal places coordinates are rounded to before they become nodes.
    /// Prevents problems with improper snapping between adjacent lines.
    pub coord_decimals: u32,
    /// Identifier property on both line and point features.
    pub index_column: String,
    /// Property holding each point's type code. Empty when IS_SOURCE and
    /// IS_SINK are precomputed on the point layer.
    pub type_column: String,
    /// Type codes where flow enters the network (e.g. catchbasins).
    pub sink_types: Vec<i64>,
    /// Type codes where flow exits the network (e.g. outfalls).
    pub source_types: Vec<i64>,
    /// Permit a code in both sets, producing points that are sink and source at once.
    pub allow_dual_role: bool,
}

/// Direction resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// One of `from_sources`, `vertex_order`, `vertex_order_r`.
    pub method: String,
}

/// Input layer locations, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub lines: PathBuf,
    pub points: PathBuf,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            coord_decimals: 3,
            index_column: "OBJECTID".to_string(),
            type_column: "Type".to_string(),
            sink_types: SINK_TYPES_VT.to_vec(),
            source_types: SOURCE_TYPES_VT.to_vec(),
            allow_dual_role: false,
        }
    }
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            method: "from_sources".to_string(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            lines: PathBuf::from("storm_lines.json"),
            points: PathBuf::from("storm_pts.json"),
        }
    }
}

impl NetworkConfig {
    pub fn type_column(&self) -> Option<&str> {
        if self.type_column.is_empty() {
            None
        } else {
            Some(&self.type_column)
        }
    }

    pub fn mapping(&self) -> TypeCodeMapping {
        TypeCodeMapping::new(
            self.sink_types.iter().copied(),
            self.source_types.iter().copied(),
        )
    }

    pub fn validate(&self) -> Result<()> {
        if self.index_column.trim().is_empty() {
            anyhow::bail!("index_column must not be empty");
        }
        let overlap = self.mapping().overlapping();
        if !overlap.is_empty() && !self.allow_dual_role {
            anyhow::bail!(
                "type codes {:?} are listed as both sink and source types (set allow_dual_role to permit this)",
                overlap
            );
        }
        Ok(())
    }
}

impl ResolveConfig {
    pub fn method(&self) -> Result<ResolveMethod> {
        Ok(self.method.parse()?)
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl StormConfig {
    /// Load config from `.storm/config.toml` in the project root, with env var overrides.
    /// Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join(".storm").join("config.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        // Environment variable overrides
        env_override(
            "STORM_COORD_DECIMALS",
            &mut config.network.coord_decimals,
        );
        env_override("STORM_INDEX_COLUMN", &mut config.network.index_column);
        env_override("STORM_TYPE_COLUMN", &mut config.network.type_column);
        env_override("STORM_RESOLVE_METHOD", &mut config.resolve.method);

        config.network.validate()?;
        config.resolve.method()?;

        Ok(config)
    }
}
