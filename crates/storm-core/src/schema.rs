//! JSON snapshot format and version handling for exported networks.

use crate::coords::Node;
use crate::graph::{Claim, FlowGraph, Segment};
use crate::network::Network;
use crate::points::StormPoint;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const CURRENT_VERSION: &str = "1.0.0";

/// A network frozen after (or before) resolution: surviving edges, segments and points.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub crs: Option<String>,
    pub coord_decimals: u32,
    pub directions_resolved: bool,
    pub segments: Vec<Segment>,
    pub edges: Vec<SnapshotEdge>,
    pub points: Vec<StormPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEdge {
    pub from: Node,
    pub to: Node,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim: Option<Claim>,
}

impl NetworkSnapshot {
    pub fn from_network(network: &Network) -> Self {
        let graph = network.graph();
        let edges = graph
            .edges()
            .map(|(from, to)| {
                let claim = match (graph.node_id(&from), graph.node_id(&to)) {
                    (Some(u), Some(v)) => graph.claim(u, v).cloned(),
                    _ => None,
                };
                SnapshotEdge { from, to, claim }
            })
            .collect();
        Self {
            version: CURRENT_VERSION.to_string(),
            exported_at: Utc::now(),
            crs: network.crs().map(str::to_string),
            coord_decimals: network.decimals(),
            directions_resolved: network.directions_resolved(),
            segments: graph.segments().to_vec(),
            edges,
            points: network.points().to_vec(),
        }
    }

    /// Rebuild the network. Nodes come back in segment order, edges in export order.
    pub fn into_network(self) -> Network {
        let mut graph = FlowGraph::new();
        for segment in self.segments {
            graph.add_node(segment.from);
            graph.add_node(segment.to);
            graph.push_segment(segment);
        }
        for edge in self.edges {
            let u = graph.add_node(edge.from);
            let v = graph.add_node(edge.to);
            graph.add_edge(u, v);
            if let Some(claim) = edge.claim {
                graph.set_claim(u, v, claim);
            }
        }
        if self.directions_resolved {
            graph.mark_resolved();
        }
        Network::from_parts(self.crs, self.coord_decimals, graph, self.points)
    }
}

/// Validate a snapshot's schema version.
pub fn validate_version(snapshot: &NetworkSnapshot) -> Result<()> {
    if snapshot.version != CURRENT_VERSION {
        anyhow::bail!(
            "snapshot version mismatch: expected {}, found {}",
            CURRENT_VERSION,
            snapshot.version
        );
    }
    Ok(())
}

/// Serialize a network to a pretty-printed JSON snapshot.
pub fn to_json(network: &Network) -> Result<String> {
    serde_json::to_string_pretty(&NetworkSnapshot::from_network(network))
        .context("failed to serialize network snapshot to JSON")
}

/// Deserialize a network from a JSON snapshot.
pub fn from_json(json: &str) -> Result<Network> {
    let snapshot: NetworkSnapshot =
        serde_json::from_str(json).context("failed to deserialize network snapshot from JSON")?;
    validate_version(&snapshot)?;
    Ok(snapshot.into_network())
}
