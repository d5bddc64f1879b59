//! The drainage network: segment graph plus classified storm points.

use crate::config::NetworkConfig;
use crate::coords::Node;
use crate::error::{NetworkError, Result};
use crate::graph::{FlowGraph, SegmentGraphBuilder};
use crate::layer::{FeatureId, LineLayer, PointLayer};
use crate::points::{PointClassifier, StormPoint};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Stormwater infrastructure parsed into a directional connectivity graph.
///
/// The network exclusively owns its graph. Resolution mutates it in place;
/// all queries borrow it read-only.
#[derive(Debug, Clone)]
pub struct Network {
    crs: Option<String>,
    decimals: u32,
    pub(crate) graph: FlowGraph,
    points: Vec<StormPoint>,
    point_index: HashMap<FeatureId, usize>,
    /// Rounded coordinate → indices of points located there, in layer order.
    coord_index: HashMap<Node, Vec<usize>>,
}

/// Aggregate counts describing a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub crs: Option<String>,
    pub lines: usize,
    pub segments: usize,
    pub nodes: usize,
    pub edges: usize,
    pub bidirected_pairs: usize,
    pub points: usize,
    pub points_in_graph: usize,
    pub sources: usize,
    pub sinks: usize,
    pub directions_resolved: bool,
}

impl Network {
    /// Build the unresolved network. Fails fast on schema or CRS problems
    /// before any graph construction happens.
    pub fn new(lines: &LineLayer, points: &PointLayer, config: &NetworkConfig) -> Result<Self> {
        if points.crs != lines.crs {
            return Err(NetworkError::CrsMismatch {
                points: points.crs.clone(),
                lines: lines.crs.clone(),
            });
        }

        let index_column = config.index_column.as_str();
        if !lines.has_column(index_column) {
            return Err(NetworkError::MissingColumn {
                layer: "storm_lines",
                column: index_column.to_string(),
            });
        }

        // Explode every line into 2-vertex segments; each segment starts out
        // bidirected and is oriented later
        let mut builder = SegmentGraphBuilder::new(config.coord_decimals);
        let mut line_ids = HashSet::new();
        for feature in &lines.features {
            let id = feature
                .properties
                .get(index_column)
                .and_then(FeatureId::from_value)
                .ok_or_else(|| NetworkError::MissingColumn {
                    layer: "storm_lines",
                    column: index_column.to_string(),
                })?;
            if !line_ids.insert(id.clone()) {
                return Err(NetworkError::DuplicateId {
                    layer: "storm_lines",
                    id,
                });
            }
            builder.add_line(id, feature.geometry.vertices())?;
        }
        let graph = builder.build();

        let mapping = config.mapping();
        let classifier = PointClassifier {
            index_column,
            type_column: config.type_column(),
            mapping: &mapping,
            decimals: config.coord_decimals,
        };
        let points = classifier.classify_layer(points)?;

        tracing::debug!(
            "built network: {} lines, {} nodes, {} edges, {} points",
            graph.line_count(),
            graph.node_count(),
            graph.edge_count(),
            points.len()
        );

        Ok(Self::from_parts(lines.crs.clone(), config.coord_decimals, graph, points))
    }

    /// Assemble a network from an already built graph and classified points.
    pub fn from_parts(
        crs: Option<String>,
        decimals: u32,
        graph: FlowGraph,
        points: Vec<StormPoint>,
    ) -> Self {
        let mut point_index = HashMap::with_capacity(points.len());
        let mut coord_index: HashMap<Node, Vec<usize>> = HashMap::new();
        for (i, pt) in points.iter().enumerate() {
            point_index.entry(pt.id.clone()).or_insert(i);
            coord_index.entry(pt.coord).or_default().push(i);
        }
        Self {
            crs,
            decimals,
            graph,
            points,
            point_index,
            coord_index,
        }
    }

    pub fn crs(&self) -> Option<&str> {
        self.crs.as_deref()
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn points(&self) -> &[StormPoint] {
        &self.points
    }

    pub fn directions_resolved(&self) -> bool {
        self.graph.is_resolved()
    }

    pub fn point(&self, id: &FeatureId) -> Option<&StormPoint> {
        self.point_index.get(id).map(|&i| &self.points[i])
    }

    pub(crate) fn require_point(&self, id: &FeatureId) -> Result<&StormPoint> {
        self.point(id)
            .ok_or_else(|| NetworkError::UnknownPoint(id.clone()))
    }

    /// Whether the point's coordinate is a node of the graph.
    pub fn has_point(&self, id: &FeatureId) -> bool {
        self.point(id)
            .is_some_and(|pt| self.graph.contains(&pt.coord))
    }

    /// All points located at a node, in layer order.
    pub fn points_at(&self, node: &Node) -> impl Iterator<Item = &StormPoint> {
        self.coord_index
            .get(node)
            .into_iter()
            .flatten()
            .map(|&i| &self.points[i])
    }

    /// The first point at a node in layer order. Silent when others share it.
    pub fn first_point_at(&self, node: &Node) -> Option<&StormPoint> {
        self.coord_index
            .get(node)?
            .first()
            .map(|&i| &self.points[i])
    }

    /// Warns that a query answered with the first of several points at `node`.
    pub(crate) fn warn_if_shared(&self, node: &Node) {
        let shared = self.coord_index.get(node).map_or(0, Vec::len);
        if shared > 1 {
            tracing::warn!(
                "{} points share coordinate {}, only keeping the first",
                shared,
                node
            );
        }
    }

    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            crs: self.crs.clone(),
            lines: self.graph.line_count(),
            segments: self.graph.segments().len(),
            nodes: self.graph.node_count(),
            edges: self.graph.edge_count(),
            bidirected_pairs: self.graph.bidirected_pairs(),
            points: self.points.len(),
            points_in_graph: self
                .points
                .iter()
                .filter(|p| self.graph.contains(&p.coord))
                .count(),
            sources: self.points.iter().filter(|p| p.is_source).count(),
            sinks: self.points.iter().filter(|p| p.is_sink).count(),
            directions_resolved: self.graph.is_resolved(),
        }
    }
}
