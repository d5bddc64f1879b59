//! Edge direction resolution.
//!
//! The graph starts with every segment bidirected. Resolution keeps one
//! direction per segment, either by walking upstream from every flow source
//! (`from_sources`) or by trusting each line's vertex order (`vertex_order`,
//! `vertex_order_r`). Every surviving oriented edge remembers its [`Claim`];
//! a later orientation that would reverse a claimed edge is rejected.

use crate::error::{NetworkError, Result};
use crate::graph::{Claim, FlowGraph, NodeId};
use crate::layer::FeatureId;
use crate::network::Network;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Strategy used to orient segment edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolveMethod {
    /// Depth-first walk upstream from every flow source.
    #[serde(rename = "from_sources")]
    FromSources,
    /// Flow follows each line's vertex order.
    #[serde(rename = "vertex_order")]
    VertexOrder,
    /// Flow opposes each line's vertex order.
    #[serde(rename = "vertex_order_r")]
    VertexOrderReversed,
}

impl ResolveMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolveMethod::FromSources => "from_sources",
            ResolveMethod::VertexOrder => "vertex_order",
            ResolveMethod::VertexOrderReversed => "vertex_order_r",
        }
    }
}

impl fmt::Display for ResolveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolveMethod {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "from_sources" => Ok(ResolveMethod::FromSources),
            "vertex_order" => Ok(ResolveMethod::VertexOrder),
            "vertex_order_r" => Ok(ResolveMethod::VertexOrderReversed),
            other => Err(NetworkError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Outcome of a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolveReport {
    pub method: ResolveMethod,
    /// Sources whose upstream subgraph was walked.
    pub sources_resolved: Vec<FeatureId>,
    /// Sources skipped because their coordinate is not a graph node.
    pub sources_missing: Vec<FeatureId>,
    /// Reverse edges removed by this pass.
    pub edges_pruned: usize,
}

impl ResolveReport {
    fn new(method: ResolveMethod) -> Self {
        Self {
            method,
            sources_resolved: Vec::new(),
            sources_missing: Vec::new(),
            edges_pruned: 0,
        }
    }
}

impl Network {
    /// Resolve directions for all edges with the given strategy.
    pub fn resolve_directions(&mut self, method: ResolveMethod) -> Result<ResolveReport> {
        let report = match method {
            ResolveMethod::FromSources => self.resolve_from_sources()?,
            ResolveMethod::VertexOrder => self.resolve_by_vertex_order(false)?,
            ResolveMethod::VertexOrderReversed => self.resolve_by_vertex_order(true)?,
        };
        tracing::info!(
            "resolved directions with {}: {} edges pruned, {} sources walked, {} sources missing",
            method,
            report.edges_pruned,
            report.sources_resolved.len(),
            report.sources_missing.len()
        );
        Ok(report)
    }

    /// Walk upstream from every source point present in the graph.
    pub fn resolve_from_sources(&mut self) -> Result<ResolveReport> {
        let mut report = ResolveReport::new(ResolveMethod::FromSources);
        let sources: Vec<FeatureId> = self
            .points()
            .iter()
            .filter(|p| p.is_source)
            .map(|p| p.id.clone())
            .collect();

        for id in sources {
            if !self.has_point(&id) {
                report.sources_missing.push(id);
                continue;
            }
            report.edges_pruned += self.resolve_upstream(&id)?;
            report.sources_resolved.push(id);
        }

        if !report.sources_missing.is_empty() {
            tracing::warn!(
                "{} source points are not part of the graph and were skipped: {:?}",
                report.sources_missing.len(),
                report
                    .sources_missing
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
            );
        }

        self.graph.mark_resolved();
        Ok(report)
    }

    /// Orient every edge upstream of one source toward it. Returns the number of edges pruned.
    pub fn resolve_upstream(&mut self, source_id: &FeatureId) -> Result<usize> {
        let source = self.require_point(source_id)?;
        if !source.is_source {
            return Err(NetworkError::NotASource(source_id.clone()));
        }
        let Some(root) = self.graph.node_id(&source.coord) else {
            tracing::warn!(
                "source point {} at {} is not a node of the graph",
                source_id,
                source.coord
            );
            return Ok(0);
        };

        let pruned = walk_upstream(&mut self.graph, root, &Claim::Source(source_id.clone()))?;
        tracing::debug!("source {}: pruned {} reverse edges", source_id, pruned);
        Ok(pruned)
    }

    /// Orient every segment along (or against, when `reverse`) its line's vertex order.
    ///
    /// All segments are checked for conflicting claims before the graph is touched.
    pub fn resolve_by_vertex_order(&mut self, reverse: bool) -> Result<ResolveReport> {
        let method = if reverse {
            ResolveMethod::VertexOrderReversed
        } else {
            ResolveMethod::VertexOrder
        };

        let mut planned: Vec<(NodeId, NodeId, Claim)> = Vec::new();
        let mut planned_claims: HashMap<(NodeId, NodeId), Claim> = HashMap::new();
        for segment in self.graph.segments() {
            if segment.is_degenerate() {
                continue;
            }
            let (Some(a), Some(b)) = (
                self.graph.node_id(&segment.from),
                self.graph.node_id(&segment.to),
            ) else {
                continue;
            };
            let (u, v) = if reverse { (b, a) } else { (a, b) };
            let claim = Claim::Line(segment.line_id.clone());

            self.graph.check_orientation(u, v, &claim)?;
            if let Some(other) = planned_claims.get(&(v, u))
                && other != &claim
            {
                return Err(self.graph.conflict(v, u, other, &claim));
            }
            planned_claims.entry((u, v)).or_insert_with(|| claim.clone());
            planned.push((u, v, claim));
        }

        let mut report = ResolveReport::new(method);
        for (u, v, claim) in planned {
            if self.graph.orient(u, v, claim)? {
                report.edges_pruned += 1;
            }
        }
        self.graph.mark_resolved();
        Ok(report)
    }
}

/// Depth-first walk along predecessor edges from `root`.
///
/// At each visited node `v`, every not-yet-visited predecessor `u` loses the
/// reverse edge `v -> u`, leaving `u -> v` pointing toward the root. Uses an
/// explicit stack of (node, next predecessor index) frames so that visitation
/// order matches the recursive formulation without its depth limit.
fn walk_upstream(graph: &mut FlowGraph, root: NodeId, claim: &Claim) -> Result<usize> {
    let mut visited = vec![false; graph.node_count()];
    visited[root.0] = true;
    let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
    let mut pruned = 0;

    while let Some(frame) = stack.last_mut() {
        let (v, next) = *frame;
        // pred(v) is stable while v is on the stack: pruning only touches
        // predecessor lists of unvisited nodes
        let Some(&u) = graph.predecessors(v).get(next) else {
            stack.pop();
            continue;
        };
        frame.1 += 1;
        if visited[u.0] {
            continue;
        }
        if graph.has_edge(v, u) && graph.orient(u, v, claim.clone())? {
            pruned += 1;
        }
        visited[u.0] = true;
        stack.push((u, 0));
    }

    Ok(pruned)
}
