//! Directed segment graph built from storm line geometry.
//!
//! Every line is exploded into two-vertex segments. Each segment starts out
//! bidirected (`u -> v` and `v -> u`); direction resolution later prunes one
//! side. Nodes and neighbor lists keep insertion order so traversals are
//! deterministic.

use crate::coords::Node;
use crate::error::{NetworkError, Result};
use crate::layer::FeatureId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Dense index of a node within a [`FlowGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Who fixed the direction of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Claim {
    /// Oriented toward this source point by an upstream walk.
    Source(FeatureId),
    /// Oriented along this line's vertex order.
    Line(FeatureId),
}

impl fmt::Display for Claim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Claim::Source(id) => write!(f, "source {id}"),
            Claim::Line(id) => write!(f, "line {id}"),
        }
    }
}

/// A two-vertex piece of a storm line, in the line's vertex order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub line_id: FeatureId,
    pub from: Node,
    pub to: Node,
}

impl Segment {
    pub fn is_degenerate(&self) -> bool {
        self.from == self.to
    }
}

/// The drainage graph: rounded coordinates as nodes, segment directions as edges.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    nodes: Vec<Node>,
    node_index: HashMap<Node, NodeId>,
    succ: Vec<Vec<NodeId>>,
    pred: Vec<Vec<NodeId>>,
    /// Retained edge → whoever oriented it.
    claims: HashMap<(NodeId, NodeId), Claim>,
    segments: Vec<Segment>,
    /// Reverse index: line ID → indices into `segments`.
    line_index: BTreeMap<FeatureId, Vec<usize>>,
    resolved: bool,
}

impl FlowGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node if absent and return its id.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        if let Some(&id) = self.node_index.get(&node) {
            return id;
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.succ.push(Vec::new());
        self.pred.push(Vec::new());
        self.node_index.insert(node, id);
        id
    }

    pub fn node_id(&self, node: &Node) -> Option<NodeId> {
        self.node_index.get(node).copied()
    }

    pub fn contains(&self, node: &Node) -> bool {
        self.node_index.contains_key(node)
    }

    pub fn node(&self, id: NodeId) -> Node {
        self.nodes[id.0]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Insert the directed edge `u -> v`. Inserting an existing edge is a no-op.
    pub fn add_edge(&mut self, u: NodeId, v: NodeId) {
        if !self.has_edge(u, v) {
            self.succ[u.0].push(v);
            self.pred[v.0].push(u);
        }
    }

    pub fn has_edge(&self, u: NodeId, v: NodeId) -> bool {
        self.succ[u.0].contains(&v)
    }

    /// Remove `u -> v`, returning whether it was present.
    pub fn remove_edge(&mut self, u: NodeId, v: NodeId) -> bool {
        if !self.has_edge(u, v) {
            return false;
        }
        self.succ[u.0].retain(|&n| n != v);
        self.pred[v.0].retain(|&n| n != u);
        true
    }

    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        &self.succ[id.0]
    }

    pub fn predecessors(&self, id: NodeId) -> &[NodeId] {
        &self.pred[id.0]
    }

    pub fn out_degree(&self, id: NodeId) -> usize {
        self.succ[id.0].len()
    }

    pub fn edge_count(&self) -> usize {
        self.succ.iter().map(Vec::len).sum()
    }

    /// All directed edges, grouped by source node in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = (Node, Node)> + '_ {
        self.succ.iter().enumerate().flat_map(move |(u, targets)| {
            targets.iter().map(move |v| (self.nodes[u], self.nodes[v.0]))
        })
    }

    /// Number of node pairs still connected in both directions.
    pub fn bidirected_pairs(&self) -> usize {
        self.succ
            .iter()
            .enumerate()
            .flat_map(|(u, targets)| targets.iter().map(move |v| (NodeId(u), *v)))
            .filter(|&(u, v)| u < v && self.has_edge(v, u))
            .count()
    }

    pub fn claim(&self, u: NodeId, v: NodeId) -> Option<&Claim> {
        self.claims.get(&(u, v))
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segments produced by a single line, in vertex order.
    pub fn line_segments(&self, line_id: &FeatureId) -> Vec<&Segment> {
        self.line_index
            .get(line_id)
            .map(|idx| idx.iter().map(|&i| &self.segments[i]).collect())
            .unwrap_or_default()
    }

    pub fn line_count(&self) -> usize {
        self.line_index.len()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub(crate) fn mark_resolved(&mut self) {
        self.resolved = true;
    }

    pub(crate) fn push_segment(&mut self, segment: Segment) {
        let index = self.segments.len();
        self.line_index
            .entry(segment.line_id.clone())
            .or_default()
            .push(index);
        self.segments.push(segment);
    }

    pub(crate) fn set_claim(&mut self, u: NodeId, v: NodeId, claim: Claim) {
        self.claims.insert((u, v), claim);
    }

    /// Fail with `DirectionConflict` if fixing `u -> v` would drop an edge another claimant fixed.
    pub(crate) fn check_orientation(&self, u: NodeId, v: NodeId, claim: &Claim) -> Result<()> {
        match self.claims.get(&(v, u)) {
            Some(existing) if existing != claim => Err(self.conflict(v, u, existing, claim)),
            _ => Ok(()),
        }
    }

    /// Error for `contested_by` trying to reverse the retained edge `from -> to`.
    pub(crate) fn conflict(
        &self,
        from: NodeId,
        to: NodeId,
        claimed_by: &Claim,
        contested_by: &Claim,
    ) -> NetworkError {
        NetworkError::DirectionConflict {
            from_x: self.nodes[from.0].x(),
            from_y: self.nodes[from.0].y(),
            to_x: self.nodes[to.0].x(),
            to_y: self.nodes[to.0].y(),
            claimed_by: claimed_by.clone(),
            contested_by: contested_by.clone(),
        }
    }

    /// Keep only `u -> v` for the segment `{u, v}` and record who decided it.
    /// Returns whether the reverse edge was pruned.
    pub(crate) fn orient(&mut self, u: NodeId, v: NodeId, claim: Claim) -> Result<bool> {
        self.check_orientation(u, v, &claim)?;
        self.add_edge(u, v);
        let pruned = self.remove_edge(v, u);
        self.claims.remove(&(v, u));
        self.claims.entry((u, v)).or_insert(claim);
        Ok(pruned)
    }
}

/// Explodes storm lines into segments and inserts both directions of each.
#[derive(Debug)]
pub struct SegmentGraphBuilder {
    decimals: u32,
    graph: FlowGraph,
}

impl SegmentGraphBuilder {
    pub fn new(decimals: u32) -> Self {
        Self {
            decimals,
            graph: FlowGraph::new(),
        }
    }

    /// Add one line; returns the number of segments it contributed (`vertices - 1`).
    pub fn add_line(&mut self, line_id: FeatureId, vertices: &[[f64; 2]]) -> Result<usize> {
        if vertices.len() < 2 {
            return Err(NetworkError::InvalidLine {
                id: line_id,
                vertices: vertices.len(),
            });
        }
        if vertices.iter().flatten().any(|c| !c.is_finite()) {
            return Err(NetworkError::InvalidGeometry {
                id: line_id,
                reason: "line has a non-finite coordinate".to_string(),
            });
        }

        let nodes: Vec<Node> = vertices
            .iter()
            .map(|&[x, y]| Node::rounded(x, y, self.decimals))
            .collect();

        for pair in nodes.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let u = self.graph.add_node(from);
            let v = self.graph.add_node(to);
            if u == v {
                tracing::warn!(
                    "line {} has a zero-length segment at {} after rounding",
                    line_id,
                    from
                );
            } else {
                self.graph.add_edge(u, v);
                self.graph.add_edge(v, u);
            }
            self.graph.push_segment(Segment {
                line_id: line_id.clone(),
                from,
                to,
            });
        }
        Ok(nodes.len() - 1)
    }

    pub fn build(self) -> FlowGraph {
        self.graph
    }
}
