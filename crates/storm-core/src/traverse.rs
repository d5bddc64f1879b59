//! Downstream and outlet queries over the drainage graph.

use crate::error::{NetworkError, Result};
use crate::graph::{FlowGraph, NodeId};
use crate::layer::FeatureId;
use crate::network::Network;
use crate::points::StormPoint;

impl Network {
    /// First flow source reachable downstream of a point, following current edge directions.
    ///
    /// Works before resolution too: unresolved edges are simply followed both ways.
    /// The search stops at the first source met along the depth-first path, which
    /// is not necessarily the nearest one. Only the first point at each coordinate
    /// is considered, so a source listed after another point there is not found.
    pub fn find_downstream(&self, id: &FeatureId) -> Result<Option<&StormPoint>> {
        let pt = self.require_point(id)?;
        let Some(start) = self.graph.node_id(&pt.coord) else {
            tracing::info!(
                "the point with index {} does not have its coordinates as a node in the graph",
                id
            );
            return Ok(None);
        };

        let graph = &self.graph;
        let mut visited = vec![false; graph.node_count()];
        visited[start.0] = true;
        let mut stack: Vec<(NodeId, usize)> = vec![(start, 0)];

        while let Some(frame) = stack.last_mut() {
            let (v, next) = *frame;
            let Some(&n) = graph.successors(v).get(next) else {
                stack.pop();
                continue;
            };
            frame.1 += 1;
            let node = graph.node(n);
            if let Some(candidate) = self.first_point_at(&node)
                && candidate.is_source
            {
                self.warn_if_shared(&node);
                return Ok(Some(candidate));
            }
            if !visited[n.0] {
                visited[n.0] = true;
                stack.push((n, 0));
            }
        }
        Ok(None)
    }

    /// Identifier of the point where flow from `id` leaves the network.
    ///
    /// Requires resolved directions. Returns `None` when the point's coordinate
    /// is not a graph node.
    pub fn get_outlet(&self, id: &FeatureId) -> Result<Option<FeatureId>> {
        if !self.directions_resolved() {
            return Err(NetworkError::Unresolved("get outlet"));
        }
        let pt = self.require_point(id)?;
        let Some(start) = self.graph.node_id(&pt.coord) else {
            tracing::info!(
                "the point with index {} does not have its coordinates as a node in the graph",
                id
            );
            return Ok(None);
        };

        let outlets = outlet_nodes(&self.graph, start);
        let Some(&outlet) = outlets.first() else {
            return Err(NetworkError::NoOutlet(id.clone()));
        };
        if outlets.len() > 1 {
            tracing::warn!(
                "multiple outlet coordinates found for point with index {}, only returning the first",
                id
            );
        }

        let node = self.graph.node(outlet);
        self.warn_if_shared(&node);
        self.first_point_at(&node)
            .map(|p| Some(p.id.clone()))
            .ok_or_else(|| NetworkError::NoPointAtOutlet {
                id: id.clone(),
                x: node.x(),
                y: node.y(),
            })
    }
}

/// Nodes reachable forward from `start` that have no outgoing edge, in
/// depth-first preorder.
///
/// Out-degree is taken in the whole graph, not in the search tree: a node whose
/// only successors were already visited is not an outlet.
pub fn outlet_nodes(graph: &FlowGraph, start: NodeId) -> Vec<NodeId> {
    preorder(graph, start)
        .into_iter()
        .filter(|&n| graph.out_degree(n) == 0)
        .collect()
}

/// Depth-first preorder of the nodes reachable forward from `start`.
pub fn preorder(graph: &FlowGraph, start: NodeId) -> Vec<NodeId> {
    let mut visited = vec![false; graph.node_count()];
    visited[start.0] = true;
    let mut order = vec![start];
    let mut stack: Vec<(NodeId, usize)> = vec![(start, 0)];

    while let Some(frame) = stack.last_mut() {
        let (v, next) = *frame;
        let Some(&n) = graph.successors(v).get(next) else {
            stack.pop();
            continue;
        };
        frame.1 += 1;
        if !visited[n.0] {
            visited[n.0] = true;
            order.push(n);
            stack.push((n, 0));
        }
    }
    order
}
