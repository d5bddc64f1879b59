//! Flow across the boundary of a candidate catchment polygon.
//!
//! Clipping points to the catchment includes points on its boundary; the test
//! for graph nodes lying outside the catchment uses strict containment, so
//! boundary nodes count as outside.

use crate::error::{NetworkError, Result};
use crate::graph::NodeId;
use crate::layer::{Catchment, FeatureId};
use crate::network::Network;
use crate::points::StormPoint;
use geo::{Contains, Intersects};
use std::collections::{BTreeSet, HashSet, VecDeque};

impl Network {
    /// Points intersecting the catchment polygon, in layer order.
    pub fn clip_points(&self, catchment: &Catchment) -> Result<Vec<&StormPoint>> {
        self.check_catchment_crs(catchment)?;
        Ok(self
            .points()
            .iter()
            .filter(|p| catchment.geometry.intersects(&p.coord.to_point()))
            .collect())
    }

    /// Outlets outside the catchment that receive flow from sinks inside it.
    ///
    /// The catchments of these points must be removed from the candidate
    /// catchment: flow leaves before reaching them. Identifiers are returned
    /// in first-seen order without repeats.
    pub fn get_outlet_points(&self, catchment: &Catchment) -> Result<Vec<FeatureId>> {
        let inside = self.clip_points(catchment)?;
        let inside_ids: HashSet<&FeatureId> = inside.iter().map(|p| &p.id).collect();

        let mut outlets = Vec::new();
        for sink in inside.iter().filter(|p| p.is_sink) {
            if let Some(outlet) = self.get_outlet(&sink.id)?
                && !inside_ids.contains(&outlet)
                && !outlets.contains(&outlet)
            {
                outlets.push(outlet);
            }
        }
        Ok(outlets)
    }

    /// Points outside the catchment that drain into a source inside it.
    ///
    /// Walks breadth-first against edge direction from every in-catchment
    /// source over the whole graph. Requires resolved directions.
    pub fn get_inlet_points(&self, catchment: &Catchment) -> Result<Vec<FeatureId>> {
        if !self.directions_resolved() {
            return Err(NetworkError::Unresolved("get inlet points"));
        }
        let inside = self.clip_points(catchment)?;

        let mut inlets = BTreeSet::new();
        for source in inside.iter().filter(|p| p.is_source) {
            let Some(root) = self.graph.node_id(&source.coord) else {
                tracing::warn!(
                    "source point {} inside the catchment is not a node of the graph, skipping",
                    source.id
                );
                continue;
            };
            for node_id in self.upstream_bfs(root) {
                let node = self.graph.node(node_id);
                if catchment.geometry.contains(&node.to_point()) {
                    continue;
                }
                if let Some(pt) = self.first_point_at(&node)
                    && inlets.insert(pt.id.clone())
                {
                    self.warn_if_shared(&node);
                }
            }
        }
        Ok(inlets.into_iter().collect())
    }

    /// Breadth-first order of every node reaching `root`, `root` included.
    fn upstream_bfs(&self, root: NodeId) -> Vec<NodeId> {
        let mut visited = vec![false; self.graph.node_count()];
        visited[root.0] = true;
        let mut order = Vec::new();
        let mut queue = VecDeque::from([root]);
        while let Some(v) = queue.pop_front() {
            order.push(v);
            for &u in self.graph.predecessors(v) {
                if !visited[u.0] {
                    visited[u.0] = true;
                    queue.push_back(u);
                }
            }
        }
        order
    }

    fn check_catchment_crs(&self, catchment: &Catchment) -> Result<()> {
        match (&catchment.crs, self.crs()) {
            (Some(theirs), Some(ours)) if theirs != ours => {
                Err(NetworkError::CatchmentCrsMismatch {
                    network: Some(ours.to_string()),
                    catchment: Some(theirs.clone()),
                })
            }
            _ => Ok(()),
        }
    }
}
