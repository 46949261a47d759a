//! Editable weighted graph for search visualizers
//!
//! The graph is the definition a rendering layer hands to the search and
//! minimax engines. Node positions exist only to derive the default
//! Euclidean heuristic. Undirected edges are stored once and become
//! traversable in both directions when neighbors are queried.
//!
//! Editing operations are atomic: they validate first and only then
//! mutate, so a failed rename or insertion leaves the graph untouched.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{AlgorithmError, NodeId};

/// 2D canvas position
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,
    #[serde(default)]
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: f64,
}

impl GraphEdge {
    /// Endpoint opposite to `node` when the edge may be walked from it
    fn step_from(&self, node: &NodeId, directed: bool) -> Option<&NodeId> {
        if &self.from == node {
            Some(&self.to)
        } else if !directed && &self.to == node {
            Some(&self.from)
        } else {
            None
        }
    }
}

/// Weighted graph with a directed/undirected toggle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchGraph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    #[serde(default)]
    is_directed: bool,
}

impl SearchGraph {
    pub fn new(directed: bool) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            is_directed: directed,
        }
    }

    #[inline]
    pub fn is_directed(&self) -> bool {
        self.is_directed
    }

    pub fn set_directed(&mut self, directed: bool) {
        self.is_directed = directed;
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.iter().any(|n| &n.id == id)
    }

    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn position(&self, id: &NodeId) -> Option<Position> {
        self.node(id).map(|n| n.position)
    }

    /// Adds a node; identifiers must be unique
    pub fn add_node(&mut self, id: impl Into<NodeId>, position: Position) -> Result<(), AlgorithmError> {
        let id = id.into();
        if self.contains(&id) {
            return Err(AlgorithmError::DuplicateId(id));
        }
        self.nodes.push(GraphNode { id, position });
        Ok(())
    }

    /// Adds an edge, or updates the weight of an existing one between
    /// the same endpoints.
    pub fn add_edge(
        &mut self,
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        weight: f64,
    ) -> Result<(), AlgorithmError> {
        let (from, to) = (from.into(), to.into());
        for endpoint in [&from, &to] {
            if !self.contains(endpoint) {
                return Err(AlgorithmError::MissingNode {
                    role: "edge endpoint",
                    id: endpoint.clone(),
                });
            }
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(AlgorithmError::InvalidWeight { from, to, weight });
        }

        let directed = self.is_directed;
        let existing = self.edges.iter_mut().find(|e| {
            (e.from == from && e.to == to) || (!directed && e.from == to && e.to == from)
        });
        match existing {
            Some(edge) => edge.weight = weight,
            None => self.edges.push(GraphEdge { from, to, weight }),
        }
        Ok(())
    }

    /// Removes a node together with every incident edge
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| &n.id != id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges.retain(|e| &e.from != id && &e.to != id);
        true
    }

    pub fn remove_edge(&mut self, from: &NodeId, to: &NodeId) -> bool {
        let before = self.edges.len();
        let directed = self.is_directed;
        self.edges.retain(|e| {
            !((&e.from == from && &e.to == to) || (!directed && &e.from == to && &e.to == from))
        });
        self.edges.len() != before
    }

    /// Renames a node and every edge endpoint referencing it
    pub fn rename_node(&mut self, old: &NodeId, new: impl Into<NodeId>) -> Result<(), AlgorithmError> {
        let new = new.into();
        if old == &new {
            return Err(AlgorithmError::SelfRename(new));
        }
        if !self.contains(old) {
            return Err(AlgorithmError::MissingNode {
                role: "node",
                id: old.clone(),
            });
        }
        if self.contains(&new) {
            return Err(AlgorithmError::DuplicateId(new));
        }

        for node in self.nodes.iter_mut().filter(|n| &n.id == old) {
            node.id = new.clone();
        }
        for edge in &mut self.edges {
            if &edge.from == old {
                edge.from = new.clone();
            }
            if &edge.to == old {
                edge.to = new.clone();
            }
        }
        Ok(())
    }

    /// Rejects definitions that could not have been built through the
    /// editing API (e.g. deserialized input with repeated identifiers).
    pub fn validate(&self) -> Result<(), AlgorithmError> {
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(&node.id) {
                return Err(AlgorithmError::DuplicateId(node.id.clone()));
            }
        }
        for edge in &self.edges {
            if !edge.weight.is_finite() || edge.weight < 0.0 {
                return Err(AlgorithmError::InvalidWeight {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    weight: edge.weight,
                });
            }
        }
        Ok(())
    }

    /// Reachable neighbors of `id` with edge weights, ascending by
    /// identifier. Edges whose far endpoint no longer exists are skipped.
    /// Each neighbor appears once, with its cheapest edge.
    pub fn neighbors(&self, id: &NodeId) -> Vec<(NodeId, f64)> {
        let mut neighbors: Vec<(NodeId, f64)> = self
            .edges
            .iter()
            .filter_map(|edge| {
                let next = edge.step_from(id, self.is_directed)?;
                if !self.contains(next) {
                    log::warn!("ignoring edge {} -> {}: '{}' does not exist", edge.from, edge.to, next);
                    return None;
                }
                Some((next.clone(), edge.weight))
            })
            .collect();
        neighbors.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
        neighbors.dedup_by(|later, kept| later.0 == kept.0);
        neighbors
    }

    /// Cheapest edge weight for a single move from `from` to `to`
    pub fn edge_weight(&self, from: &NodeId, to: &NodeId) -> Option<f64> {
        self.edges
            .iter()
            .filter(|e| e.step_from(from, self.is_directed) == Some(to))
            .map(|e| e.weight)
            .min_by(f64::total_cmp)
    }

    /// Total weight of a walk, `None` if some hop has no edge
    pub fn path_cost(&self, path: &[NodeId]) -> Option<f64> {
        path.windows(2)
            .map(|hop| self.edge_weight(&hop[0], &hop[1]))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(directed: bool) -> SearchGraph {
        let mut graph = SearchGraph::new(directed);
        graph.add_node("A", Position::new(0.0, 0.0)).unwrap();
        graph.add_node("B", Position::new(30.0, 40.0)).unwrap();
        graph.add_node("C", Position::new(60.0, 0.0)).unwrap();
        graph.add_edge("A", "C", 4.0).unwrap();
        graph.add_edge("A", "B", 2.0).unwrap();
        graph.add_edge("B", "C", 1.0).unwrap();
        graph
    }

    #[test]
    fn test_neighbors_sorted_and_direction_aware() {
        let undirected = triangle(false);
        let names: Vec<String> = undirected
            .neighbors(&"C".into())
            .into_iter()
            .map(|(id, _)| id.to_string())
            .collect();
        assert_eq!(names, vec!["A", "B"]);

        let directed = triangle(true);
        assert!(directed.neighbors(&"C".into()).is_empty());
        assert_eq!(
            directed.neighbors(&"A".into()),
            vec![(NodeId::from("B"), 2.0), (NodeId::from("C"), 4.0)]
        );
    }

    #[test]
    fn test_opposite_edges_merge_when_undirected() {
        let mut graph = triangle(true);
        graph.add_edge("B", "A", 1.0).unwrap();
        assert_eq!(graph.edges().len(), 4);

        graph.set_directed(false);
        assert_eq!(
            graph.neighbors(&"A".into()),
            vec![(NodeId::from("B"), 1.0), (NodeId::from("C"), 4.0)]
        );
        assert_eq!(graph.edge_weight(&"A".into(), &"B".into()), Some(1.0));
    }

    #[test]
    fn test_duplicate_and_invalid_insertions() {
        let mut graph = triangle(false);
        assert!(matches!(
            graph.add_node("A", Position::default()),
            Err(AlgorithmError::DuplicateId(_))
        ));
        assert!(matches!(
            graph.add_edge("A", "Z", 1.0),
            Err(AlgorithmError::MissingNode { .. })
        ));
        assert!(matches!(
            graph.add_edge("A", "B", -1.0),
            Err(AlgorithmError::InvalidWeight { .. })
        ));

        graph.add_edge("B", "A", 7.0).unwrap();
        assert_eq!(graph.edges().len(), 3);
        assert_eq!(graph.edge_weight(&"A".into(), &"B".into()), Some(7.0));
    }

    #[test]
    fn test_rename_propagates_to_edges() {
        let mut graph = triangle(false);
        graph.rename_node(&"A".into(), "S").unwrap();
        assert!(!graph.contains(&"A".into()));
        assert_eq!(graph.edge_weight(&"S".into(), &"C".into()), Some(4.0));

        assert!(matches!(
            graph.rename_node(&"S".into(), "S"),
            Err(AlgorithmError::SelfRename(_))
        ));
        assert!(matches!(
            graph.rename_node(&"S".into(), "B"),
            Err(AlgorithmError::DuplicateId(_))
        ));
        assert!(graph.contains(&"S".into()));
    }

    #[test]
    fn test_remove_node_cascades() {
        let mut graph = triangle(false);
        assert!(graph.remove_node(&"B".into()));
        assert_eq!(graph.edges().len(), 1);
        assert!(!graph.remove_node(&"B".into()));
    }

    #[test]
    fn test_dangling_edges_are_filtered() {
        let json = r#"{"nodes":[{"id":"A"},{"id":"B"}],
            "edges":[{"from":"A","to":"B","weight":1.0},{"from":"A","to":"Ghost","weight":1.0}]}"#;
        let graph: SearchGraph = serde_json::from_str(json).unwrap();
        assert!(!graph.is_directed());
        assert_eq!(graph.neighbors(&"A".into()), vec![(NodeId::from("B"), 1.0)]);
    }

    #[test]
    fn test_path_cost() {
        let graph = triangle(false);
        let path: Vec<NodeId> = ["A", "B", "C"].into_iter().map(NodeId::from).collect();
        assert_eq!(graph.path_cost(&path), Some(3.0));
        let broken: Vec<NodeId> = ["C", "C"].into_iter().map(NodeId::from).collect();
        assert_eq!(graph.path_cost(&broken), None);
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let json = r#"{"nodes":[{"id":"A"},{"id":"A"}],"edges":[]}"#;
        let graph: SearchGraph = serde_json::from_str(json).unwrap();
        assert!(matches!(graph.validate(), Err(AlgorithmError::DuplicateId(_))));
    }
}
