//! Search problem definition: graph, endpoints and heuristic source
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{AlgorithmError, NodeId};
use crate::data_structures::graph::{Position, SearchGraph};

/// Divisor applied to canvas distances by the automatic heuristic
pub const EUCLIDEAN_SCALE: f64 = 10.0;

/// Graph plus start, goal and heuristic values as edited in the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchProblem {
    pub graph: SearchGraph,
    pub start: NodeId,
    pub goal: NodeId,
    /// Use `heuristics` instead of the Euclidean default
    #[serde(default)]
    pub manual_heuristics: bool,
    /// Per-node estimates; missing entries count as 0
    #[serde(default)]
    pub heuristics: BTreeMap<NodeId, f64>,
}

impl SearchProblem {
    pub fn new(graph: SearchGraph, start: impl Into<NodeId>, goal: impl Into<NodeId>) -> Self {
        Self {
            graph,
            start: start.into(),
            goal: goal.into(),
            manual_heuristics: false,
            heuristics: BTreeMap::new(),
        }
    }

    /// Switches to manual heuristic values
    pub fn with_heuristics<I, K>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<NodeId>,
    {
        self.manual_heuristics = true;
        self.heuristics = values.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self
    }

    /// Heuristic estimate for `node` under the active source
    pub fn heuristic(&self, node: &NodeId) -> f64 {
        if self.manual_heuristics {
            return self.heuristics.get(node).copied().unwrap_or(0.0);
        }
        match (self.graph.position(node), self.graph.position(&self.goal)) {
            (Some(from), Some(goal)) => euclidean_estimate(from, goal),
            _ => 0.0,
        }
    }

    /// Checks the graph and that both endpoints exist
    pub fn validate(&self) -> Result<(), AlgorithmError> {
        self.graph.validate()?;
        self.require(&self.start, "start node")?;
        self.require(&self.goal, "goal node")
    }

    fn require(&self, id: &NodeId, role: &'static str) -> Result<(), AlgorithmError> {
        if self.graph.contains(id) {
            Ok(())
        } else {
            Err(AlgorithmError::MissingNode {
                role,
                id: id.clone(),
            })
        }
    }

    /// Renames a node everywhere it is referenced: edges, endpoints and
    /// heuristic values. Nothing changes when the rename is rejected.
    pub fn rename_node(&mut self, old: &NodeId, new: impl Into<NodeId>) -> Result<(), AlgorithmError> {
        let new = new.into();
        self.graph.rename_node(old, new.clone())?;
        if &self.start == old {
            self.start = new.clone();
        }
        if &self.goal == old {
            self.goal = new.clone();
        }
        if let Some(value) = self.heuristics.remove(old) {
            self.heuristics.insert(new, value);
        }
        Ok(())
    }

    /// Removes a node, its edges and its heuristic value
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        self.heuristics.remove(id);
        self.graph.remove_node(id)
    }
}

/// `round(distance / 10)`, the visualizer's automatic estimate
#[inline]
pub fn euclidean_estimate(from: Position, goal: Position) -> f64 {
    (from.distance_to(&goal) / EUCLIDEAN_SCALE).round()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem() -> SearchProblem {
        let mut graph = SearchGraph::new(false);
        graph.add_node("S", Position::new(0.0, 0.0)).unwrap();
        graph.add_node("A", Position::new(30.0, 40.0)).unwrap();
        graph.add_node("G", Position::new(60.0, 80.0)).unwrap();
        graph.add_edge("S", "A", 5.0).unwrap();
        graph.add_edge("A", "G", 5.0).unwrap();
        SearchProblem::new(graph, "S", "G")
    }

    #[test]
    fn test_euclidean_heuristic() {
        let problem = problem();
        assert_eq!(problem.heuristic(&"S".into()), 10.0);
        assert_eq!(problem.heuristic(&"A".into()), 5.0);
        assert_eq!(problem.heuristic(&"G".into()), 0.0);
        assert_eq!(euclidean_estimate(Position::new(0.0, 0.0), Position::new(0.0, 25.0)), 3.0);
    }

    #[test]
    fn test_manual_heuristic_defaults_to_zero() {
        let problem = problem().with_heuristics([("S", 7.0)]);
        assert_eq!(problem.heuristic(&"S".into()), 7.0);
        assert_eq!(problem.heuristic(&"A".into()), 0.0);
    }

    #[test]
    fn test_rename_updates_all_references() {
        let mut problem = problem().with_heuristics([("S", 7.0)]);
        problem.rename_node(&"S".into(), "Start").unwrap();
        assert_eq!(problem.start.as_str(), "Start");
        assert_eq!(problem.heuristic(&"Start".into()), 7.0);
        assert!(problem.validate().is_ok());

        assert!(problem.rename_node(&"Start".into(), "G").is_err());
        assert_eq!(problem.goal.as_str(), "G");
    }

    #[test]
    fn test_validation_catches_missing_endpoints() {
        let mut problem = problem();
        problem.remove_node(&"G".into());
        assert!(matches!(
            problem.validate(),
            Err(AlgorithmError::MissingNode { role: "goal node", .. })
        ));
    }
}
