//! Canonical teaching instances
//!
//! Each preset is built through the same validated mutation API a
//! rendering layer uses, so a preset that fails to build is a bug in
//! the preset itself. The builders therefore return values, not
//! `Result`s.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use crate::algorithm::adversarial::minimax::MinimaxProblem;
use crate::algorithm::path_finding::problem::SearchProblem;
use crate::algorithm::traits::AlgorithmError;
use crate::data_structures::constraint::{Constraint, ConstraintNetwork, Relation};
use crate::data_structures::graph::{Position, SearchGraph};

/// Colours available to the map-colouring preset
pub const MAP_COLOURS: [&str; 4] = ["red", "green", "blue", "yellow"];

pub const SAUDI_PROVINCES: [&str; 13] = [
    "Tabuk",
    "Al-Jawf",
    "Northern Borders",
    "Hail",
    "Qassim",
    "Madinah",
    "Eastern Province",
    "Riyadh",
    "Makkah",
    "Al-Bahah",
    "Asir",
    "Jazan",
    "Najran",
];

const SAUDI_BORDERS: [(&str, &str); 25] = [
    ("Tabuk", "Al-Jawf"),
    ("Tabuk", "Hail"),
    ("Tabuk", "Madinah"),
    ("Al-Jawf", "Northern Borders"),
    ("Al-Jawf", "Hail"),
    ("Northern Borders", "Hail"),
    ("Northern Borders", "Eastern Province"),
    ("Hail", "Qassim"),
    ("Hail", "Madinah"),
    ("Qassim", "Madinah"),
    ("Qassim", "Riyadh"),
    ("Qassim", "Eastern Province"),
    ("Madinah", "Riyadh"),
    ("Madinah", "Makkah"),
    ("Eastern Province", "Riyadh"),
    ("Eastern Province", "Najran"),
    ("Riyadh", "Makkah"),
    ("Riyadh", "Asir"),
    ("Riyadh", "Najran"),
    ("Makkah", "Al-Bahah"),
    ("Makkah", "Asir"),
    ("Al-Bahah", "Asir"),
    ("Asir", "Jazan"),
    ("Asir", "Najran"),
    ("Jazan", "Najran"),
];

fn weighted_graph() -> Result<SearchGraph, AlgorithmError> {
    let mut graph = SearchGraph::new(false);
    for (id, x, y) in [
        ("S", 50.0, 200.0),
        ("A", 150.0, 120.0),
        ("B", 170.0, 280.0),
        ("C", 280.0, 100.0),
        ("D", 300.0, 240.0),
        ("G", 400.0, 180.0),
    ] {
        graph.add_node(id, Position::new(x, y))?;
    }
    for (from, to, weight) in [
        ("S", "A", 2.0),
        ("S", "B", 5.0),
        ("A", "B", 2.0),
        ("A", "C", 5.0),
        ("B", "D", 3.0),
        ("C", "D", 1.0),
        ("C", "G", 4.0),
        ("D", "G", 2.0),
    ] {
        graph.add_edge(from, to, weight)?;
    }
    Ok(graph)
}

/// Six-node weighted graph from S to G with consistent manual
/// heuristics. The cheapest path is S-A-B-D-G with cost 9.
pub fn weighted_search_problem() -> SearchProblem {
    let graph = weighted_graph().unwrap_or_else(|e| {
        log::warn!("weighted search preset incomplete: {e}");
        SearchGraph::new(false)
    });
    SearchProblem::new(graph, "S", "G").with_heuristics([
        ("S", 8.0),
        ("A", 6.0),
        ("B", 4.0),
        ("C", 3.0),
        ("D", 2.0),
        ("G", 0.0),
    ])
}

fn game_tree() -> Result<SearchGraph, AlgorithmError> {
    let mut graph = SearchGraph::new(true);
    for (id, x, y) in [
        ("A", 200.0, 40.0),
        ("B", 100.0, 140.0),
        ("C", 300.0, 140.0),
        ("D", 50.0, 240.0),
        ("E", 150.0, 240.0),
        ("F", 250.0, 240.0),
        ("G", 350.0, 240.0),
    ] {
        graph.add_node(id, Position::new(x, y))?;
    }
    for (parent, child) in [("A", "B"), ("A", "C"), ("B", "D"), ("B", "E"), ("C", "F"), ("C", "G")] {
        graph.add_edge(parent, child, 1.0)?;
    }
    Ok(graph)
}

/// Depth-2 game tree rooted at A with leaves D=3, E=5, F=2, G=9.
/// MAX at the root yields 3 via B.
pub fn minimax_tree() -> MinimaxProblem {
    let graph = game_tree().unwrap_or_else(|e| {
        log::warn!("minimax preset incomplete: {e}");
        SearchGraph::new(true)
    });
    MinimaxProblem::new(graph, "A").with_values([("D", 3.0), ("E", 5.0), ("F", 2.0), ("G", 9.0)])
}

fn classic_network() -> Result<ConstraintNetwork, AlgorithmError> {
    let mut network = ConstraintNetwork::new();
    for id in ["X", "Y", "Z"] {
        network.add_variable(id, 1..=6)?;
    }
    network.add_constraint(Constraint::new("X", "Y", Relation::Lt, 0))?;
    network.add_constraint(Constraint::new("Z", "X", Relation::Lt, -2))?;
    Ok(network)
}

/// `X < Y` and `Z < X - 2` over `1..=6`
pub fn arc_consistency_network() -> ConstraintNetwork {
    classic_network().unwrap_or_else(|e| {
        log::warn!("arc consistency preset incomplete: {e}");
        ConstraintNetwork::new()
    })
}

fn provinces() -> Result<ConstraintNetwork, AlgorithmError> {
    let mut network = ConstraintNetwork::new();
    for province in SAUDI_PROVINCES {
        network.add_variable(province, 0..MAP_COLOURS.len() as i64)?;
    }
    for (a, b) in SAUDI_BORDERS {
        network.add_constraint(Constraint::new(a, b, Relation::Ne, 0))?;
    }
    Ok(network)
}

/// Four-colouring of the thirteen Saudi provinces; values index
/// [`MAP_COLOURS`]
pub fn saudi_provinces_network() -> ConstraintNetwork {
    provinces().unwrap_or_else(|e| {
        log::warn!("map colouring preset incomplete: {e}");
        ConstraintNetwork::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_build_completely() {
        assert!(weighted_graph().is_ok());
        assert!(game_tree().is_ok());
        assert!(classic_network().is_ok());
        assert!(provinces().is_ok());

        let network = saudi_provinces_network();
        assert_eq!(network.variables().len(), 13);
        assert_eq!(network.constraints().len(), SAUDI_BORDERS.len());
        assert!(network.variables().iter().all(|v| v.domain == vec![0, 1, 2, 3]));
    }

    #[test]
    fn test_weighted_heuristics_are_consistent() {
        let problem = weighted_search_problem();
        for edge in problem.graph.edges() {
            let gap = (problem.heuristic(&edge.from) - problem.heuristic(&edge.to)).abs();
            assert!(gap <= edge.weight, "{} - {}", edge.from, edge.to);
        }
        assert_eq!(problem.graph.path_cost(&["S".into(), "A".into(), "B".into(), "D".into(), "G".into()]), Some(9.0));
    }
}
