//! Problem representations shared by the engines
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod constraint;
pub mod frontier;
pub mod graph;

pub use self::constraint::{invert, Constraint, ConstraintNetwork, DirectedArc, Relation, Variable};
pub use self::frontier::{Discipline, Frontier, SearchNode};
pub use self::graph::{GraphEdge, GraphNode, Position, SearchGraph};
