//! MiniMax with optional alpha-beta pruning
//!
//! Edges are read as parent -> child moves from the root. A node with no
//! child outside its own path is a leaf and takes its stored value
//! (default 0). Inner nodes take the max or min of their children,
//! alternating players per depth.
//!
//! The trace is post-order: a node's step is recorded only after every
//! child below it has been resolved (or pruned). Ties keep the first
//! child in ascending identifier order.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{
    validated, Algorithm, AlgorithmError, AlgorithmId, AlgorithmParameter, AlgorithmProfiler,
    ExecutionResult, NodeId,
};
use crate::data_structures::graph::SearchGraph;
use crate::execution::history::Replay;
use crate::execution::trace::{ExecutionTrace, TraceMetadata, TraceStep};

/// Game tree: graph, root and leaf values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimaxProblem {
    pub graph: SearchGraph,
    pub root: NodeId,
    /// Leaf values; the graph visualizer stores them as heuristics
    #[serde(default, alias = "heuristics")]
    pub values: BTreeMap<NodeId, f64>,
}

impl MinimaxProblem {
    pub fn new(graph: SearchGraph, root: impl Into<NodeId>) -> Self {
        Self {
            graph,
            root: root.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn with_values<I, K>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<NodeId>,
    {
        self.values = values.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self
    }

    pub fn validate(&self) -> Result<(), AlgorithmError> {
        self.graph.validate()?;
        if !self.graph.contains(&self.root) {
            return Err(AlgorithmError::MissingNode {
                role: "root node",
                id: self.root.clone(),
            });
        }
        Ok(())
    }

    /// Renames a node in the graph, the root reference and the value map
    pub fn rename_node(&mut self, old: &NodeId, new: impl Into<NodeId>) -> Result<(), AlgorithmError> {
        let new = new.into();
        self.graph.rename_node(old, new.clone())?;
        if &self.root == old {
            self.root = new.clone();
        }
        if let Some(value) = self.values.remove(old) {
            self.values.insert(new, value);
        }
        Ok(())
    }

    fn leaf_value(&self, node: &NodeId) -> f64 {
        self.values.get(node).copied().unwrap_or(0.0)
    }

    /// Children of the last node of `path` that are not already on it.
    /// Edges always point parent -> child, whatever the graph's
    /// direction flag says.
    fn children(&self, path: &[NodeId]) -> Vec<NodeId> {
        let Some(node) = path.last() else {
            return Vec::new();
        };
        let mut children: Vec<NodeId> = self
            .graph
            .edges()
            .iter()
            .filter(|edge| &edge.from == node)
            .filter_map(|edge| {
                if !self.graph.contains(&edge.to) {
                    log::warn!("ignoring move {} -> {}: '{}' does not exist", edge.from, edge.to, edge.to);
                    return None;
                }
                Some(edge.to.clone())
            })
            .filter(|child| !path.contains(child))
            .collect();
        children.sort();
        children.dedup();
        children
    }
}

/// Player and pruning flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MinimaxConfig {
    pub maximizing_root: bool,
    pub alpha_beta: bool,
}

impl Default for MinimaxConfig {
    fn default() -> Self {
        Self {
            maximizing_root: true,
            alpha_beta: false,
        }
    }
}

impl Display for MinimaxConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} root{}",
            if self.maximizing_root { "MAX" } else { "MIN" },
            if self.alpha_beta { ", alpha-beta" } else { "" }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MinimaxStepKind {
    /// Stored value taken at a node without children
    Leaf,
    /// Extremum over children, with the child that achieved it
    Resolved { best_child: NodeId },
    /// Skipped by an alpha-beta cutoff at the parent
    Pruned { alpha: f64, beta: f64 },
}

/// One node settled (or pruned) during the recursion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimaxStep {
    pub step: usize,
    pub node: NodeId,
    /// Path from the root to `node`, inclusive
    pub path: Vec<NodeId>,
    pub depth: usize,
    pub maximizing: bool,
    /// `None` for pruned nodes
    pub value: Option<f64>,
    pub kind: MinimaxStepKind,
}

impl TraceStep for MinimaxStep {
    fn index(&self) -> usize {
        self.step
    }

    fn describe(&self) -> String {
        let player = if self.maximizing { "MAX" } else { "MIN" };
        match (&self.kind, self.value) {
            (MinimaxStepKind::Leaf, Some(value)) => {
                format!("Step {}: leaf {} = {value}", self.step, self.node)
            }
            (MinimaxStepKind::Resolved { best_child }, Some(value)) => format!(
                "Step {}: {player} {} = {value} (via {best_child})",
                self.step, self.node
            ),
            (MinimaxStepKind::Pruned { alpha, beta }, _) => format!(
                "Step {}: {} pruned (alpha = {alpha}, beta = {beta})",
                self.step, self.node
            ),
            (_, None) => format!("Step {}: {}", self.step, self.node),
        }
    }
}

/// Game value and the principal line from the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimaxOutcome {
    pub value: f64,
    pub best_path: Vec<NodeId>,
    pub leaves_evaluated: usize,
    pub pruned: usize,
}

struct Recursion<'a> {
    problem: &'a MinimaxProblem,
    alpha_beta: bool,
    trace: ExecutionTrace<MinimaxStep>,
    profiler: AlgorithmProfiler,
    leaves: usize,
    pruned: usize,
}

impl Recursion<'_> {
    fn record(&mut self, path: &[NodeId], maximizing: bool, value: Option<f64>, kind: MinimaxStepKind) {
        let step = MinimaxStep {
            step: self.trace.next_index(),
            node: path[path.len() - 1].clone(),
            path: path.to_vec(),
            depth: path.len() - 1,
            maximizing,
            value,
            kind,
        };
        self.profiler.record_step();
        self.trace.record(step);
    }

    /// Value of the subtree at the end of `path` and its best line
    fn evaluate(
        &mut self,
        path: &[NodeId],
        maximizing: bool,
        mut alpha: f64,
        mut beta: f64,
    ) -> (f64, Vec<NodeId>) {
        let node = path[path.len() - 1].clone();
        let children = self.problem.children(path);
        if children.is_empty() {
            let value = self.problem.leaf_value(&node);
            self.leaves += 1;
            self.record(path, maximizing, Some(value), MinimaxStepKind::Leaf);
            return (value, vec![node]);
        }
        self.profiler.record_node_exploration();

        let mut best: Option<(f64, Vec<NodeId>)> = None;
        for (index, child) in children.iter().enumerate() {
            let mut child_path = path.to_vec();
            child_path.push(child.clone());
            let (value, line) = self.evaluate(&child_path, !maximizing, alpha, beta);

            let improves = match &best {
                None => true,
                Some((current, _)) if maximizing => value > *current,
                Some((current, _)) => value < *current,
            };
            if improves {
                best = Some((value, line));
            }

            if self.alpha_beta {
                let bound = best.as_ref().map_or(value, |(v, _)| *v);
                if maximizing {
                    alpha = alpha.max(bound);
                } else {
                    beta = beta.min(bound);
                }
                if alpha >= beta {
                    for skipped in &children[index + 1..] {
                        let mut skipped_path = path.to_vec();
                        skipped_path.push(skipped.clone());
                        self.pruned += 1;
                        self.record(
                            &skipped_path,
                            !maximizing,
                            None,
                            MinimaxStepKind::Pruned { alpha, beta },
                        );
                    }
                    break;
                }
            }
        }

        // `children` is non-empty, so the first iteration always sets `best`.
        let (value, line) = best.unwrap_or((0.0, Vec::new()));
        let best_child = line.first().cloned().unwrap_or_else(|| node.clone());
        self.record(path, maximizing, Some(value), MinimaxStepKind::Resolved { best_child });

        let mut best_path = Vec::with_capacity(line.len() + 1);
        best_path.push(node);
        best_path.extend(line);
        (value, best_path)
    }
}

/// MiniMax engine
#[derive(Debug, Clone, Default)]
pub struct Minimax {
    config: MinimaxConfig,
}

impl Minimax {
    pub fn new(maximizing_root: bool) -> Self {
        Self::with_config(MinimaxConfig {
            maximizing_root,
            ..MinimaxConfig::default()
        })
    }

    pub fn with_config(config: MinimaxConfig) -> Self {
        Self { config }
    }

    pub fn alpha_beta(mut self, enabled: bool) -> Self {
        self.config.alpha_beta = enabled;
        self
    }

    pub fn config(&self) -> &MinimaxConfig {
        &self.config
    }
}

impl Algorithm for Minimax {
    type Input = MinimaxProblem;
    type Step = MinimaxStep;
    type Outcome = MinimaxOutcome;

    fn id(&self) -> AlgorithmId {
        AlgorithmId::new(if self.config.alpha_beta { "alphabeta" } else { "minimax" })
    }

    fn name(&self) -> &'static str {
        if self.config.alpha_beta {
            "MiniMax with Alpha-Beta Pruning"
        } else {
            "MiniMax"
        }
    }

    fn category(&self) -> &'static str {
        "adversarial"
    }

    fn description(&self) -> String {
        format!("{} ({})", self.name(), self.config)
    }

    fn parameters(&self) -> Vec<AlgorithmParameter> {
        vec![
            AlgorithmParameter::boolean("maximizing_root", self.config.maximizing_root),
            AlgorithmParameter::boolean("alpha_beta", self.config.alpha_beta),
        ]
    }

    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        validated(&self.parameters(), name, value)?;
        let flag = value.parse::<bool>().map_err(|_| AlgorithmError::InvalidParameter {
            name: name.to_owned(),
            reason: "expected a boolean".to_owned(),
        })?;
        match name {
            "maximizing_root" => self.config.maximizing_root = flag,
            _ => self.config.alpha_beta = flag,
        }
        Ok(())
    }

    fn execute(
        &self,
        input: &MinimaxProblem,
    ) -> Result<ExecutionResult<MinimaxStep, MinimaxOutcome>, AlgorithmError> {
        input.validate()?;
        log::debug!("{} from {}", self.description(), input.root);

        let mut recursion = Recursion {
            problem: input,
            alpha_beta: self.config.alpha_beta,
            trace: ExecutionTrace::new(TraceMetadata::for_algorithm(self)),
            profiler: AlgorithmProfiler::new(),
            leaves: 0,
            pruned: 0,
        };
        recursion.profiler.start();
        let (value, best_path) = recursion.evaluate(
            std::slice::from_ref(&input.root),
            self.config.maximizing_root,
            f64::NEG_INFINITY,
            f64::INFINITY,
        );

        let Recursion {
            mut trace,
            mut profiler,
            leaves,
            pruned,
            ..
        } = recursion;
        profiler.record_custom("pruned", pruned as f64);
        trace.finish(profiler.into_metrics());
        log::debug!("minimax value {value} along {} steps", trace.len());

        Ok(ExecutionResult {
            trace,
            outcome: MinimaxOutcome {
                value,
                best_path,
                leaves_evaluated: leaves,
                pruned,
            },
        })
    }
}

/// Values known so far, keyed by root path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinimaxView {
    pub values: BTreeMap<Vec<NodeId>, f64>,
    pub best_child: BTreeMap<Vec<NodeId>, NodeId>,
    pub pruned: BTreeSet<Vec<NodeId>>,
    pub current: Option<NodeId>,
    root: Option<NodeId>,
}

impl MinimaxView {
    /// Principal line as far as it has been resolved
    pub fn best_path(&self) -> Vec<NodeId> {
        let Some(root) = &self.root else {
            return Vec::new();
        };
        let mut path = vec![root.clone()];
        while let Some(next) = self.best_child.get(&path) {
            path.push(next.clone());
        }
        path
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MinimaxReplay;

impl Replay for MinimaxReplay {
    type Step = MinimaxStep;
    type State = MinimaxView;

    fn initial_state(&self) -> MinimaxView {
        MinimaxView::default()
    }

    fn apply(&self, state: &mut MinimaxView, step: &MinimaxStep) {
        if state.root.is_none() {
            state.root = step.path.first().cloned();
        }
        state.current = Some(step.node.clone());
        match &step.kind {
            MinimaxStepKind::Pruned { .. } => {
                state.pruned.insert(step.path.clone());
            }
            MinimaxStepKind::Leaf => {
                if let Some(value) = step.value {
                    state.values.insert(step.path.clone(), value);
                }
            }
            MinimaxStepKind::Resolved { best_child } => {
                if let Some(value) = step.value {
                    state.values.insert(step.path.clone(), value);
                }
                state.best_child.insert(step.path.clone(), best_child.clone());
            }
        }
    }
}
