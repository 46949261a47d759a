//! Frontier-based graph search: BFS, DFS, UCS and A*
//!
//! One expansion loop drives all four strategies; they differ in the
//! frontier discipline and in how generated children are disposed of.
//! The uninformed rules live in `uninformed.rs`, the cost-aware rules
//! (including A*'s duplicate-entry reopening) in `informed.rs`.
//!
//! # Loop
//! 1. Pop the front of the frontier. The goal test happens at pop time.
//! 2. Graph search only: skip the entry if its node was already
//!    extended at a cost no worse than the entry's (`g` for UCS, `f` for
//!    A*, always for BFS/DFS), otherwise record it in the extended list.
//! 3. Generate neighbors in ascending identifier order and record one
//!    event per child.
//!
//! Every loop iteration records exactly one `SearchStep` holding deep
//! copies of the frontier and extended list.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::BTreeSet;
use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::algorithm::path_finding::problem::SearchProblem;
use crate::algorithm::traits::{
    validated, Algorithm, AlgorithmError, AlgorithmId, AlgorithmParameter, AlgorithmProfiler,
    ExecutionResult, NodeId,
};
use crate::data_structures::frontier::{Discipline, Frontier, SearchNode};
use crate::execution::history::Replay;
use crate::execution::trace::{ExecutionTrace, TraceMetadata, TraceStep};

/// Default guard against runaway tree searches on cyclic graphs
pub const DEFAULT_MAX_STEPS: usize = 10_000;

/// Search strategy selectable in the graph visualizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchStrategy {
    #[serde(rename = "bfs")]
    BreadthFirst,
    #[serde(rename = "dfs")]
    DepthFirst,
    #[serde(rename = "ucs")]
    UniformCost,
    #[serde(rename = "astar")]
    AStar,
}

impl SearchStrategy {
    pub const ALL: [Self; 4] = [
        Self::BreadthFirst,
        Self::DepthFirst,
        Self::UniformCost,
        Self::AStar,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::BreadthFirst => "bfs",
            Self::DepthFirst => "dfs",
            Self::UniformCost => "ucs",
            Self::AStar => "astar",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::BreadthFirst => "Breadth-First Search",
            Self::DepthFirst => "Depth-First Search",
            Self::UniformCost => "Uniform-Cost Search",
            Self::AStar => "A* Search",
        }
    }

    pub const fn discipline(self) -> Discipline {
        match self {
            Self::BreadthFirst => Discipline::Fifo,
            Self::DepthFirst => Discipline::Lifo,
            Self::UniformCost => Discipline::LowestCost,
            Self::AStar => Discipline::LowestEstimate,
        }
    }

    /// Tracks real path costs
    pub const fn is_informed(self) -> bool {
        matches!(self, Self::UniformCost | Self::AStar)
    }

    pub const fn uses_heuristic(self) -> bool {
        matches!(self, Self::AStar)
    }
}

impl Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SearchStrategy {
    type Err = AlgorithmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AlgorithmError::InvalidParameter {
                name: "strategy".to_owned(),
                reason: format!("unknown strategy '{s}'"),
            })
    }
}

/// Mode flags for a search run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchConfig {
    pub strategy: SearchStrategy,
    /// Cycle check against the current path only, no extended list
    pub tree_search: bool,
    pub max_steps: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            strategy: SearchStrategy::BreadthFirst,
            tree_search: false,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// Extended-list entry: node and the cost it was extended at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtendedEntry {
    pub node: NodeId,
    pub cost: f64,
}

/// What happened during a step, one entry per generated child
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchEvent {
    Initialized { start: NodeId, h: f64 },
    Enqueued { node: NodeId, g: f64, h: f64, f: f64 },
    SkippedOnPath { node: NodeId },
    SkippedExtended { node: NodeId, recorded: f64, candidate: f64 },
    SkippedWorse { node: NodeId, existing: f64, candidate: f64 },
    ReplacedInQueue { node: NodeId, old_cost: f64, new_cost: f64 },
    DuplicateEnqueued { node: NodeId, existing: f64, candidate: f64 },
    Reopened { node: NodeId, recorded: f64, candidate: f64 },
    NotExtended { node: NodeId, recorded: f64, current: f64 },
    GoalReached { path: Vec<NodeId>, cost: f64 },
    FrontierExhausted,
    StepLimitReached { limit: usize },
}

impl Display for SearchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialized { start, h } => write!(f, "Start at {start} (h = {h})"),
            Self::Enqueued { node, g, h, f: total } => {
                write!(f, "{node} enqueued (g = {g}, h = {h}, f = {total})")
            }
            Self::SkippedOnPath { node } => write!(f, "{node} skipped: already on the current path"),
            Self::SkippedExtended { node, recorded, candidate } => write!(
                f,
                "{node} skipped: already extended at {recorded} (new cost {candidate})"
            ),
            Self::SkippedWorse { node, existing, candidate } => write!(
                f,
                "{node} skipped: already queued at {existing} (new cost {candidate})"
            ),
            Self::ReplacedInQueue { node, old_cost, new_cost } => {
                write!(f, "{node} updated in queue: {old_cost} -> {new_cost}")
            }
            Self::DuplicateEnqueued { node, existing, candidate } => write!(
                f,
                "{node} enqueued again: queued at {existing}, new cost {candidate}"
            ),
            Self::Reopened { node, recorded, candidate } => write!(
                f,
                "{node} reopened: {candidate} improves on extended cost {recorded}"
            ),
            Self::NotExtended { node, recorded, current } => write!(
                f,
                "{node} not extended: already extended at {recorded} (entry cost {current})"
            ),
            Self::GoalReached { path, cost } => {
                let path: Vec<&str> = path.iter().map(NodeId::as_str).collect();
                write!(f, "Goal reached via {} with cost {cost}", path.join("-"))
            }
            Self::FrontierExhausted => f.write_str("Queue empty: no path found"),
            Self::StepLimitReached { limit } => write!(f, "Stopped after {limit} steps"),
        }
    }
}

/// One recorded iteration of the search loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStep {
    pub step: usize,
    /// Entry removed from the frontier this step
    pub popped: Option<SearchNode>,
    /// Node whose children were generated, if any
    pub extended_node: Option<NodeId>,
    /// Frontier after the step, in pop order
    pub queue: Vec<SearchNode>,
    /// Extended list after the step, in extension order
    pub extended_list: Vec<ExtendedEntry>,
    pub extended_count: usize,
    pub enqueued_count: usize,
    pub events: Vec<SearchEvent>,
}

impl SearchStep {
    pub fn extended_nodes(&self) -> Vec<&NodeId> {
        self.extended_list.iter().map(|e| &e.node).collect()
    }
}

impl TraceStep for SearchStep {
    fn index(&self) -> usize {
        self.step
    }

    fn describe(&self) -> String {
        let head = match (&self.extended_node, &self.popped) {
            (Some(node), _) => format!("Step {}: extend {node}", self.step),
            (None, Some(popped)) => format!("Step {}: pop {}", self.step, popped.path_label()),
            (None, None) => format!("Step {}", self.step),
        };
        let events: Vec<String> = self.events.iter().map(ToString::to_string).collect();
        if events.is_empty() {
            head
        } else {
            format!("{head}; {}", events.join("; "))
        }
    }
}

/// How a search run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    GoalReached,
    FrontierExhausted,
    StepLimitReached,
}

/// Terminal result of a search run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub found: bool,
    pub path: Vec<NodeId>,
    pub cost: f64,
    pub termination: Termination,
}

impl SearchOutcome {
    fn failed(termination: Termination) -> Self {
        Self {
            found: false,
            path: Vec::new(),
            cost: 0.0,
            termination,
        }
    }
}

/// Closed set keyed by node, remembering extension order
#[derive(Debug, Clone, Default)]
pub(super) struct ExtendedList {
    entries: Vec<ExtendedEntry>,
}

impl ExtendedList {
    pub(super) fn cost_of(&self, node: &NodeId) -> Option<f64> {
        self.entries.iter().find(|e| &e.node == node).map(|e| e.cost)
    }

    /// Inserts, or overwrites the cost of a reopened node in place
    pub(super) fn record(&mut self, node: NodeId, cost: f64) {
        match self.entries.iter_mut().find(|e| e.node == node) {
            Some(entry) => entry.cost = cost,
            None => self.entries.push(ExtendedEntry { node, cost }),
        }
    }

    fn snapshot(&self) -> Vec<ExtendedEntry> {
        self.entries.clone()
    }
}

/// Live, mutable state of one run; never shared with recorded steps
pub(super) struct Expansion<'a> {
    pub(super) problem: &'a SearchProblem,
    pub(super) strategy: SearchStrategy,
    pub(super) tree_search: bool,
    pub(super) frontier: Frontier,
    pub(super) extended: ExtendedList,
    pub(super) extended_count: usize,
    pub(super) enqueued_count: usize,
}

impl<'a> Expansion<'a> {
    fn new(problem: &'a SearchProblem, config: &SearchConfig) -> Self {
        Self {
            problem,
            strategy: config.strategy,
            tree_search: config.tree_search,
            frontier: Frontier::new(config.strategy.discipline()),
            extended: ExtendedList::default(),
            extended_count: 0,
            enqueued_count: 0,
        }
    }

    /// Cost the extended list compares on
    pub(super) fn closed_cost(&self, node: &SearchNode) -> f64 {
        match self.strategy {
            SearchStrategy::AStar => node.f,
            SearchStrategy::UniformCost => node.g,
            SearchStrategy::BreadthFirst | SearchStrategy::DepthFirst => 0.0,
        }
    }

    pub(super) fn enqueue(&mut self, child: SearchNode, events: &mut Vec<SearchEvent>) {
        events.push(SearchEvent::Enqueued {
            node: child.node().clone(),
            g: child.g,
            h: child.h,
            f: child.f,
        });
        self.enqueued_count += 1;
        self.frontier.push(child);
    }

    fn snapshot(
        &self,
        step: usize,
        popped: Option<SearchNode>,
        extended_node: Option<NodeId>,
        events: Vec<SearchEvent>,
    ) -> SearchStep {
        SearchStep {
            step,
            popped,
            extended_node,
            queue: self.frontier.snapshot(),
            extended_list: self.extended.snapshot(),
            extended_count: self.extended_count,
            enqueued_count: self.enqueued_count,
            events,
        }
    }
}

/// Graph search engine for BFS, DFS, UCS and A*
#[derive(Debug, Clone, Default)]
pub struct GraphSearch {
    config: SearchConfig,
}

impl GraphSearch {
    pub fn new(strategy: SearchStrategy) -> Self {
        Self::with_config(SearchConfig {
            strategy,
            ..SearchConfig::default()
        })
    }

    pub fn with_config(config: SearchConfig) -> Self {
        Self { config }
    }

    pub fn tree_search(mut self, tree_search: bool) -> Self {
        self.config.tree_search = tree_search;
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.config.max_steps = max_steps;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn search(
        &self,
        problem: &SearchProblem,
    ) -> Result<ExecutionResult<SearchStep, SearchOutcome>, AlgorithmError> {
        problem.validate()?;

        let strategy = self.config.strategy;
        let mut profiler = AlgorithmProfiler::new();
        profiler.start();
        let mut trace = ExecutionTrace::new(TraceMetadata::for_algorithm(self));
        log::debug!(
            "{} from {} to {} ({} search)",
            strategy.display_name(),
            problem.start,
            problem.goal,
            if self.config.tree_search { "tree" } else { "graph" }
        );

        let mut run = Expansion::new(problem, &self.config);
        let h = if strategy.uses_heuristic() {
            problem.heuristic(&problem.start)
        } else {
            0.0
        };
        run.frontier.push(SearchNode::root(problem.start.clone(), h));
        run.enqueued_count = 1;
        trace.record(run.snapshot(
            0,
            None,
            None,
            vec![SearchEvent::Initialized {
                start: problem.start.clone(),
                h,
            }],
        ));

        let outcome = loop {
            let index = trace.next_index();
            if index > self.config.max_steps {
                let limit = self.config.max_steps;
                trace.record(run.snapshot(index, None, None, vec![SearchEvent::StepLimitReached { limit }]));
                break SearchOutcome::failed(Termination::StepLimitReached);
            }
            profiler.record_step();

            let Some(current) = run.frontier.pop() else {
                trace.record(run.snapshot(index, None, None, vec![SearchEvent::FrontierExhausted]));
                break SearchOutcome::failed(Termination::FrontierExhausted);
            };

            if current.node() == &problem.goal {
                let cost = if strategy.is_informed() {
                    current.g
                } else {
                    problem.graph.path_cost(&current.path).unwrap_or(0.0)
                };
                let event = SearchEvent::GoalReached {
                    path: current.path.clone(),
                    cost,
                };
                let path = current.path.clone();
                trace.record(run.snapshot(index, Some(current), None, vec![event]));
                break SearchOutcome {
                    found: true,
                    path,
                    cost,
                    termination: Termination::GoalReached,
                };
            }

            let mut events = Vec::new();
            if !run.tree_search {
                let cost = run.closed_cost(&current);
                if let Some(recorded) = run.extended.cost_of(current.node()) {
                    if recorded <= cost {
                        events.push(SearchEvent::NotExtended {
                            node: current.node().clone(),
                            recorded,
                            current: cost,
                        });
                        trace.record(run.snapshot(index, Some(current), None, events));
                        continue;
                    }
                }
                run.extended.record(current.node().clone(), cost);
            }
            run.extended_count += 1;
            profiler.record_node_exploration();

            if strategy.is_informed() {
                run.expand_informed(&current, &mut events);
            } else {
                run.expand_uninformed(&current, &mut events);
            }

            let extended = current.node().clone();
            trace.record(run.snapshot(index, Some(current), Some(extended), events));
        };

        profiler.record_custom("enqueued", run.enqueued_count as f64);
        trace.finish(profiler.into_metrics());
        log::debug!(
            "{} finished after {} steps: {:?}",
            strategy.key(),
            trace.len(),
            outcome.termination
        );
        Ok(ExecutionResult { trace, outcome })
    }
}

impl Algorithm for GraphSearch {
    type Input = SearchProblem;
    type Step = SearchStep;
    type Outcome = SearchOutcome;

    fn id(&self) -> AlgorithmId {
        AlgorithmId::new(self.config.strategy.key())
    }

    fn name(&self) -> &'static str {
        self.config.strategy.display_name()
    }

    fn category(&self) -> &'static str {
        "path_finding"
    }

    fn description(&self) -> String {
        let mode = if self.config.tree_search {
            "tree search with path cycle check"
        } else {
            "graph search with extended list"
        };
        format!("{} ({mode})", self.name())
    }

    fn parameters(&self) -> Vec<AlgorithmParameter> {
        vec![
            AlgorithmParameter::choice(
                "strategy",
                self.config.strategy.key(),
                &SearchStrategy::ALL.map(SearchStrategy::key),
            ),
            AlgorithmParameter::boolean("tree_search", self.config.tree_search),
            AlgorithmParameter::integer("max_steps", self.config.max_steps, 1),
        ]
    }

    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        validated(&self.parameters(), name, value)?;
        let invalid = |reason: &str| AlgorithmError::InvalidParameter {
            name: name.to_owned(),
            reason: reason.to_owned(),
        };
        match name {
            "strategy" => self.config.strategy = value.parse()?,
            "tree_search" => {
                self.config.tree_search = value.parse().map_err(|_| invalid("expected a boolean"))?
            }
            "max_steps" => {
                self.config.max_steps = value.parse().map_err(|_| invalid("expected a count"))?
            }
            _ => return Err(invalid("unknown parameter")),
        }
        Ok(())
    }

    fn execute(
        &self,
        input: &SearchProblem,
    ) -> Result<ExecutionResult<SearchStep, SearchOutcome>, AlgorithmError> {
        self.search(input)
    }
}

/// Visual state of a search at some step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchView {
    pub frontier: Vec<SearchNode>,
    pub extended: Vec<ExtendedEntry>,
    /// Every node extended so far
    pub visited: BTreeSet<NodeId>,
    pub current: Option<NodeId>,
    pub extended_count: usize,
    pub enqueued_count: usize,
    /// Set once the goal has been popped
    pub solution: Option<Vec<NodeId>>,
}

/// Rebuilds `SearchView`s from search steps
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchReplay;

impl Replay for SearchReplay {
    type Step = SearchStep;
    type State = SearchView;

    fn initial_state(&self) -> SearchView {
        SearchView::default()
    }

    fn apply(&self, state: &mut SearchView, step: &SearchStep) {
        state.frontier = step.queue.clone();
        state.extended = step.extended_list.clone();
        state.current = step.popped.as_ref().map(|p| p.node().clone());
        if let Some(node) = &step.extended_node {
            state.visited.insert(node.clone());
        }
        state.extended_count = step.extended_count;
        state.enqueued_count = step.enqueued_count;
        for event in &step.events {
            if let SearchEvent::GoalReached { path, .. } = event {
                state.solution = Some(path.clone());
            }
        }
    }
}
