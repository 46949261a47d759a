//! Backtracking search with optional forward checking and MRV
//!
//! Depth-first assignment over a working copy of the domains. The first
//! complete consistent assignment wins. Every decision is recorded in
//! the order it happens: variable selection and assignment on the way
//! down, forward-checking prunes right after their assignment, and one
//! backtrack step per undone assignment on the way back up.
//!
//! Constraints are read from the current variable's side through
//! `Constraint::seen_from`, so a variable that is a constraint's target
//! is checked against the inverted relation.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::BTreeMap;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::algorithm::csp::{DomainTable, DEFAULT_MAX_STEPS};
use crate::algorithm::traits::{
    validated, Algorithm, AlgorithmError, AlgorithmId, AlgorithmParameter, AlgorithmProfiler,
    ExecutionResult, VariableId,
};
use crate::data_structures::constraint::{ConstraintNetwork, Relation, Variable};
use crate::execution::history::Replay;
use crate::execution::trace::{ExecutionTrace, TraceMetadata, TraceStep};

/// Search flags, named as in the CSP visualizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BacktrackingConfig {
    #[serde(rename = "enableFC")]
    pub forward_checking: bool,
    #[serde(rename = "enableMRV")]
    pub mrv: bool,
    pub max_steps: usize,
}

impl Default for BacktrackingConfig {
    fn default() -> Self {
        Self {
            forward_checking: false,
            mrv: false,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// A value removed from a domain by forward checking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Removal {
    pub variable: VariableId,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BacktrackEvent {
    Started,
    /// Variable chosen for the next assignment, with its live domain
    Selected { variable: VariableId, candidates: Vec<i64> },
    Assigned { variable: VariableId, value: i64 },
    /// Value rejected by an already assigned neighbor
    Inconsistent { variable: VariableId, value: i64, conflict: VariableId },
    Pruned { variable: VariableId, value: i64, removals: Vec<Removal> },
    /// Forward checking emptied a neighbor's domain
    DomainWiped { variable: VariableId, value: i64, emptied: VariableId },
    /// Assignment undone, pruned values put back
    Backtracked { variable: VariableId, value: i64, restored: Vec<Removal> },
    Solved,
    Exhausted,
    StepLimitReached { limit: usize },
}

impl Display for BacktrackEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => f.write_str("Start"),
            Self::Selected { variable, candidates } => {
                write!(f, "Select {variable} (domain {candidates:?})")
            }
            Self::Assigned { variable, value } => write!(f, "Assign {variable} = {value}"),
            Self::Inconsistent { variable, value, conflict } => {
                write!(f, "{variable} = {value} conflicts with {conflict}")
            }
            Self::Pruned { variable, value, removals } => {
                let pairs: Vec<String> = removals
                    .iter()
                    .map(|r| format!("{}:{}", r.variable, r.value))
                    .collect();
                write!(f, "{variable} = {value} prunes {}", pairs.join(", "))
            }
            Self::DomainWiped { variable, value, emptied } => {
                write!(f, "{variable} = {value} empties the domain of {emptied}")
            }
            Self::Backtracked { variable, value, .. } => {
                write!(f, "Backtrack: undo {variable} = {value}")
            }
            Self::Solved => f.write_str("All variables assigned"),
            Self::Exhausted => f.write_str("No consistent assignment exists"),
            Self::StepLimitReached { limit } => write!(f, "Stopped after {limit} steps"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktrackStep {
    pub step: usize,
    /// Recursion depth (number of assigned variables when recorded)
    pub depth: usize,
    pub event: BacktrackEvent,
    pub assignment: BTreeMap<VariableId, i64>,
    pub domains: Vec<Variable>,
}

impl TraceStep for BacktrackStep {
    fn index(&self) -> usize {
        self.step
    }

    fn describe(&self) -> String {
        format!("Step {}: {}", self.step, self.event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktrackTermination {
    Solved,
    Exhausted,
    StepLimitReached,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktrackOutcome {
    pub solved: bool,
    /// Complete assignment when solved, empty otherwise
    pub assignment: BTreeMap<VariableId, i64>,
    pub termination: BacktrackTermination,
    pub assignments: usize,
    pub backtracks: usize,
}

/// Marker for an exhausted step budget, unwound through the recursion
struct StepLimit;

/// Constraint seen from one variable: `variable rel (other + offset)`
#[derive(Debug, Clone, Copy)]
struct Link {
    other: usize,
    relation: Relation,
    offset: i64,
}

struct Search<'a> {
    config: &'a BacktrackingConfig,
    links: Vec<Vec<Link>>,
    domains: DomainTable,
    assignment: Vec<Option<i64>>,
    trace: ExecutionTrace<BacktrackStep>,
    profiler: AlgorithmProfiler,
    assignments: usize,
    backtracks: usize,
}

impl<'a> Search<'a> {
    fn new(network: &ConstraintNetwork, config: &'a BacktrackingConfig, trace: ExecutionTrace<BacktrackStep>) -> Self {
        let domains = DomainTable::from_network(network);
        let mut links = vec![Vec::new(); domains.len()];
        for (_, constraint) in network.live_constraints() {
            for endpoint in [&constraint.source, &constraint.target] {
                let Some((other, relation, offset)) = constraint.seen_from(endpoint) else {
                    continue;
                };
                if let (Some(index), Some(other)) = (domains.index_of(endpoint), domains.index_of(other)) {
                    links[index].push(Link { other, relation, offset });
                }
            }
        }
        Self {
            config,
            links,
            assignment: vec![None; domains.len()],
            domains,
            trace,
            profiler: AlgorithmProfiler::new(),
            assignments: 0,
            backtracks: 0,
        }
    }

    fn depth(&self) -> usize {
        self.assignment.iter().filter(|a| a.is_some()).count()
    }

    fn assignment_map(&self) -> BTreeMap<VariableId, i64> {
        self.assignment
            .iter()
            .enumerate()
            .filter_map(|(i, value)| value.map(|v| (self.domains.id(i).clone(), v)))
            .collect()
    }

    fn record(&mut self, event: BacktrackEvent) -> Result<(), StepLimit> {
        let index = self.trace.next_index();
        if index > self.config.max_steps {
            self.push(BacktrackEvent::StepLimitReached {
                limit: self.config.max_steps,
            });
            return Err(StepLimit);
        }
        self.push(event);
        Ok(())
    }

    fn push(&mut self, event: BacktrackEvent) {
        let step = BacktrackStep {
            step: self.trace.next_index(),
            depth: self.depth(),
            event,
            assignment: self.assignment_map(),
            domains: self.domains.snapshot(),
        };
        self.profiler.record_step();
        self.trace.record(step);
    }

    /// MRV: smallest live domain, earliest variable on ties
    fn select(&self) -> Option<usize> {
        let mut unassigned = (0..self.assignment.len()).filter(|&i| self.assignment[i].is_none());
        if self.config.mrv {
            unassigned.min_by_key(|&i| (self.domains.domain(i).len(), i))
        } else {
            unassigned.next()
        }
    }

    /// First assigned neighbor that rejects `variable = value`
    fn conflict(&self, variable: usize, value: i64) -> Option<usize> {
        self.links[variable].iter().find_map(|link| {
            let other = self.assignment[link.other]?;
            (!link.relation.holds(value, other.saturating_add(link.offset))).then_some(link.other)
        })
    }

    /// Prunes unassigned neighbors; stops at the first emptied domain
    fn forward_check(&mut self, variable: usize, value: i64) -> (Vec<Removal>, Option<usize>) {
        let mut removals = Vec::new();
        for link in self.links[variable].clone() {
            if self.assignment[link.other].is_some() {
                continue;
            }
            let removed = self
                .domains
                .prune(link.other, |y| link.relation.holds(value, y.saturating_add(link.offset)));
            let id = self.domains.id(link.other).clone();
            removals.extend(removed.into_iter().map(|value| Removal {
                variable: id.clone(),
                value,
            }));
            if self.domains.domain(link.other).is_empty() {
                return (removals, Some(link.other));
            }
        }
        (removals, None)
    }

    fn restore(&mut self, removals: &[Removal]) {
        let mut grouped: BTreeMap<usize, Vec<i64>> = BTreeMap::new();
        for removal in removals {
            if let Some(index) = self.domains.index_of(&removal.variable) {
                grouped.entry(index).or_default().push(removal.value);
            }
        }
        for (index, values) in grouped {
            self.domains.restore(index, &values);
        }
    }

    fn solve(&mut self) -> Result<bool, StepLimit> {
        let Some(variable) = self.select() else {
            self.record(BacktrackEvent::Solved)?;
            return Ok(true);
        };
        let id = self.domains.id(variable).clone();
        let candidates = self.domains.domain(variable).to_vec();
        self.profiler.record_node_exploration();
        self.record(BacktrackEvent::Selected {
            variable: id.clone(),
            candidates: candidates.clone(),
        })?;

        for value in candidates {
            if let Some(conflict) = self.conflict(variable, value) {
                let conflict = self.domains.id(conflict).clone();
                self.record(BacktrackEvent::Inconsistent {
                    variable: id.clone(),
                    value,
                    conflict,
                })?;
                continue;
            }

            self.assignment[variable] = Some(value);
            self.assignments += 1;
            self.record(BacktrackEvent::Assigned {
                variable: id.clone(),
                value,
            })?;

            let mut removals = Vec::new();
            let mut wiped = None;
            if self.config.forward_checking {
                (removals, wiped) = self.forward_check(variable, value);
                if !removals.is_empty() {
                    self.record(BacktrackEvent::Pruned {
                        variable: id.clone(),
                        value,
                        removals: removals.clone(),
                    })?;
                }
                if let Some(emptied) = wiped {
                    let emptied = self.domains.id(emptied).clone();
                    self.record(BacktrackEvent::DomainWiped {
                        variable: id.clone(),
                        value,
                        emptied,
                    })?;
                }
            }

            if wiped.is_none() && self.solve()? {
                return Ok(true);
            }

            self.assignment[variable] = None;
            self.restore(&removals);
            self.backtracks += 1;
            self.record(BacktrackEvent::Backtracked {
                variable: id.clone(),
                value,
                restored: removals,
            })?;
        }
        Ok(false)
    }
}

/// Backtracking search engine
#[derive(Debug, Clone, Default)]
pub struct Backtracking {
    config: BacktrackingConfig,
}

impl Backtracking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BacktrackingConfig) -> Self {
        Self { config }
    }

    pub fn forward_checking(mut self, enabled: bool) -> Self {
        self.config.forward_checking = enabled;
        self
    }

    pub fn mrv(mut self, enabled: bool) -> Self {
        self.config.mrv = enabled;
        self
    }

    pub fn config(&self) -> &BacktrackingConfig {
        &self.config
    }

    fn run(
        &self,
        network: &ConstraintNetwork,
    ) -> Result<ExecutionResult<BacktrackStep, BacktrackOutcome>, AlgorithmError> {
        network.validate()?;
        log::debug!(
            "backtracking over {} variables (FC: {}, MRV: {})",
            network.variables().len(),
            self.config.forward_checking,
            self.config.mrv
        );

        let trace = ExecutionTrace::new(TraceMetadata::for_algorithm(self));
        let mut search = Search::new(network, &self.config, trace);
        search.profiler.start();
        search.push(BacktrackEvent::Started);

        let termination = match search.solve() {
            Ok(true) => BacktrackTermination::Solved,
            Ok(false) => match search.record(BacktrackEvent::Exhausted) {
                Ok(()) => BacktrackTermination::Exhausted,
                Err(StepLimit) => BacktrackTermination::StepLimitReached,
            },
            Err(StepLimit) => BacktrackTermination::StepLimitReached,
        };

        let solved = termination == BacktrackTermination::Solved;
        let outcome = BacktrackOutcome {
            solved,
            assignment: if solved {
                search.assignment_map()
            } else {
                BTreeMap::new()
            },
            termination,
            assignments: search.assignments,
            backtracks: search.backtracks,
        };

        let Search {
            mut trace,
            mut profiler,
            ..
        } = search;
        profiler.record_custom("assignments", outcome.assignments as f64);
        profiler.record_custom("backtracks", outcome.backtracks as f64);
        trace.finish(profiler.into_metrics());
        log::debug!(
            "backtracking finished after {} steps: {:?}",
            trace.len(),
            outcome.termination
        );
        Ok(ExecutionResult { trace, outcome })
    }
}

impl Algorithm for Backtracking {
    type Input = ConstraintNetwork;
    type Step = BacktrackStep;
    type Outcome = BacktrackOutcome;

    fn id(&self) -> AlgorithmId {
        AlgorithmId::new("backtracking")
    }

    fn name(&self) -> &'static str {
        "Backtracking Search"
    }

    fn category(&self) -> &'static str {
        "csp"
    }

    fn description(&self) -> String {
        let mut extras = Vec::new();
        if self.config.forward_checking {
            extras.push("forward checking");
        }
        if self.config.mrv {
            extras.push("MRV");
        }
        if extras.is_empty() {
            "Backtracking search".to_owned()
        } else {
            format!("Backtracking search with {}", extras.join(" and "))
        }
    }

    fn parameters(&self) -> Vec<AlgorithmParameter> {
        vec![
            AlgorithmParameter::boolean("forward_checking", self.config.forward_checking),
            AlgorithmParameter::boolean("mrv", self.config.mrv),
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
            "forward_checking" => {
                self.config.forward_checking =
                    value.parse().map_err(|_| invalid("expected a boolean"))?
            }
            "mrv" => self.config.mrv = value.parse().map_err(|_| invalid("expected a boolean"))?,
            "max_steps" => {
                self.config.max_steps = value.parse().map_err(|_| invalid("expected a count"))?
            }
            _ => return Err(invalid("unknown parameter")),
        }
        Ok(())
    }

    fn execute(
        &self,
        input: &ConstraintNetwork,
    ) -> Result<ExecutionResult<BacktrackStep, BacktrackOutcome>, AlgorithmError> {
        self.run(input)
    }
}

/// Assignment and live domains at some step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BacktrackView {
    pub assignment: BTreeMap<VariableId, i64>,
    pub domains: Vec<Variable>,
    /// Variable being decided, if any
    pub current: Option<VariableId>,
    initial: Vec<Variable>,
}

/// Rebuilds `BacktrackView`s from events alone (domains are taken from
/// step 0 only)
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktrackReplay;

impl BacktrackReplay {
    fn remove(domains: &mut [Variable], removals: &[Removal]) {
        for removal in removals {
            if let Some(variable) = domains.iter_mut().find(|v| v.id == removal.variable) {
                variable.domain.retain(|v| *v != removal.value);
            }
        }
    }

    fn restore(initial: &[Variable], domains: &mut [Variable], removals: &[Removal]) {
        for (variable, original) in domains.iter_mut().zip(initial) {
            let back: Vec<i64> = removals
                .iter()
                .filter(|r| r.variable == variable.id)
                .map(|r| r.value)
                .collect();
            if back.is_empty() {
                continue;
            }
            let current = &variable.domain;
            variable.domain = original
                .domain
                .iter()
                .copied()
                .filter(|v| current.contains(v) || back.contains(v))
                .collect();
        }
    }
}

impl Replay for BacktrackReplay {
    type Step = BacktrackStep;
    type State = BacktrackView;

    fn initial_state(&self) -> BacktrackView {
        BacktrackView::default()
    }

    fn apply(&self, state: &mut BacktrackView, step: &BacktrackStep) {
        match &step.event {
            BacktrackEvent::Started => {
                state.initial = step.domains.clone();
                state.domains = step.domains.clone();
            }
            BacktrackEvent::Selected { variable, .. } => state.current = Some(variable.clone()),
            BacktrackEvent::Assigned { variable, value } => {
                state.assignment.insert(variable.clone(), *value);
                state.current = Some(variable.clone());
            }
            BacktrackEvent::Pruned { removals, .. } => Self::remove(&mut state.domains, removals),
            BacktrackEvent::Backtracked {
                variable, restored, ..
            } => {
                state.assignment.remove(variable);
                Self::restore(&state.initial, &mut state.domains, restored);
                state.current = Some(variable.clone());
            }
            BacktrackEvent::Solved | BacktrackEvent::Exhausted => state.current = None,
            BacktrackEvent::Inconsistent { .. }
            | BacktrackEvent::DomainWiped { .. }
            | BacktrackEvent::StepLimitReached { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::presets;
    use crate::data_structures::constraint::Constraint;

    fn kinds(trace: &ExecutionTrace<BacktrackStep>) -> Vec<String> {
        trace
            .iter()
            .map(|s| match &s.event {
                BacktrackEvent::Started => "start".to_owned(),
                BacktrackEvent::Selected { variable, .. } => format!("select {variable}"),
                BacktrackEvent::Assigned { variable, value } => format!("{variable}={value}"),
                BacktrackEvent::Inconsistent { variable, value, .. } => format!("{variable}!={value}"),
                BacktrackEvent::Pruned { .. } => "prune".to_owned(),
                BacktrackEvent::DomainWiped { .. } => "wipe".to_owned(),
                BacktrackEvent::Backtracked { variable, .. } => format!("undo {variable}"),
                BacktrackEvent::Solved => "solved".to_owned(),
                BacktrackEvent::Exhausted => "exhausted".to_owned(),
                BacktrackEvent::StepLimitReached { .. } => "limit".to_owned(),
            })
            .collect()
    }

    fn chain() -> ConstraintNetwork {
        // A < B < C over 1..=3 admits exactly one solution.
        let mut network = ConstraintNetwork::new();
        for id in ["A", "B", "C"] {
            network.add_variable(id, 1..=3).unwrap();
        }
        network.add_constraint(Constraint::new("A", "B", Relation::Lt, 0)).unwrap();
        network.add_constraint(Constraint::new("B", "C", Relation::Lt, 0)).unwrap();
        network
    }

    fn assert_valid(network: &ConstraintNetwork, assignment: &BTreeMap<VariableId, i64>) {
        assert_eq!(assignment.len(), network.variables().len());
        for c in network.constraints() {
            let (x, y) = (assignment[&c.source], assignment[&c.target]);
            assert!(c.relation.holds(x, y + c.offset), "{c} violated by {x}, {y}");
        }
    }

    #[test]
    fn test_plain_backtracking_order() {
        let result = Backtracking::new().execute(&chain()).unwrap();
        assert!(result.outcome.solved);
        assert_valid(&chain(), &result.outcome.assignment);
        assert_eq!(
            kinds(&result.trace),
            vec![
                "start", "select A", "A=1", "select B", "B!=1", "B=2", "select C", "C!=1", "C!=2",
                "C=3", "solved"
            ]
        );
    }

    #[test]
    fn test_target_side_checked_with_inverse() {
        // B is the target of A < B; assigning B first must still respect it.
        let mut network = ConstraintNetwork::new();
        network.add_variable("B", [1, 2]).unwrap();
        network.add_variable("A", [2, 1]).unwrap();
        network.add_constraint(Constraint::new("A", "B", Relation::Lt, 0)).unwrap();
        let result = Backtracking::new().execute(&network).unwrap();
        assert_eq!(kinds(&result.trace)[1..4], ["select B", "B=1", "select A"]);
        assert_eq!(result.outcome.assignment[&VariableId::from("B")], 2);
        assert_eq!(result.outcome.assignment[&VariableId::from("A")], 1);
    }

    #[test]
    fn test_forward_checking_detects_wipeout() {
        let mut network = ConstraintNetwork::new();
        network.add_variable("X", [1, 2]).unwrap();
        network.add_variable("Y", [1]).unwrap();
        network.add_constraint(Constraint::new("X", "Y", Relation::Ne, 0)).unwrap();

        let result = Backtracking::new().forward_checking(true).execute(&network).unwrap();
        assert_eq!(
            kinds(&result.trace),
            vec!["start", "select X", "X=1", "prune", "wipe", "undo X", "X=2", "select Y", "Y=1", "solved"]
        );
        // The value pruned from Y is back after the undo.
        let undo = &result.trace.steps()[5];
        assert_eq!(undo.domains[1].domain, vec![1]);
        assert!(result.outcome.solved);
    }

    #[test]
    fn test_unsatisfiable_network_is_exhausted() {
        let mut network = ConstraintNetwork::new();
        network.add_variable("X", [1]).unwrap();
        network.add_variable("Y", [1]).unwrap();
        network.add_constraint(Constraint::new("X", "Y", Relation::Ne, 0)).unwrap();
        for fc in [false, true] {
            let result = Backtracking::new().forward_checking(fc).execute(&network).unwrap();
            assert!(!result.outcome.solved);
            assert_eq!(result.outcome.termination, BacktrackTermination::Exhausted);
            assert!(result.outcome.assignment.is_empty());
            let last = result.trace.last().unwrap();
            assert_eq!(last.event, BacktrackEvent::Exhausted);
            assert!(last.assignment.is_empty());
        }
    }

    #[test]
    fn test_mrv_picks_smallest_domain() {
        let mut network = chain();
        network.add_variable("D", [7]).unwrap();
        let result = Backtracking::new().mrv(true).execute(&network).unwrap();
        assert_eq!(kinds(&result.trace)[1], "select D");
    }

    #[test]
    fn test_saudi_map_colouring() {
        let network = presets::saudi_provinces_network();
        let result = Backtracking::new()
            .forward_checking(true)
            .mrv(true)
            .execute(&network)
            .unwrap();
        assert!(result.outcome.solved);
        assert_valid(&network, &result.outcome.assignment);
    }

    #[test]
    fn test_replay_rebuilds_snapshots() {
        let network = presets::saudi_provinces_network();
        for (fc, mrv) in [(false, false), (true, false), (true, true)] {
            let result = Backtracking::new()
                .forward_checking(fc)
                .mrv(mrv)
                .execute(&network)
                .unwrap();
            let mut state = BacktrackReplay.initial_state();
            for step in &result.trace {
                BacktrackReplay.apply(&mut state, step);
                assert_eq!(state.assignment, step.assignment);
                assert_eq!(state.domains, step.domains);
            }
        }
    }

    #[test]
    fn test_step_limit() {
        let result = Backtracking::with_config(BacktrackingConfig {
            max_steps: 3,
            ..BacktrackingConfig::default()
        })
        .execute(&chain())
        .unwrap();
        assert_eq!(result.outcome.termination, BacktrackTermination::StepLimitReached);
        assert_eq!(result.trace.len(), 5);
        assert!(!result.outcome.solved);
    }

    #[test]
    fn test_config_uses_ui_flag_names() {
        let config: BacktrackingConfig =
            serde_json::from_str(r#"{"enableFC": true, "enableMRV": true}"#).unwrap();
        assert!(config.forward_checking && config.mrv);
        assert_eq!(config.max_steps, DEFAULT_MAX_STEPS);

        let mut engine = Backtracking::with_config(config);
        engine.set_parameter("mrv", "false").unwrap();
        assert_eq!(engine.get_parameter("mrv").as_deref(), Some("false"));
        assert!(engine.set_parameter("mrv", "maybe").is_err());
    }
}
