//! AC-3 arc consistency
//!
//! The queue starts with every arc of the network in constraint order
//! (stated direction, then its inverse unless the network is directed).
//! Each pop revises the arc's source domain against its target domain.
//! When values were removed, every arc pointing into the source is
//! queued again, except the ones coming from the arc's own target and
//! the ones already waiting.
//!
//! Working domains are copies of the network's domains; the network is
//! never modified. A wiped-out domain stops propagation and is reported
//! as an outcome, not as an error.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::VecDeque;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::algorithm::csp::{DomainTable, DEFAULT_MAX_STEPS};
use crate::algorithm::traits::{
    validated, Algorithm, AlgorithmError, AlgorithmId, AlgorithmParameter, AlgorithmProfiler,
    ExecutionResult, VariableId,
};
use crate::data_structures::constraint::{ConstraintNetwork, DirectedArc, Variable};
use crate::execution::history::Replay;
use crate::execution::trace::{ExecutionTrace, TraceMetadata, TraceStep};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Ac3Config {
    pub max_steps: usize,
}

impl Default for Ac3Config {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ac3Event {
    /// Queue filled with every arc
    Initialized,
    /// Every source value had support
    Unchanged,
    /// Unsupported source values were removed
    Revised,
    /// The source domain became empty; the network is unsatisfiable
    DomainWiped { variable: VariableId },
    StepLimitReached { limit: usize },
}

/// One queue pop (or the initial fill at step 0)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ac3Step {
    pub step: usize,
    pub arc: Option<DirectedArc>,
    /// Values removed from the arc's source domain, in domain order
    pub removed: Vec<i64>,
    /// Arcs queued again because of this revision
    pub enqueued: Vec<DirectedArc>,
    /// Every domain after the step, in variable order
    pub domains: Vec<Variable>,
    /// Queue after the step, front first
    pub queue: Vec<DirectedArc>,
    pub event: Ac3Event,
}

impl TraceStep for Ac3Step {
    fn index(&self) -> usize {
        self.step
    }

    fn describe(&self) -> String {
        let Some(arc) = &self.arc else {
            return match &self.event {
                Ac3Event::StepLimitReached { limit } => {
                    format!("Step {}: stopped after {limit} steps", self.step)
                }
                _ => format!("Step {}: {} arcs queued", self.step, self.queue.len()),
            };
        };
        match &self.event {
            Ac3Event::Unchanged => format!("Step {}: {arc} is consistent", self.step),
            Ac3Event::DomainWiped { variable } => format!(
                "Step {}: {arc} removed {:?}, domain of {variable} is empty",
                self.step, self.removed
            ),
            _ => format!(
                "Step {}: {arc} removed {:?}, queued {} arcs",
                self.step,
                self.removed,
                self.enqueued.len()
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ac3Termination {
    QueueEmpty,
    DomainWiped,
    StepLimitReached,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ac3Outcome {
    /// False when some domain was emptied
    pub consistent: bool,
    pub domains: Vec<Variable>,
    pub wiped: Option<VariableId>,
    pub termination: Ac3Termination,
    pub revisions: usize,
}

impl Display for Ac3Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.termination, &self.wiped) {
            (Ac3Termination::DomainWiped, Some(variable)) => {
                write!(f, "inconsistent: domain of {variable} is empty")
            }
            (Ac3Termination::StepLimitReached, _) => f.write_str("stopped at the step limit"),
            _ => write!(f, "arc consistent after {} revisions", self.revisions),
        }
    }
}

/// Arc-consistency engine
#[derive(Debug, Clone, Default)]
pub struct Ac3 {
    config: Ac3Config,
}

impl Ac3 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Ac3Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Ac3Config {
        &self.config
    }

    fn propagate(
        &self,
        network: &ConstraintNetwork,
    ) -> Result<ExecutionResult<Ac3Step, Ac3Outcome>, AlgorithmError> {
        network.validate()?;

        let mut profiler = AlgorithmProfiler::new();
        profiler.start();
        let mut trace = ExecutionTrace::new(TraceMetadata::for_algorithm(self));

        let arcs = network.arcs();
        let mut domains = DomainTable::from_network(network);
        let mut queue: VecDeque<DirectedArc> = arcs.iter().cloned().collect();
        log::debug!(
            "AC-3 over {} variables, {} arcs{}",
            network.variables().len(),
            arcs.len(),
            if network.is_directed() { " (directed)" } else { "" }
        );

        let snapshot = |step: usize,
                        arc: Option<DirectedArc>,
                        removed: Vec<i64>,
                        enqueued: Vec<DirectedArc>,
                        domains: &DomainTable,
                        queue: &VecDeque<DirectedArc>,
                        event: Ac3Event| Ac3Step {
            step,
            arc,
            removed,
            enqueued,
            domains: domains.snapshot(),
            queue: queue.iter().cloned().collect(),
            event,
        };

        trace.record(snapshot(0, None, Vec::new(), Vec::new(), &domains, &queue, Ac3Event::Initialized));

        let mut revisions = 0;
        let (termination, wiped) = loop {
            let index = trace.next_index();
            if index > self.config.max_steps {
                let limit = self.config.max_steps;
                trace.record(snapshot(
                    index,
                    None,
                    Vec::new(),
                    Vec::new(),
                    &domains,
                    &queue,
                    Ac3Event::StepLimitReached { limit },
                ));
                break (Ac3Termination::StepLimitReached, None);
            }
            let Some(arc) = queue.pop_front() else {
                break (Ac3Termination::QueueEmpty, None);
            };
            profiler.record_step();
            profiler.record_node_exploration();

            let removed = domains.revise(&arc);
            if removed.is_empty() {
                trace.record(snapshot(index, Some(arc), removed, Vec::new(), &domains, &queue, Ac3Event::Unchanged));
                continue;
            }
            revisions += 1;

            if domains.is_empty(&arc.source) {
                let variable = arc.source.clone();
                let event = Ac3Event::DomainWiped {
                    variable: variable.clone(),
                };
                trace.record(snapshot(index, Some(arc), removed, Vec::new(), &domains, &queue, event));
                break (Ac3Termination::DomainWiped, Some(variable));
            }

            let mut enqueued = Vec::new();
            for candidate in &arcs {
                if candidate.target == arc.source
                    && candidate.source != arc.target
                    && !queue.contains(candidate)
                {
                    queue.push_back(candidate.clone());
                    enqueued.push(candidate.clone());
                }
            }
            trace.record(snapshot(index, Some(arc), removed, enqueued, &domains, &queue, Ac3Event::Revised));
        };

        profiler.record_custom("revisions", revisions as f64);
        trace.finish(profiler.into_metrics());
        log::debug!("AC-3 finished after {} steps: {termination:?}", trace.len());

        let outcome = Ac3Outcome {
            consistent: termination != Ac3Termination::DomainWiped,
            domains: domains.snapshot(),
            wiped,
            termination,
            revisions,
        };
        Ok(ExecutionResult { trace, outcome })
    }
}

impl Algorithm for Ac3 {
    type Input = ConstraintNetwork;
    type Step = Ac3Step;
    type Outcome = Ac3Outcome;

    fn id(&self) -> AlgorithmId {
        AlgorithmId::new("ac3")
    }

    fn name(&self) -> &'static str {
        "AC-3 Arc Consistency"
    }

    fn category(&self) -> &'static str {
        "csp"
    }

    fn description(&self) -> String {
        "AC-3: prunes unsupported values until every arc is consistent".to_owned()
    }

    fn parameters(&self) -> Vec<AlgorithmParameter> {
        vec![AlgorithmParameter::integer("max_steps", self.config.max_steps, 1)]
    }

    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError> {
        validated(&self.parameters(), name, value)?;
        match name {
            "max_steps" => {
                self.config.max_steps =
                    value
                        .parse()
                        .map_err(|_| AlgorithmError::InvalidParameter {
                            name: name.to_owned(),
                            reason: "expected a count".to_owned(),
                        })?
            }
            _ => {
                return Err(AlgorithmError::InvalidParameter {
                    name: name.to_owned(),
                    reason: "unknown parameter".to_owned(),
                })
            }
        }
        Ok(())
    }

    fn execute(
        &self,
        input: &ConstraintNetwork,
    ) -> Result<ExecutionResult<Ac3Step, Ac3Outcome>, AlgorithmError> {
        self.propagate(input)
    }
}

/// Domains and queue as displayed at some step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ac3View {
    pub domains: Vec<Variable>,
    pub queue: Vec<DirectedArc>,
    pub current: Option<DirectedArc>,
    pub wiped: Option<VariableId>,
}

/// Rebuilds `Ac3View`s: domains from step 0, then removals only
#[derive(Debug, Clone, Copy, Default)]
pub struct Ac3Replay;

impl Replay for Ac3Replay {
    type Step = Ac3Step;
    type State = Ac3View;

    fn initial_state(&self) -> Ac3View {
        Ac3View::default()
    }

    fn apply(&self, state: &mut Ac3View, step: &Ac3Step) {
        if step.event == Ac3Event::Initialized {
            state.domains = step.domains.clone();
        }
        if let Some(arc) = &step.arc {
            if let Some(variable) = state.domains.iter_mut().find(|v| v.id == arc.source) {
                variable.domain.retain(|value| !step.removed.contains(value));
            }
        }
        if let Ac3Event::DomainWiped { variable } = &step.event {
            state.wiped = Some(variable.clone());
        }
        state.current = step.arc.clone();
        state.queue = step.queue.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::presets;
    use crate::data_structures::constraint::{Constraint, Relation};

    fn domain_of<'a>(domains: &'a [Variable], id: &str) -> &'a [i64] {
        &domains.iter().find(|v| v.id.as_str() == id).unwrap().domain
    }

    #[test]
    fn test_classic_example_reaches_fixpoint() {
        let result = Ac3::new().execute(&presets::arc_consistency_network()).unwrap();
        let outcome = &result.outcome;
        assert!(outcome.consistent);
        assert_eq!(outcome.termination, Ac3Termination::QueueEmpty);
        assert_eq!(domain_of(&outcome.domains, "X"), &[4, 5]);
        assert_eq!(domain_of(&outcome.domains, "Y"), &[5, 6]);
        assert_eq!(domain_of(&outcome.domains, "Z"), &[1, 2]);
        assert!(result.trace.last().unwrap().queue.is_empty());

        // Every remaining X has a larger Y.
        let y = domain_of(&outcome.domains, "Y");
        assert!(domain_of(&outcome.domains, "X").iter().all(|x| y.iter().any(|v| v > x)));
        assert_eq!(result.trace.len(), 6);
    }

    #[test]
    fn test_first_revision_of_z_keeps_three_values() {
        // With the Z constraint listed first, X is still 1..6 when Z is revised.
        let mut network = ConstraintNetwork::new();
        for id in ["X", "Y", "Z"] {
            network.add_variable(id, 1..=6).unwrap();
        }
        network.add_constraint(Constraint::new("Z", "X", Relation::Lt, -2)).unwrap();
        network.add_constraint(Constraint::new("X", "Y", Relation::Lt, 0)).unwrap();

        let result = Ac3::new().execute(&network).unwrap();
        let first = &result.trace.steps()[1];
        assert_eq!(first.removed, vec![4, 5, 6]);
        assert_eq!(domain_of(&first.domains, "Z"), &[1, 2, 3]);
        assert_eq!(domain_of(&result.outcome.domains, "Z"), &[1, 2]);

        // Revising X < Y puts Z < X - 2 back in the queue.
        let third = &result.trace.steps()[3];
        assert_eq!(third.enqueued.len(), 1);
        assert_eq!(third.enqueued[0].to_string(), "Z < X - 2");
    }

    #[test]
    fn test_wipeout_is_an_outcome() {
        let mut network = ConstraintNetwork::new();
        network.add_variable("A", [1, 2]).unwrap();
        network.add_variable("B", [1, 2]).unwrap();
        network.add_constraint(Constraint::new("A", "B", Relation::Gt, 5)).unwrap();

        let result = Ac3::new().execute(&network).unwrap();
        assert!(!result.outcome.consistent);
        assert_eq!(result.outcome.wiped, Some("A".into()));
        assert_eq!(result.trace.len(), 2);
        assert!(matches!(result.trace.last().unwrap().event, Ac3Event::DomainWiped { .. }));
    }

    #[test]
    fn test_directed_network_only_revises_sources() {
        let mut network = presets::arc_consistency_network();
        network.set_directed(true);
        let result = Ac3::new().execute(&network).unwrap();
        // Y is never a source, so it keeps its full domain.
        assert_eq!(domain_of(&result.outcome.domains, "Y"), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(domain_of(&result.outcome.domains, "X"), &[1, 2, 3, 4, 5]);
        assert_eq!(domain_of(&result.outcome.domains, "Z"), &[1, 2]);
    }

    #[test]
    fn test_input_network_untouched() {
        let network = presets::arc_consistency_network();
        let before = network.clone();
        Ac3::new().execute(&network).unwrap();
        assert_eq!(network, before);
    }

    #[test]
    fn test_replay_matches_snapshots() {
        let result = Ac3::new().execute(&presets::arc_consistency_network()).unwrap();
        for (k, step) in result.trace.iter().enumerate() {
            let view = Ac3Replay.replay(result.trace.prefix(k));
            assert_eq!(view.domains, step.domains);
            assert_eq!(view.queue, step.queue);
        }
    }

    #[test]
    fn test_step_limit() {
        let mut engine = Ac3::new();
        engine.set_parameter("max_steps", "2").unwrap();
        let result = engine.execute(&presets::arc_consistency_network()).unwrap();
        assert_eq!(result.outcome.termination, Ac3Termination::StepLimitReached);
        assert_eq!(result.trace.len(), 4);
        assert!(engine.set_parameter("max_steps", "0").is_err());
    }
}
