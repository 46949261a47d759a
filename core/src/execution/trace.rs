//! Execution trace containers
//!
//! A trace is the complete, order-preserving record of one engine run.
//! Steps are immutable once recorded: each one owns deep copies of the
//! frontier, closed set or domains it describes, so later mutations of
//! the live solver state can never leak into history.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::algorithm::traits::{Algorithm, AlgorithmError, AlgorithmId, AlgorithmMetrics};

/// One discrete, fully computed step of an engine run
pub trait TraceStep: Debug + Clone + Send + Sync {
    /// Monotonically increasing position in the trace, starting at 0
    fn index(&self) -> usize;

    /// Human-readable summary used by step lists and logs
    fn describe(&self) -> String;
}

/// Metadata for a recorded run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceMetadata {
    /// Algorithm identifier
    pub algorithm: AlgorithmId,

    /// Algorithm display name
    pub algorithm_name: String,

    /// Parameter values the run was configured with
    pub parameters: BTreeMap<String, String>,

    /// Collected once the run finishes
    pub metrics: AlgorithmMetrics,
}

impl TraceMetadata {
    pub fn for_algorithm<A: Algorithm + ?Sized>(algorithm: &A) -> Self {
        Self {
            algorithm: algorithm.id(),
            algorithm_name: algorithm.name().to_owned(),
            parameters: algorithm
                .parameters()
                .into_iter()
                .map(|p| (p.name, p.value))
                .collect(),
            metrics: AlgorithmMetrics::default(),
        }
    }
}

/// Ordered, append-only list of steps plus run metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionTrace<S> {
    metadata: TraceMetadata,
    steps: Vec<S>,
}

impl<S: TraceStep> ExecutionTrace<S> {
    pub fn new(metadata: TraceMetadata) -> Self {
        Self {
            metadata,
            steps: Vec::new(),
        }
    }

    /// Index the next recorded step must carry
    #[inline]
    pub fn next_index(&self) -> usize {
        self.steps.len()
    }

    pub(crate) fn record(&mut self, step: S) {
        debug_assert_eq!(step.index(), self.steps.len(), "steps must be recorded in order");
        log::trace!("[{}] {}", self.metadata.algorithm, step.describe());
        self.steps.push(step);
    }

    pub(crate) fn finish(&mut self, metrics: AlgorithmMetrics) {
        self.metadata.metrics = metrics;
    }

    pub fn metadata(&self) -> &TraceMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&S> {
        self.steps.get(index)
    }

    pub fn last(&self) -> Option<&S> {
        self.steps.last()
    }

    pub fn steps(&self) -> &[S] {
        &self.steps
    }

    /// Steps `0..=index`, clamped to the trace length
    pub fn prefix(&self, index: usize) -> &[S] {
        let end = (index + 1).min(self.steps.len());
        &self.steps[..end]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, S> {
        self.steps.iter()
    }

    /// One line per step, in order
    pub fn describe(&self) -> Vec<String> {
        self.steps.iter().map(TraceStep::describe).collect()
    }
}

impl<S: TraceStep + Serialize> ExecutionTrace<S> {
    pub fn to_json(&self) -> Result<String, AlgorithmError> {
        Ok(serde_json::to_string(self)?)
    }
}

impl<S: TraceStep + DeserializeOwned> ExecutionTrace<S> {
    pub fn from_json(json: &str) -> Result<Self, AlgorithmError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl<'a, S> IntoIterator for &'a ExecutionTrace<S> {
    type Item = &'a S;
    type IntoIter = std::slice::Iter<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tick(usize);

    impl TraceStep for Tick {
        fn index(&self) -> usize {
            self.0
        }

        fn describe(&self) -> String {
            format!("tick {}", self.0)
        }
    }

    fn metadata() -> TraceMetadata {
        TraceMetadata {
            algorithm: AlgorithmId::new("tick"),
            algorithm_name: "Tick".to_owned(),
            parameters: BTreeMap::new(),
            metrics: AlgorithmMetrics::default(),
        }
    }

    #[test]
    fn test_prefix_is_clamped() {
        let mut trace = ExecutionTrace::new(metadata());
        for i in 0..3 {
            trace.record(Tick(i));
        }
        assert_eq!(trace.prefix(1), &[Tick(0), Tick(1)]);
        assert_eq!(trace.prefix(10).len(), 3);
        assert_eq!(trace.next_index(), 3);
    }

    #[test]
    fn test_json_export_import() {
        let mut trace = ExecutionTrace::new(metadata());
        trace.record(Tick(0));
        trace.record(Tick(1));

        let json = trace.to_json().unwrap();
        let restored: ExecutionTrace<Tick> = ExecutionTrace::from_json(&json).unwrap();
        assert_eq!(restored.steps(), trace.steps());
        assert_eq!(restored.metadata(), trace.metadata());
        assert_eq!(restored.describe(), vec!["tick 0", "tick 1"]);
    }
}
