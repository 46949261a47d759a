//! Core algorithm trait definitions for the TRACELAB solving core
//!
//! This module establishes the shared vocabulary of every engine: string
//! identifiers for graph nodes and CSP variables, the error taxonomy, the
//! typed parameter protocol used by rendering layers to configure a run,
//! and the `Algorithm` trait that turns an input definition into a
//! replayable execution trace plus a terminal outcome.
//!
//! # Key Design Principles
//! - Engines are pure: `(definition, parameters) -> (trace, outcome)`
//! - Negative results are outcomes, malformed input is an error
//! - Every run owns its working copies; inputs are never mutated
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::execution::trace::{ExecutionTrace, TraceStep};

/// Universal algorithm identifier for type-safe dispatch
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmId(String);

impl AlgorithmId {
    pub fn new(name: &str) -> Self {
        Self(name.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a graph node or CSP variable.
///
/// Ordering is lexical on the underlying string; every tie-break in the
/// search engines relies on it.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// CSP variables share the node identifier space.
pub type VariableId = NodeId;

/// Algorithm parameter with strongly typed values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmParameter {
    pub name: String,
    pub value: String,
    pub value_type: ParameterType,
    pub constraints: Option<ParameterConstraints>,
}

/// Parameter type enumeration for type-safe parameter handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ParameterType {
    Integer,
    Boolean,
    Enum(Vec<String>),
}

/// Parameter constraints for validating algorithm parameters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterConstraints {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub allowed_values: Option<Vec<String>>,
}

impl AlgorithmParameter {
    pub fn boolean(name: &str, value: bool) -> Self {
        Self {
            name: name.to_owned(),
            value: value.to_string(),
            value_type: ParameterType::Boolean,
            constraints: None,
        }
    }

    pub fn integer(name: &str, value: usize, min: usize) -> Self {
        Self {
            name: name.to_owned(),
            value: value.to_string(),
            value_type: ParameterType::Integer,
            constraints: Some(ParameterConstraints {
                min: Some(min as f64),
                ..ParameterConstraints::default()
            }),
        }
    }

    pub fn choice(name: &str, value: &str, options: &[&str]) -> Self {
        let options: Vec<String> = options.iter().map(|o| (*o).to_owned()).collect();
        Self {
            name: name.to_owned(),
            value: value.to_owned(),
            value_type: ParameterType::Enum(options.clone()),
            constraints: Some(ParameterConstraints {
                allowed_values: Some(options),
                ..ParameterConstraints::default()
            }),
        }
    }

    /// Checks a candidate value against the declared type and constraints
    pub fn validate(&self, value: &str) -> Result<(), AlgorithmError> {
        let invalid = |reason: String| AlgorithmError::InvalidParameter {
            name: self.name.clone(),
            reason,
        };

        let numeric = match &self.value_type {
            ParameterType::Boolean => {
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("expected true or false, got '{value}'")))?;
                None
            }
            ParameterType::Integer => Some(
                value
                    .parse::<i64>()
                    .map_err(|_| invalid(format!("expected an integer, got '{value}'")))?
                    as f64,
            ),
            ParameterType::Enum(options) => {
                if !options.iter().any(|o| o == value) {
                    return Err(invalid(format!(
                        "'{value}' is not one of {}",
                        options.join(", ")
                    )));
                }
                None
            }
        };

        if let (Some(number), Some(constraints)) = (numeric, &self.constraints) {
            if let Some(min) = constraints.min {
                if number < min {
                    return Err(invalid(format!("{number} is below the minimum {min}")));
                }
            }
            if let Some(max) = constraints.max {
                if number > max {
                    return Err(invalid(format!("{number} is above the maximum {max}")));
                }
            }
        }

        Ok(())
    }
}

/// Looks up the declared parameter and validates the value against it.
pub(crate) fn validated<'a>(
    declared: &'a [AlgorithmParameter],
    name: &str,
    value: &str,
) -> Result<&'a AlgorithmParameter, AlgorithmError> {
    let parameter = declared
        .iter()
        .find(|p| p.name == name)
        .ok_or_else(|| AlgorithmError::InvalidParameter {
            name: name.to_owned(),
            reason: "unknown parameter".to_owned(),
        })?;
    parameter.validate(value)?;
    Ok(parameter)
}

/// Comprehensive error types for algorithm operations
#[derive(Debug, thiserror::Error)]
pub enum AlgorithmError {
    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Unknown {role} '{id}'")]
    MissingNode { role: &'static str, id: NodeId },

    #[error("Duplicate identifier '{0}'")]
    DuplicateId(NodeId),

    #[error("Cannot rename '{0}' to itself")]
    SelfRename(NodeId),

    #[error("Invalid edge weight {weight} on {from} -> {to}")]
    InvalidWeight { from: NodeId, to: NodeId, weight: f64 },

    #[error("Invalid constraint: {0}")]
    InvalidConstraint(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Algorithm execution metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmMetrics {
    pub steps_executed: usize,
    pub nodes_explored: usize,
    pub execution_time: Duration,
    pub custom_metrics: HashMap<String, f64>,
}

/// Finished run: the full trace and the terminal result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult<S, O> {
    pub trace: ExecutionTrace<S>,
    pub outcome: O,
}

/// Main algorithm trait
///
/// # Invariants
/// - State isolation between runs
/// - Deterministic behavior for given inputs
/// - Input validation happens before the first step is recorded
pub trait Algorithm: Debug + Send + Sync {
    /// Problem definition the engine consumes
    type Input: ?Sized;

    /// Trace record emitted per step
    type Step: TraceStep;

    /// Terminal result of a run
    type Outcome: Debug + Clone;

    /// Returns the algorithm's unique identifier
    fn id(&self) -> AlgorithmId;

    /// Returns the algorithm's descriptive name
    fn name(&self) -> &'static str;

    /// Returns the algorithm's category (e.g., path_finding, csp)
    fn category(&self) -> &'static str;

    /// Returns a short description of the algorithm and its current mode
    fn description(&self) -> String;

    /// Returns supported parameters with type information
    fn parameters(&self) -> Vec<AlgorithmParameter>;

    /// Sets algorithm parameter with type validation
    fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), AlgorithmError>;

    /// Gets algorithm parameter value
    fn get_parameter(&self, name: &str) -> Option<String> {
        self.parameters()
            .into_iter()
            .find(|p| p.name == name)
            .map(|p| p.value)
    }

    /// Runs to completion and returns the trace with its outcome
    fn execute(
        &self,
        input: &Self::Input,
    ) -> Result<ExecutionResult<Self::Step, Self::Outcome>, AlgorithmError>;
}

/// Lightweight profiler feeding `AlgorithmMetrics`
#[derive(Debug, Default)]
pub struct AlgorithmProfiler {
    metrics: AlgorithmMetrics,
    start_time: Option<Instant>,
}

impl AlgorithmProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.metrics.execution_time = start.elapsed();
        }
    }

    pub fn record_node_exploration(&mut self) {
        self.metrics.nodes_explored += 1;
    }

    pub fn record_step(&mut self) {
        self.metrics.steps_executed += 1;
    }

    pub fn record_custom(&mut self, name: &str, value: f64) {
        self.metrics.custom_metrics.insert(name.to_owned(), value);
    }

    pub fn into_metrics(mut self) -> AlgorithmMetrics {
        self.stop();
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_id_uniqueness() {
        let id1 = AlgorithmId::new("astar");
        let id2 = AlgorithmId::new("ucs");
        let id3 = AlgorithmId::new("astar");

        assert_ne!(id1, id2);
        assert_eq!(id1, id3);
    }

    #[test]
    fn test_node_id_lexical_order() {
        let mut ids: Vec<NodeId> = ["C", "A", "AB", "B"].into_iter().map(NodeId::from).collect();
        ids.sort();
        let names: Vec<&str> = ids.iter().map(NodeId::as_str).collect();
        assert_eq!(names, vec!["A", "AB", "B", "C"]);
    }

    #[test]
    fn test_parameter_constraints() {
        let param = AlgorithmParameter::integer("max_steps", 100, 1);
        assert!(param.validate("5").is_ok());
        assert!(param.validate("0").is_err());
        assert!(param.validate("many").is_err());

        let choice = AlgorithmParameter::choice("strategy", "bfs", &["bfs", "dfs"]);
        assert!(choice.validate("dfs").is_ok());
        assert!(matches!(
            choice.validate("ucs"),
            Err(AlgorithmError::InvalidParameter { .. })
        ));

        let flag = AlgorithmParameter::boolean("mrv", false);
        assert!(flag.validate("true").is_ok());
        assert!(flag.validate("yes").is_err());
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let declared = vec![AlgorithmParameter::boolean("tree_search", false)];
        assert!(validated(&declared, "tree_search", "true").is_ok());
        assert!(validated(&declared, "depth", "3").is_err());
    }

    #[test]
    fn test_profiler_counts() {
        let mut profiler = AlgorithmProfiler::new();
        profiler.start();
        profiler.record_step();
        profiler.record_step();
        profiler.record_node_exploration();
        let metrics = profiler.into_metrics();
        assert_eq!(metrics.steps_executed, 2);
        assert_eq!(metrics.nodes_explored, 1);
    }
}
