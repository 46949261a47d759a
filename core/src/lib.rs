//! TRACELAB core - search and constraint solving engines with replayable traces
//!
//! Every engine consumes an immutable problem (a `SearchProblem`,
//! `MinimaxProblem` or `ConstraintNetwork`) and returns an
//! `ExecutionResult`: the ordered, immutable steps of the run plus a
//! terminal outcome. A rendering layer replays the steps through
//! `ExecutionHistory` or `Playback` without ever re-running the engine.
//!
//! ```no_run
//! use tracelab_core::algorithm::{presets, Algorithm, GraphSearch, SearchStrategy};
//!
//! let result = GraphSearch::new(SearchStrategy::AStar)
//!     .execute(&presets::weighted_search_problem())?;
//! for line in result.trace.describe() {
//!     println!("{line}");
//! }
//! # Ok::<(), tracelab_core::algorithm::AlgorithmError>(())
//! ```
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod algorithm;
pub mod data_structures;
pub mod execution;

pub use algorithm::traits::{Algorithm, AlgorithmError, ExecutionResult, NodeId, VariableId};
pub use execution::{ExecutionHistory, ExecutionTrace, Replay, TraceStep};
