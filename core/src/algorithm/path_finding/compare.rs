//! Side-by-side comparison of search strategies on one problem
//!
//! Runs are independent (each owns its frontier and extended list), so
//! they are evaluated in parallel and reported in the requested order.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::algorithm::path_finding::problem::SearchProblem;
use crate::algorithm::path_finding::search::{GraphSearch, SearchConfig, SearchStrategy, Termination};
use crate::algorithm::traits::{Algorithm, AlgorithmError, NodeId};

/// Summary row for one strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub strategy: SearchStrategy,
    pub found: bool,
    pub path: Vec<NodeId>,
    pub cost: f64,
    pub termination: Termination,
    pub steps: usize,
    pub extended_count: usize,
    pub enqueued_count: usize,
}

/// Runs every strategy in `strategies` with otherwise identical flags
pub fn compare_strategies(
    problem: &SearchProblem,
    strategies: &[SearchStrategy],
    base: &SearchConfig,
) -> Result<Vec<ComparisonRow>, AlgorithmError> {
    problem.validate()?;
    strategies
        .par_iter()
        .map(|&strategy| {
            let engine = GraphSearch::with_config(SearchConfig {
                strategy,
                ..base.clone()
            });
            let result = engine.execute(problem)?;
            let last = result.trace.last();
            Ok(ComparisonRow {
                strategy,
                found: result.outcome.found,
                path: result.outcome.path,
                cost: result.outcome.cost,
                termination: result.outcome.termination,
                steps: result.trace.len(),
                extended_count: last.map_or(0, |s| s.extended_count),
                enqueued_count: last.map_or(0, |s| s.enqueued_count),
            })
        })
        .collect()
}
