//! Frontier-based path finding with step-by-step traces
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod compare;
mod informed;
pub mod problem;
pub mod search;
mod uninformed;

pub use self::compare::{compare_strategies, ComparisonRow};
pub use self::problem::{euclidean_estimate, SearchProblem};
pub use self::search::{
    ExtendedEntry, GraphSearch, SearchConfig, SearchEvent, SearchOutcome, SearchReplay, SearchStep,
    SearchStrategy, SearchView, Termination,
};
