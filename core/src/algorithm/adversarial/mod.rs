//! Adversarial search over game trees drawn in the graph editor
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

pub mod minimax;

pub use self::minimax::{
    Minimax, MinimaxConfig, MinimaxOutcome, MinimaxProblem, MinimaxReplay, MinimaxStep,
    MinimaxStepKind, MinimaxView,
};
