//! Execution history management for trace replay
//!
//! This module provides bidirectional navigation over a finished trace.
//! The visual state at any step is rebuilt by folding the engine's
//! `Replay::apply` over the trace prefix, never by re-running the
//! engine. Full state snapshots are kept at regular intervals so that
//! seeking costs at most `checkpoint_interval` applications.
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::BTreeMap;
use std::fmt::Debug;

use thiserror::Error;

use crate::execution::trace::{ExecutionTrace, TraceStep};

/// Default distance between stored state snapshots
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 32;

/// Rebuilds the visual state of an engine from its own steps
pub trait Replay {
    type Step: TraceStep;
    type State: Clone + Debug + PartialEq;

    /// State before step 0 has been applied
    fn initial_state(&self) -> Self::State;

    /// Advances `state` by exactly one recorded step
    fn apply(&self, state: &mut Self::State, step: &Self::Step);

    /// Folds a whole prefix from the initial state
    fn replay(&self, steps: &[Self::Step]) -> Self::State {
        let mut state = self.initial_state();
        for step in steps {
            self.apply(&mut state, step);
        }
        state
    }
}

/// Error types for execution history operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("Invalid step index {index} (trace has {len} steps)")]
    InvalidIndex { index: usize, len: usize },

    #[error("Cannot replay an empty trace")]
    EmptyTrace,
}

/// Cursor over a recorded trace with checkpointed state reconstruction
#[derive(Debug)]
pub struct ExecutionHistory<R: Replay> {
    replay: R,

    trace: ExecutionTrace<R::Step>,

    /// State after applying step `k`, for every `k` multiple of the interval
    checkpoints: BTreeMap<usize, R::State>,

    checkpoint_interval: usize,

    /// Index of the step currently displayed
    cursor: usize,
}

impl<R: Replay> ExecutionHistory<R> {
    pub fn new(replay: R, trace: ExecutionTrace<R::Step>) -> Result<Self, HistoryError> {
        Self::with_checkpoint_interval(replay, trace, DEFAULT_CHECKPOINT_INTERVAL)
    }

    pub fn with_checkpoint_interval(
        replay: R,
        trace: ExecutionTrace<R::Step>,
        checkpoint_interval: usize,
    ) -> Result<Self, HistoryError> {
        if trace.is_empty() {
            return Err(HistoryError::EmptyTrace);
        }
        let checkpoint_interval = checkpoint_interval.max(1);

        let mut checkpoints = BTreeMap::new();
        let mut state = replay.initial_state();
        for (index, step) in trace.iter().enumerate() {
            replay.apply(&mut state, step);
            if index % checkpoint_interval == 0 {
                checkpoints.insert(index, state.clone());
            }
        }
        log::debug!(
            "history for {} built: {} steps, {} checkpoints",
            trace.metadata().algorithm,
            trace.len(),
            checkpoints.len()
        );

        Ok(Self {
            replay,
            trace,
            checkpoints,
            checkpoint_interval,
            cursor: 0,
        })
    }

    pub fn trace(&self) -> &ExecutionTrace<R::Step> {
        &self.trace
    }

    pub fn len(&self) -> usize {
        self.trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }

    pub fn checkpoint_interval(&self) -> usize {
        self.checkpoint_interval
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn is_at_start(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor + 1 >= self.trace.len()
    }

    pub fn current_step(&self) -> &R::Step {
        // The trace is non-empty and the cursor is kept in range.
        &self.trace.steps()[self.cursor]
    }

    /// State after step `index` has been applied
    pub fn state_at(&self, index: usize) -> Result<R::State, HistoryError> {
        if index >= self.trace.len() {
            return Err(HistoryError::InvalidIndex {
                index,
                len: self.trace.len(),
            });
        }

        let (mut state, from) = match self.checkpoints.range(..=index).next_back() {
            Some((&at, state)) => (state.clone(), at + 1),
            None => (self.replay.initial_state(), 0),
        };
        for step in &self.trace.steps()[from..=index] {
            self.replay.apply(&mut state, step);
        }
        Ok(state)
    }

    pub fn current_state(&self) -> R::State {
        // Invariant: cursor < len, so this cannot fail.
        match self.state_at(self.cursor) {
            Ok(state) => state,
            Err(_) => self.replay.initial_state(),
        }
    }

    /// Moves one step forward, returning the newly displayed step
    pub fn step_forward(&mut self) -> Option<&R::Step> {
        if self.is_at_end() {
            return None;
        }
        self.cursor += 1;
        Some(self.current_step())
    }

    /// Moves one step back, returning the newly displayed step
    pub fn step_back(&mut self) -> Option<&R::Step> {
        if self.is_at_start() {
            return None;
        }
        self.cursor -= 1;
        Some(self.current_step())
    }

    pub fn seek(&mut self, index: usize) -> Result<&R::Step, HistoryError> {
        if index >= self.trace.len() {
            return Err(HistoryError::InvalidIndex {
                index,
                len: self.trace.len(),
            });
        }
        self.cursor = index;
        Ok(self.current_step())
    }

    pub fn seek_end(&mut self) -> &R::Step {
        self.cursor = self.trace.len() - 1;
        self.current_step()
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }
}
