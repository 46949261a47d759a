//! Constraint satisfaction engines over finite integer domains
//!
//! Copyright (c) 2025 Mohammad Atashi <mohammadaliatashi@icloud.com>

use std::collections::HashMap;

use crate::algorithm::traits::VariableId;
use crate::data_structures::constraint::{ConstraintNetwork, DirectedArc, Variable};

pub mod ac3;
pub mod backtracking;

pub use self::ac3::{Ac3, Ac3Config, Ac3Event, Ac3Outcome, Ac3Replay, Ac3Step, Ac3Termination, Ac3View};
pub use self::backtracking::{
    BacktrackEvent, BacktrackOutcome, BacktrackReplay, BacktrackStep, BacktrackTermination,
    BacktrackView, Backtracking, BacktrackingConfig,
};

pub use crate::algorithm::path_finding::search::DEFAULT_MAX_STEPS;

/// Working copy of every domain, indexed like the network's variables
#[derive(Debug, Clone)]
pub(crate) struct DomainTable {
    ids: Vec<VariableId>,
    index: HashMap<VariableId, usize>,
    original: Vec<Vec<i64>>,
    current: Vec<Vec<i64>>,
}

impl DomainTable {
    pub(crate) fn from_network(network: &ConstraintNetwork) -> Self {
        let ids: Vec<VariableId> = network.variables().iter().map(|v| v.id.clone()).collect();
        let index = ids.iter().cloned().enumerate().map(|(i, id)| (id, i)).collect();
        let original: Vec<Vec<i64>> = network.variables().iter().map(|v| v.domain.clone()).collect();
        Self {
            ids,
            index,
            current: original.clone(),
            original,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn index_of(&self, id: &VariableId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub(crate) fn id(&self, index: usize) -> &VariableId {
        &self.ids[index]
    }

    pub(crate) fn domain(&self, index: usize) -> &[i64] {
        &self.current[index]
    }

    pub(crate) fn is_empty(&self, id: &VariableId) -> bool {
        self.index_of(id).map_or(false, |i| self.current[i].is_empty())
    }

    /// Removes source values without support in the target domain and
    /// returns them in domain order
    pub(crate) fn revise(&mut self, arc: &DirectedArc) -> Vec<i64> {
        let (Some(source), Some(target)) = (self.index_of(&arc.source), self.index_of(&arc.target))
        else {
            log::warn!("skipping arc '{arc}': unknown variable");
            return Vec::new();
        };
        let (kept, removed): (Vec<i64>, Vec<i64>) = self.current[source]
            .iter()
            .copied()
            .partition(|&x| self.current[target].iter().any(|&y| arc.satisfied(x, y)));
        self.current[source] = kept;
        removed
    }

    /// Removes the values of `index` rejected by `keep`
    pub(crate) fn prune(&mut self, index: usize, mut keep: impl FnMut(i64) -> bool) -> Vec<i64> {
        let (kept, removed): (Vec<i64>, Vec<i64>) =
            self.current[index].iter().copied().partition(|&y| keep(y));
        self.current[index] = kept;
        removed
    }

    /// Puts values back, keeping the original domain order
    pub(crate) fn restore(&mut self, index: usize, values: &[i64]) {
        let current = &self.current[index];
        let restored: Vec<i64> = self.original[index]
            .iter()
            .copied()
            .filter(|v| current.contains(v) || values.contains(v))
            .collect();
        self.current[index] = restored;
    }

    pub(crate) fn snapshot(&self) -> Vec<Variable> {
        self.ids
            .iter()
            .zip(&self.current)
            .map(|(id, domain)| Variable {
                id: id.clone(),
                domain: domain.clone(),
            })
            .collect()
    }
}
