//! Search frontier with the four queueing disciplines of the visualizers
//!
//! The frontier is kept as a fully ordered sequence whose front is the
//! next entry to be popped, so a snapshot is exactly what a step list
//! renders. Priority insertion is stable: among entries with equal keys
//! the one inserted first stays first.
//!
//! # Ordering
//! - FIFO: insertion order
//! - LIFO: most recent first
//! - lowest cost: ascending `g`, then ascending path label (`S-A-B`)
//! - lowest estimate: ascending `f = g + h`, then ascending path label

use std::cmp::Ordering;
use std::collections::VecDeque;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::algorithm::traits::NodeId;

/// Frontier entry: a partial path with its cost bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchNode {
    /// Full path from the start, ending at this entry's node. Never
    /// empty, also when read back from JSON.
    #[serde(deserialize_with = "non_empty_path")]
    pub path: Vec<NodeId>,
    pub g: f64,
    pub h: f64,
    pub f: f64,
}

impl SearchNode {
    pub fn root(start: NodeId, h: f64) -> Self {
        Self {
            path: vec![start],
            g: 0.0,
            h,
            f: h,
        }
    }

    /// New entry one hop further; the receiver is left untouched
    pub fn extend(&self, next: NodeId, g: f64, h: f64) -> Self {
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.extend(self.path.iter().cloned());
        path.push(next);
        Self { path, g, h, f: g + h }
    }

    /// Node this entry ends at
    #[inline]
    pub fn node(&self) -> &NodeId {
        &self.path[self.path.len() - 1]
    }

    #[inline]
    pub fn on_path(&self, id: &NodeId) -> bool {
        self.path.contains(id)
    }

    pub fn path_label(&self) -> String {
        self.path
            .iter()
            .map(NodeId::as_str)
            .collect::<Vec<_>>()
            .join("-")
    }
}

fn non_empty_path<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<NodeId>, D::Error> {
    let path = Vec::<NodeId>::deserialize(deserializer)?;
    if path.is_empty() {
        return Err(de::Error::invalid_length(0, &"a path of at least one node"));
    }
    Ok(path)
}

/// Queueing discipline of a frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Discipline {
    Fifo,
    Lifo,
    LowestCost,
    LowestEstimate,
}

impl Discipline {
    fn compare(self, a: &SearchNode, b: &SearchNode) -> Ordering {
        match self {
            Self::Fifo | Self::Lifo => Ordering::Equal,
            Self::LowestCost => a.g.total_cmp(&b.g).then_with(|| a.path_label().cmp(&b.path_label())),
            Self::LowestEstimate => a.f.total_cmp(&b.f).then_with(|| a.path_label().cmp(&b.path_label())),
        }
    }
}

/// Ordered frontier; index 0 is popped next
#[derive(Debug, Clone)]
pub struct Frontier {
    discipline: Discipline,
    entries: VecDeque<SearchNode>,
}

impl Frontier {
    pub fn new(discipline: Discipline) -> Self {
        Self {
            discipline,
            entries: VecDeque::new(),
        }
    }

    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, node: SearchNode) {
        match self.discipline {
            Discipline::Fifo => self.entries.push_back(node),
            Discipline::Lifo => self.entries.push_front(node),
            discipline => {
                let at = self
                    .entries
                    .iter()
                    .position(|e| discipline.compare(&node, e) == Ordering::Less)
                    .unwrap_or(self.entries.len());
                self.entries.insert(at, node);
            }
        }
    }

    /// Adds the children of one expansion, given in ascending identifier
    /// order. A stack receives them in descending order so the smallest
    /// identifier ends up on top.
    pub fn push_children(&mut self, children: Vec<SearchNode>) {
        if self.discipline == Discipline::Lifo {
            for child in children.into_iter().rev() {
                self.push(child);
            }
        } else {
            for child in children {
                self.push(child);
            }
        }
    }

    pub fn pop(&mut self) -> Option<SearchNode> {
        self.entries.pop_front()
    }

    /// Position of the first entry ending at `id`
    pub fn position_of(&self, id: &NodeId) -> Option<usize> {
        self.entries.iter().position(|e| e.node() == id)
    }

    pub fn get(&self, index: usize) -> Option<&SearchNode> {
        self.entries.get(index)
    }

    /// Replaces the entry at `index` and restores the ordering
    pub fn replace(&mut self, index: usize, node: SearchNode) -> Option<SearchNode> {
        let old = self.entries.remove(index)?;
        self.push(node);
        Some(old)
    }

    /// Deep copy in pop order
    pub fn snapshot(&self) -> Vec<SearchNode> {
        self.entries.iter().cloned().collect()
    }
}
