//! Child disposition for uniform-cost and A* search
//!
//! Tree search only performs the path cycle check. Graph search consults
//! the extended list first: a child whose node was extended at a cost no
//! worse than the new one is dropped, a strictly better one reopens it.
//!
//! The two strategies then treat the open set differently:
//! - UCS keeps one entry per node, improving it in place.
//! - A* always pushes a new entry, even when the node is already queued,
//!   and relies on the pop-time extended check to discard stale ones.

use crate::algorithm::path_finding::search::{Expansion, SearchEvent, SearchStrategy};
use crate::data_structures::frontier::SearchNode;

impl Expansion<'_> {
    pub(super) fn expand_informed(&mut self, current: &SearchNode, events: &mut Vec<SearchEvent>) {
        for (neighbor, weight) in self.problem.graph.neighbors(current.node()) {
            let g = current.g + weight;
            let h = if self.strategy.uses_heuristic() {
                self.problem.heuristic(&neighbor)
            } else {
                0.0
            };

            if self.tree_search {
                if current.on_path(&neighbor) {
                    events.push(SearchEvent::SkippedOnPath { node: neighbor });
                } else {
                    self.enqueue(current.extend(neighbor, g, h), events);
                }
                continue;
            }

            let child = current.extend(neighbor, g, h);
            let candidate = self.closed_cost(&child);
            if let Some(recorded) = self.extended.cost_of(child.node()) {
                if recorded <= candidate {
                    events.push(SearchEvent::SkippedExtended {
                        node: child.node().clone(),
                        recorded,
                        candidate,
                    });
                } else {
                    events.push(SearchEvent::Reopened {
                        node: child.node().clone(),
                        recorded,
                        candidate,
                    });
                    self.enqueued_count += 1;
                    self.frontier.push(child);
                }
                continue;
            }

            match self.strategy {
                SearchStrategy::AStar => self.push_duplicate(child, events),
                _ => self.merge_in_place(child, events),
            }
        }
    }

    /// UCS: at most one queued entry per node
    fn merge_in_place(&mut self, child: SearchNode, events: &mut Vec<SearchEvent>) {
        let Some(at) = self.frontier.position_of(child.node()) else {
            self.enqueue(child, events);
            return;
        };
        let existing = self.frontier.get(at).map_or(f64::INFINITY, |e| e.g);
        if existing > child.g {
            events.push(SearchEvent::ReplacedInQueue {
                node: child.node().clone(),
                old_cost: existing,
                new_cost: child.g,
            });
            self.enqueued_count += 1;
            self.frontier.replace(at, child);
        } else {
            events.push(SearchEvent::SkippedWorse {
                node: child.node().clone(),
                existing,
                candidate: child.g,
            });
        }
    }

    /// A*: queued entries are never rewritten
    fn push_duplicate(&mut self, child: SearchNode, events: &mut Vec<SearchEvent>) {
        match self.frontier.position_of(child.node()).and_then(|at| self.frontier.get(at)) {
            Some(existing) => {
                events.push(SearchEvent::DuplicateEnqueued {
                    node: child.node().clone(),
                    existing: existing.g,
                    candidate: child.g,
                });
                self.enqueued_count += 1;
                self.frontier.push(child);
            }
            None => self.enqueue(child, events),
        }
    }
}
