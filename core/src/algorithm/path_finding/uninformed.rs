//! Child disposition for breadth-first and depth-first search
//!
//! Uninformed entries carry `g = 0`; only the path matters. Tree search
//! rejects children already on the current path, graph search rejects
//! children already in the extended list. Neither deduplicates against
//! the frontier: stale entries are filtered when popped.

use crate::algorithm::path_finding::search::{Expansion, SearchEvent};
use crate::data_structures::frontier::SearchNode;

impl Expansion<'_> {
    pub(super) fn expand_uninformed(&mut self, current: &SearchNode, events: &mut Vec<SearchEvent>) {
        let mut children = Vec::new();
        for (neighbor, _) in self.problem.graph.neighbors(current.node()) {
            if self.tree_search {
                if current.on_path(&neighbor) {
                    events.push(SearchEvent::SkippedOnPath { node: neighbor });
                    continue;
                }
            } else if let Some(recorded) = self.extended.cost_of(&neighbor) {
                events.push(SearchEvent::SkippedExtended {
                    node: neighbor,
                    recorded,
                    candidate: 0.0,
                });
                continue;
            }

            events.push(SearchEvent::Enqueued {
                node: neighbor.clone(),
                g: 0.0,
                h: 0.0,
                f: 0.0,
            });
            children.push(current.extend(neighbor, 0.0, 0.0));
        }
        self.enqueued_count += children.len();
        self.frontier.push_children(children);
    }
}
