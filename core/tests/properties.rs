//! Optimality and completeness properties of the search engines on
//! random undirected graphs.

use approx::assert_relative_eq;
use proptest::prelude::{any, Just, Strategy};
use proptest::{prop_assert, prop_assert_eq, proptest};

use tracelab_core::algorithm::{
    Algorithm, GraphSearch, SearchOutcome, SearchProblem, SearchStep, SearchStrategy, Termination,
};
use tracelab_core::data_structures::{Position, SearchGraph};
use tracelab_core::execution::ExecutionTrace;
use tracelab_core::{ExecutionResult, NodeId};

const MAX_NODES: usize = 7;

/// Graph on `n` nodes `N0..N{n-1}`: one flag per unordered pair. The
/// k-th present edge weighs `2^k`, so distinct simple paths never tie.
#[derive(Debug, Clone)]
struct RandomGraph {
    nodes: usize,
    edges: Vec<(usize, usize, f64)>,
}

fn random_graph() -> impl Strategy<Value = RandomGraph> {
    (2..=MAX_NODES)
        .prop_flat_map(|n| (Just(n), proptest::collection::vec(any::<bool>(), n * (n - 1) / 2)))
        .prop_map(|(nodes, flags)| {
            let pairs = (0..nodes).flat_map(|a| (a + 1..nodes).map(move |b| (a, b)));
            let mut edges = Vec::new();
            for ((a, b), present) in pairs.zip(flags) {
                if present {
                    edges.push((a, b, f64::from(1u32 << edges.len())));
                }
            }
            RandomGraph { nodes, edges }
        })
}

fn name(index: usize) -> String {
    format!("N{index}")
}

impl RandomGraph {
    fn problem(&self) -> SearchProblem {
        let mut graph = SearchGraph::new(false);
        for i in 0..self.nodes {
            graph.add_node(name(i), Position::default()).unwrap();
        }
        for &(a, b, weight) in &self.edges {
            graph.add_edge(name(a), name(b), weight).unwrap();
        }
        SearchProblem::new(graph, name(0), name(self.nodes - 1))
    }

    /// Bellman-Ford distances to every node from `source`
    fn distances(&self, source: usize) -> Vec<Option<f64>> {
        let mut dist = vec![None; self.nodes];
        dist[source] = Some(0.0);
        for _ in 0..self.nodes {
            for &(a, b, w) in &self.edges {
                for (from, to) in [(a, b), (b, a)] {
                    if let Some(d) = dist[from] {
                        if dist[to].map_or(true, |current: f64| d + w < current) {
                            dist[to] = Some(d + w);
                        }
                    }
                }
            }
        }
        dist
    }

    /// Fewest edges from node 0 to every node
    fn hops(&self) -> Vec<Option<usize>> {
        let mut hops = vec![None; self.nodes];
        hops[0] = Some(0);
        let mut frontier = vec![0];
        let mut depth = 0;
        while !frontier.is_empty() {
            depth += 1;
            let mut next = Vec::new();
            for &node in &frontier {
                for &(a, b, _) in &self.edges {
                    let other = if a == node {
                        b
                    } else if b == node {
                        a
                    } else {
                        continue;
                    };
                    if hops[other].is_none() {
                        hops[other] = Some(depth);
                        next.push(other);
                    }
                }
            }
            frontier = next;
        }
        hops
    }
}

fn extended_order(trace: &ExecutionTrace<SearchStep>) -> Vec<NodeId> {
    trace.iter().filter_map(|s| s.extended_node.clone()).collect()
}

fn run(strategy: SearchStrategy, problem: &SearchProblem) -> ExecutionResult<SearchStep, SearchOutcome> {
    GraphSearch::new(strategy).execute(problem).unwrap()
}

proptest! {
    #[test]
    fn ucs_cost_is_optimal(graph in random_graph()) {
        let _ = env_logger::builder().is_test(true).try_init();
        let problem = graph.problem();
        let expected = graph.distances(0)[graph.nodes - 1];
        let result = run(SearchStrategy::UniformCost, &problem);

        prop_assert_eq!(result.outcome.found, expected.is_some());
        if let Some(distance) = expected {
            assert_relative_eq!(result.outcome.cost, distance);
            assert_relative_eq!(problem.graph.path_cost(&result.outcome.path).unwrap(), distance);
        } else {
            prop_assert_eq!(result.outcome.termination, Termination::FrontierExhausted);
        }
    }

    #[test]
    fn astar_with_exact_heuristic_is_optimal(graph in random_graph()) {
        let to_goal = graph.distances(graph.nodes - 1);
        let heuristics: Vec<(String, f64)> = (0..graph.nodes)
            .map(|i| (name(i), to_goal[i].unwrap_or(0.0)))
            .collect();
        let problem = graph.problem().with_heuristics(heuristics);
        let result = run(SearchStrategy::AStar, &problem);

        prop_assert_eq!(result.outcome.found, to_goal[0].is_some());
        if let Some(distance) = to_goal[0] {
            assert_relative_eq!(result.outcome.cost, distance);
        }
    }

    #[test]
    fn astar_without_heuristic_matches_ucs(graph in random_graph()) {
        let problem = graph.problem().with_heuristics(Vec::<(String, f64)>::new());
        let ucs = run(SearchStrategy::UniformCost, &problem);
        let astar = run(SearchStrategy::AStar, &problem);

        prop_assert_eq!(&astar.outcome.path, &ucs.outcome.path);
        assert_relative_eq!(astar.outcome.cost, ucs.outcome.cost);
        prop_assert_eq!(extended_order(&astar.trace), extended_order(&ucs.trace));
    }

    #[test]
    fn bfs_uses_fewest_edges(graph in random_graph()) {
        let hops = graph.hops()[graph.nodes - 1];
        let result = run(SearchStrategy::BreadthFirst, &graph.problem());

        prop_assert_eq!(result.outcome.found, hops.is_some());
        if let Some(hops) = hops {
            prop_assert_eq!(result.outcome.path.len(), hops + 1);
        }
    }

    #[test]
    fn dfs_reaches_every_reachable_goal(graph in random_graph()) {
        let reachable = graph.hops()[graph.nodes - 1].is_some();
        let problem = graph.problem();
        for tree_search in [false, true] {
            let result = GraphSearch::new(SearchStrategy::DepthFirst)
                .tree_search(tree_search)
                .execute(&problem)
                .unwrap();
            prop_assert_eq!(result.outcome.found, reachable);
            if reachable {
                prop_assert!(problem.graph.path_cost(&result.outcome.path).is_some());
            }
        }
    }

    #[test]
    fn graph_search_extends_each_node_once(graph in random_graph()) {
        let problem = graph.problem();
        for strategy in [SearchStrategy::BreadthFirst, SearchStrategy::DepthFirst, SearchStrategy::UniformCost] {
            let order = extended_order(&run(strategy, &problem).trace);
            let mut unique = order.clone();
            unique.sort();
            unique.dedup();
            prop_assert_eq!(unique.len(), order.len());
        }
    }
}
