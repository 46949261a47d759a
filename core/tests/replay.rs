//! Replay idempotence and trace round trips across every engine.

use proptest::prelude::{any, Strategy};
use proptest::{prop_assert, prop_assert_eq, proptest};

use tracelab_core::algorithm::presets;
use tracelab_core::algorithm::{
    Ac3, Ac3Replay, Algorithm, Backtracking, BacktrackReplay, GraphSearch, Minimax, MinimaxReplay,
    SearchConfig, SearchReplay, SearchStrategy,
};
use tracelab_core::data_structures::{Constraint, ConstraintNetwork, Relation};
use tracelab_core::execution::{ExecutionHistory, ExecutionTrace, Replay};

/// Every prefix must rebuild the same state through a checkpointed
/// history, a fresh fold and a JSON round trip of the trace.
fn assert_replay_stable<R>(replay: R, trace: ExecutionTrace<R::Step>)
where
    R: Replay + Clone,
    R::Step: serde::Serialize + serde::de::DeserializeOwned,
{
    let restored: ExecutionTrace<R::Step> = ExecutionTrace::from_json(&trace.to_json().unwrap()).unwrap();
    assert_eq!(restored.len(), trace.len());

    let mut history = ExecutionHistory::with_checkpoint_interval(replay.clone(), trace.clone(), 3).unwrap();
    for k in 0..trace.len() {
        let folded = replay.replay(trace.prefix(k));
        assert_eq!(replay.replay(trace.prefix(k)), folded);
        assert_eq!(replay.replay(restored.prefix(k)), folded);
        assert_eq!(history.state_at(k).unwrap(), folded);
        assert_eq!(history.current_state(), folded);
        history.step_forward();
    }
    assert!(history.is_at_end());

    // Walking back lands on the same states.
    while history.step_back().is_some() {
        let k = history.position();
        assert_eq!(history.current_state(), replay.replay(trace.prefix(k)));
    }
}

#[test]
fn search_traces_replay() {
    let _ = env_logger::builder().is_test(true).try_init();
    let problem = presets::weighted_search_problem();
    for strategy in SearchStrategy::ALL {
        for tree_search in [false, true] {
            let engine = GraphSearch::with_config(SearchConfig {
                strategy,
                tree_search,
                ..SearchConfig::default()
            });
            let result = engine.execute(&problem).unwrap();
            assert!(result.outcome.found, "{strategy} tree={tree_search}");
            assert_replay_stable(SearchReplay, result.trace);
        }
    }
}

#[test]
fn minimax_traces_replay() {
    let problem = presets::minimax_tree();
    for alpha_beta in [false, true] {
        let result = Minimax::new(true).alpha_beta(alpha_beta).execute(&problem).unwrap();
        assert_eq!(result.outcome.value, 3.0);
        assert_replay_stable(MinimaxReplay, result.trace);
    }
}

#[test]
fn csp_traces_replay() {
    let classic = presets::arc_consistency_network();
    assert_replay_stable(Ac3Replay, Ac3::new().execute(&classic).unwrap().trace);

    let map = presets::saudi_provinces_network();
    for (fc, mrv) in [(false, false), (true, false), (false, true), (true, true)] {
        let result = Backtracking::new()
            .forward_checking(fc)
            .mrv(mrv)
            .execute(&map)
            .unwrap();
        assert!(result.outcome.solved);
        for (a, b) in map.constraints().iter().map(|c| (&c.source, &c.target)) {
            assert_ne!(result.outcome.assignment[a], result.outcome.assignment[b]);
        }
        assert_replay_stable(BacktrackReplay, result.trace);
    }
}

#[test]
fn engines_never_mutate_their_input() {
    let problem = presets::weighted_search_problem();
    let before = problem.clone();
    for strategy in SearchStrategy::ALL {
        GraphSearch::new(strategy).execute(&problem).unwrap();
    }
    assert_eq!(problem, before);

    let map = presets::saudi_provinces_network();
    let before = map.clone();
    Backtracking::new().forward_checking(true).execute(&map).unwrap();
    Ac3::new().execute(&map).unwrap();
    assert_eq!(map, before);
}

fn random_network() -> impl Strategy<Value = ConstraintNetwork> {
    let relations = [Relation::Lt, Relation::Gt, Relation::Le, Relation::Ge, Relation::Eq, Relation::Ne];
    proptest::collection::vec((0..4usize, 0..4usize, 0..6usize, -2..=2i64), 0..6).prop_map(
        move |raw| {
            let mut network = ConstraintNetwork::new();
            for id in ["A", "B", "C", "D"] {
                network.add_variable(id, 1..=4).unwrap();
            }
            let ids = ["A", "B", "C", "D"];
            for (source, target, relation, offset) in raw {
                if source != target {
                    network
                        .add_constraint(Constraint::new(ids[source], ids[target], relations[relation], offset))
                        .unwrap();
                }
            }
            network
        },
    )
}

proptest! {
    #[test]
    fn backtracking_replay_matches_snapshots(network in random_network(), fc in any::<bool>(), mrv in any::<bool>()) {
        let result = Backtracking::new().forward_checking(fc).mrv(mrv).execute(&network).unwrap();
        let mut state = BacktrackReplay.initial_state();
        for step in result.trace.iter() {
            BacktrackReplay.apply(&mut state, step);
            prop_assert_eq!(&state.assignment, &step.assignment);
            prop_assert_eq!(&state.domains, &step.domains);
        }
    }

    #[test]
    fn forward_checking_agrees_with_plain_backtracking(network in random_network()) {
        let plain = Backtracking::new().execute(&network).unwrap();
        let checked = Backtracking::new().forward_checking(true).mrv(true).execute(&network).unwrap();
        prop_assert_eq!(plain.outcome.solved, checked.outcome.solved);
        if checked.outcome.solved {
            for c in network.constraints() {
                let (x, y) = (checked.outcome.assignment[&c.source], checked.outcome.assignment[&c.target]);
                prop_assert!(c.relation.holds(x, y + c.offset));
            }
        }
    }

    #[test]
    fn ac3_never_removes_solution_values(network in random_network()) {
        let solution = Backtracking::new().execute(&network).unwrap().outcome;
        let reduced = Ac3::new().execute(&network).unwrap().outcome;
        if solution.solved {
            prop_assert!(reduced.consistent);
            for variable in &reduced.domains {
                prop_assert!(variable.domain.contains(&solution.assignment[&variable.id]));
            }
        }
    }
}
