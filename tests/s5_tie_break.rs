//! S5 — Dispatch that must force a translation, with a deterministic
//! tie-break when two translation routes cost the same.

mod common;

use common::fixtures::{abstract_algorithm, concrete_algorithm, concrete_type, graph_type, node_map_type, translator, value};
use metagraph::dispatch::Dispatcher;
use metagraph::registry::Registry;
use metagraph::Config;

fn registry_with_costs(scipy_to_nx: f64, scipy_to_grblas: f64) -> Registry {
    Registry::builder()
        .abstract_type(graph_type())
        .abstract_type(node_map_type())
        .concrete_type(concrete_type("NX", "Graph"))
        .concrete_type(concrete_type("Scipy", "Graph"))
        .concrete_type(concrete_type("Grblas", "Graph"))
        .concrete_type(concrete_type("NodeMapC", "NodeMap"))
        .translator(translator("scipy_to_nx", "Graph", "Scipy", "NX", scipy_to_nx))
        .translator(translator("scipy_to_grblas", "Graph", "Scipy", "Grblas", scipy_to_grblas))
        .abstract_algorithm(abstract_algorithm("pagerank", &["Graph"], "NodeMap"))
        .concrete_algorithm(concrete_algorithm("pagerank_nx", "pagerank", &["NX"], "NodeMapC", 0.0))
        .concrete_algorithm(concrete_algorithm("pagerank_grblas", "pagerank", &["Grblas"], "NodeMapC", 0.0))
        .finalize()
        .unwrap()
}

#[test]
fn cheaper_translation_route_wins() {
    let registry = registry_with_costs(2.0, 1.0);
    let config = Config::default();
    let dispatcher = Dispatcher::new(&registry, &config);

    let plan = dispatcher.dispatch("pagerank", &[value("Scipy", 1)]).unwrap();

    assert_eq!(plan.chosen_concrete_algorithm, "pagerank_grblas");
}

#[test]
fn equal_cost_routes_tie_break_lexicographically_by_candidate_name() {
    let registry = registry_with_costs(1.0, 1.0);
    let config = Config::default();
    let dispatcher = Dispatcher::new(&registry, &config);

    let plan = dispatcher.dispatch("pagerank", &[value("Scipy", 1)]).unwrap();

    // "pagerank_grblas" < "pagerank_nx" lexicographically.
    assert_eq!(plan.chosen_concrete_algorithm, "pagerank_grblas");
}
