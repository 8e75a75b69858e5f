//! S6 — Lazy composition: calls in lazy mode return Placeholders that share
//! upstream dependencies and materialize independently; repeating an
//! identical call dedups to the same underlying task instead of re-running
//! the algorithm.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::fixtures::{abstract_algorithm, concrete_type, graph_type, node_map_type, payload_of, value, vector_type};
use metagraph::algorithm::ConcreteAlgorithm;
use metagraph::registry::Registry;
use metagraph::resolver::{CallArg, Resolver};
use metagraph::types::ConcreteTypeId;
use metagraph::Config;

fn counting_algorithm(
    name: &'static str,
    abstract_name: &'static str,
    returns: &'static str,
    counter: Arc<AtomicUsize>,
) -> ConcreteAlgorithm {
    ConcreteAlgorithm::new(
        name,
        abstract_name,
        vec![ConcreteTypeId::from("NX")],
        returns,
        move |args: &[metagraph::types::Dynamic]| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(value(returns, payload_of(&args[0]) + 1))
        },
    )
}

fn sharing_registry(bfs_calls: Arc<AtomicUsize>, pagerank_calls: Arc<AtomicUsize>) -> Registry {
    Registry::builder()
        .abstract_type(graph_type())
        .abstract_type(vector_type())
        .abstract_type(node_map_type())
        .concrete_type(concrete_type("NX", "Graph"))
        .concrete_type(concrete_type("NumpyVector", "Vector"))
        .concrete_type(concrete_type("PythonNodeMap", "NodeMap"))
        .abstract_algorithm(abstract_algorithm("traversal.bfs_iter", &["Graph"], "Vector"))
        .abstract_algorithm(abstract_algorithm("centrality.pagerank", &["Graph"], "NodeMap"))
        .concrete_algorithm(counting_algorithm(
            "bfs_iter_nx",
            "traversal.bfs_iter",
            "NumpyVector",
            bfs_calls,
        ))
        .concrete_algorithm(counting_algorithm(
            "pagerank_nx",
            "centrality.pagerank",
            "PythonNodeMap",
            pagerank_calls,
        ))
        .finalize()
        .unwrap()
}

#[test]
fn two_lazy_calls_on_one_value_compute_independently() {
    let bfs_calls = Arc::new(AtomicUsize::new(0));
    let pagerank_calls = Arc::new(AtomicUsize::new(0));
    let registry = sharing_registry(bfs_calls.clone(), pagerank_calls.clone());

    let resolver = Resolver::new(&registry, Config::default().with_lazy(true));
    let g = value("NX", 7);

    // a = bfs_iter(g); b = pagerank(g) — both Placeholders share the same
    // upstream constant `g`, built once by the resolver's lazy graph.
    let a = resolver
        .algos()
        .call("traversal.bfs_iter", &[CallArg::from(g.clone())])
        .unwrap()
        .into_placeholder();
    let b = resolver
        .algos()
        .call("centrality.pagerank", &[CallArg::from(g)])
        .unwrap()
        .into_placeholder();

    assert_ne!(a.key, b.key);

    let a_result = resolver.compute(a).unwrap();
    assert_eq!(payload_of(&a_result), 8);
    assert_eq!(bfs_calls.load(Ordering::SeqCst), 1);

    let b_result = resolver.compute(b).unwrap();
    assert_eq!(payload_of(&b_result), 8);
    assert_eq!(pagerank_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn identical_lazy_calls_dedup_to_one_task_and_run_once() {
    let bfs_calls = Arc::new(AtomicUsize::new(0));
    let pagerank_calls = Arc::new(AtomicUsize::new(0));
    let registry = sharing_registry(bfs_calls.clone(), pagerank_calls.clone());

    let resolver = Resolver::new(&registry, Config::default().with_lazy(true));
    let g = value("NX", 7);

    let first = resolver
        .algos()
        .call("traversal.bfs_iter", &[CallArg::from(g.clone())])
        .unwrap()
        .into_placeholder();
    let second = resolver
        .algos()
        .call("traversal.bfs_iter", &[CallArg::from(g.clone())])
        .unwrap()
        .into_placeholder();

    // `g.clone()` bumps the Arc's refcount without changing its identity, so
    // both calls resolve to the same (plan, arg_keys) pair and dedup to one
    // task node (§8 invariant 6) — computing either one only runs the
    // algorithm once.
    assert_eq!(first.key, second.key);
    resolver.compute(first).unwrap();
    resolver.compute(second).unwrap();
    assert_eq!(bfs_calls.load(Ordering::SeqCst), 1);
    assert_eq!(pagerank_calls.load(Ordering::SeqCst), 0);
}
