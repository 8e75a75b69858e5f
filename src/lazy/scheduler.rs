//! Schedulers turn a built [`LazyGraph`] plus a set of target keys into
//! materialized values. The crate does not hard-code execution — a
//! `Scheduler` implementation decides when and where each node runs — but it
//! ships [`RayonScheduler`] as the reference implementation (§5.1), grounded
//! directly in the reference site generator's parallel topological runner.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::channel;

use indicatif::ProgressStyle;
use petgraph::graph::NodeIndex;
use tracing::Level;
use tracing_indicatif::span_ext::IndicatifSpanExt;

use super::{LazyGraph, LazyNode, TaskKey};
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::LazyError;
use crate::registry::Registry;
use crate::types::Dynamic;

/// Materializes a [`LazyGraph`]: given a set of target keys, runs every node
/// they transitively depend on and returns the resulting values keyed by
/// [`TaskKey`].
pub trait Scheduler {
    fn run(
        &self,
        graph: &LazyGraph,
        registry: &Registry,
        config: &Config,
        targets: &[TaskKey],
    ) -> Result<HashMap<TaskKey, Dynamic>, LazyError>;
}

/// Runs the reachable subgraph with a rayon thread pool, dispatching a node
/// as soon as every upstream node it depends on has finished — the same
/// dependency-count/channel pattern the reference build graph uses to turn a
/// DAG into a wavefront of parallel work.
#[derive(Default)]
pub struct RayonScheduler;

impl RayonScheduler {
    pub fn new() -> Self {
        Self
    }

    fn reachable(graph: &LazyGraph, targets: &[TaskKey]) -> Result<HashSet<NodeIndex>, LazyError> {
        let mut needed = HashSet::new();
        let mut stack: Vec<NodeIndex> = Vec::new();
        for &key in targets {
            let idx = graph.node_index(key).ok_or(LazyError::MissingNode(key))?;
            stack.push(idx);
        }
        while let Some(idx) = stack.pop() {
            if needed.insert(idx) {
                stack.extend(graph.dependencies(idx));
            }
        }
        Ok(needed)
    }
}

impl Scheduler for RayonScheduler {
    fn run(
        &self,
        graph: &LazyGraph,
        registry: &Registry,
        config: &Config,
        targets: &[TaskKey],
    ) -> Result<HashMap<TaskKey, Dynamic>, LazyError> {
        let needed = Self::reachable(graph, targets)?;
        let dispatcher = Dispatcher::new(registry, config);

        let dependency_counts: HashMap<NodeIndex, usize> = needed
            .iter()
            .map(|&idx| (idx, graph.dependencies(idx).filter(|dep| needed.contains(dep)).count()))
            .collect();

        let total_tasks = needed.len() as u64;
        let results: HashMap<NodeIndex, Dynamic> = HashMap::new();

        if total_tasks == 0 {
            return Ok(HashMap::new());
        }

        let span = tracing::span!(Level::INFO, "executing_task_graph");
        span.pb_set_length(total_tasks);
        span.pb_set_style(
            &ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        span.pb_set_message("Executing task graph...");
        let _enter = span.enter();

        let results = std::sync::Mutex::new(results);
        let error = std::sync::Mutex::new(None::<LazyError>);
        let dependency_counts = std::sync::Mutex::new(dependency_counts);

        rayon::scope(|scope| {
            let (sender, receiver) = channel::<(NodeIndex, Result<Dynamic, LazyError>)>();

            let ready: Vec<NodeIndex> = needed
                .iter()
                .copied()
                .filter(|idx| dependency_counts.lock().unwrap().get(idx).copied() == Some(0))
                .collect();

            let spawn = |idx: NodeIndex, sender: std::sync::mpsc::Sender<(NodeIndex, Result<Dynamic, LazyError>)>| {
                let results = &results;
                let dispatcher = &dispatcher;
                scope.spawn(move |_| {
                    let outcome = execute_node(graph, idx, results, dispatcher);
                    let _ = sender.send((idx, outcome));
                });
            };

            for idx in ready {
                spawn(idx, sender.clone());
            }
            drop(sender);

            let mut completed = 0u64;
            while completed < total_tasks {
                match receiver.recv() {
                    Ok((idx, Ok(value))) => {
                        results.lock().unwrap().insert(idx, value);
                        completed += 1;
                        span.pb_inc(1);

                        for dependent in graph.dependents(idx) {
                            if !needed.contains(&dependent) {
                                continue;
                            }
                            let mut counts = dependency_counts.lock().unwrap();
                            if let Some(count) = counts.get_mut(&dependent) {
                                *count -= 1;
                                if *count == 0 {
                                    drop(counts);
                                    spawn(dependent, sender.clone());
                                }
                            }
                        }
                    }
                    Ok((_, Err(e))) => {
                        *error.lock().unwrap() = Some(e);
                        break;
                    }
                    Err(_) => break,
                }
            }
        });

        if let Some(e) = error.into_inner().unwrap() {
            return Err(e);
        }

        let results = results.into_inner().unwrap();
        Ok(targets
            .iter()
            .filter_map(|&key| {
                graph
                    .node_index(key)
                    .and_then(|idx| results.get(&idx))
                    .map(|value| (key, value.clone()))
            })
            .collect())
    }
}

fn execute_node(
    graph: &LazyGraph,
    idx: NodeIndex,
    results: &std::sync::Mutex<HashMap<NodeIndex, Dynamic>>,
    dispatcher: &Dispatcher<'_>,
) -> Result<Dynamic, LazyError> {
    match graph.node(idx) {
        LazyNode::Constant { value, .. } => Ok(value.clone()),
        LazyNode::Call { plan, arg_keys } => {
            let results = results.lock().unwrap();
            let args: Vec<Dynamic> = arg_keys
                .iter()
                .map(|key| {
                    let dep_idx = graph.node_index(*key).expect("dependency key must exist in the graph");
                    results
                        .get(&dep_idx)
                        .cloned()
                        .expect("dependency must have completed before its dependent runs")
                })
                .collect();
            drop(results);
            dispatcher.execute(plan, &args).map_err(LazyError::from)
        }
    }
}
