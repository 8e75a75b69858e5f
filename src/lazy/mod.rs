//! The lazy task graph (§4.6): when a resolver runs in lazy mode, every call
//! returns a [`Placeholder`] instead of a value, and the actual work is
//! recorded as a node in a deferred DAG for a [`Scheduler`] to run later.
//!
//! This is the same shape as the reference site generator's build graph
//! (`petgraph` nodes holding type-erased work, deduplicated by content key so
//! diamond dependencies run once) with the node payload swapped from "build a
//! page" to "execute a dispatch Plan".

mod scheduler;

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

pub use scheduler::{RayonScheduler, Scheduler};

use crate::hash::Hash32;
use crate::plan::Plan;
use crate::types::{ConcreteTypeId, Dynamic};

/// The stable content key identifying a node in the lazy task graph. Two
/// calls that would perform the same work (same plan, same argument keys)
/// hash to the same `TaskKey` and share a single node (§8 invariant 6).
pub type TaskKey = Hash32;

/// An opaque, type-safe token standing in for a value that hasn't been
/// computed yet. Carries enough to inspect what it names — its key and
/// expected concrete type — without revealing how it will be produced.
#[derive(Debug)]
pub struct Placeholder<T> {
    pub key: TaskKey,
    pub concrete_type: ConcreteTypeId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Placeholder<T> {
    fn new(key: TaskKey, concrete_type: ConcreteTypeId) -> Self {
        Self {
            key,
            concrete_type,
            _marker: PhantomData,
        }
    }

    /// Forgets the phantom output type, for storing heterogeneous
    /// placeholders in one collection (e.g. as an upstream argument list).
    pub fn erase(&self) -> TaskKey {
        self.key
    }
}

impl<T> Clone for Placeholder<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            concrete_type: self.concrete_type.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> PartialEq for Placeholder<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl<T> Eq for Placeholder<T> {}

/// A node in the deferred task graph: either a constant value lifted in from
/// eager code, or a recorded dispatch call whose arguments are themselves
/// task keys.
pub(crate) enum LazyNode {
    Constant {
        value: Dynamic,
        concrete_type: ConcreteTypeId,
    },
    Call {
        plan: Plan,
        arg_keys: Vec<TaskKey>,
    },
}

impl LazyNode {
    fn concrete_type(&self) -> &ConcreteTypeId {
        match self {
            LazyNode::Constant { concrete_type, .. } => concrete_type,
            LazyNode::Call { plan, .. } => &plan.return_concrete_type,
        }
    }
}

/// The deferred computation DAG built up while a resolver runs in lazy mode.
/// Content-addressed: pushing the same constant pointer or the same
/// `(plan, arg_keys)` pair twice returns the existing node instead of adding
/// a duplicate, exactly like the reference build graph's diamond-dependency
/// sharing.
#[derive(Default)]
pub struct LazyGraph {
    graph: DiGraph<LazyNode, ()>,
    index: HashMap<TaskKey, NodeIndex>,
    keys: HashMap<NodeIndex, TaskKey>,
}

impl LazyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifts an eagerly-available value into the graph as a zero-dependency
    /// task, so it can be passed as an argument alongside real Placeholders
    /// (§4.6: constants mixed into lazy calls).
    ///
    /// The key is derived from the value's `Arc` identity rather than its
    /// contents: the core has no generic way to content-hash an opaque
    /// `Dynamic`, so two structurally-equal-but-distinct `Arc`s get distinct
    /// nodes. Passing the same `Arc` (e.g. a clone) twice does dedup.
    pub fn constant<T: Send + Sync + 'static>(&mut self, value: Dynamic, concrete_type: ConcreteTypeId) -> Placeholder<T> {
        let key = constant_key(&value, &concrete_type);
        if !self.index.contains_key(&key) {
            let idx = self.graph.add_node(LazyNode::Constant {
                value,
                concrete_type: concrete_type.clone(),
            });
            self.index.insert(key, idx);
            self.keys.insert(idx, key);
        }
        Placeholder::new(key, concrete_type)
    }

    /// Records a dispatch call as a node whose dependencies are the argument
    /// placeholders' keys.
    pub fn call<T: Send + Sync + 'static>(&mut self, plan: Plan, arg_keys: Vec<TaskKey>) -> Placeholder<T> {
        let key = Hash32::for_plan_call(&plan, &arg_keys);
        let concrete_type = plan.return_concrete_type.clone();

        if !self.index.contains_key(&key) {
            let idx = self.graph.add_node(LazyNode::Call {
                plan,
                arg_keys: arg_keys.clone(),
            });
            self.index.insert(key, idx);
            self.keys.insert(idx, key);
            for arg_key in &arg_keys {
                if let Some(&dep_idx) = self.index.get(arg_key) {
                    self.graph.add_edge(dep_idx, idx, ());
                }
            }
        }

        Placeholder::new(key, concrete_type)
    }

    pub(crate) fn node_index(&self, key: TaskKey) -> Option<NodeIndex> {
        self.index.get(&key).copied()
    }

    pub(crate) fn node(&self, idx: NodeIndex) -> &LazyNode {
        &self.graph[idx]
    }

    pub(crate) fn dependencies(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(idx, Direction::Incoming)
    }

    pub(crate) fn dependents(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors_directed(idx, Direction::Outgoing)
    }

    pub(crate) fn concrete_type_of(&self, idx: NodeIndex) -> &ConcreteTypeId {
        self.graph[idx].concrete_type()
    }

    pub(crate) fn key_of(&self, idx: NodeIndex) -> TaskKey {
        *self.keys.get(&idx).expect("every graph node has an index entry")
    }
}

fn constant_key(value: &Dynamic, concrete_type: &ConcreteTypeId) -> TaskKey {
    let ptr = Arc::as_ptr(value) as *const () as usize;
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"constant");
    hasher.update(&ptr.to_le_bytes());
    hasher.update(concrete_type.0.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dynamic(v: i64) -> Dynamic {
        Arc::new(v)
    }

    #[test]
    fn same_arc_dedups_to_one_constant_node() {
        let mut graph = LazyGraph::new();
        let value = dynamic(1);
        let a: Placeholder<i64> = graph.constant(value.clone(), ConcreteTypeId("Int".into()));
        let b: Placeholder<i64> = graph.constant(value, ConcreteTypeId("Int".into()));
        assert_eq!(a.key, b.key);
        assert_eq!(graph.graph.node_count(), 1);
    }

    #[test]
    fn distinct_arcs_get_distinct_nodes() {
        let mut graph = LazyGraph::new();
        let a: Placeholder<i64> = graph.constant(dynamic(1), ConcreteTypeId("Int".into()));
        let b: Placeholder<i64> = graph.constant(dynamic(1), ConcreteTypeId("Int".into()));
        assert_ne!(a.key, b.key);
    }

    #[test]
    fn identical_plan_and_args_dedup_to_one_call_node() {
        let mut graph = LazyGraph::new();
        let plan = Plan {
            algorithm_name: "bfs".into(),
            chosen_concrete_algorithm: "bfs_nx".into(),
            args: vec![],
            total_cost: crate::cost::Cost::ZERO,
            return_concrete_type: ConcreteTypeId("NumpyVector".into()),
        };
        let a: Placeholder<()> = graph.call(plan.clone(), vec![]);
        let b: Placeholder<()> = graph.call(plan, vec![]);
        assert_eq!(a.key, b.key);
        assert_eq!(graph.graph.node_count(), 1);
    }
}
