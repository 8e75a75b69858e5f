//! The translation planner (§4.3): least-cost pathfinding over the per-abstract-type
//! translator multigraph, with property propagation tracked alongside cost.
//!
//! This is Dijkstra, but the thing being relaxed along each edge is not just a
//! scalar distance — it's `(cost, hop count, translator-id chain, property
//! vector)`. Termination happens at the first-popped node whose *propagated*
//! properties satisfy the caller's target spec, not merely the first-popped
//! node with the right concrete type.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::cost::Cost;
use crate::error::{PlanningError, TypeError};
use crate::property::PropertyMap;
use crate::translate::{Translator, TranslatorId, TranslationChain};
use crate::types::{AbstractTypeId, Classification, ConcreteTypeId, TypeSpec};

/// The translation multigraph for a single [`AbstractType`](crate::types::AbstractType):
/// nodes are its [`ConcreteType`](crate::types::ConcreteType)s, edges are
/// [`Translator`]s labeled by their id.
#[derive(Default)]
pub struct TranslationGraph {
    graph: DiGraph<ConcreteTypeId, TranslatorId>,
    index: HashMap<ConcreteTypeId, NodeIndex>,
}

impl TranslationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&mut self, concrete_type: &ConcreteTypeId) -> NodeIndex {
        if let Some(&idx) = self.index.get(concrete_type) {
            return idx;
        }
        let idx = self.graph.add_node(concrete_type.clone());
        self.index.insert(concrete_type.clone(), idx);
        idx
    }

    pub fn add_edge(&mut self, src: &ConcreteTypeId, dst: &ConcreteTypeId, translator: TranslatorId) {
        let a = self.node(src);
        let b = self.node(dst);
        self.graph.add_edge(a, b, translator);
    }

    fn node_index(&self, concrete_type: &ConcreteTypeId) -> Option<NodeIndex> {
        self.index.get(concrete_type).copied()
    }
}

/// A best-known path to a node during the search: its accumulated cost, hop
/// count, translator chain, and the property vector after applying that chain.
#[derive(Clone)]
struct PathState {
    key: PathKey,
    abstract_props: PropertyMap,
    concrete_props: PropertyMap,
}

/// The ordering key used both for the priority queue and for deciding whether
/// a newly-found path to a node beats the previously best one. Order is
/// `(cost, hop count, translator-id chain)` ascending, which is exactly the
/// tie-break rule in §4.3.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct PathKey {
    cost: Cost,
    hops: usize,
    chain: Vec<String>,
}

struct HeapEntry {
    key: PathKey,
    node: NodeIndex,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

/// Computes least-cost translation chains over a registry's translation
/// multigraphs (§4.3).
pub struct Planner<'r> {
    pub(crate) graphs: &'r HashMap<AbstractTypeId, TranslationGraph>,
    pub(crate) translators: &'r BTreeMap<TranslatorId, Translator>,
}

impl<'r> Planner<'r> {
    pub fn new(
        graphs: &'r HashMap<AbstractTypeId, TranslationGraph>,
        translators: &'r BTreeMap<TranslatorId, Translator>,
    ) -> Self {
        Self { graphs, translators }
    }

    /// Returns the least-cost [`TranslationChain`] from `source` (with the
    /// given starting property vector) to a concrete type satisfying `target`.
    ///
    /// A length-0 chain is returned when `source` already satisfies `target`
    /// (§4.3, and invariant 4 in §8: `plan_translation(C, C) = empty chain, cost 0`).
    pub fn plan_translation(
        &self,
        abstract_type: &AbstractTypeId,
        source: &ConcreteTypeId,
        source_abstract_props: &PropertyMap,
        source_concrete_props: &PropertyMap,
        target: &TypeSpec,
    ) -> Result<TranslationChain, PlanningError> {
        let no_path = || PlanningError::NoTranslationPath {
            source: source.clone(),
            target: target.to_string(),
        };

        let graph = self.graphs.get(abstract_type).ok_or_else(no_path)?;
        let start = graph.node_index(source).ok_or_else(no_path)?;

        let start_classification = Classification {
            concrete_type: source.clone(),
            abstract_props: source_abstract_props.clone(),
            concrete_props: source_concrete_props.clone(),
        };
        if target.is_satisfied_by(&start_classification) {
            return Ok(TranslationChain::empty());
        }

        // Tracks the cheapest arrival at a node whose concrete type matches
        // `target` but whose properties don't, so a total search failure can
        // be reported as a `PropertyMismatch` (§4.1, §7) rather than a bare
        // `NoTranslationPath` when the type itself was in fact reachable.
        let mut property_conflict: Option<TypeError> = None;
        let mut record_property_conflict = |classification: &Classification| {
            if property_conflict.is_none() && classification.concrete_type == target.concrete_type {
                if let Some((property, required, found)) = target.first_unmet_property(classification) {
                    property_conflict = Some(TypeError::PropertyMismatch {
                        actual: classification.concrete_type.clone(),
                        property,
                        required,
                        found,
                    });
                }
            }
        };
        record_property_conflict(&start_classification);

        let mut best: HashMap<NodeIndex, PathState> = HashMap::new();
        let mut heap: BinaryHeap<Reverse<HeapEntry>> = BinaryHeap::new();
        let mut settled: HashSet<NodeIndex> = HashSet::new();

        let start_key = PathKey {
            cost: Cost::ZERO,
            hops: 0,
            chain: Vec::new(),
        };
        best.insert(
            start,
            PathState {
                key: start_key.clone(),
                abstract_props: source_abstract_props.clone(),
                concrete_props: source_concrete_props.clone(),
            },
        );
        heap.push(Reverse(HeapEntry { key: start_key, node: start }));

        while let Some(Reverse(entry)) = heap.pop() {
            if !settled.insert(entry.node) {
                continue;
            }

            let state = best.get(&entry.node).expect("popped node must have a recorded state").clone();

            if entry.node != start {
                let concrete_type = graph
                    .graph
                    .node_weight(entry.node)
                    .expect("node index came from this graph");
                let classification = Classification {
                    concrete_type: concrete_type.clone(),
                    abstract_props: state.abstract_props.clone(),
                    concrete_props: state.concrete_props.clone(),
                };
                if target.is_satisfied_by(&classification) {
                    return Ok(TranslationChain {
                        hops: state.key.chain.iter().map(|id| TranslatorId(id.clone())).collect(),
                    });
                }
                record_property_conflict(&classification);
            }

            for edge in graph.graph.edges_directed(entry.node, Direction::Outgoing) {
                let translator_id = edge.weight();
                let translator = self
                    .translators
                    .get(translator_id)
                    .expect("translation graph references an unregistered translator");
                let next_node = edge.target();

                let next_cost = state.key.cost + translator.cost;
                let next_hops = state.key.hops + 1;
                let mut next_chain = state.key.chain.clone();
                next_chain.push(translator_id.0.clone());
                let next_key = PathKey {
                    cost: next_cost,
                    hops: next_hops,
                    chain: next_chain,
                };

                let is_better = match best.get(&next_node) {
                    Some(existing) => next_key < existing.key,
                    None => true,
                };

                if is_better {
                    let (next_abstract, next_concrete) =
                        translator.propagate(&state.abstract_props, &state.concrete_props);
                    best.insert(
                        next_node,
                        PathState {
                            key: next_key.clone(),
                            abstract_props: next_abstract,
                            concrete_props: next_concrete,
                        },
                    );
                    heap.push(Reverse(HeapEntry { key: next_key, node: next_node }));
                }
            }
        }

        match property_conflict {
            Some(reason) => Err(PlanningError::Property(reason)),
            None => Err(no_path()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyValue;

    fn translator(id: &str, abstract_type: &str, src: &str, dst: &str, cost: f64) -> Translator {
        Translator::new(id.to_string(), abstract_type.to_string(), src.to_string(), dst.to_string(), cost, |v| {
            Ok(v.clone())
        })
    }

    fn build(
        abstract_type: &str,
        translators: Vec<Translator>,
    ) -> (HashMap<AbstractTypeId, TranslationGraph>, BTreeMap<TranslatorId, Translator>) {
        let mut graph = TranslationGraph::new();
        let mut registry = BTreeMap::new();
        for t in translators {
            graph.add_edge(&t.src, &t.dst, t.id.clone());
            registry.insert(t.id.clone(), t);
        }
        let mut graphs = HashMap::new();
        graphs.insert(AbstractTypeId(abstract_type.to_string()), graph);
        (graphs, registry)
    }

    #[test]
    fn direct_translation_one_hop() {
        let (graphs, translators) = build("Graph", vec![translator("nx_to_scipy", "Graph", "NX", "Scipy", 1.0)]);
        let planner = Planner::new(&graphs, &translators);
        let chain = planner
            .plan_translation(
                &AbstractTypeId("Graph".into()),
                &ConcreteTypeId("NX".into()),
                &PropertyMap::new(),
                &PropertyMap::new(),
                &TypeSpec::new("Scipy"),
            )
            .unwrap();
        assert_eq!(chain.hops, vec![TranslatorId("nx_to_scipy".into())]);
    }

    #[test]
    fn multi_hop_accumulates_cost() {
        let (graphs, translators) = build(
            "Graph",
            vec![
                translator("nx_to_scipy", "Graph", "NX", "Scipy", 1.0),
                translator("scipy_to_grblas", "Graph", "Scipy", "Grblas", 1.0),
            ],
        );
        let planner = Planner::new(&graphs, &translators);
        let chain = planner
            .plan_translation(
                &AbstractTypeId("Graph".into()),
                &ConcreteTypeId("NX".into()),
                &PropertyMap::new(),
                &PropertyMap::new(),
                &TypeSpec::new("Grblas"),
            )
            .unwrap();
        assert_eq!(
            chain.hops,
            vec![
                TranslatorId("nx_to_scipy".into()),
                TranslatorId("scipy_to_grblas".into())
            ]
        );
    }

    #[test]
    fn identity_translation_is_free() {
        let (graphs, translators) = build("Graph", vec![translator("nx_to_scipy", "Graph", "NX", "Scipy", 1.0)]);
        let planner = Planner::new(&graphs, &translators);
        let chain = planner
            .plan_translation(
                &AbstractTypeId("Graph".into()),
                &ConcreteTypeId("NX".into()),
                &PropertyMap::new(),
                &PropertyMap::new(),
                &TypeSpec::new("NX"),
            )
            .unwrap();
        assert!(chain.is_empty());
    }

    #[test]
    fn disconnected_graph_has_no_path() {
        let (graphs, translators) = build("Graph", vec![translator("nx_to_scipy", "Graph", "NX", "Scipy", 1.0)]);
        let planner = Planner::new(&graphs, &translators);
        let result = planner.plan_translation(
            &AbstractTypeId("Graph".into()),
            &ConcreteTypeId("Grblas".into()),
            &PropertyMap::new(),
            &PropertyMap::new(),
            &TypeSpec::new("NX"),
        );
        assert!(matches!(result, Err(PlanningError::NoTranslationPath { .. })));
    }

    #[test]
    fn property_constrained_target_requires_matching_hop() {
        let mut to_directed = translator("scipy_to_nx_directed", "Graph", "Scipy", "NX", 1.0);
        to_directed = to_directed.with_property_transform(|_, concrete| {
            let mut concrete = concrete.clone();
            concrete.insert("is_directed".into(), PropertyValue::Bool(true));
            (PropertyMap::new(), concrete)
        });
        let (graphs, translators) = build("Graph", vec![to_directed]);
        let planner = Planner::new(&graphs, &translators);

        let target = TypeSpec::new("NX").with_property("is_directed", PropertyValue::Bool(true));
        let chain = planner
            .plan_translation(
                &AbstractTypeId("Graph".into()),
                &ConcreteTypeId("Scipy".into()),
                &PropertyMap::new(),
                &PropertyMap::new(),
                &target,
            )
            .unwrap();
        assert_eq!(chain.len(), 1);
    }
}
