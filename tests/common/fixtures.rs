//! A minimal in-memory plugin used across the end-to-end scenarios: one value
//! type tagged by concrete-type name, translators that just relabel the tag,
//! and algorithms whose "computation" is an integer combinator cheap enough to
//! assert on directly.

use std::sync::Arc;

use metagraph::algorithm::{AbstractAlgorithm, ConcreteAlgorithm, ParamSpec};
use metagraph::property::PropertyMap;
use metagraph::translate::Translator;
use metagraph::types::{AbstractType, ConcreteType, ConcreteTypeId, Dynamic, TypeSpec};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureValue {
    pub kind: &'static str,
    pub payload: i64,
}

pub fn value(kind: &'static str, payload: i64) -> Dynamic {
    Arc::new(FixtureValue { kind, payload })
}

fn downcast(v: &Dynamic) -> Option<&FixtureValue> {
    v.downcast_ref::<FixtureValue>()
}

pub fn payload_of(v: &Dynamic) -> i64 {
    downcast(v).expect("fixture value").payload
}

/// A `ConcreteType` that claims any `FixtureValue` tagged `id`.
pub fn concrete_type(id: &'static str, abstract_type: &'static str) -> ConcreteType {
    ConcreteType::new(
        id,
        abstract_type,
        move |v: &Dynamic| downcast(v).is_some_and(|f| f.kind == id),
        |_| (PropertyMap::new(), PropertyMap::new()),
        |a, b| downcast(a) == downcast(b),
    )
}

/// A translator that relabels a `FixtureValue`'s tag, leaving its payload untouched.
pub fn translator(
    id: &'static str,
    abstract_type: &'static str,
    src: &'static str,
    dst: &'static str,
    cost: f64,
) -> Translator {
    Translator::new(id, abstract_type, src, dst, cost, move |v: &Dynamic| {
        Ok(value(dst, downcast(v).expect("fixture value").payload))
    })
}

pub fn abstract_algorithm(name: &'static str, params: &[&'static str], returns: &'static str) -> AbstractAlgorithm {
    AbstractAlgorithm::new(
        name,
        params
            .iter()
            .enumerate()
            .map(|(i, type_name)| ParamSpec::new(format!("arg{i}"), TypeSpec::new(*type_name)))
            .collect(),
        TypeSpec::new(returns),
    )
}

/// A concrete algorithm whose "computation" sums its arguments' payloads and
/// adds one, tagging the result with `returns`. Cheap and deterministic, so
/// assertions can check the return value without caring about semantics.
pub fn concrete_algorithm(
    name: &'static str,
    abstract_name: &'static str,
    params: &[&'static str],
    returns: &'static str,
    cost: f64,
) -> ConcreteAlgorithm {
    ConcreteAlgorithm::with_fixed_cost(
        name,
        abstract_name,
        params.iter().map(|p| ConcreteTypeId::from(*p)).collect(),
        returns,
        cost,
        move |args: &[Dynamic]| {
            let total: i64 = args.iter().map(payload_of).sum();
            Ok(value(returns, total + 1))
        },
    )
}

pub fn graph_type() -> AbstractType {
    AbstractType::new("Graph", [])
}

pub fn vector_type() -> AbstractType {
    AbstractType::new("Vector", [])
}

pub fn scalar_type() -> AbstractType {
    AbstractType::new("Scalar", [])
}

pub fn node_map_type() -> AbstractType {
    AbstractType::new("NodeMap", [])
}
