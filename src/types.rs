//! The type system (§4.1): abstract types, concrete types, and the property
//! lattice that refines them.
//!
//! Runtime values of abstract types are never owned or defined by this crate
//! (Non-goal: "providing graph data structures of its own"). They flow through
//! as type-erased, cheaply-cloneable handles — the same `Arc<dyn Any + Send +
//! Sync>` idiom the reference site generator uses for its task outputs.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::TypeError;
use crate::property::{PropertyConstraints, PropertyDomain, PropertyMap};

/// A type-erased, thread-safe handle to a value of some concrete type.
///
/// This is the crate's only concession to the Non-goal of not providing graph
/// data structures: translators and algorithms receive and return `Dynamic`,
/// and never know each other's concrete Rust type directly.
pub type Dynamic = Arc<dyn Any + Send + Sync>;

/// The name of an [`AbstractType`]. Interned as a plain `String` so registries
/// built from dynamically-discovered plugins (the `EntryProvider` collaborator)
/// don't need `'static` data.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct AbstractTypeId(pub String);

impl fmt::Display for AbstractTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for AbstractTypeId {
    fn from(value: S) -> Self {
        AbstractTypeId(value.into())
    }
}

/// The name of a [`ConcreteType`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct ConcreteTypeId(pub String);

impl fmt::Display for ConcreteTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for ConcreteTypeId {
    fn from(value: S) -> Self {
        ConcreteTypeId(value.into())
    }
}

/// A named category of value (`Graph`, `NodeMap`, `EdgeMap`, …). Carries the
/// declared domain of its abstract properties (§3).
#[derive(Debug, Clone)]
pub struct AbstractType {
    pub id: AbstractTypeId,
    pub properties: std::collections::BTreeMap<String, PropertyDomain>,
}

impl AbstractType {
    pub fn new(
        id: impl Into<AbstractTypeId>,
        properties: impl IntoIterator<Item = (String, PropertyDomain)>,
    ) -> Self {
        Self {
            id: id.into(),
            properties: properties.into_iter().collect(),
        }
    }

    /// Fills in any property missing from `props` with its declared default.
    pub fn with_defaults(&self, props: &PropertyMap) -> PropertyMap {
        let mut filled = props.clone();
        for (name, domain) in &self.properties {
            filled
                .entry(name.clone())
                .or_insert_with(|| domain.default.clone());
        }
        filled
    }
}

type TypeclassPredicate = Arc<dyn Fn(&Dynamic) -> bool + Send + Sync>;
type TypeinfoExtractor = Arc<dyn Fn(&Dynamic) -> (PropertyMap, PropertyMap) + Send + Sync>;
type EqualityFn = Arc<dyn Fn(&Dynamic, &Dynamic) -> bool + Send + Sync>;

/// A specific in-memory representation of an [`AbstractType`], bound to one
/// backend library (`NetworkXGraphType`, `ScipyGraphType`, …).
///
/// The predicate/extractor/equality functions are supplied by the plugin at
/// registration time and are otherwise opaque to the resolver (§3.1): the core
/// never looks inside a concrete value, it only calls these callbacks.
#[derive(Clone)]
pub struct ConcreteType {
    pub id: ConcreteTypeId,
    pub abstract_type: AbstractTypeId,
    is_typeclass_of: TypeclassPredicate,
    get_typeinfo: TypeinfoExtractor,
    assert_equal: EqualityFn,
}

impl ConcreteType {
    pub fn new(
        id: impl Into<ConcreteTypeId>,
        abstract_type: impl Into<AbstractTypeId>,
        is_typeclass_of: impl Fn(&Dynamic) -> bool + Send + Sync + 'static,
        get_typeinfo: impl Fn(&Dynamic) -> (PropertyMap, PropertyMap) + Send + Sync + 'static,
        assert_equal: impl Fn(&Dynamic, &Dynamic) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            abstract_type: abstract_type.into(),
            is_typeclass_of: Arc::new(is_typeclass_of),
            get_typeinfo: Arc::new(get_typeinfo),
            assert_equal: Arc::new(assert_equal),
        }
    }

    pub fn is_typeclass_of(&self, value: &Dynamic) -> bool {
        (self.is_typeclass_of)(value)
    }

    pub fn get_typeinfo(&self, value: &Dynamic) -> (PropertyMap, PropertyMap) {
        (self.get_typeinfo)(value)
    }

    pub fn assert_equal(&self, a: &Dynamic, b: &Dynamic) -> bool {
        (self.assert_equal)(a, b)
    }
}

impl fmt::Debug for ConcreteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcreteType")
            .field("id", &self.id)
            .field("abstract_type", &self.abstract_type)
            .finish_non_exhaustive()
    }
}

/// The result of classifying a runtime value: which [`ConcreteType`] claims it,
/// and its property vector at both the abstract and concrete level.
#[derive(Debug, Clone)]
pub struct Classification {
    pub concrete_type: ConcreteTypeId,
    pub abstract_props: PropertyMap,
    pub concrete_props: PropertyMap,
}

/// A constrained type annotation used for algorithm parameters, return types,
/// and translation targets (§4.1: `typespec(ct, **properties)`).
#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub concrete_type: ConcreteTypeId,
    pub constraints: PropertyConstraints,
}

impl TypeSpec {
    pub fn new(concrete_type: impl Into<ConcreteTypeId>) -> Self {
        Self {
            concrete_type: concrete_type.into(),
            constraints: PropertyConstraints::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: crate::property::PropertyValue) -> Self {
        self.constraints.insert(name.into(), value);
        self
    }

    /// §4.1's property matching rule: every property constrained by this spec
    /// must equal the classification's value; unconstrained properties are free.
    /// Abstract and concrete properties are disjoint namespaces, so a
    /// constraint is satisfied if either one carries the matching value.
    pub fn is_satisfied_by(&self, classification: &Classification) -> bool {
        classification.concrete_type == self.concrete_type
            && self.constraints.iter().all(|(key, want)| {
                classification.abstract_props.get(key) == Some(want)
                    || classification.concrete_props.get(key) == Some(want)
            })
    }

    /// Finds the first constrained property this spec requires that
    /// `classification` does not carry, for `PropertyMismatch` diagnostics
    /// (§4.1, §4.3). Returns `None` if every constraint is met (the
    /// concrete-type mismatch, if any, is reported separately).
    pub fn first_unmet_property(&self, classification: &Classification) -> Option<(String, String, String)> {
        self.constraints.iter().find_map(|(key, want)| {
            let have = classification
                .abstract_props
                .get(key)
                .or_else(|| classification.concrete_props.get(key));
            if have == Some(want) {
                None
            } else {
                let found = have.map(|v| v.to_string()).unwrap_or_else(|| "<unset>".to_string());
                Some((key.clone(), want.to_string(), found))
            }
        })
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.concrete_type)?;
        if !self.constraints.is_empty() {
            write!(f, "[")?;
            for (i, (key, value)) in self.constraints.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{key}={value}")?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// The registry's view of all registered abstract and concrete types, and the
/// operation that classifies an arbitrary runtime value (§4.1).
#[derive(Default)]
pub struct TypeSystem {
    abstract_types: std::collections::BTreeMap<AbstractTypeId, AbstractType>,
    concrete_types: std::collections::BTreeMap<ConcreteTypeId, ConcreteType>,
}

impl TypeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_abstract_type(&mut self, abstract_type: AbstractType) {
        self.abstract_types.insert(abstract_type.id.clone(), abstract_type);
    }

    pub fn register_concrete_type(&mut self, concrete_type: ConcreteType) {
        self.concrete_types
            .insert(concrete_type.id.clone(), concrete_type);
    }

    pub fn abstract_type(&self, id: &AbstractTypeId) -> Option<&AbstractType> {
        self.abstract_types.get(id)
    }

    pub fn concrete_type(&self, id: &ConcreteTypeId) -> Option<&ConcreteType> {
        self.concrete_types.get(id)
    }

    pub fn concrete_types(&self) -> impl Iterator<Item = &ConcreteType> {
        self.concrete_types.values()
    }

    pub fn concrete_types_of(&self, abstract_type: &AbstractTypeId) -> impl Iterator<Item = &ConcreteType> {
        self.concrete_types
            .values()
            .filter(move |ct| &ct.abstract_type == abstract_type)
    }

    /// Tries each registered concrete type's typeclass predicate; the first
    /// match wins (§4.1). Ties between two *different* matching predicates are
    /// a contract violation that registration validates away, but inference
    /// re-checks defensively since a plugin's predicate can misbehave at runtime.
    pub fn infer_concrete_type(&self, value: &Dynamic) -> Result<Classification, TypeError> {
        let mut found: Option<&ConcreteType> = None;

        for candidate in self.concrete_types.values() {
            if candidate.is_typeclass_of(value) {
                if let Some(first) = found {
                    return Err(TypeError::AmbiguousType {
                        first: first.id.clone(),
                        second: candidate.id.clone(),
                    });
                }
                found = Some(candidate);
            }
        }

        let concrete_type = found.ok_or(TypeError::NoMatchingType { abstract_type: None })?;
        let (abstract_props, concrete_props) = concrete_type.get_typeinfo(value);

        Ok(Classification {
            concrete_type: concrete_type.id.clone(),
            abstract_props,
            concrete_props,
        })
    }
}
