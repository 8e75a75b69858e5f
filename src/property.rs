//! The property lattice (§9: "Abstract and concrete properties form a finite
//! key→value map with a declared domain per key").
//!
//! Properties refine what a value of an [`AbstractType`](crate::types::AbstractType)
//! or [`ConcreteType`](crate::types::ConcreteType) is allowed to be used for, e.g.
//! `is_directed ∈ {true, false}` on `Graph`. They are modeled as small closed
//! enums rather than open-ended reflection, per the design notes.

use std::collections::BTreeMap;
use std::fmt;

/// A single property value. Kept deliberately small and closed: the property
/// lattice is a finite key→value map, not an open type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Int(i) => write!(f, "{i}"),
            PropertyValue::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Str(value.to_string())
    }
}

/// An ordered map from property name to value. `BTreeMap` gives deterministic
/// iteration order, which matters for the deterministic tie-breaks in §4.3/§4.4
/// and for stable hashing of [`Plan`](crate::plan::Plan)s in lazy mode.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// The declared domain of an abstract property: the allowed values and the
/// default used when a registration or call site leaves it unspecified.
#[derive(Debug, Clone)]
pub struct PropertyDomain {
    pub allowed: Vec<PropertyValue>,
    pub default: PropertyValue,
}

impl PropertyDomain {
    pub fn new(allowed: impl IntoIterator<Item = PropertyValue>, default: PropertyValue) -> Self {
        let allowed: Vec<PropertyValue> = allowed.into_iter().collect();
        debug_assert!(
            allowed.contains(&default),
            "default property value must be one of the allowed values"
        );
        Self { allowed, default }
    }

    pub fn contains(&self, value: &PropertyValue) -> bool {
        self.allowed.contains(value)
    }
}

/// A set of property constraints attached to a [`TypeSpec`](crate::types::TypeSpec).
/// Only the properties present here are checked; everything else is free
/// (§4.1: "Unspecified properties are free").
pub type PropertyConstraints = PropertyMap;

/// Returns `true` if every constrained property in `constraints` is present in
/// `actual` with an equal value. This is the property matching rule used by
/// both the planner and the dispatcher.
pub fn satisfies(actual: &PropertyMap, constraints: &PropertyConstraints) -> bool {
    constraints
        .iter()
        .all(|(key, want)| actual.get(key).is_some_and(|have| have == want))
}

/// Merges a translator's declared property transform into a running property
/// vector. Translators that do not declare one are pass-through (§4.3: "if
/// absent, default = pass-through").
pub fn merge_passthrough(base: &PropertyMap, overrides: &PropertyMap) -> PropertyMap {
    let mut merged = base.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}
