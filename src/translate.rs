//! Translators: pure, plugin-declared conversions between two [`ConcreteType`]s
//! of the same [`AbstractType`] (§3).

use std::fmt;
use std::sync::Arc;

use crate::cost::Cost;
use crate::property::PropertyMap;
use crate::types::{AbstractTypeId, ConcreteTypeId, Dynamic};

/// The name of a [`Translator`], used in diagnostics and as the tie-break key
/// in §4.3 ("lexicographic order of the chain's Translator identifiers").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct TranslatorId(pub String);

impl fmt::Display for TranslatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for TranslatorId {
    fn from(value: S) -> Self {
        TranslatorId(value.into())
    }
}

type TranslateFn = Arc<dyn Fn(&Dynamic) -> anyhow::Result<Dynamic> + Send + Sync>;

/// Declares how a translator reshapes the property vector across the hop it
/// performs. Absent means pass-through (§4.3: "if absent, default =
/// pass-through"), which is what [`Translator::propagate`] falls back to.
type PropertyTransform = Arc<dyn Fn(&PropertyMap, &PropertyMap) -> (PropertyMap, PropertyMap) + Send + Sync>;

/// A pure function `(source_value) → target_value`, plus the metadata the
/// planner needs to route through it: which concrete types it connects, what
/// it costs, and how it reshapes properties.
#[derive(Clone)]
pub struct Translator {
    pub id: TranslatorId,
    pub src: ConcreteTypeId,
    pub dst: ConcreteTypeId,
    pub abstract_type: AbstractTypeId,
    pub cost: Cost,
    translate: TranslateFn,
    transform: Option<PropertyTransform>,
}

impl Translator {
    pub fn new(
        id: impl Into<TranslatorId>,
        abstract_type: impl Into<AbstractTypeId>,
        src: impl Into<ConcreteTypeId>,
        dst: impl Into<ConcreteTypeId>,
        cost: f64,
        translate: impl Fn(&Dynamic) -> anyhow::Result<Dynamic> + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            src: src.into(),
            dst: dst.into(),
            abstract_type: abstract_type.into(),
            cost: Cost::new(cost),
            translate: Arc::new(translate),
            transform: None,
        }
    }

    /// Attaches an explicit property-propagation rule. Without one, the
    /// abstract/concrete property vectors pass through unchanged across this
    /// hop (§9 open question: "the spec requires each translator to declare a
    /// property-transform function; where the source leaves this implicit,
    /// test against observed translator behavior rather than guess").
    pub fn with_property_transform(
        mut self,
        transform: impl Fn(&PropertyMap, &PropertyMap) -> (PropertyMap, PropertyMap) + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn apply(&self, value: &Dynamic) -> anyhow::Result<Dynamic> {
        (self.translate)(value)
    }

    /// Propagates a property vector across this hop, defaulting to pass-through.
    pub fn propagate(&self, abstract_props: &PropertyMap, concrete_props: &PropertyMap) -> (PropertyMap, PropertyMap) {
        match &self.transform {
            Some(f) => f(abstract_props, concrete_props),
            None => (abstract_props.clone(), concrete_props.clone()),
        }
    }
}

impl fmt::Debug for Translator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Translator")
            .field("id", &self.id)
            .field("src", &self.src)
            .field("dst", &self.dst)
            .field("cost", &self.cost)
            .finish_non_exhaustive()
    }
}

/// An ordered sequence of [`TranslatorId`]s describing a path from one
/// concrete type to another, plus its accumulated cost. Chains store stable
/// identifiers rather than `Translator` references, matching the "Plans hold
/// non-owning references (stable keys)" ownership rule in §3.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct TranslationChain {
    pub hops: Vec<TranslatorId>,
}

impl TranslationChain {
    pub fn empty() -> Self {
        Self { hops: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }
}

impl fmt::Display for TranslationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hops.is_empty() {
            return write!(f, "(identity)");
        }
        for (i, hop) in self.hops.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{hop}")?;
        }
        Ok(())
    }
}
