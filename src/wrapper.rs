//! Wrapper entries (§6, §9's `EntryProvider` Entry kinds): plugin-declared
//! constructors that build a concrete value straight from raw library data,
//! e.g. a `PandasEdgeMap` wrapper built from a table plus column names,
//! without going through an existing runtime value first.

use std::fmt;
use std::sync::Arc;

use crate::types::{AbstractTypeId, ConcreteTypeId, Dynamic};

type ConstructFn = Arc<dyn Fn(&[Dynamic]) -> anyhow::Result<Dynamic> + Send + Sync>;

/// Builds a value of `concrete_type` from raw, not-yet-classified arguments.
#[derive(Clone)]
pub struct Wrapper {
    pub name: String,
    pub abstract_type: AbstractTypeId,
    pub concrete_type: ConcreteTypeId,
    construct: ConstructFn,
}

impl Wrapper {
    pub fn new(
        name: impl Into<String>,
        abstract_type: impl Into<AbstractTypeId>,
        concrete_type: impl Into<ConcreteTypeId>,
        construct: impl Fn(&[Dynamic]) -> anyhow::Result<Dynamic> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            abstract_type: abstract_type.into(),
            concrete_type: concrete_type.into(),
            construct: Arc::new(construct),
        }
    }

    pub fn construct(&self, args: &[Dynamic]) -> anyhow::Result<Dynamic> {
        (self.construct)(args)
    }
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("name", &self.name)
            .field("abstract_type", &self.abstract_type)
            .field("concrete_type", &self.concrete_type)
            .finish_non_exhaustive()
    }
}
