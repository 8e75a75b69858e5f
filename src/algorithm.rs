//! Algorithm descriptors (§3, §4.4): the abstract signature plugins implement
//! against, and the concrete, callable implementations that satisfy it.

use std::fmt;
use std::sync::Arc;

use crate::types::{ConcreteTypeId, Dynamic, TypeSpec};

/// One positional parameter of an [`AbstractAlgorithm`]: a name (for
/// diagnostics and keyword binding) and the [`TypeSpec`] its argument must
/// eventually satisfy.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub type_spec: TypeSpec,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, type_spec: TypeSpec) -> Self {
        Self {
            name: name.into(),
            type_spec,
        }
    }
}

/// The name-and-shape contract plugins implement against: parameter count,
/// per-parameter type constraints, and the declared return type (§3).
///
/// An `AbstractAlgorithm` never runs anything itself — it is purely a
/// signature that [`ConcreteAlgorithm`]s are checked against at registration
/// (§4.2, step 3: "parameter shape matches").
#[derive(Debug, Clone)]
pub struct AbstractAlgorithm {
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub returns: TypeSpec,
}

impl AbstractAlgorithm {
    pub fn new(name: impl Into<String>, params: Vec<ParamSpec>, returns: TypeSpec) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
        }
    }
}

type AlgorithmFn = Arc<dyn Fn(&[Dynamic]) -> anyhow::Result<Dynamic> + Send + Sync>;

/// A single backend's implementation of an [`AbstractAlgorithm`]: concrete
/// per-parameter types, a concrete return type, and the type-erased callable
/// itself. A candidate's cost in dispatch ranking comes entirely from the
/// translation chains its arguments need (§4.4, §8 invariant 3) — `declared_cost`
/// is carried for diagnostics/display only and never added into a [`Plan`](crate::plan::Plan)'s
/// `total_cost`.
#[derive(Clone)]
pub struct ConcreteAlgorithm {
    pub name: String,
    pub abstract_name: String,
    pub params: Vec<ConcreteTypeId>,
    pub returns: ConcreteTypeId,
    pub declared_cost: crate::cost::Cost,
    call: AlgorithmFn,
}

impl ConcreteAlgorithm {
    pub fn new(
        name: impl Into<String>,
        abstract_name: impl Into<String>,
        params: Vec<ConcreteTypeId>,
        returns: impl Into<ConcreteTypeId>,
        call: impl Fn(&[Dynamic]) -> anyhow::Result<Dynamic> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            abstract_name: abstract_name.into(),
            params,
            returns: returns.into(),
            declared_cost: crate::cost::Cost::ZERO,
            call: Arc::new(call),
        }
    }

    /// Same as [`ConcreteAlgorithm::new`], but records a `declared_cost` (e.g.
    /// for a plugin that wants to advertise a fixed implementation cost in
    /// diagnostics). Dispatch ranking still only sums argument translation
    /// costs (§4.4 step 4) — this is not folded into a [`Plan`]'s `total_cost`.
    pub fn with_fixed_cost(
        name: impl Into<String>,
        abstract_name: impl Into<String>,
        params: Vec<ConcreteTypeId>,
        returns: impl Into<ConcreteTypeId>,
        cost: f64,
        call: impl Fn(&[Dynamic]) -> anyhow::Result<Dynamic> + Send + Sync + 'static,
    ) -> Self {
        Self {
            declared_cost: crate::cost::Cost::new(cost),
            ..Self::new(name, abstract_name, params, returns, call)
        }
    }

    pub fn call(&self, args: &[Dynamic]) -> anyhow::Result<Dynamic> {
        (self.call)(args)
    }
}

impl fmt::Debug for ConcreteAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcreteAlgorithm")
            .field("name", &self.name)
            .field("abstract_name", &self.abstract_name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("declared_cost", &self.declared_cost)
            .finish_non_exhaustive()
    }
}
