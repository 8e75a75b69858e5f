//! The error taxonomy of the resolver (§7 of the design).
//!
//! Each failing component gets its own `thiserror` enum, and all of them are
//! aggregated behind [`MetagraphError`] so callers can match narrowly or widely
//! as they please. This mirrors the reference site generator's layered
//! `CleanError` / `SitemapError` / `StylesheetError` / … under one `HauchiwaError`.

use std::fmt;

use thiserror::Error;

use crate::types::{AbstractTypeId, ConcreteTypeId};

/// Errors raised while registering or finalizing a [`Registry`](crate::registry::Registry).
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("concrete type `{concrete}` references unknown abstract type `{abstract_type}`")]
    UnknownAbstractType {
        concrete: ConcreteTypeId,
        abstract_type: AbstractTypeId,
    },

    #[error(
        "translator `{translator}` connects `{src}` and `{dst}`, which belong to different abstract types (`{src_abstract}` vs `{dst_abstract}`)"
    )]
    TranslatorAbstractMismatch {
        translator: String,
        src: ConcreteTypeId,
        dst: ConcreteTypeId,
        src_abstract: AbstractTypeId,
        dst_abstract: AbstractTypeId,
    },

    #[error(
        "concrete algorithm `{concrete_algorithm}` implements unknown abstract algorithm `{abstract_algorithm}`"
    )]
    UnknownAbstractAlgorithm {
        concrete_algorithm: String,
        abstract_algorithm: String,
    },

    #[error(
        "concrete algorithm `{concrete_algorithm}` has {found} parameter(s), but abstract algorithm `{abstract_algorithm}` declares {expected}"
    )]
    ParameterShapeMismatch {
        concrete_algorithm: String,
        abstract_algorithm: String,
        expected: usize,
        found: usize,
    },

    #[error("duplicate registration of `{kind}` named `{name}`")]
    DuplicateEntry { kind: &'static str, name: String },

    #[error(
        "wrapper `{wrapper}` claims abstract type `{claimed}`, but its concrete type `{concrete}` belongs to `{actual}`"
    )]
    WrapperTypeMismatch {
        wrapper: String,
        concrete: ConcreteTypeId,
        claimed: AbstractTypeId,
        actual: AbstractTypeId,
    },
}

/// Errors raised while inferring or matching types against values (§4.1).
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("no registered concrete type claims this value (abstract type: {abstract_type:?})")]
    NoMatchingType { abstract_type: Option<AbstractTypeId> },

    #[error("concrete types `{first}` and `{second}` both claim this value")]
    AmbiguousType {
        first: ConcreteTypeId,
        second: ConcreteTypeId,
    },

    #[error(
        "value of type `{actual}` does not satisfy required property `{property}={required}` (got `{found}`)"
    )]
    PropertyMismatch {
        actual: ConcreteTypeId,
        property: String,
        required: String,
        found: String,
    },
}

/// Errors raised while planning a translation chain (§4.3).
#[derive(Debug, Error)]
pub enum PlanningError {
    #[error("no translation path from `{source}` to a type satisfying `{target}`")]
    NoTranslationPath {
        source: ConcreteTypeId,
        target: String,
    },

    #[error(transparent)]
    Property(#[from] TypeError),
}

/// Errors raised while binding, dispatching or executing an algorithm call (§4.4).
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("algorithm `{algorithm}` expects {expected} argument(s), got {found}")]
    Arity {
        algorithm: String,
        expected: usize,
        found: usize,
    },

    #[error("missing required argument `{parameter}` for algorithm `{algorithm}`")]
    MissingArgument { algorithm: String, parameter: String },

    #[error("unknown abstract algorithm `{0}`")]
    UnknownAlgorithm(String),

    #[error(
        "no concrete implementation of `{algorithm}` is reachable from the supplied arguments:\n{diagnostic}"
    )]
    NoConcreteAlgorithm { algorithm: String, diagnostic: String },

    #[error("plugin code for `{algorithm}` failed: {source}")]
    Plugin {
        algorithm: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("return value of `{algorithm}` has concrete type `{actual}`, expected `{expected}`")]
    ReturnTypeMismatch {
        algorithm: String,
        expected: ConcreteTypeId,
        actual: ConcreteTypeId,
    },

    #[error("no registered wrapper named `{0}`")]
    UnknownWrapper(String),

    #[error("wrapper `{wrapper}` builds abstract type `{actual}`, not `{requested}`")]
    WrapperAbstractMismatch {
        wrapper: String,
        requested: AbstractTypeId,
        actual: AbstractTypeId,
    },

    #[error("cannot pass an unresolved Placeholder as an argument in eager mode")]
    PlaceholderInEagerMode,
}

/// Errors raised while materializing the lazy task DAG (§4.6).
#[derive(Debug, Error)]
pub enum LazyError {
    #[error("task graph has no node for key {0:?}")]
    MissingNode(crate::lazy::TaskKey),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// The aggregate error type returned from the public API.
#[derive(Debug, Error)]
pub enum MetagraphError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Planning(#[from] PlanningError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Lazy(#[from] LazyError),
}

/// Accumulates plugin-author-facing rejection reasons while dispatch enumerates
/// candidates, so a total failure can explain itself (§7: "surfaced to caller
/// with a diagnostic listing why each candidate was rejected").
pub(crate) struct RejectionLog {
    lines: Vec<String>,
}

impl RejectionLog {
    pub(crate) fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub(crate) fn reject(&mut self, candidate: &str, reason: impl fmt::Display) {
        self.lines.push(format!("  - {candidate}: {reason}"));
    }

    pub(crate) fn render(&self) -> String {
        if self.lines.is_empty() {
            "  (no concrete algorithms are registered for this name)".to_string()
        } else {
            self.lines.join("\n")
        }
    }
}
