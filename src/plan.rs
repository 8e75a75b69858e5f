//! The Plan object (§4.5): an immutable, inspectable record of one dispatch
//! decision, separate from actually running anything.

use std::fmt;

use crate::cost::Cost;
use crate::translate::TranslatorId;
use crate::types::ConcreteTypeId;

/// One hop of a per-argument translation chain, with the concrete type it
/// lands on cached alongside the translator id so [`Plan::describe`] can
/// render a full type path without consulting the registry again.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TranslationStep {
    pub translator: TranslatorId,
    pub resulting_type: ConcreteTypeId,
}

/// The translation chain applied to one positional argument, from its
/// inferred concrete type to the parameter type the chosen algorithm expects.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ArgPlan {
    pub source_type: ConcreteTypeId,
    pub steps: Vec<TranslationStep>,
}

impl ArgPlan {
    pub fn identity(source_type: ConcreteTypeId) -> Self {
        Self {
            source_type,
            steps: Vec::new(),
        }
    }

    /// The concrete type this argument has after all of its steps are applied.
    pub fn target_type(&self) -> &ConcreteTypeId {
        self.steps.last().map(|s| &s.resulting_type).unwrap_or(&self.source_type)
    }
}

impl fmt::Display for ArgPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source_type)?;
        for step in &self.steps {
            write!(f, " -> (via {}) -> {}", step.translator, step.resulting_type)?;
        }
        Ok(())
    }
}

/// An immutable record of a dispatch decision (§4.5): which concrete
/// algorithm was chosen, how each argument gets there, and what the call is
/// expected to return. Plans are cheap to build and discard per call, or held
/// by a lazy task alongside its upstream keys (§4.6).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Plan {
    pub algorithm_name: String,
    pub chosen_concrete_algorithm: String,
    pub args: Vec<ArgPlan>,
    pub total_cost: Cost,
    pub return_concrete_type: ConcreteTypeId,
}

impl Plan {
    /// A human-readable tree: algorithm name, chosen implementation, each
    /// argument's translation path, total cost, and the expected return type.
    pub fn describe(&self) -> String {
        let mut out = format!(
            "{} -> {} (cost {})\n",
            self.algorithm_name, self.chosen_concrete_algorithm, self.total_cost
        );
        for (i, arg) in self.args.iter().enumerate() {
            out.push_str(&format!("  arg{i}: {arg}\n"));
        }
        out.push_str(&format!("  returns: {}", self.return_concrete_type));
        out
    }

    /// Renders the plan as JSON, for structured logging and diagnostics
    /// surfaces that want a machine-readable shape rather than `describe`'s
    /// tree. Plans are never persisted from this; only rendered or logged.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_renders_chains_and_cost() {
        let plan = Plan {
            algorithm_name: "bfs".into(),
            chosen_concrete_algorithm: "bfs_grblas".into(),
            args: vec![ArgPlan {
                source_type: ConcreteTypeId("NX".into()),
                steps: vec![
                    TranslationStep {
                        translator: TranslatorId("nx_to_scipy".into()),
                        resulting_type: ConcreteTypeId("Scipy".into()),
                    },
                    TranslationStep {
                        translator: TranslatorId("scipy_to_grblas".into()),
                        resulting_type: ConcreteTypeId("Grblas".into()),
                    },
                ],
            }],
            total_cost: Cost::new(2.0),
            return_concrete_type: ConcreteTypeId("NumpyVector".into()),
        };

        let rendered = plan.describe();
        assert!(rendered.contains("bfs_grblas"));
        assert!(rendered.contains("NX -> (via nx_to_scipy) -> Scipy -> (via scipy_to_grblas) -> Grblas"));
        assert!(rendered.contains("returns: NumpyVector"));
    }

    #[test]
    fn structural_equality_ignores_nothing() {
        let a = Plan {
            algorithm_name: "bfs".into(),
            chosen_concrete_algorithm: "bfs_nx".into(),
            args: vec![ArgPlan::identity(ConcreteTypeId("NX".into()))],
            total_cost: Cost::ZERO,
            return_concrete_type: ConcreteTypeId("NumpyVector".into()),
        };
        let b = a.clone();
        assert_eq!(a, b);
    }
}
