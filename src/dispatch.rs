//! The Algorithm Dispatcher (§4.4): turns `(abstract_algorithm_name, args)`
//! into a [`Plan`] by binding arguments, classifying them, enumerating
//! candidate concrete algorithms, and choosing the cheapest reachable one.
//!
//! `dispatch` never runs plugin code — it only asks the Planner for chain
//! costs. `execute` is the separate step that actually walks the chains and
//! calls into the chosen algorithm, matching the "planning is pure, execution
//! is not" split the spec draws in §4.4.

use tracing::{debug, warn};

use crate::config::Config;
use crate::cost::Cost;
use crate::error::{DispatchError, MetagraphError, RejectionLog};
use crate::plan::{ArgPlan, Plan, TranslationStep};
use crate::registry::Registry;
use crate::translate::TranslationChain;
use crate::types::{Dynamic, TypeSpec};

/// Binds and dispatches calls to abstract algorithms against a [`Registry`].
pub struct Dispatcher<'r> {
    registry: &'r Registry,
    config: &'r Config,
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r Registry, config: &'r Config) -> Self {
        Self { registry, config }
    }

    /// Plans a call without running anything (§4.4 steps 1-5): infers each
    /// argument's concrete type from its actual value, then dispatches
    /// against those classifications.
    pub fn dispatch(&self, algorithm_name: &str, args: &[Dynamic]) -> Result<Plan, DispatchError> {
        let type_system = self.registry.type_system();
        let mut classifications = Vec::with_capacity(args.len());
        for arg in args {
            let classification = type_system
                .infer_concrete_type(arg)
                .map_err(|source| DispatchError::Plugin {
                    algorithm: algorithm_name.to_string(),
                    source: anyhow::Error::new(source),
                })?;
            classifications.push(classification);
        }

        self.dispatch_classified(algorithm_name, &classifications)
    }

    /// Plans a call from already-known argument classifications, without
    /// requiring the actual argument values. Used directly by eager
    /// [`Dispatcher::dispatch`] above, and by the lazy resolver (§4.6) where a
    /// `Placeholder` argument carries only its expected concrete type — its
    /// value does not exist yet, so its property vector is conservatively
    /// empty (§9 open question on property propagation).
    pub fn dispatch_classified(
        &self,
        algorithm_name: &str,
        classifications: &[crate::types::Classification],
    ) -> Result<Plan, DispatchError> {
        let abstract_algorithm = self
            .registry
            .abstract_algorithm(algorithm_name)
            .ok_or_else(|| DispatchError::UnknownAlgorithm(algorithm_name.to_string()))?;

        if classifications.len() != abstract_algorithm.params.len() {
            return Err(DispatchError::Arity {
                algorithm: algorithm_name.to_string(),
                expected: abstract_algorithm.params.len(),
                found: classifications.len(),
            });
        }

        let planner = self.registry.planner();
        let mut rejections = RejectionLog::new();
        let mut best: Option<(Plan, Cost, usize)> = None;

        for candidate in self.registry.concrete_algorithms_for(algorithm_name) {
            let mut arg_plans = Vec::with_capacity(classifications.len());
            let mut total_cost = Cost::ZERO;
            let mut total_hops = 0usize;
            let mut reachable = true;

            for ((classification, target), abstract_param) in
                classifications.iter().zip(candidate.params.iter()).zip(abstract_algorithm.params.iter())
            {
                let concrete_type = self
                    .registry
                    .concrete_type(&classification.concrete_type)
                    .expect("classified value must resolve to a registered concrete type");

                // The candidate's own parameter only names a concrete type;
                // the property constraints a caller actually asked for live on
                // the abstract algorithm's `ParamSpec` (§4.4 step 3: "respecting
                // property constraints"). Target the candidate's concrete type
                // refined by those constraints.
                let target_spec = TypeSpec {
                    concrete_type: target.clone(),
                    constraints: abstract_param.type_spec.constraints.clone(),
                };

                let chain = planner.plan_translation(
                    &concrete_type.abstract_type,
                    &classification.concrete_type,
                    &classification.abstract_props,
                    &classification.concrete_props,
                    &target_spec,
                );

                match chain {
                    Ok(chain) => {
                        total_hops += chain.len();

                        let steps: Vec<TranslationStep> = chain
                            .hops
                            .iter()
                            .map(|translator_id| {
                                let translator = self.translator(translator_id);
                                total_cost = total_cost + translator.cost;
                                TranslationStep {
                                    translator: translator_id.clone(),
                                    resulting_type: translator.dst.clone(),
                                }
                            })
                            .collect();

                        arg_plans.push(ArgPlan {
                            source_type: classification.concrete_type.clone(),
                            steps,
                        });
                    }
                    Err(reason) => {
                        rejections.reject(&candidate.name, reason);
                        reachable = false;
                        break;
                    }
                }
            }

            if !reachable {
                continue;
            }

            // §4.4 step 4: cost first, then fewest total hops, then a
            // deterministic ordering over candidate identifiers.
            let is_better = match &best {
                None => true,
                Some((best_plan, best_cost, best_hops)) => {
                    (total_cost, total_hops, candidate.name.as_str())
                        < (*best_cost, *best_hops, best_plan.chosen_concrete_algorithm.as_str())
                }
            };

            if is_better {
                let plan = Plan {
                    algorithm_name: algorithm_name.to_string(),
                    chosen_concrete_algorithm: candidate.name.clone(),
                    args: arg_plans,
                    total_cost,
                    return_concrete_type: candidate.returns.clone(),
                };
                best = Some((plan, total_cost, total_hops));
            }
        }

        let plan = best.map(|(plan, _, _)| plan).ok_or_else(|| DispatchError::NoConcreteAlgorithm {
            algorithm: algorithm_name.to_string(),
            diagnostic: rejections.render(),
        })?;

        if let Ok(json) = plan.to_json() {
            debug!(algorithm = algorithm_name, plan = json, "dispatched");
        }

        Ok(plan)
    }

    /// Plans a direct value-to-type translation (§4.3, `resolver.plan.translate`),
    /// without applying it. Classifies `value`, then asks the Planner for the
    /// cheapest chain from its inferred type to `target`.
    pub fn plan_translate(&self, value: &Dynamic, target: &TypeSpec) -> Result<TranslationChain, MetagraphError> {
        let classification = self.registry.type_system().infer_concrete_type(value)?;
        let concrete_type = self
            .registry
            .concrete_type(&classification.concrete_type)
            .expect("classified value must resolve to a registered concrete type");

        let chain = self.registry.planner().plan_translation(
            &concrete_type.abstract_type,
            &classification.concrete_type,
            &classification.abstract_props,
            &classification.concrete_props,
            target,
        )?;
        Ok(chain)
    }

    /// Plans and applies a direct value-to-type translation (§4.3,
    /// `resolver.translate`). Runs the chain eagerly; does not consult
    /// the Dispatcher's algorithm registry at all.
    pub fn translate(&self, value: &Dynamic, target: &TypeSpec) -> Result<Dynamic, MetagraphError> {
        let chain = self.plan_translate(value, target)?;
        let mut current = value.clone();
        for hop in &chain.hops {
            let translator = self.translator(hop);
            current = translator.apply(&current).map_err(|source| DispatchError::Plugin {
                algorithm: format!("translate -> {}", target.concrete_type),
                source,
            })?;
        }
        Ok(current)
    }

    fn translator(&self, id: &crate::translate::TranslatorId) -> &crate::translate::Translator {
        self.registry
            .planner()
            .translators
            .get(id)
            .expect("plan references an unregistered translator")
    }

    /// Runs a previously-computed [`Plan`] against concrete argument values
    /// (§4.4 "Execution"): applies each argument's chain, invokes the chosen
    /// algorithm, and validates the return type.
    pub fn execute(&self, plan: &Plan, args: &[Dynamic]) -> Result<Dynamic, DispatchError> {
        if args.len() != plan.args.len() {
            return Err(DispatchError::Arity {
                algorithm: plan.algorithm_name.clone(),
                expected: plan.args.len(),
                found: args.len(),
            });
        }

        let mut translated = Vec::with_capacity(args.len());
        for (arg, arg_plan) in args.iter().zip(plan.args.iter()) {
            let mut value = arg.clone();
            for step in &arg_plan.steps {
                let translator = self.translator(&step.translator);
                value = translator.apply(&value).map_err(|source| DispatchError::Plugin {
                    algorithm: plan.algorithm_name.clone(),
                    source,
                })?;
            }
            translated.push(value);
        }

        let concrete_algorithm = self.registry.concrete_algorithm(&plan.chosen_concrete_algorithm).expect(
            "plan references an unregistered concrete algorithm",
        );
        let result = concrete_algorithm
            .call(&translated)
            .map_err(|source| DispatchError::Plugin {
                algorithm: plan.algorithm_name.clone(),
                source,
            })?;

        let classification = self
            .registry
            .type_system()
            .infer_concrete_type(&result)
            .map_err(|source| DispatchError::Plugin {
                algorithm: plan.algorithm_name.clone(),
                source: anyhow::Error::new(source),
            })?;

        if classification.concrete_type != plan.return_concrete_type {
            let mismatch = DispatchError::ReturnTypeMismatch {
                algorithm: plan.algorithm_name.clone(),
                expected: plan.return_concrete_type.clone(),
                actual: classification.concrete_type,
            };
            if self.config.strict_return_type_check {
                return Err(mismatch);
            }
            warn!(error = %mismatch, "return type mismatch ignored (strict_return_type_check = false)");
        }

        Ok(result)
    }
}
