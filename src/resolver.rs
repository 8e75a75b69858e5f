//! The Resolver façade (§6): the user-visible surface that binds a
//! [`Registry`] + [`Config`] and exposes dotted-name algorithm groups, plan
//! inspection, direct translation, and the type/wrapper navigation hierarchy.
//!
//! §9 is explicit that the source's `resolver.algos.traversal.bfs_iter`
//! reflective attribute access is "purely a naming convention" and must not be
//! reproduced literally. Here the dotted name is modeled as a small builder
//! chain (`resolver.algos().group("traversal").call("bfs_iter", args)`) over
//! a plain `lookup_algorithm("traversal.bfs_iter")`-shaped registry index —
//! no reflection, no macros synthesizing methods per plugin.

use std::sync::Mutex;

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::{DispatchError, MetagraphError};
use crate::lazy::{LazyGraph, Placeholder, RayonScheduler, Scheduler, TaskKey};
use crate::plan::Plan;
use crate::property::PropertyMap;
use crate::registry::Registry;
use crate::translate::TranslationChain;
use crate::types::{AbstractType, AbstractTypeId, Classification, ConcreteType, Dynamic, TypeSpec};
use crate::wrapper::Wrapper;

/// One argument to an `algos()` call: either a value already in hand, or a
/// [`Placeholder`] produced by an earlier lazy call (§4.6: "mixing eager
/// values and Placeholders in a call is legal").
#[derive(Clone)]
pub enum CallArg {
    Value(Dynamic),
    Placeholder(Placeholder<Dynamic>),
}

impl From<Dynamic> for CallArg {
    fn from(value: Dynamic) -> Self {
        CallArg::Value(value)
    }
}

impl From<Placeholder<Dynamic>> for CallArg {
    fn from(value: Placeholder<Dynamic>) -> Self {
        CallArg::Placeholder(value)
    }
}

/// What an `algos()` call produces: a materialized value in eager mode, or a
/// deferred [`Placeholder`] in lazy mode (§6, §4.6).
#[derive(Clone)]
pub enum Outcome {
    Value(Dynamic),
    Placeholder(Placeholder<Dynamic>),
}

impl Outcome {
    /// Unwraps an eager [`Outcome::Value`], panicking if the resolver was
    /// actually running in lazy mode. Convenience for call sites that already
    /// know their resolver's mode statically.
    pub fn into_value(self) -> Dynamic {
        match self {
            Outcome::Value(v) => v,
            Outcome::Placeholder(_) => panic!("Outcome::into_value called on a lazy Placeholder"),
        }
    }

    pub fn into_placeholder(self) -> Placeholder<Dynamic> {
        match self {
            Outcome::Placeholder(p) => p,
            Outcome::Value(_) => panic!("Outcome::into_placeholder called on an eager Value"),
        }
    }
}

/// Binds a [`Registry`] and a [`Config`] together into the user-facing
/// surface described in §6. Owns the lazy task graph accumulated by calls
/// made while `config.lazy` is set.
pub struct Resolver<'r> {
    registry: &'r Registry,
    config: Config,
    lazy_graph: Mutex<LazyGraph>,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r Registry, config: Config) -> Self {
        Self {
            registry,
            config,
            lazy_graph: Mutex::new(LazyGraph::new()),
        }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `resolver.algos.<group>.<name>(args…)` — dispatch + execute (eager) or
    /// build a Placeholder (lazy).
    pub fn algos(&self) -> Algos<'_, 'r> {
        Algos { resolver: self }
    }

    /// `resolver.plan.algos.<group>.<name>(args…)` — dispatch only.
    pub fn plan(&self) -> PlanFacade<'_, 'r> {
        PlanFacade { resolver: self }
    }

    /// `resolver.types.<AbstractTypeName>.<ConcreteTypeName>` — navigable type hierarchy.
    pub fn types(&self) -> TypesFacade<'_, 'r> {
        TypesFacade { resolver: self }
    }

    /// `resolver.wrappers.<AbstractTypeName>.<WrapperName>(…)`.
    pub fn wrappers(&self) -> WrappersFacade<'_, 'r> {
        WrappersFacade { resolver: self }
    }

    /// `resolver.translate(value, target_concrete_type)` — plan + execute a translation.
    pub fn translate(&self, value: &Dynamic, target: TypeSpec) -> Result<Dynamic, MetagraphError> {
        self.dispatcher().translate(value, &target)
    }

    /// Materializes a [`Placeholder`] by running its transitive dependency
    /// subgraph through the default [`RayonScheduler`] (§4.6: ".compute()").
    pub fn compute<T>(&self, placeholder: Placeholder<T>) -> Result<Dynamic, MetagraphError> {
        let graph = self.lazy_graph.lock().expect("lazy graph mutex poisoned");
        let scheduler = RayonScheduler::new();
        let mut results = scheduler.run(&graph, self.registry, &self.config, &[placeholder.key])?;
        Ok(results
            .remove(&placeholder.key)
            .expect("scheduler returns a result for every requested target"))
    }

    fn dispatcher(&self) -> Dispatcher<'r> {
        Dispatcher::new(self.registry, &self.config)
    }

    /// Resolves one [`CallArg`] down to a [`Classification`] the Dispatcher
    /// can plan against, and (in lazy mode) the task key to record as an
    /// upstream dependency.
    fn classify(&self, arg: &CallArg) -> Result<(Classification, Option<TaskKey>), MetagraphError> {
        match arg {
            CallArg::Value(value) => {
                let classification = self.registry.type_system().infer_concrete_type(value)?;
                Ok((classification, None))
            }
            CallArg::Placeholder(placeholder) => Ok((
                Classification {
                    concrete_type: placeholder.concrete_type.clone(),
                    abstract_props: PropertyMap::new(),
                    concrete_props: PropertyMap::new(),
                },
                Some(placeholder.key),
            )),
        }
    }

    fn call(&self, algorithm_name: &str, args: &[CallArg]) -> Result<Outcome, MetagraphError> {
        let mut classifications = Vec::with_capacity(args.len());
        let mut task_keys: Vec<Option<TaskKey>> = Vec::with_capacity(args.len());
        for arg in args {
            let (classification, key) = self.classify(arg)?;
            task_keys.push(key);
            classifications.push(classification);
        }

        let dispatcher = self.dispatcher();

        if !self.config.lazy {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                match arg {
                    CallArg::Value(v) => values.push(v.clone()),
                    CallArg::Placeholder(_) => return Err(DispatchError::PlaceholderInEagerMode.into()),
                }
            }
            let plan = dispatcher.dispatch_classified(algorithm_name, &classifications)?;
            let result = dispatcher.execute(&plan, &values)?;
            return Ok(Outcome::Value(result));
        }

        let plan = dispatcher.dispatch_classified(algorithm_name, &classifications)?;

        let mut graph = self.lazy_graph.lock().expect("lazy graph mutex poisoned");
        let arg_keys: Vec<TaskKey> = args
            .iter()
            .zip(classifications.iter())
            .zip(task_keys)
            .map(|((arg, classification), key)| match (arg, key) {
                (CallArg::Placeholder(_), Some(key)) => key,
                (CallArg::Value(value), None) => {
                    let placeholder: Placeholder<Dynamic> =
                        graph.constant(value.clone(), classification.concrete_type.clone());
                    placeholder.erase()
                }
                _ => unreachable!("classify() always pairs Value with None and Placeholder with Some"),
            })
            .collect();

        let placeholder: Placeholder<Dynamic> = graph.call(plan, arg_keys);
        Ok(Outcome::Placeholder(placeholder))
    }
}

/// `resolver.algos` — dispatch-and-run (or defer) a call by dotted name.
pub struct Algos<'a, 'r> {
    resolver: &'a Resolver<'r>,
}

impl<'a, 'r> Algos<'a, 'r> {
    /// Calls an abstract algorithm by its full dotted name (e.g. `"centrality.pagerank"`).
    pub fn call(&self, name: &str, args: &[CallArg]) -> Result<Outcome, MetagraphError> {
        self.resolver.call(name, args)
    }

    /// Scopes subsequent calls to a dotted-name group, e.g. `.group("centrality").call("pagerank", args)`
    /// is equivalent to `.call("centrality.pagerank", args)`.
    pub fn group(&self, group: &str) -> AlgoGroup<'a, 'r> {
        AlgoGroup {
            resolver: self.resolver,
            group: group.to_string(),
        }
    }
}

pub struct AlgoGroup<'a, 'r> {
    resolver: &'a Resolver<'r>,
    group: String,
}

impl<'a, 'r> AlgoGroup<'a, 'r> {
    pub fn call(&self, name: &str, args: &[CallArg]) -> Result<Outcome, MetagraphError> {
        self.resolver.call(&format!("{}.{}", self.group, name), args)
    }
}

/// `resolver.plan` — the dispatch-only mirror of [`Algos`] and direct
/// translation planning, never executing plugin code.
pub struct PlanFacade<'a, 'r> {
    resolver: &'a Resolver<'r>,
}

impl<'a, 'r> PlanFacade<'a, 'r> {
    pub fn algos(&self) -> PlanAlgos<'a, 'r> {
        PlanAlgos { resolver: self.resolver }
    }

    /// `resolver.plan.translate(value, target_concrete_type)`.
    pub fn translate(&self, value: &Dynamic, target: TypeSpec) -> Result<TranslationChain, MetagraphError> {
        let dispatcher = Dispatcher::new(self.resolver.registry, &self.resolver.config);
        dispatcher.plan_translate(value, &target)
    }
}

pub struct PlanAlgos<'a, 'r> {
    resolver: &'a Resolver<'r>,
}

impl<'a, 'r> PlanAlgos<'a, 'r> {
    pub fn call(&self, name: &str, args: &[CallArg]) -> Result<Plan, MetagraphError> {
        let mut classifications = Vec::with_capacity(args.len());
        for arg in args {
            classifications.push(self.resolver.classify(arg)?.0);
        }
        let dispatcher = Dispatcher::new(self.resolver.registry, &self.resolver.config);
        Ok(dispatcher.dispatch_classified(name, &classifications)?)
    }

    pub fn group(&self, group: &str) -> PlanAlgoGroup<'a, 'r> {
        PlanAlgoGroup {
            resolver: self.resolver,
            group: group.to_string(),
        }
    }
}

pub struct PlanAlgoGroup<'a, 'r> {
    resolver: &'a Resolver<'r>,
    group: String,
}

impl<'a, 'r> PlanAlgoGroup<'a, 'r> {
    pub fn call(&self, name: &str, args: &[CallArg]) -> Result<Plan, MetagraphError> {
        PlanAlgos { resolver: self.resolver }.call(&format!("{}.{}", self.group, name), args)
    }
}

/// `resolver.types` — read-only navigation over the registered type hierarchy.
pub struct TypesFacade<'a, 'r> {
    resolver: &'a Resolver<'r>,
}

impl<'a, 'r> TypesFacade<'a, 'r> {
    pub fn abstract_type(&self, name: &str) -> Option<&'r AbstractType> {
        self.resolver
            .registry
            .type_system()
            .abstract_type(&AbstractTypeId(name.to_string()))
    }

    pub fn concrete_type(&self, abstract_name: &str, concrete_name: &str) -> Option<&'r ConcreteType> {
        let ct = self
            .resolver
            .registry
            .type_system()
            .concrete_types_of(&AbstractTypeId(abstract_name.to_string()))
            .find(|ct| ct.id.0 == concrete_name)?;
        Some(ct)
    }

    pub fn concrete_types(&self, abstract_name: &str) -> impl Iterator<Item = &'r ConcreteType> {
        self.resolver
            .registry
            .type_system()
            .concrete_types_of(&AbstractTypeId(abstract_name.to_string()))
    }
}

/// `resolver.wrappers` — construct concrete values from raw library data
/// without going through an existing runtime value first (§6).
pub struct WrappersFacade<'a, 'r> {
    resolver: &'a Resolver<'r>,
}

impl<'a, 'r> WrappersFacade<'a, 'r> {
    pub fn group(&self, abstract_name: &str) -> WrapperGroup<'a, 'r> {
        WrapperGroup {
            resolver: self.resolver,
            abstract_type: AbstractTypeId(abstract_name.to_string()),
        }
    }
}

pub struct WrapperGroup<'a, 'r> {
    resolver: &'a Resolver<'r>,
    abstract_type: AbstractTypeId,
}

impl<'a, 'r> WrapperGroup<'a, 'r> {
    pub fn construct(&self, wrapper_name: &str, args: &[Dynamic]) -> Result<Dynamic, MetagraphError> {
        let wrapper = self.find(wrapper_name)?;
        wrapper.construct(args).map_err(|source| {
            DispatchError::Plugin {
                algorithm: format!("wrappers.{}.{}", self.abstract_type, wrapper_name),
                source,
            }
            .into()
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &'r str> {
        self.resolver.registry.wrappers_for(&self.abstract_type).map(|w| w.name.as_str())
    }

    fn find(&self, wrapper_name: &str) -> Result<&'r Wrapper, MetagraphError> {
        let wrapper = self
            .resolver
            .registry
            .wrapper(wrapper_name)
            .ok_or_else(|| DispatchError::UnknownWrapper(wrapper_name.to_string()))?;
        if wrapper.abstract_type != self.abstract_type {
            return Err(DispatchError::WrapperAbstractMismatch {
                wrapper: wrapper_name.to_string(),
                requested: self.abstract_type.clone(),
                actual: wrapper.abstract_type.clone(),
            }
            .into());
        }
        Ok(wrapper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::{AbstractAlgorithm, ConcreteAlgorithm, ParamSpec};
    use crate::property::PropertyMap;
    use crate::types::{ConcreteType, ConcreteTypeId};
    use std::sync::Arc;

    fn is_i64(v: &Dynamic) -> bool {
        v.downcast_ref::<i64>().is_some()
    }

    fn fixture_registry() -> Registry {
        let nx = ConcreteType::new(
            "NX",
            "Graph",
            is_i64,
            |_| (PropertyMap::new(), PropertyMap::new()),
            |a, b| a.downcast_ref::<i64>() == b.downcast_ref::<i64>(),
        );

        let abstract_algo = AbstractAlgorithm::new(
            "centrality.pagerank",
            vec![ParamSpec::new("graph", TypeSpec::new("NX"))],
            TypeSpec::new("NX"),
        );
        let concrete_algo = ConcreteAlgorithm::with_fixed_cost(
            "pagerank_nx",
            "centrality.pagerank",
            vec![ConcreteTypeId("NX".into())],
            "NX",
            1.0,
            |args| Ok(Arc::new(args[0].downcast_ref::<i64>().copied().unwrap() + 1) as Dynamic),
        );

        Registry::builder()
            .abstract_type(AbstractType::new("Graph", []))
            .concrete_type(nx)
            .abstract_algorithm(abstract_algo)
            .concrete_algorithm(concrete_algo)
            .finalize()
            .unwrap()
    }

    #[test]
    fn eager_call_through_group_matches_direct_call() {
        let registry = fixture_registry();
        let resolver = Resolver::new(&registry, Config::default());
        let value: Dynamic = Arc::new(41i64);

        let outcome = resolver
            .algos()
            .group("centrality")
            .call("pagerank", &[CallArg::from(value)])
            .unwrap();

        let result = outcome.into_value();
        assert_eq!(*result.downcast_ref::<i64>().unwrap(), 42);
    }

    #[test]
    fn lazy_call_returns_placeholder_and_computes_same_value() {
        let registry = fixture_registry();
        let resolver = Resolver::new(&registry, Config::default().with_lazy(true));
        let value: Dynamic = Arc::new(41i64);

        let outcome = resolver
            .algos()
            .call("centrality.pagerank", &[CallArg::from(value)])
            .unwrap();
        let placeholder = outcome.into_placeholder();

        let result = resolver.compute(placeholder).unwrap();
        assert_eq!(*result.downcast_ref::<i64>().unwrap(), 42);
    }

    #[test]
    fn plan_only_does_not_execute() {
        let registry = fixture_registry();
        let resolver = Resolver::new(&registry, Config::default());
        let value: Dynamic = Arc::new(41i64);

        let plan = resolver
            .plan()
            .algos()
            .call("centrality.pagerank", &[CallArg::from(value)])
            .unwrap();

        assert_eq!(plan.chosen_concrete_algorithm, "pagerank_nx");
        assert_eq!(plan.total_cost, crate::cost::Cost::ZERO);
    }

    #[test]
    fn wrappers_construct_checked_against_abstract_type() {
        let mut registry_builder = Registry::builder()
            .abstract_type(AbstractType::new("Graph", []))
            .concrete_type(ConcreteType::new(
                "NX",
                "Graph",
                is_i64,
                |_| (PropertyMap::new(), PropertyMap::new()),
                |a, b| a.downcast_ref::<i64>() == b.downcast_ref::<i64>(),
            ));
        registry_builder = registry_builder.wrapper(crate::wrapper::Wrapper::new(
            "from_edge_list",
            "Graph",
            "NX",
            |args| Ok(args[0].clone()),
        ));
        let registry = registry_builder.finalize().unwrap();
        let resolver = Resolver::new(&registry, Config::default());

        let value: Dynamic = Arc::new(7i64);
        let built = resolver
            .wrappers()
            .group("Graph")
            .construct("from_edge_list", &[value])
            .unwrap();
        assert_eq!(*built.downcast_ref::<i64>().unwrap(), 7);

        let err = resolver.wrappers().group("Vector").construct("from_edge_list", &[]);
        assert!(matches!(
            err,
            Err(MetagraphError::Dispatch(DispatchError::WrapperAbstractMismatch { .. }))
        ));
    }

    #[test]
    fn translate_and_plan_translate_are_identity_for_matching_type() {
        let registry = fixture_registry();
        let resolver = Resolver::new(&registry, Config::default());
        let value: Dynamic = Arc::new(5i64);

        let chain = resolver.plan().translate(&value, TypeSpec::new("NX")).unwrap();
        assert!(chain.is_empty());

        let translated = resolver.translate(&value, TypeSpec::new("NX")).unwrap();
        assert_eq!(*translated.downcast_ref::<i64>().unwrap(), 5);
    }
}
