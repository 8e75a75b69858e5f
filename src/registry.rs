//! The Registry (§4.2): collects plugin-declared Entries, validates them, and
//! builds the indexes the Planner and Dispatcher run queries against.
//!
//! Building one goes through a [`RegistryBuilder`] so that finalization — the
//! five validation/index-building steps in §4.2 — happens exactly once, after
//! which the [`Registry`] is immutable and safe to share across threads
//! without locking, mirroring the reference site generator's build-then-freeze
//! `Graph`.

use std::collections::{BTreeMap, HashMap};

use crate::algorithm::{AbstractAlgorithm, ConcreteAlgorithm};
use crate::error::RegistryError;
use crate::planner::{Planner, TranslationGraph};
use crate::translate::{Translator, TranslatorId};
use crate::types::{AbstractType, AbstractTypeId, ConcreteType, ConcreteTypeId, TypeSystem};
use crate::wrapper::Wrapper;

/// One unit of plugin-declared configuration. A plugin hands the builder a
/// stream of these rather than calling five different registration methods
/// directly, so that an [`EntryProvider`] discovered from an external source
/// (a plugin search path, say) can be collected uniformly.
pub enum Entry {
    AbstractType(AbstractType),
    ConcreteType(ConcreteType),
    Translator(Translator),
    AbstractAlgorithm(AbstractAlgorithm),
    ConcreteAlgorithm(ConcreteAlgorithm),
    Wrapper(Wrapper),
}

/// A source of [`Entry`] values — typically one per backend plugin. The
/// Registry never discovers plugins itself (Non-goal: plugin discovery
/// mechanics); callers hand it providers already resolved from wherever
/// `Config::plugin_search_paths` pointed.
pub trait EntryProvider {
    fn entries(&self) -> Vec<Entry>;
}

/// Accumulates [`Entry`] values before validation. Building incrementally
/// mirrors the reference crate's `Website`/`Blueprint` builders: registration
/// methods just push into flat `Vec`s, all checking happens in one place at
/// [`RegistryBuilder::finalize`].
#[derive(Default)]
pub struct RegistryBuilder {
    abstract_types: Vec<AbstractType>,
    concrete_types: Vec<ConcreteType>,
    translators: Vec<Translator>,
    abstract_algorithms: Vec<AbstractAlgorithm>,
    concrete_algorithms: Vec<ConcreteAlgorithm>,
    wrappers: Vec<Wrapper>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abstract_type(mut self, value: AbstractType) -> Self {
        self.abstract_types.push(value);
        self
    }

    pub fn concrete_type(mut self, value: ConcreteType) -> Self {
        self.concrete_types.push(value);
        self
    }

    pub fn translator(mut self, value: Translator) -> Self {
        self.translators.push(value);
        self
    }

    pub fn abstract_algorithm(mut self, value: AbstractAlgorithm) -> Self {
        self.abstract_algorithms.push(value);
        self
    }

    pub fn concrete_algorithm(mut self, value: ConcreteAlgorithm) -> Self {
        self.concrete_algorithms.push(value);
        self
    }

    pub fn wrapper(mut self, value: Wrapper) -> Self {
        self.wrappers.push(value);
        self
    }

    /// Pulls every [`Entry`] out of a plugin-supplied provider and files it
    /// into the right bucket.
    pub fn provider(mut self, provider: &dyn EntryProvider) -> Self {
        for entry in provider.entries() {
            match entry {
                Entry::AbstractType(v) => self.abstract_types.push(v),
                Entry::ConcreteType(v) => self.concrete_types.push(v),
                Entry::Translator(v) => self.translators.push(v),
                Entry::AbstractAlgorithm(v) => self.abstract_algorithms.push(v),
                Entry::ConcreteAlgorithm(v) => self.concrete_algorithms.push(v),
                Entry::Wrapper(v) => self.wrappers.push(v),
            }
        }
        self
    }

    /// Runs the five validation/index-building steps of §4.2 and freezes the
    /// result into a [`Registry`]. Fails fast on the first violation found,
    /// in the order the steps are listed.
    pub fn finalize(self) -> Result<Registry, RegistryError> {
        let mut type_system = TypeSystem::new();
        for at in self.abstract_types {
            type_system.register_abstract_type(at);
        }

        // Step 1: every ConcreteType references a known AbstractType.
        for ct in &self.concrete_types {
            if type_system.abstract_type(&ct.abstract_type).is_none() {
                return Err(RegistryError::UnknownAbstractType {
                    concrete: ct.id.clone(),
                    abstract_type: ct.abstract_type.clone(),
                });
            }
        }
        for ct in self.concrete_types {
            type_system.register_concrete_type(ct);
        }

        // Step 2: every Translator's endpoints belong to the same AbstractType.
        let mut translators: BTreeMap<TranslatorId, Translator> = BTreeMap::new();
        for translator in self.translators {
            if translators.contains_key(&translator.id) {
                return Err(RegistryError::DuplicateEntry {
                    kind: "translator",
                    name: translator.id.0.clone(),
                });
            }

            let src_abstract = type_system
                .concrete_type(&translator.src)
                .ok_or_else(|| RegistryError::UnknownAbstractType {
                    concrete: translator.src.clone(),
                    abstract_type: translator.abstract_type.clone(),
                })?
                .abstract_type
                .clone();
            let dst_abstract = type_system
                .concrete_type(&translator.dst)
                .ok_or_else(|| RegistryError::UnknownAbstractType {
                    concrete: translator.dst.clone(),
                    abstract_type: translator.abstract_type.clone(),
                })?
                .abstract_type
                .clone();

            if src_abstract != dst_abstract {
                return Err(RegistryError::TranslatorAbstractMismatch {
                    translator: translator.id.0.clone(),
                    src: translator.src.clone(),
                    dst: translator.dst.clone(),
                    src_abstract,
                    dst_abstract,
                });
            }

            translators.insert(translator.id.clone(), translator);
        }

        // Step 3: every ConcreteAlgorithm implements a known AbstractAlgorithm
        // with a compatible parameter shape.
        let mut abstract_algorithms: BTreeMap<String, AbstractAlgorithm> = BTreeMap::new();
        for aa in self.abstract_algorithms {
            if abstract_algorithms.contains_key(&aa.name) {
                return Err(RegistryError::DuplicateEntry {
                    kind: "abstract_algorithm",
                    name: aa.name.clone(),
                });
            }
            abstract_algorithms.insert(aa.name.clone(), aa);
        }

        let mut concrete_algorithms: BTreeMap<String, ConcreteAlgorithm> = BTreeMap::new();
        let mut algorithm_index: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for ca in self.concrete_algorithms {
            if concrete_algorithms.contains_key(&ca.name) {
                return Err(RegistryError::DuplicateEntry {
                    kind: "concrete_algorithm",
                    name: ca.name.clone(),
                });
            }

            let abstract_algorithm = abstract_algorithms.get(&ca.abstract_name).ok_or_else(|| {
                RegistryError::UnknownAbstractAlgorithm {
                    concrete_algorithm: ca.name.clone(),
                    abstract_algorithm: ca.abstract_name.clone(),
                }
            })?;

            if abstract_algorithm.params.len() != ca.params.len() {
                return Err(RegistryError::ParameterShapeMismatch {
                    concrete_algorithm: ca.name.clone(),
                    abstract_algorithm: ca.abstract_name.clone(),
                    expected: abstract_algorithm.params.len(),
                    found: ca.params.len(),
                });
            }

            algorithm_index
                .entry(ca.abstract_name.clone())
                .or_default()
                .push(ca.name.clone());
            concrete_algorithms.insert(ca.name.clone(), ca);
        }
        for group in algorithm_index.values_mut() {
            group.sort();
        }

        // Step 4 (registry-internal, not numbered in §4.2 but validated the
        // same way): every Wrapper's declared concrete type must be known and
        // must actually belong to the abstract type the wrapper claims.
        let mut wrappers: BTreeMap<String, Wrapper> = BTreeMap::new();
        let mut wrapper_index: BTreeMap<AbstractTypeId, Vec<String>> = BTreeMap::new();
        for wrapper in self.wrappers {
            if wrappers.contains_key(&wrapper.name) {
                return Err(RegistryError::DuplicateEntry {
                    kind: "wrapper",
                    name: wrapper.name.clone(),
                });
            }

            let concrete_type = type_system.concrete_type(&wrapper.concrete_type).ok_or_else(|| {
                RegistryError::UnknownAbstractType {
                    concrete: wrapper.concrete_type.clone(),
                    abstract_type: wrapper.abstract_type.clone(),
                }
            })?;

            if concrete_type.abstract_type != wrapper.abstract_type {
                return Err(RegistryError::WrapperTypeMismatch {
                    wrapper: wrapper.name.clone(),
                    concrete: wrapper.concrete_type.clone(),
                    claimed: wrapper.abstract_type.clone(),
                    actual: concrete_type.abstract_type.clone(),
                });
            }

            wrapper_index
                .entry(wrapper.abstract_type.clone())
                .or_default()
                .push(wrapper.name.clone());
            wrappers.insert(wrapper.name.clone(), wrapper);
        }
        for group in wrapper_index.values_mut() {
            group.sort();
        }

        // Step 5: build the per-AbstractType translation multigraph.
        let mut translation_graphs: HashMap<AbstractTypeId, TranslationGraph> = HashMap::new();
        for translator in translators.values() {
            translation_graphs
                .entry(translator.abstract_type.clone())
                .or_insert_with(TranslationGraph::new)
                .add_edge(&translator.src, &translator.dst, translator.id.clone());
        }
        // Every concrete type gets a node even with no incident translators,
        // so a same-type "translation" (empty chain) always has somewhere to start.
        for ct in type_system.concrete_types() {
            translation_graphs
                .entry(ct.abstract_type.clone())
                .or_insert_with(TranslationGraph::new)
                .node(&ct.id);
        }

        Ok(Registry {
            type_system,
            translators,
            translation_graphs,
            abstract_algorithms,
            concrete_algorithms,
            algorithm_index,
            wrappers,
            wrapper_index,
        })
    }
}

/// The finalized, immutable set of descriptors a resolver dispatches and
/// plans against (§4.2). Once built, every field is read-only; concurrent
/// reads need no coordination.
pub struct Registry {
    type_system: TypeSystem,
    translators: BTreeMap<TranslatorId, Translator>,
    translation_graphs: HashMap<AbstractTypeId, TranslationGraph>,
    abstract_algorithms: BTreeMap<String, AbstractAlgorithm>,
    concrete_algorithms: BTreeMap<String, ConcreteAlgorithm>,
    algorithm_index: BTreeMap<String, Vec<String>>,
    wrappers: BTreeMap<String, Wrapper>,
    wrapper_index: BTreeMap<AbstractTypeId, Vec<String>>,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn type_system(&self) -> &TypeSystem {
        &self.type_system
    }

    pub fn planner(&self) -> Planner<'_> {
        Planner::new(&self.translation_graphs, &self.translators)
    }

    pub fn abstract_algorithm(&self, name: &str) -> Option<&AbstractAlgorithm> {
        self.abstract_algorithms.get(name)
    }

    pub fn abstract_algorithm_names(&self) -> impl Iterator<Item = &str> {
        self.abstract_algorithms.keys().map(String::as_str)
    }

    pub fn concrete_algorithm(&self, name: &str) -> Option<&ConcreteAlgorithm> {
        self.concrete_algorithms.get(name)
    }

    /// The concrete implementations registered against an abstract algorithm
    /// name, in deterministic (lexicographic-by-name) order.
    pub fn concrete_algorithms_for(&self, abstract_name: &str) -> impl Iterator<Item = &ConcreteAlgorithm> {
        self.algorithm_index
            .get(abstract_name)
            .into_iter()
            .flatten()
            .filter_map(move |name| self.concrete_algorithms.get(name))
    }

    pub fn concrete_type(&self, id: &ConcreteTypeId) -> Option<&ConcreteType> {
        self.type_system.concrete_type(id)
    }

    pub fn wrapper(&self, name: &str) -> Option<&Wrapper> {
        self.wrappers.get(name)
    }

    /// The wrappers registered against an abstract type, in deterministic
    /// (lexicographic-by-name) order — the `resolver.wrappers.<AbstractType>.*`
    /// navigation surface of §6.
    pub fn wrappers_for(&self, abstract_type: &AbstractTypeId) -> impl Iterator<Item = &Wrapper> {
        self.wrapper_index
            .get(abstract_type)
            .into_iter()
            .flatten()
            .filter_map(move |name| self.wrappers.get(name))
    }
}
