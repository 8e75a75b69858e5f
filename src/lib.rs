#![deny(
    unsafe_code,
    // clippy::unwrap_used,
    // clippy::expect_used,
    clippy::panic,
)]

//! Metagraph: a type-and-dispatch resolver for graph analytics across
//! heterogeneous backend libraries (§1).
//!
//! Six cooperating components, in dependency order (§2): the [`types`] system
//! and its [`property`] lattice; the [`registry`] that collects and validates
//! plugin [`registry::Entry`] values; the [`planner`] that finds least-cost
//! [`translate::TranslationChain`]s; the [`dispatch`]er that resolves an
//! abstract algorithm call into a [`plan::Plan`]; and the [`lazy`] task graph
//! that defers a resolved call into a [`lazy::Placeholder`] for an external
//! [`lazy::Scheduler`] to run. [`resolver`] ties all of it together behind the
//! user-facing façade described in §6.

pub mod algorithm;
pub mod config;
pub mod cost;
pub mod dispatch;
pub mod error;
pub mod hash;
pub mod lazy;
pub mod plan;
pub mod planner;
pub mod property;
pub mod registry;
pub mod resolver;
pub mod translate;
pub mod types;
pub mod wrapper;

pub use camino;

pub use config::Config;
pub use error::MetagraphError;
pub use registry::{Entry, EntryProvider, Registry, RegistryBuilder};
pub use resolver::Resolver;
pub use types::Dynamic;
