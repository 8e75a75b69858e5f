//! Resolver-wide configuration (§2.1, §6).
//!
//! Mirrors the reference site generator's `Website` builder options: a small
//! plain struct with a `Default` impl and chained setters, rather than a
//! config file format of its own.

use camino::Utf8PathBuf;

/// Tunables for a [`Resolver`](crate::resolver::Resolver).
#[derive(Debug, Clone)]
pub struct Config {
    /// When true, calls return [`Placeholder`](crate::lazy::Placeholder)s
    /// that must be explicitly materialized through a [`Scheduler`](crate::lazy::Scheduler)
    /// instead of running eagerly (§4.6).
    pub lazy: bool,

    /// Where plugin `EntryProvider`s may be discovered from, for callers that
    /// load backends dynamically rather than registering them inline.
    pub plugin_search_paths: Vec<Utf8PathBuf>,

    /// Whether a return-type mismatch after executing a [`Plan`](crate::plan::Plan)
    /// is a hard error (`true`) or a logged warning (`false`, §7).
    pub strict_return_type_check: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lazy: false,
            plugin_search_paths: Vec::new(),
            strict_return_type_check: true,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn with_plugin_search_path(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.plugin_search_paths.push(path.into());
        self
    }

    pub fn with_strict_return_type_check(mut self, strict: bool) -> Self {
        self.strict_return_type_check = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_eager_and_strict() {
        let config = Config::default();
        assert!(!config.lazy);
        assert!(config.strict_return_type_check);
        assert!(config.plugin_search_paths.is_empty());
    }
}
