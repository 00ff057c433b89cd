//! Provider registry

use super::traits::{Provider, ProviderName};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// A registered provider and the outer time bound on one of its searches
#[derive(Clone)]
struct Registered {
    provider: Arc<dyn Provider>,
    timeout: Duration,
}

/// Outcome of filtering a caller's provider list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderSelection {
    /// Registered providers, in request order, without duplicates
    pub valid: Vec<ProviderName>,
    /// Names that are unknown or not registered
    pub ignored: Vec<String>,
}

impl ProviderSelection {
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty()
    }
}

/// Registry of enabled providers
///
/// Filled once by the loader and read-only afterwards.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderName, Registered>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider; a later registration under the same name replaces it
    pub fn register(&mut self, provider: Arc<dyn Provider>, timeout: Duration) {
        self.providers
            .insert(provider.name(), Registered { provider, timeout });
    }

    /// Get a provider by name
    pub fn lookup(&self, name: ProviderName) -> Option<&Arc<dyn Provider>> {
        self.providers.get(&name).map(|r| &r.provider)
    }

    /// Outer time bound for one search of a provider
    pub fn timeout_for(&self, name: ProviderName) -> Option<Duration> {
        self.providers.get(&name).map(|r| r.timeout)
    }

    /// Registered names in registry order; this is also the default provider list
    pub fn names(&self) -> Vec<ProviderName> {
        ProviderName::ALL
            .into_iter()
            .filter(|name| self.providers.contains_key(name))
            .collect()
    }

    /// Split requested names into registered providers and ignored names
    pub fn validate<S: AsRef<str>>(&self, requested: &[S]) -> ProviderSelection {
        let mut selection = ProviderSelection::default();

        for raw in requested {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            match raw.parse::<ProviderName>() {
                Ok(name) if self.providers.contains_key(&name) => {
                    if !selection.valid.contains(&name) {
                        selection.valid.push(name);
                    }
                }
                _ => selection.ignored.push(raw.to_string()),
            }
        }

        selection
    }

    /// Check if a provider is registered
    pub fn contains(&self, name: ProviderName) -> bool {
        self.providers.contains_key(&name)
    }

    /// Get number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
