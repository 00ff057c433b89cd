//! Application state shared across handlers

use crate::config::Settings;
use crate::providers::ProviderRegistry;
use crate::search::Search;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Aggregation orchestrator
    pub search: Arc<Search>,
}

impl AppState {
    /// Create new application state
    pub fn new(settings: Settings, registry: ProviderRegistry) -> Self {
        let registry = Arc::new(registry);

        Self {
            settings: Arc::new(settings),
            search: Arc::new(Search::new(registry)),
        }
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }

    /// Locale used when the caller states no preference
    pub fn default_locale(&self) -> &str {
        &self.settings.search.default_locale
    }
}
