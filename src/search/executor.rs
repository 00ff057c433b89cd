//! Search execution and orchestration

use super::models::{AggregateResult, SearchQuery};
use crate::error::SearchError;
use crate::providers::{ProviderName, ProviderRegistry};
use crate::results::ResultRecord;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::timeout;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Aggregation orchestrator: fans a query out to providers and merges the results
#[derive(Clone)]
pub struct Search {
    /// Provider registry
    registry: Arc<ProviderRegistry>,
}

impl Search {
    /// Create a new search executor
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Search every requested provider concurrently and concatenate their records
    /// in request order
    ///
    /// Provider failures never surface here; only a request naming no registered
    /// provider is an error.
    pub async fn aggregate(&self, query: &SearchQuery) -> Result<AggregateResult, SearchError> {
        let requested: Vec<String> = if query.providers().is_empty() {
            self.registry.names().iter().map(|n| n.to_string()).collect()
        } else {
            query.providers().to_vec()
        };

        let selection = self.registry.validate(&requested);
        if !selection.ignored.is_empty() {
            debug!(ignored = ?selection.ignored, "ignoring unknown or disabled providers");
        }
        if selection.is_empty() {
            return Err(SearchError::NoValidProviders { requested });
        }

        let search_id = Uuid::new_v4();
        let span = info_span!("search", id = %search_id);
        let start = Instant::now();

        info!(
            parent: &span,
            keyword = query.keyword(),
            page = query.page(),
            providers = ?selection.valid,
            "Executing search"
        );

        // join_all yields in input order whatever the completion order
        let per_provider = join_all(
            selection
                .valid
                .iter()
                .map(|name| self.search_provider(*name, query)),
        )
        .instrument(span.clone())
        .await;

        let records: Vec<ResultRecord> = per_provider.into_iter().flatten().collect();

        info!(
            parent: &span,
            total_found = records.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Search finished"
        );

        Ok(AggregateResult::new(
            query.keyword(),
            query.page(),
            selection.valid,
            records,
        ))
    }

    /// Search a single provider, bounded by its configured timeout
    async fn search_provider(&self, name: ProviderName, query: &SearchQuery) -> Vec<ResultRecord> {
        let Some(provider) = self.registry.lookup(name) else {
            return Vec::new();
        };
        let Some(limit) = self.registry.timeout_for(name) else {
            return provider.search(query).await;
        };

        let start = Instant::now();
        match timeout(limit, provider.search(query)).await {
            Ok(records) => {
                debug!(
                    provider = %name,
                    count = records.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "provider settled"
                );
                records
            }
            Err(_) => {
                warn!(provider = %name, timeout = ?limit, "provider timed out, contributing no results");
                Vec::new()
            }
        }
    }
}
