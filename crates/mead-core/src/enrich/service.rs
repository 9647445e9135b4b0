//! Enrichment entry point

use std::sync::Arc;

use tracing::{debug, info};

use super::cache::SourceCache;
use super::merge::MergePolicy;
use super::orchestrator::Orchestrator;
use super::pool::WorkerPool;
use super::types::{EntityReference, MergedEnrichment};
use crate::config::{Config, ExtractionConfig};
use crate::error::Error;
use crate::sources::{SourceClient, default_sources};
use crate::store::FactStore;
use crate::transport::{HttpTransport, Transport};
use crate::Result;

/// Looks up an entity, fans out to the sources and merges what comes back
pub struct EnrichmentService {
    store: Arc<dyn FactStore>,
    orchestrator: Orchestrator,
    extraction: ExtractionConfig,
}

impl EnrichmentService {
    pub fn new(
        store: Arc<dyn FactStore>,
        sources: Vec<Arc<dyn SourceClient>>,
        pool: WorkerPool,
        extraction: ExtractionConfig,
    ) -> Self {
        Self {
            store,
            orchestrator: Orchestrator::new(sources, pool),
            extraction,
        }
    }

    /// Production wiring: the four sources over a shared HTTP transport
    pub fn from_config(config: &Config, store: Arc<dyn FactStore>) -> Result<Self> {
        config
            .validate()
            .map_err(|e| Error::ConfigError(e.to_string()))?;
        let transport = HttpTransport::builder()
            .pool_idle_per_host(config.pool.size)
            .build()?;
        Ok(Self::with_transport(config, store, Arc::new(transport)))
    }

    /// The four sources over the given transport
    pub fn with_transport(
        config: &Config,
        store: Arc<dyn FactStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self::new(
            store,
            default_sources(config, transport),
            WorkerPool::new(config.pool.size),
            config.extraction.clone(),
        )
        .with_cache(SourceCache::new(config.cache.enabled))
    }

    /// Replace the contribution cache
    pub fn with_cache(mut self, cache: SourceCache) -> Self {
        self.orchestrator = self.orchestrator.with_cache(cache);
        self
    }

    pub fn store(&self) -> &Arc<dyn FactStore> {
        &self.store
    }

    pub fn cache(&self) -> &SourceCache {
        self.orchestrator.cache()
    }

    /// Re-read the fact store and forget every cached contribution
    pub async fn reload(&self) -> Result<usize> {
        let count = self.store.reload().await?;
        self.orchestrator.cache().clear();
        Ok(count)
    }

    /// Enrich a known entity by id
    ///
    /// An unknown id is an [`Error::EntityNotFound`] and no source is
    /// contacted. Source failures never surface here; they only leave
    /// fields empty.
    pub async fn enrich(&self, id: &str) -> Result<MergedEnrichment> {
        let reference = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::EntityNotFound(id.to_string()))?;
        Ok(self.enrich_reference(&reference).await)
    }

    /// Enrich a reference that did not come from the store
    pub async fn enrich_reference(&self, reference: &EntityReference) -> MergedEnrichment {
        debug!(entity = %reference.id, kind = %reference.kind, "Enriching");
        let fan_out = self.orchestrator.fan_out(reference).await;

        let merged = MergePolicy::for_kind(reference.kind, &self.extraction).merge(
            reference,
            &fan_out.partials,
            fan_out.skipped,
        );
        info!(
            entity = %merged.id,
            sources = ?merged.contributing_sources,
            skipped = ?merged.skipped_sources,
            "Enrichment complete"
        );
        merged
    }
}
