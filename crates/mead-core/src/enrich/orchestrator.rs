//! Fan-out of one entity to every applicable source

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, warn};

use super::cache::SourceCache;
use super::pool::WorkerPool;
use super::types::{EntityReference, PartialEnrichment, SourceId};
use crate::sources::{FetchTarget, Gate, SourceClient};

/// Contributions gathered for one entity
#[derive(Debug, Clone, Default)]
pub struct FanOut {
    pub partials: Vec<PartialEnrichment>,
    /// Gated sources not invoked because no reference URI matched
    pub skipped: Vec<SourceId>,
}

/// Dispatches source fetches onto the worker pool and waits for all of them
#[derive(Clone)]
pub struct Orchestrator {
    sources: Vec<Arc<dyn SourceClient>>,
    pool: WorkerPool,
    cache: SourceCache,
}

impl Orchestrator {
    pub fn new(sources: Vec<Arc<dyn SourceClient>>, pool: WorkerPool) -> Self {
        Self {
            sources,
            pool,
            cache: SourceCache::default(),
        }
    }

    pub fn with_cache(mut self, cache: SourceCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    pub fn sources(&self) -> &[Arc<dyn SourceClient>] {
        &self.sources
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub async fn fan_out(&self, reference: &EntityReference) -> FanOut {
        let mut skipped = Vec::new();
        let mut cached = Vec::new();
        let mut tasks = Vec::new();

        for source in &self.sources {
            let id = source.id();
            if !source.supports(reference.kind) {
                debug!(source = %id, kind = %reference.kind, "Source does not cover entity kind");
                continue;
            }

            let uri = match source.gate() {
                Gate::Ungated => None,
                Gate::Namespace(marker) => match reference.uri_matching(marker) {
                    Some(uri) => Some(uri.to_string()),
                    None => {
                        debug!(source = %id, entity = %reference.id, "No reference URI, skipping source");
                        skipped.push(id);
                        continue;
                    }
                },
            };

            if let Some(hit) = self.cache.get(id, &reference.id) {
                debug!(source = %id, entity = %reference.id, "Using cached contribution");
                cached.push(hit);
                continue;
            }

            let source = source.clone();
            let target = FetchTarget::new(reference.clone(), uri);
            tasks.push((id, self.pool.spawn(async move { source.fetch(&target).await })));
        }

        let (ids, handles): (Vec<_>, Vec<_>) = tasks.into_iter().unzip();
        let fetched = join_all(handles)
            .await
            .into_iter()
            .zip(ids)
            .map(|(joined, id)| match joined {
                Ok(partial) => {
                    self.cache.insert(&reference.id, &partial);
                    partial
                }
                Err(e) => {
                    warn!(source = %id, entity = %reference.id, error = %e, "Source task did not complete");
                    PartialEnrichment::empty(id)
                }
            });

        let mut partials = cached;
        partials.extend(fetched);
        FanOut { partials, skipped }
    }
}
