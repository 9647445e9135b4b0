//! Multi-source enrichment
//!
//! [`EnrichmentService::enrich`] resolves an id in the fact store, hands the
//! reference to the [`Orchestrator`], which runs one task per applicable
//! source on the shared [`WorkerPool`], and folds the contributions into a
//! [`MergedEnrichment`] using the kind's [`MergePolicy`]. Contributions are
//! remembered in a [`SourceCache`] until the fact store is reloaded.

pub mod cache;
pub mod merge;
pub mod orchestrator;
pub mod pool;
pub mod service;
pub mod types;

pub use cache::SourceCache;
pub use merge::{FieldRule, MergePolicy, Strategy};
pub use orchestrator::{FanOut, Orchestrator};
pub use pool::WorkerPool;
pub use service::EnrichmentService;
pub use types::{
    ArticleOrigin, ArticleProvenance, ArticleSection, EntityKind, EntityReference, FactField,
    ListField, MergedEnrichment, PartialEnrichment, SourceId,
};
