//! MeAd Core Library
//!
//! This crate provides the enrichment pipeline for MeAd, including:
//! - Local fact store (entity id -> display name and reference URIs)
//! - Source clients (DBpedia, Wikidata, WikiDoc, Wikipedia)
//! - Text normalization, image canonicalization and article extraction
//! - Concurrent fan-out on a bounded worker pool
//! - Per-field merge policies

pub mod config;
pub mod enrich;
pub mod error;
pub mod sources;
pub mod store;
pub mod text;
pub mod transport;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::enrich::{
        EnrichmentService, EntityKind, EntityReference, MergePolicy, MergedEnrichment,
        PartialEnrichment, SourceId, WorkerPool,
    };
    pub use crate::error::{Error, Result};
    pub use crate::sources::SourceClient;
    pub use crate::store::{FactStore, InMemoryFactStore};
    pub use crate::transport::{HttpTransport, Transport};
}
