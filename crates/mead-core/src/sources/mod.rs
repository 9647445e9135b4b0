//! Source clients
//!
//! Every external knowledge source implements [`SourceClient`]. A client
//! never fails: remote problems are logged and turn into an empty
//! [`PartialEnrichment`].
//!
//! Two families exist:
//! - structured graphs (DBpedia, Wikidata) queried over SPARQL and gated on
//!   a namespace-matching reference URI
//! - scraped articles (WikiDoc, Wikipedia) looked up by display name

pub mod dbpedia;
pub mod graph;
pub mod mediawiki;
pub mod snippets;
pub mod wikidata;
pub mod wikidoc;
pub mod wikipedia;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::Config;
use crate::enrich::types::{EntityKind, EntityReference, PartialEnrichment, SourceId};
use crate::transport::Transport;

pub use dbpedia::DbpediaClient;
pub use snippets::SnippetStore;
pub use wikidata::WikidataClient;
pub use wikidoc::WikidocClient;
pub use wikipedia::WikipediaClient;

/// Reference URIs containing this marker point into Wikidata
pub const WIKIDATA_ENTITY_MARKER: &str = "wikidata.org/entity/";
/// Reference URIs containing this marker point into DBpedia
pub const DBPEDIA_RESOURCE_MARKER: &str = "dbpedia.org/resource/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFamily {
    StructuredGraph,
    ScrapedArticle,
}

/// Precondition for invoking a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Only invoked when a reference URI contains the marker
    Namespace(&'static str),
    Ungated,
}

/// Input handed to a source client
#[derive(Debug, Clone)]
pub struct FetchTarget {
    pub reference: EntityReference,
    /// The reference URI that opened a [`Gate::Namespace`] gate
    pub uri: Option<String>,
}

impl FetchTarget {
    pub fn new(reference: EntityReference, uri: Option<String>) -> Self {
        Self { reference, uri }
    }

    pub fn kind(&self) -> EntityKind {
        self.reference.kind
    }
}

/// One external knowledge source
#[async_trait]
pub trait SourceClient: Send + Sync {
    fn id(&self) -> SourceId;

    fn family(&self) -> SourceFamily;

    fn gate(&self) -> Gate;

    /// Whether this source has anything to say about entities of `kind`
    fn supports(&self, _kind: EntityKind) -> bool {
        true
    }

    /// Fetch everything this source knows about the target
    async fn fetch(&self, target: &FetchTarget) -> PartialEnrichment;
}

/// The four production sources, sharing one transport
pub fn default_sources(config: &Config, transport: Arc<dyn Transport>) -> Vec<Arc<dyn SourceClient>> {
    let snippets = SnippetStore::new(config.snippets.dir.clone());
    vec![
        Arc::new(DbpediaClient::new(transport.clone(), &config.sources.dbpedia)),
        Arc::new(WikidataClient::new(transport.clone(), &config.sources.wikidata)),
        Arc::new(WikidocClient::new(
            transport.clone(),
            &config.sources.wikidoc,
            config.extraction.char_budget,
            snippets,
        )),
        Arc::new(WikipediaClient::new(transport, &config.sources.wikipedia)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::ScriptedTransport;

    #[test]
    fn test_default_sources_gates() {
        let transport: Arc<dyn Transport> = Arc::new(ScriptedTransport::new());
        let sources = default_sources(&Config::default(), transport);

        let gates: Vec<(SourceId, Gate)> = sources.iter().map(|s| (s.id(), s.gate())).collect();
        assert_eq!(
            gates,
            vec![
                (SourceId::DBpedia, Gate::Namespace(DBPEDIA_RESOURCE_MARKER)),
                (SourceId::Wikidata, Gate::Namespace(WIKIDATA_ENTITY_MARKER)),
                (SourceId::WikiDoc, Gate::Ungated),
                (SourceId::Wikipedia, Gate::Ungated),
            ]
        );
        assert!(!sources[3].supports(EntityKind::Condition));
        assert_eq!(sources[0].family(), SourceFamily::StructuredGraph);
        assert_eq!(sources[2].family(), SourceFamily::ScrapedArticle);
    }
}
