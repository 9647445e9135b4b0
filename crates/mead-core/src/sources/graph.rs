//! SPARQL helpers shared by the structured-graph sources

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::enrich::types::SourceId;
use crate::text::{dedupe, split_packed};
use crate::transport::{self, Binding, SelectRequest, Transport, sparql};

pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";

pub const LIMIT_ONE: usize = 1;
pub const LIMIT_LITERALS: usize = 10;
pub const LIMIT_LABELS: usize = 50;
pub const LIMIT_IMAGES: usize = 10;

/// Which literals a query result accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lang {
    /// English-tagged literals only
    English,
    /// English-tagged or untagged literals
    EnglishOrPlain,
    /// Any term, including URIs and typed literals
    Any,
}

/// Runs queries for one source against its endpoint
#[derive(Clone)]
pub struct GraphQuery {
    transport: Arc<dyn Transport>,
    source: SourceId,
    endpoint: String,
    user_agent: String,
    timeout: Duration,
}

impl GraphQuery {
    pub fn new(transport: Arc<dyn Transport>, source: SourceId, config: &SourceConfig) -> Self {
        Self {
            transport,
            source,
            endpoint: config.endpoint.clone(),
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Rows of a `SELECT`; empty on any transport failure
    pub async fn rows(&self, query: String) -> Vec<Binding> {
        let request = SelectRequest {
            endpoint: self.endpoint.clone(),
            query,
            user_agent: self.user_agent.clone(),
            timeout: self.timeout,
        };
        match transport::select(self.transport.as_ref(), &request).await {
            Ok(rows) => {
                debug!(source = %self.source, rows = rows.len(), "SPARQL select");
                rows
            }
            Err(e) => {
                warn!(source = %self.source, kind = e.kind(), error = %e, "SPARQL query failed");
                Vec::new()
            }
        }
    }

    /// Values bound to `var`, filtered by language
    pub async fn values(&self, query: String, var: &str, lang: Lang) -> Vec<String> {
        let rows = self.rows(query).await;
        sparql::column(&rows, var)
            .filter(|term| match lang {
                Lang::Any => true,
                Lang::English => !term.is_literal() || term.is_english(),
                Lang::EnglishOrPlain => {
                    !term.is_literal() || term.is_english() || term.is_untagged()
                }
            })
            .map(|term| term.value.trim().to_string())
            .collect()
    }

    pub async fn first(&self, query: String, var: &str, lang: Lang) -> Option<String> {
        self.values(query, var, lang).await.into_iter().next()
    }

    /// English `rdfs:label`s of the resources linked by `predicate`
    pub async fn labels_of(&self, subject: &str, predicate: &str) -> Vec<String> {
        let query = format!(
            "PREFIX rdfs: <{RDFS}>\n\
             SELECT DISTINCT ?label WHERE {{\n  <{subject}> <{predicate}> ?item .\n  ?item rdfs:label ?label .\n  FILTER(LANG(?label) = \"en\")\n}} LIMIT {LIMIT_LABELS}"
        );
        dedupe(self.values(query, "label", Lang::English).await)
    }

    /// First English literal of `predicate`
    pub async fn english_literal(&self, subject: &str, predicate: &str) -> Option<String> {
        let query = format!(
            "SELECT ?text WHERE {{\n  <{subject}> <{predicate}> ?text .\n  FILTER(LANG(?text) = \"en\")\n}} LIMIT {LIMIT_ONE}"
        );
        self.first(query, "text", Lang::English).await
    }

    /// First value of `predicate`, whatever its type
    pub async fn any_value(&self, subject: &str, predicate: &str) -> Option<String> {
        let query = format!(
            "SELECT ?value WHERE {{\n  <{subject}> <{predicate}> ?value .\n}} LIMIT {LIMIT_ONE}"
        );
        self.first(query, "value", Lang::Any).await
    }

    /// English or untagged literals of `predicate`, with packed values split
    pub async fn packed_literals(&self, subject: &str, predicate: &str) -> Vec<String> {
        let query = format!(
            "SELECT DISTINCT ?value WHERE {{\n  <{subject}> <{predicate}> ?value .\n  FILTER(LANG(?value) = \"en\" || LANG(?value) = \"\")\n}} LIMIT {LIMIT_LITERALS}"
        );
        split_packed(self.values(query, "value", Lang::EnglishOrPlain).await)
    }
}

/// Whether a URI can be embedded in `<...>` without escaping the IRI
pub fn is_safe_iri(uri: &str) -> bool {
    !uri.is_empty()
        && !uri
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '\\' | '^' | '`'))
}
