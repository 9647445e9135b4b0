//! Wikidata SPARQL source

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::graph::{GraphQuery, LIMIT_IMAGES, LIMIT_ONE, Lang};
use super::{FetchTarget, Gate, SourceClient, SourceFamily, WIKIDATA_ENTITY_MARKER};
use crate::config::SourceConfig;
use crate::enrich::types::{EntityKind, FactField, ListField, PartialEnrichment, SourceId};
use crate::text::{dedupe, image, merge_unique};
use crate::transport::Transport;

const PREFIXES: &str = "PREFIX wd: <http://www.wikidata.org/entity/>\n\
PREFIX wdt: <http://www.wikidata.org/prop/direct/>\n\
PREFIX p: <http://www.wikidata.org/prop/>\n\
PREFIX ps: <http://www.wikidata.org/prop/statement/>\n\
PREFIX pq: <http://www.wikidata.org/prop/qualifier/>\n\
PREFIX schema: <http://schema.org/>\n\
PREFIX wikibase: <http://wikiba.se/ontology#>\n\
PREFIX bd: <http://www.bigdata.com/rdf#>\n";

const LIMIT_LIST: usize = 30;

/// Entity id from a Wikidata entity URI (`.../entity/Q35869` -> `Q35869`)
pub fn qid_from_uri(uri: &str) -> Option<&str> {
    let qid = uri.trim().trim_end_matches('/').rsplit('/').next()?;
    let mut chars = qid.chars();
    let valid = matches!(chars.next(), Some('Q' | 'q'))
        && qid.len() > 1
        && chars.all(|c| c.is_ascii_digit());
    valid.then_some(qid)
}

/// `population / area` with two decimals; `None` when either is missing,
/// unparsable or the area is zero
pub fn population_density(population: Option<&str>, area: Option<&str>) -> Option<String> {
    let population = parse_number(population?)?;
    let area = parse_number(area?)?;
    if area == 0.0 {
        return None;
    }
    Some(format!("{:.2}", population / area))
}

fn parse_number(value: &str) -> Option<f64> {
    let cleaned = value.replace(',', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Structured data from a Wikidata entity
pub struct WikidataClient {
    graph: GraphQuery,
}

impl WikidataClient {
    pub fn new(transport: Arc<dyn Transport>, config: &SourceConfig) -> Self {
        Self {
            graph: GraphQuery::new(transport, SourceId::Wikidata, config),
        }
    }

    async fn description(&self, qid: &str) -> Option<String> {
        let query = format!(
            "{PREFIXES}SELECT ?desc WHERE {{\n  wd:{qid} schema:description ?desc .\n  FILTER(LANG(?desc) = \"en\")\n}} LIMIT {LIMIT_ONE}"
        );
        self.graph.first(query, "desc", Lang::English).await
    }

    /// English labels of the items linked by `property`
    async fn labels(&self, qid: &str, property: &str) -> Vec<String> {
        let query = format!(
            "{PREFIXES}SELECT DISTINCT ?itemLabel WHERE {{\n  wd:{qid} wdt:{property} ?item .\n  SERVICE wikibase:label {{ bd:serviceParam wikibase:language \"en\". }}\n}} LIMIT {LIMIT_LIST}"
        );
        dedupe(self.graph.values(query, "itemLabel", Lang::English).await)
    }

    /// Single value of `property`: preferred statements first, then the
    /// most recent point in time (P585); deprecated statements never count
    async fn value(&self, qid: &str, property: &str) -> Option<String> {
        let query = format!(
            "{PREFIXES}SELECT ?value WHERE {{\n  wd:{qid} p:{property} ?st .\n  ?st ps:{property} ?value ;\n      wikibase:rank ?rank .\n  OPTIONAL {{ ?st pq:P585 ?when . }}\n  FILTER(?rank != wikibase:DeprecatedRank)\n}} ORDER BY DESC(?rank = wikibase:PreferredRank) DESC(?when) LIMIT {LIMIT_ONE}"
        );
        self.graph.first(query, "value", Lang::Any).await
    }

    async fn demonyms(&self, qid: &str) -> Vec<String> {
        let query = format!(
            "{PREFIXES}SELECT DISTINCT ?demonym WHERE {{\n  wd:{qid} wdt:P1549 ?demonym .\n  FILTER(LANG(?demonym) = \"en\" || LANG(?demonym) = \"\")\n}} LIMIT {LIMIT_LIST}"
        );
        self.graph.values(query, "demonym", Lang::EnglishOrPlain).await
    }

    async fn images(&self, qid: &str, limit: usize) -> Vec<String> {
        let query = format!(
            "{PREFIXES}SELECT ?img WHERE {{\n  wd:{qid} wdt:P18 ?img .\n}} LIMIT {limit}"
        );
        image::normalize(self.graph.values(query, "img", Lang::Any).await)
    }

    async fn fetch_condition(&self, qid: &str) -> PartialEnrichment {
        let (description, symptoms, risks, images) = tokio::join!(
            self.description(qid),
            self.labels(qid, "P780"),
            self.labels(qid, "P5642"),
            self.images(qid, LIMIT_ONE),
        );

        let mut partial = PartialEnrichment::empty(SourceId::Wikidata).with_images(images);
        partial.description = description;
        partial.set_list(ListField::Symptoms, symptoms);
        partial.set_list(ListField::RiskFactors, risks);
        partial
    }

    async fn fetch_region(&self, qid: &str) -> PartialEnrichment {
        let (description, population, area, climates, industries, languages, demonyms, images) = tokio::join!(
            self.description(qid),
            self.value(qid, "P1082"),
            self.value(qid, "P2046"),
            self.labels(qid, "P2564"),
            self.labels(qid, "P452"),
            self.labels(qid, "P37"),
            self.demonyms(qid),
            self.images(qid, LIMIT_IMAGES),
        );

        let density = population_density(population.as_deref(), area.as_deref());

        let mut partial = PartialEnrichment::empty(SourceId::Wikidata).with_images(images);
        partial.description = description;
        partial.set_fact(FactField::PopulationTotal, population);
        partial.set_fact(FactField::PopulationDensity, density);
        partial.set_list(ListField::Climates, climates);
        partial.set_list(ListField::Industries, industries);
        partial.set_list(ListField::CulturalFactors, merge_unique([languages, demonyms]));
        partial
    }
}

#[async_trait]
impl SourceClient for WikidataClient {
    fn id(&self) -> SourceId {
        SourceId::Wikidata
    }

    fn family(&self) -> SourceFamily {
        SourceFamily::StructuredGraph
    }

    fn gate(&self) -> Gate {
        Gate::Namespace(WIKIDATA_ENTITY_MARKER)
    }

    async fn fetch(&self, target: &FetchTarget) -> PartialEnrichment {
        let Some(uri) = target.uri.as_deref() else {
            return PartialEnrichment::empty(SourceId::Wikidata);
        };
        let Some(qid) = qid_from_uri(uri) else {
            warn!(uri = %uri, "Wikidata reference URI has no entity id");
            return PartialEnrichment::empty(SourceId::Wikidata);
        };

        debug!(entity = %target.reference.id, qid = %qid, "Fetching from Wikidata");
        match target.kind() {
            EntityKind::Condition => self.fetch_condition(qid).await,
            EntityKind::Region => self.fetch_region(qid).await,
        }
    }
}
