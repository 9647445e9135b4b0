//! DBpedia SPARQL source

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::graph::{GraphQuery, LIMIT_IMAGES, Lang, RDFS, is_safe_iri};
use super::{DBPEDIA_RESOURCE_MARKER, FetchTarget, Gate, SourceClient, SourceFamily};
use crate::config::SourceConfig;
use crate::enrich::types::{EntityKind, FactField, ListField, PartialEnrichment, SourceId};
use crate::text::{dedupe, image, merge_unique};
use crate::transport::Transport;

const DBO: &str = "http://dbpedia.org/ontology/";
const DBP: &str = "http://dbpedia.org/property/";
const FOAF: &str = "http://xmlns.com/foaf/0.1/";
const SCHEMA: &str = "http://schema.org/";

/// Structured data from a DBpedia resource
pub struct DbpediaClient {
    graph: GraphQuery,
}

impl DbpediaClient {
    pub fn new(transport: Arc<dyn Transport>, config: &SourceConfig) -> Self {
        Self {
            graph: GraphQuery::new(transport, SourceId::DBpedia, config),
        }
    }

    async fn description(&self, resource: &str) -> Option<String> {
        for predicate in [
            format!("{DBO}abstract"),
            format!("{DBO}description"),
            format!("{RDFS}comment"),
        ] {
            if let Some(text) = self.graph.english_literal(resource, &predicate).await {
                return Some(text);
            }
        }
        None
    }

    async fn symptoms(&self, resource: &str) -> Vec<String> {
        let labels = self.graph.labels_of(resource, &format!("{DBO}symptom")).await;
        if !labels.is_empty() {
            return labels;
        }
        dedupe(self.graph.packed_literals(resource, &format!("{DBP}symptoms")).await)
    }

    async fn risk_factors(&self, resource: &str) -> Vec<String> {
        let p0 = format!("{DBO}medicalCause");
        let p1 = format!("{DBP}causes");
        let (causes, cause_literals) = tokio::join!(
            self.graph.labels_of(resource, &p0),
            self.graph.packed_literals(resource, &p1),
        );
        let risks = merge_unique([causes, cause_literals]);
        if !risks.is_empty() {
            return risks;
        }

        let p0 = format!("{DBP}complications");
        let p1 = format!("{DBO}complications");
        let (dbp, dbo) = tokio::join!(
            self.graph.packed_literals(resource, &p0),
            self.graph.packed_literals(resource, &p1),
        );
        merge_unique([dbp, dbo])
    }

    async fn images(&self, resource: &str) -> Vec<String> {
        let query = format!(
            "PREFIX dbo: <{DBO}>\nPREFIX dbp: <{DBP}>\nPREFIX foaf: <{FOAF}>\nPREFIX schema: <{SCHEMA}>\n\
             SELECT DISTINCT ?img WHERE {{\n  {{ <{resource}> dbo:thumbnail ?img . }}\n  UNION {{ <{resource}> foaf:depiction ?img . }}\n  UNION {{ <{resource}> schema:image ?img . }}\n  UNION {{ <{resource}> dbp:image ?img . }}\n}} LIMIT {LIMIT_IMAGES}"
        );
        image::normalize(self.graph.values(query, "img", Lang::Any).await)
    }

    async fn first_value(&self, resource: &str, predicates: &[String]) -> Option<String> {
        for predicate in predicates {
            if let Some(value) = self.graph.any_value(resource, predicate).await {
                return Some(value);
            }
        }
        None
    }

    async fn climates(&self, resource: &str) -> Vec<String> {
        let labels = self.graph.labels_of(resource, &format!("{DBO}climate")).await;
        if !labels.is_empty() {
            return labels;
        }
        dedupe(self.graph.packed_literals(resource, &format!("{DBP}climate")).await)
    }

    async fn industries(&self, resource: &str) -> Vec<String> {
        let p0 = format!("{DBO}industry");
        let p1 = format!("{DBP}industries");
        let p2 = format!("{DBP}industry");
        let (labels, plural, singular) = tokio::join!(
            self.graph.labels_of(resource, &p0),
            self.graph.packed_literals(resource, &p1),
            self.graph.packed_literals(resource, &p2),
        );
        merge_unique([labels, plural, singular])
    }

    async fn cultural_factors(&self, resource: &str) -> Vec<String> {
        let p0 = format!("{DBO}language");
        let p1 = format!("{DBO}officialLanguage");
        let p2 = format!("{DBO}demonym");
        let p3 = format!("{DBP}officialLanguages");
        let p4 = format!("{DBP}officialLanguage");
        let p5 = format!("{DBP}demonym");
        let (languages, official, demonym_labels, official_plural, official_literal, demonyms) = tokio::join!(
            self.graph.labels_of(resource, &p0),
            self.graph.labels_of(resource, &p1),
            self.graph.labels_of(resource, &p2),
            self.graph.packed_literals(resource, &p3),
            self.graph.packed_literals(resource, &p4),
            self.graph.packed_literals(resource, &p5),
        );
        merge_unique([
            languages,
            official,
            demonym_labels,
            official_plural,
            official_literal,
            demonyms,
        ])
    }

    async fn fetch_condition(&self, resource: &str) -> PartialEnrichment {
        let (description, symptoms, risks, images) = tokio::join!(
            self.description(resource),
            self.symptoms(resource),
            self.risk_factors(resource),
            self.images(resource),
        );

        let mut partial = PartialEnrichment::empty(SourceId::DBpedia).with_images(images);
        partial.description = description;
        partial.set_list(ListField::Symptoms, symptoms);
        partial.set_list(ListField::RiskFactors, risks);
        partial
    }

    async fn fetch_region(&self, resource: &str) -> PartialEnrichment {
        let population_predicates = [
            format!("{DBO}populationTotal"),
            format!("{DBP}populationTotal"),
            format!("{DBP}population"),
        ];
        let density_predicates = [
            format!("{DBO}populationDensity"),
            format!("{DBP}populationDensity"),
        ];

        let (description, population, density, climates, industries, cultural, images) = tokio::join!(
            self.description(resource),
            self.first_value(resource, &population_predicates),
            self.first_value(resource, &density_predicates),
            self.climates(resource),
            self.industries(resource),
            self.cultural_factors(resource),
            self.images(resource),
        );

        let mut partial = PartialEnrichment::empty(SourceId::DBpedia).with_images(images);
        partial.description = description;
        partial.set_fact(FactField::PopulationTotal, population);
        partial.set_fact(FactField::PopulationDensity, density);
        partial.set_list(ListField::Climates, climates);
        partial.set_list(ListField::Industries, industries);
        partial.set_list(ListField::CulturalFactors, cultural);
        partial
    }
}

#[async_trait]
impl SourceClient for DbpediaClient {
    fn id(&self) -> SourceId {
        SourceId::DBpedia
    }

    fn family(&self) -> SourceFamily {
        SourceFamily::StructuredGraph
    }

    fn gate(&self) -> Gate {
        Gate::Namespace(DBPEDIA_RESOURCE_MARKER)
    }

    async fn fetch(&self, target: &FetchTarget) -> PartialEnrichment {
        let Some(resource) = target.uri.as_deref() else {
            return PartialEnrichment::empty(SourceId::DBpedia);
        };
        if !is_safe_iri(resource) {
            warn!(uri = %resource, "Refusing to query DBpedia with malformed resource URI");
            return PartialEnrichment::empty(SourceId::DBpedia);
        }

        debug!(entity = %target.reference.id, resource = %resource, "Fetching from DBpedia");
        match target.kind() {
            EntityKind::Condition => self.fetch_condition(resource).await,
            EntityKind::Region => self.fetch_region(resource).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::enrich::types::EntityReference;
    use crate::transport::Term;
    use crate::transport::mock::ScriptedTransport;

    const ASTHMA: &str = "http://dbpedia.org/resource/Asthma";

    fn target(kind: EntityKind) -> FetchTarget {
        let reference =
            EntityReference::new("asthma", "Asthma", kind, vec![ASTHMA.to_string()]);
        FetchTarget::new(reference, Some(ASTHMA.to_string()))
    }

    fn client(transport: ScriptedTransport) -> DbpediaClient {
        DbpediaClient::new(Arc::new(transport), &Config::default().sources.dbpedia)
    }

    #[tokio::test]
    async fn test_condition_fetch() {
        let transport = ScriptedTransport::new()
            .rows(
                "ontology/description",
                "text",
                vec![Term::literal("A chronic airway disease.", Some("en"))],
            )
            .rows(
                "ontology/symptom>",
                "label",
                vec![Term::literal("Wheeze", Some("en"))],
            )
            .rows(
                "property/causes>",
                "value",
                vec![Term::literal("Genetics, air pollution", None)],
            )
            .rows(
                "dbo:thumbnail",
                "img",
                vec![
                    Term::uri("http://commons.wikimedia.org/wiki/Special:FilePath/Asthma.jpg?width=300"),
                    Term::uri("https://commons.wikimedia.org/wiki/File:Asthma.jpg"),
                ],
            );

        let partial = client(transport).fetch(&target(EntityKind::Condition)).await;

        assert_eq!(partial.description.as_deref(), Some("A chronic airway disease."));
        assert_eq!(partial.list(ListField::Symptoms), ["Wheeze".to_string()]);
        assert_eq!(
            partial.list(ListField::RiskFactors),
            ["Genetics".to_string(), "air pollution".to_string()]
        );
        assert_eq!(
            partial.images,
            vec!["https://commons.wikimedia.org/wiki/Special:FilePath/Asthma.jpg".to_string()]
        );
    }

    #[tokio::test]
    async fn test_risk_factors_fall_back_to_complications() {
        let transport = ScriptedTransport::new().rows(
            "ontology/complications>",
            "value",
            vec![Term::literal("Pneumothorax; respiratory failure", Some("en"))],
        );

        let partial = client(transport).fetch(&target(EntityKind::Condition)).await;
        assert_eq!(
            partial.list(ListField::RiskFactors),
            ["Pneumothorax".to_string(), "respiratory failure".to_string()]
        );
        assert!(partial.description.is_none());
    }

    #[tokio::test]
    async fn test_region_fetch() {
        let transport = ScriptedTransport::new()
            .rows(
                "property/population>",
                "value",
                vec![Term::literal("1200000", None)],
            )
            .rows(
                "ontology/populationDensity>",
                "value",
                vec![Term::literal("310.5", None)],
            )
            .rows(
                "property/climate>",
                "value",
                vec![Term::literal("Temperate; oceanic", None)],
            );

        let partial = client(transport).fetch(&target(EntityKind::Region)).await;
        assert_eq!(
            partial.facts.get(&FactField::PopulationTotal).map(String::as_str),
            Some("1200000")
        );
        assert_eq!(
            partial.facts.get(&FactField::PopulationDensity).map(String::as_str),
            Some("310.5")
        );
        assert_eq!(
            partial.list(ListField::Climates),
            ["Temperate".to_string(), "oceanic".to_string()]
        );
    }

    #[tokio::test]
    async fn test_without_uri_issues_no_query() {
        let transport = Arc::new(ScriptedTransport::new());
        let client = DbpediaClient::new(transport.clone(), &Config::default().sources.dbpedia);
        let reference = EntityReference::new("asthma", "Asthma", EntityKind::Condition, vec![]);

        let partial = client.fetch(&FetchTarget::new(reference, None)).await;
        assert!(partial.is_empty());
        assert_eq!(transport.call_count(), 0);
    }
}
