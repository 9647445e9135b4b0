//! Enrichment data model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// External knowledge sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceId {
    DBpedia,
    Wikidata,
    WikiDoc,
    Wikipedia,
}

impl SourceId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DBpedia => "dbpedia",
            Self::Wikidata => "wikidata",
            Self::WikiDoc => "wikidoc",
            Self::Wikipedia => "wikipedia",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which family of local entity is being enriched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    #[default]
    Condition,
    Region,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Condition => f.write_str("condition"),
            Self::Region => f.write_str("region"),
        }
    }
}

/// A locally curated entity and its links to external graphs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReference {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub kind: EntityKind,
    #[serde(default)]
    pub external_uris: Vec<String>,
}

impl EntityReference {
    /// Create a reference; `external_uris` keeps its order with exact duplicates removed
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        kind: EntityKind,
        external_uris: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut uris: Vec<String> = Vec::new();
        for uri in external_uris {
            if !uris.contains(&uri) {
                uris.push(uri);
            }
        }
        Self {
            id: id.into(),
            display_name: display_name.into(),
            kind,
            external_uris: uris,
        }
    }

    /// First reference URI containing `marker`
    pub fn uri_matching(&self, marker: &str) -> Option<&str> {
        self.external_uris
            .iter()
            .map(String::as_str)
            .find(|uri| uri.contains(marker))
    }

    /// Display name, or the id when the name is blank
    pub fn title_base(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.id
        } else {
            &self.display_name
        }
    }
}

/// Multi-valued fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListField {
    Symptoms,
    RiskFactors,
    Climates,
    Industries,
    CulturalFactors,
}

/// Single scalar facts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactField {
    PopulationTotal,
    PopulationDensity,
}

/// Named sections of a medical article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArticleSection {
    Overview,
    Causes,
    Pathophysiology,
    Diagnosis,
    Treatment,
    Prevention,
    Prognosis,
    Epidemiology,
}

impl ArticleSection {
    pub const ALL: [ArticleSection; 8] = [
        Self::Overview,
        Self::Causes,
        Self::Pathophysiology,
        Self::Diagnosis,
        Self::Treatment,
        Self::Prevention,
        Self::Prognosis,
        Self::Epidemiology,
    ];

    /// Heading synonyms tried in order; empty for the introduction
    pub fn headings(&self) -> &'static [&'static str] {
        match self {
            Self::Overview => &[],
            Self::Causes => &["Causes", "Etiology", "Cause"],
            Self::Pathophysiology => &["Pathophysiology", "Pathogenesis"],
            Self::Diagnosis => &["Diagnosis", "Differential Diagnosis", "Diagnostic"],
            Self::Treatment => &["Treatment", "Therapy", "Management"],
            Self::Prevention => &["Prevention", "Prophylaxis"],
            Self::Prognosis => &["Prognosis", "Outcome"],
            Self::Epidemiology => &["Epidemiology", "Demographics"],
        }
    }
}

/// Where article text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleOrigin {
    Api,
    Local,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleProvenance {
    pub source_url: String,
    pub origin: ArticleOrigin,
}

/// What one source contributed for one entity
///
/// Every field is independently optional; an all-empty record is the
/// normal result of a failed or unproductive source.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialEnrichment {
    pub source: SourceId,
    pub description: Option<String>,
    pub lists: BTreeMap<ListField, Vec<String>>,
    pub images: Vec<String>,
    pub facts: BTreeMap<FactField, String>,
    pub sections: BTreeMap<ArticleSection, String>,
    pub article: Option<ArticleProvenance>,
}

impl PartialEnrichment {
    pub fn empty(source: SourceId) -> Self {
        Self {
            source,
            description: None,
            lists: BTreeMap::new(),
            images: Vec::new(),
            facts: BTreeMap::new(),
            sections: BTreeMap::new(),
            article: None,
        }
    }

    /// True when no field carries a value
    pub fn is_empty(&self) -> bool {
        self.description.as_deref().is_none_or(|d| d.trim().is_empty())
            && self.lists.values().all(Vec::is_empty)
            && self.images.is_empty()
            && self.facts.is_empty()
            && self.sections.is_empty()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_list(mut self, field: ListField, values: Vec<String>) -> Self {
        self.set_list(field, values);
        self
    }

    pub fn with_fact(mut self, field: FactField, value: impl Into<String>) -> Self {
        self.facts.insert(field, value.into());
        self
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }

    /// Store a list, leaving the field absent when `values` is empty
    pub fn set_list(&mut self, field: ListField, values: Vec<String>) {
        if values.is_empty() {
            self.lists.remove(&field);
        } else {
            self.lists.insert(field, values);
        }
    }

    pub fn set_fact(&mut self, field: FactField, value: Option<String>) {
        match value.filter(|v| !v.trim().is_empty()) {
            Some(v) => {
                self.facts.insert(field, v);
            }
            None => {
                self.facts.remove(&field);
            }
        }
    }

    pub fn list(&self, field: ListField) -> &[String] {
        self.lists.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Final per-field result for one entity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedEnrichment {
    pub id: String,
    pub display_name: String,
    pub kind: EntityKind,
    pub external_uris: Vec<String>,
    pub description: Option<String>,
    pub lists: BTreeMap<ListField, Vec<String>>,
    pub images: Vec<String>,
    pub facts: BTreeMap<FactField, String>,
    pub sections: BTreeMap<ArticleSection, String>,
    pub article: Option<ArticleProvenance>,
    /// Sources that contributed at least one field
    pub contributing_sources: Vec<SourceId>,
    /// Gated sources not invoked for lack of a matching URI
    pub skipped_sources: Vec<SourceId>,
}

impl MergedEnrichment {
    pub fn list(&self, field: ListField) -> &[String] {
        self.lists.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fact(&self, field: FactField) -> Option<&str> {
        self.facts.get(&field).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_dedupes_uris_in_order() {
        let reference = EntityReference::new(
            "asthma",
            "Asthma",
            EntityKind::Condition,
            vec![
                "http://www.wikidata.org/entity/Q35869".to_string(),
                "http://dbpedia.org/resource/Asthma".to_string(),
                "http://www.wikidata.org/entity/Q35869".to_string(),
            ],
        );
        assert_eq!(reference.external_uris.len(), 2);
        assert_eq!(
            reference.uri_matching("dbpedia.org/resource/"),
            Some("http://dbpedia.org/resource/Asthma")
        );
        assert_eq!(reference.uri_matching("example.org/"), None);
    }

    #[test]
    fn test_title_base_falls_back_to_id() {
        let reference = EntityReference::new("type-2-diabetes", "  ", EntityKind::Condition, vec![]);
        assert_eq!(reference.title_base(), "type-2-diabetes");
    }

    #[test]
    fn test_partial_is_empty() {
        let mut partial = PartialEnrichment::empty(SourceId::Wikidata);
        assert!(partial.is_empty());

        partial.set_list(ListField::Symptoms, vec![]);
        partial.set_fact(FactField::PopulationTotal, Some("  ".to_string()));
        assert!(partial.is_empty());

        let partial = partial.with_list(ListField::Symptoms, vec!["Cough".to_string()]);
        assert!(!partial.is_empty());
        assert_eq!(partial.list(ListField::Symptoms), ["Cough".to_string()]);
    }

    #[test]
    fn test_serialized_field_names() {
        let json = serde_json::to_string(&ListField::RiskFactors).unwrap();
        assert_eq!(json, "\"risk_factors\"");
        let json = serde_json::to_string(&SourceId::DBpedia).unwrap();
        assert_eq!(json, "\"dbpedia\"");
        let json = serde_json::to_string(&ArticleOrigin::Local).unwrap();
        assert_eq!(json, "\"local\"");
    }

    #[test]
    fn test_section_headings() {
        assert!(ArticleSection::Overview.headings().is_empty());
        assert_eq!(ArticleSection::Causes.headings()[1], "Etiology");
    }
}
