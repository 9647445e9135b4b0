//! Per-field merge of source contributions
//!
//! Each field carries a [`FieldRule`]: a strategy plus a source priority.
//! Partial records are always visited in priority order, so the merged
//! record does not depend on which source task finished first. A source
//! missing from a rule's priority contributes nothing to that field.

use std::collections::BTreeMap;

use tracing::debug;

use super::types::{
    ArticleProvenance, ArticleSection, EntityKind, EntityReference, FactField, ListField,
    MergedEnrichment, PartialEnrichment, SourceId,
};
use crate::config::ExtractionConfig;
use crate::text::{clean_label, dedupe, image, is_ui_friendly, merge_unique};

use SourceId::{DBpedia, WikiDoc, Wikidata, Wikipedia};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// First value that is not blank
    FirstNonBlank,
    /// First list that is non-empty after cleanup
    FirstNonEmptyList,
    /// Concatenation of all lists, de-duplicated
    UnionMerge,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub strategy: Strategy,
    pub priority: Vec<SourceId>,
    pub clean_labels: bool,
    pub ui_filter: bool,
    pub max: Option<usize>,
}

impl FieldRule {
    pub fn new(strategy: Strategy, priority: &[SourceId]) -> Self {
        Self {
            strategy,
            priority: priority.to_vec(),
            clean_labels: false,
            ui_filter: false,
            max: None,
        }
    }

    /// Clean labels and cap the list length
    pub fn labels(mut self, max: usize) -> Self {
        self.clean_labels = true;
        self.max = Some(max);
        self
    }

    /// Cap the list length without touching the values
    pub fn capped(mut self, max: usize) -> Self {
        self.max = Some(max);
        self
    }

    pub fn ui_friendly(mut self) -> Self {
        self.ui_filter = true;
        self
    }

    /// Contributions in priority order
    fn ordered<'a>(
        &'a self,
        partials: &'a [PartialEnrichment],
    ) -> impl Iterator<Item = &'a PartialEnrichment> + 'a {
        self.priority
            .iter()
            .filter_map(move |source| partials.iter().find(|p| p.source == *source))
    }
}

/// Rules for every field of one entity kind
#[derive(Debug, Clone)]
pub struct MergePolicy {
    pub description: FieldRule,
    pub lists: BTreeMap<ListField, FieldRule>,
    pub facts: BTreeMap<FactField, FieldRule>,
    pub images: FieldRule,
    pub sections: Option<FieldRule>,
    pub max_label_length: usize,
}

impl MergePolicy {
    pub fn for_kind(kind: EntityKind, extraction: &ExtractionConfig) -> Self {
        match kind {
            EntityKind::Condition => Self::conditions(extraction),
            EntityKind::Region => Self::regions(extraction),
        }
    }

    pub fn conditions(extraction: &ExtractionConfig) -> Self {
        let max = extraction.max_list_size;
        Self {
            description: FieldRule::new(Strategy::FirstNonBlank, &[DBpedia, Wikidata, WikiDoc]),
            lists: BTreeMap::from([
                (
                    ListField::Symptoms,
                    FieldRule::new(Strategy::FirstNonEmptyList, &[Wikidata, DBpedia, WikiDoc])
                        .labels(max),
                ),
                (
                    ListField::RiskFactors,
                    FieldRule::new(Strategy::UnionMerge, &[Wikidata, DBpedia, WikiDoc])
                        .labels(max)
                        .ui_friendly(),
                ),
            ]),
            facts: BTreeMap::new(),
            images: FieldRule::new(Strategy::UnionMerge, &[Wikidata, DBpedia]).capped(max),
            sections: Some(FieldRule::new(Strategy::FirstNonBlank, &[WikiDoc])),
            max_label_length: extraction.max_label_length,
        }
    }

    pub fn regions(extraction: &ExtractionConfig) -> Self {
        let max = extraction.max_list_size;
        Self {
            description: FieldRule::new(
                Strategy::FirstNonBlank,
                &[DBpedia, Wikidata, Wikipedia, WikiDoc],
            ),
            lists: BTreeMap::from([
                (
                    ListField::Climates,
                    FieldRule::new(Strategy::FirstNonEmptyList, &[Wikidata, DBpedia]).labels(max),
                ),
                (
                    ListField::Industries,
                    FieldRule::new(Strategy::UnionMerge, &[Wikidata, DBpedia]).labels(max),
                ),
                (
                    ListField::CulturalFactors,
                    FieldRule::new(Strategy::UnionMerge, &[Wikidata, DBpedia]).labels(max),
                ),
            ]),
            facts: BTreeMap::from([
                (
                    FactField::PopulationTotal,
                    FieldRule::new(Strategy::FirstNonBlank, &[Wikidata, DBpedia]),
                ),
                // DBpedia publishes density directly; Wikidata's is derived
                (
                    FactField::PopulationDensity,
                    FieldRule::new(Strategy::FirstNonBlank, &[DBpedia, Wikidata]),
                ),
            ]),
            images: FieldRule::new(Strategy::UnionMerge, &[Wikidata, DBpedia]).capped(max),
            sections: None,
            max_label_length: extraction.max_label_length,
        }
    }

    /// Combine the contributions gathered for `reference`
    pub fn merge(
        &self,
        reference: &EntityReference,
        partials: &[PartialEnrichment],
        skipped_sources: Vec<SourceId>,
    ) -> MergedEnrichment {
        let description = first_non_blank(
            self.description
                .ordered(partials)
                .map(|p| p.description.as_deref()),
        );

        let lists = self
            .lists
            .iter()
            .filter_map(|(field, rule)| {
                let merged = self.merge_list(*field, rule, partials);
                (!merged.is_empty()).then_some((*field, merged))
            })
            .collect();

        let facts = self
            .facts
            .iter()
            .filter_map(|(field, rule)| {
                first_non_blank(rule.ordered(partials).map(|p| p.facts.get(field).map(String::as_str)))
                    .map(|value| (*field, value))
            })
            .collect();

        let mut images = image::normalize(
            self.images
                .ordered(partials)
                .flat_map(|p| p.images.iter()),
        );
        if let Some(max) = self.images.max {
            images.truncate(max);
        }

        let (sections, article) = match &self.sections {
            Some(rule) => merge_sections(rule, partials),
            None => (BTreeMap::new(), None),
        };

        let mut contributing_sources: Vec<SourceId> = partials
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| p.source)
            .collect();
        contributing_sources.sort();
        contributing_sources.dedup();

        debug!(
            entity = %reference.id,
            contributing = contributing_sources.len(),
            skipped = skipped_sources.len(),
            "Merged enrichment"
        );

        MergedEnrichment {
            id: reference.id.clone(),
            display_name: reference.display_name.clone(),
            kind: reference.kind,
            external_uris: reference.external_uris.clone(),
            description,
            lists,
            images,
            facts,
            sections,
            article,
            contributing_sources,
            skipped_sources,
        }
    }

    fn merge_list(&self, field: ListField, rule: &FieldRule, partials: &[PartialEnrichment]) -> Vec<String> {
        let cleaned = rule
            .ordered(partials)
            .map(|p| self.clean(rule, p.list(field)))
            .filter(|list| !list.is_empty());

        let mut merged = match rule.strategy {
            Strategy::UnionMerge => merge_unique(cleaned),
            Strategy::FirstNonEmptyList | Strategy::FirstNonBlank => {
                cleaned.into_iter().next().unwrap_or_default()
            }
        };
        if let Some(max) = rule.max {
            merged.truncate(max);
        }
        merged
    }

    fn clean(&self, rule: &FieldRule, values: &[String]) -> Vec<String> {
        let labels = values.iter().filter_map(|value| {
            if rule.clean_labels {
                clean_label(value, self.max_label_length)
            } else {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        });
        dedupe(labels.filter(|label| !rule.ui_filter || is_ui_friendly(label)))
    }
}

fn first_non_blank<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Option<String> {
    values
        .flatten()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

fn merge_sections(
    rule: &FieldRule,
    partials: &[PartialEnrichment],
) -> (BTreeMap<ArticleSection, String>, Option<ArticleProvenance>) {
    let sections = ArticleSection::ALL
        .iter()
        .filter_map(|section| {
            first_non_blank(rule.ordered(partials).map(|p| p.sections.get(section).map(String::as_str)))
                .map(|text| (*section, text))
        })
        .collect();
    let article = rule.ordered(partials).find_map(|p| p.article.clone());
    (sections, article)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::types::ArticleOrigin;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn asthma() -> EntityReference {
        EntityReference::new("asthma", "Asthma", EntityKind::Condition, vec![])
    }

    fn condition_partials() -> Vec<PartialEnrichment> {
        vec![
            PartialEnrichment::empty(WikiDoc)
                .with_description("WikiDoc overview of asthma.")
                .with_list(ListField::Symptoms, strings(&["Wheezing"]))
                .with_list(ListField::RiskFactors, strings(&["obesity", "Smoking"])),
            PartialEnrichment::empty(DBpedia)
                .with_description("   ")
                .with_list(ListField::Symptoms, strings(&["Cough", "wheeze"]))
                .with_list(
                    ListField::RiskFactors,
                    strings(&["Air pollution", "Genetics and environment"]),
                )
                .with_images(strings(&["https://commons.wikimedia.org/wiki/Special:FilePath/B.jpg"])),
            PartialEnrichment::empty(Wikidata)
                .with_description("chronic disease of the airways")
                .with_list(ListField::RiskFactors, strings(&["smoking", "Allergens [3]"]))
                .with_images(strings(&["A.png", "b.JPG"])),
        ]
    }

    #[test]
    fn test_condition_merge() {
        let policy = MergePolicy::conditions(&ExtractionConfig::default());
        let merged = policy.merge(&asthma(), &condition_partials(), vec![]);

        // DBpedia's blank description is skipped
        assert_eq!(merged.description.as_deref(), Some("chronic disease of the airways"));
        // Wikidata has no symptoms, DBpedia is next in line
        assert_eq!(merged.list(ListField::Symptoms), strings(&["Cough", "wheeze"]));
        assert_eq!(
            merged.list(ListField::RiskFactors),
            strings(&["smoking", "Allergens", "Air pollution", "obesity"])
        );
        assert_eq!(
            merged.images,
            strings(&[
                "https://commons.wikimedia.org/wiki/Special:FilePath/A.png",
                "https://commons.wikimedia.org/wiki/Special:FilePath/b.JPG",
            ])
        );
        assert_eq!(merged.contributing_sources, vec![DBpedia, Wikidata, WikiDoc]);
    }

    #[test]
    fn test_merge_is_independent_of_completion_order() {
        let policy = MergePolicy::conditions(&ExtractionConfig::default());
        let forward = condition_partials();
        let mut reversed = forward.clone();
        reversed.reverse();

        assert_eq!(
            policy.merge(&asthma(), &forward, vec![]),
            policy.merge(&asthma(), &reversed, vec![])
        );
    }

    #[test]
    fn test_list_cap() {
        let extraction = ExtractionConfig {
            max_list_size: 2,
            ..ExtractionConfig::default()
        };
        let partials = vec![
            PartialEnrichment::empty(Wikidata)
                .with_list(ListField::RiskFactors, strings(&["Smoking", "Obesity", "Pollen"])),
        ];
        let merged = MergePolicy::conditions(&extraction).merge(&asthma(), &partials, vec![]);
        assert_eq!(merged.list(ListField::RiskFactors), strings(&["Smoking", "Obesity"]));
    }

    #[test]
    fn test_image_cap() {
        let extraction = ExtractionConfig {
            max_list_size: 2,
            ..ExtractionConfig::default()
        };
        let partials = vec![
            PartialEnrichment::empty(Wikidata).with_images(strings(&["A.png", "B.png"])),
            PartialEnrichment::empty(DBpedia).with_images(strings(&["C.png"])),
        ];
        let reference = EntityReference::new("paris", "Paris", EntityKind::Region, vec![]);

        let merged = MergePolicy::regions(&extraction).merge(&reference, &partials, vec![]);
        assert_eq!(
            merged.images,
            strings(&[
                "https://commons.wikimedia.org/wiki/Special:FilePath/A.png",
                "https://commons.wikimedia.org/wiki/Special:FilePath/B.png",
            ])
        );
        let merged = MergePolicy::conditions(&extraction).merge(&asthma(), &partials, vec![]);
        assert_eq!(merged.images.len(), 2);
    }

    #[test]
    fn test_region_density_prefers_dbpedia() {
        let reference = EntityReference::new("paris", "Paris", EntityKind::Region, vec![]);
        let partials = vec![
            PartialEnrichment::empty(Wikidata)
                .with_fact(FactField::PopulationTotal, "2165423")
                .with_fact(FactField::PopulationDensity, "20544.81")
                .with_list(ListField::Climates, strings(&["oceanic climate"])),
            PartialEnrichment::empty(DBpedia)
                .with_fact(FactField::PopulationTotal, "2148271")
                .with_fact(FactField::PopulationDensity, "20000")
                .with_list(ListField::Climates, strings(&["Cfb"])),
            PartialEnrichment::empty(Wikipedia).with_description("Paris is the capital of France."),
        ];

        let merged = MergePolicy::regions(&ExtractionConfig::default()).merge(&reference, &partials, vec![]);
        assert_eq!(merged.fact(FactField::PopulationTotal), Some("2165423"));
        assert_eq!(merged.fact(FactField::PopulationDensity), Some("20000"));
        assert_eq!(merged.list(ListField::Climates), strings(&["oceanic climate"]));
        assert_eq!(merged.description.as_deref(), Some("Paris is the capital of France."));
    }

    #[test]
    fn test_sources_outside_priority_are_ignored() {
        let partials = vec![
            PartialEnrichment::empty(Wikipedia).with_description("Not used for conditions."),
        ];
        let merged = MergePolicy::conditions(&ExtractionConfig::default()).merge(&asthma(), &partials, vec![]);
        assert!(merged.description.is_none());
    }

    #[test]
    fn test_sections_and_provenance_from_wikidoc() {
        let mut wikidoc = PartialEnrichment::empty(WikiDoc);
        wikidoc
            .sections
            .insert(ArticleSection::Treatment, "Inhaled corticosteroids.".to_string());
        wikidoc.article = Some(ArticleProvenance {
            source_url: "https://www.wikidoc.org/index.php/Asthma".to_string(),
            origin: ArticleOrigin::Api,
        });

        let merged = MergePolicy::conditions(&ExtractionConfig::default()).merge(
            &asthma(),
            &[wikidoc],
            vec![DBpedia, Wikidata],
        );
        assert_eq!(
            merged.sections.get(&ArticleSection::Treatment).map(String::as_str),
            Some("Inhaled corticosteroids.")
        );
        assert_eq!(merged.article.map(|a| a.origin), Some(ArticleOrigin::Api));
        assert_eq!(merged.skipped_sources, vec![DBpedia, Wikidata]);
    }
}
