//! CLI tests

use super::*;
use clap::CommandFactory;
use mead_core::enrich::{EntityKind, SourceId};
use std::collections::BTreeMap;

fn merged() -> MergedEnrichment {
    MergedEnrichment {
        id: "asthma".to_string(),
        display_name: "Asthma".to_string(),
        kind: EntityKind::Condition,
        external_uris: vec![],
        description: Some("A chronic airway disease.".to_string()),
        lists: BTreeMap::from([(
            ListField::Symptoms,
            vec!["Wheezing".to_string(), "Cough".to_string()],
        )]),
        images: vec![],
        facts: BTreeMap::new(),
        sections: BTreeMap::from([
            (ArticleSection::Overview, "A chronic airway disease.".to_string()),
            (ArticleSection::Treatment, "Inhaled corticosteroids.".to_string()),
        ]),
        article: None,
        contributing_sources: vec![SourceId::Wikidata, SourceId::WikiDoc],
        skipped_sources: vec![SourceId::DBpedia],
    }
}

#[test]
fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn test_parse_enrich_with_global_flags() {
    let cli = Cli::try_parse_from(["mead", "enrich", "asthma", "--format", "json", "--store", "facts.json"])
        .unwrap();
    assert!(matches!(cli.format, OutputFormat::Json));
    assert_eq!(cli.store, Some(PathBuf::from("facts.json")));
    assert!(matches!(cli.command, Commands::Enrich { ref id } if id == "asthma"));
}

#[test]
fn test_render_text() {
    let text = render_text(&merged());
    assert!(text.starts_with("Asthma (asthma, condition)\n"));
    assert!(text.contains("Symptoms:\n  - Wheezing\n  - Cough\n"));
    assert!(text.contains("## Treatment\nInhaled corticosteroids.\n"));
    assert!(!text.contains("## Overview"));
    assert!(text.contains("Sources: wikidata, wikidoc\nSkipped: dbpedia\n"));
}

#[test]
fn test_render_text_without_sources() {
    let mut record = merged();
    record.contributing_sources.clear();
    record.skipped_sources.clear();
    assert!(render_text(&record).contains("Sources: none\nSkipped: none\n"));
}
