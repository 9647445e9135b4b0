//! WikiDoc article source

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::mediawiki::{MediaWikiApi, title_candidates};
use super::snippets::SnippetStore;
use super::{FetchTarget, Gate, SourceClient, SourceFamily};
use crate::config::SourceConfig;
use crate::enrich::types::{
    ArticleOrigin, ArticleProvenance, ArticleSection, EntityKind, ListField, PartialEnrichment,
    SourceId,
};
use crate::text::{
    extract_list, extract_paragraphs, extract_section, fragment_items, fragment_text, merge_unique,
    truncate,
};
use crate::transport::Transport;

const SYMPTOM_HEADINGS: &[&str] = &["Signs and symptoms", "Symptoms"];
const CAUSE_HEADINGS: &[&str] = &["Causes", "Etiology"];
const RISK_HEADINGS: &[&str] = &["Risk factors", "Risk Factors"];
const OVERVIEW_HEADINGS: &[&str] = &["Overview"];

/// WikiDoc splits large articles into `<Title>_<suffix>` subpages
const OVERVIEW_SUBPAGE: &str = "overview";
const CAUSES_SUBPAGE: &str = "causes";
const RISK_FACTORS_SUBPAGE: &str = "risk_factors";

/// Headings tried on a subpage, whose lead section is often just "Overview"
fn subpage_headings(headings: &[&'static str]) -> Vec<&'static str> {
    headings.iter().copied().chain(OVERVIEW_HEADINGS.iter().copied()).collect()
}

fn subpage(title: &str, suffix: &str) -> String {
    format!("{}_{}", title, suffix)
}

fn non_empty_or(items: Vec<String>, fallback: impl FnOnce() -> Vec<String>) -> Vec<String> {
    if items.is_empty() {
        fallback()
    } else {
        items
    }
}

/// Article text scraped from WikiDoc
pub struct WikidocClient {
    api: MediaWikiApi,
    endpoint: String,
    char_budget: usize,
    snippets: SnippetStore,
}

impl WikidocClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: &SourceConfig,
        char_budget: usize,
        snippets: SnippetStore,
    ) -> Self {
        Self {
            api: MediaWikiApi::new(transport, SourceId::WikiDoc, config.endpoint.clone(), config),
            endpoint: config.endpoint.clone(),
            char_budget,
            snippets,
        }
    }

    /// Human-facing page URL for a title
    pub fn page_url(&self, title: &str) -> String {
        match self.endpoint.strip_suffix("api.php") {
            Some(base) => format!("{}index.php/{}", base, title),
            None => format!("{}/index.php/{}", self.endpoint.trim_end_matches('/'), title),
        }
    }

    /// Canonical title for a candidate, or the candidate itself
    async fn resolve_title(&self, candidate: &str) -> String {
        self.api
            .resolve_redirect(candidate)
            .await
            .unwrap_or_else(|| candidate.to_string())
    }

    async fn fetch_condition(&self, target: &FetchTarget) -> PartialEnrichment {
        let candidates = title_candidates(&target.reference);
        let mut partial = PartialEnrichment::empty(SourceId::WikiDoc);

        for candidate in &candidates {
            let title = self.resolve_title(candidate).await;
            let overview_page = subpage(&title, OVERVIEW_SUBPAGE);
            let causes_page = subpage(&title, CAUSES_SUBPAGE);
            let risks_page = subpage(&title, RISK_FACTORS_SUBPAGE);
            let (html, subpage_overview, subpage_causes, subpage_risks) = tokio::join!(
                self.api.parse_html(&title),
                self.subpage_text(&overview_page, OVERVIEW_HEADINGS),
                self.subpage_items(&causes_page, CAUSE_HEADINGS),
                self.subpage_items(&risks_page, RISK_HEADINGS),
            );
            let html = html.unwrap_or_default();

            let Some(overview) = subpage_overview.or_else(|| self.page_overview(&html)) else {
                debug!(title = %title, "WikiDoc article has no usable overview");
                continue;
            };

            let mut sections = self.sections(&html);
            sections.insert(ArticleSection::Overview, overview.clone());
            let causes = non_empty_or(subpage_causes, || extract_list(&html, CAUSE_HEADINGS));
            let risks = non_empty_or(subpage_risks, || extract_list(&html, RISK_HEADINGS));

            partial.description = Some(overview);
            partial.sections = sections;
            partial.set_list(ListField::Symptoms, extract_list(&html, SYMPTOM_HEADINGS));
            partial.set_list(ListField::RiskFactors, merge_unique([causes, risks]));
            partial.article = Some(ArticleProvenance {
                source_url: self.page_url(&title),
                origin: ArticleOrigin::Api,
            });
            return partial;
        }

        let source_url = candidates
            .first()
            .map(|title| self.page_url(title))
            .unwrap_or_default();
        let origin = match self.snippets.load(&target.reference.id).await {
            Some(snippet) => {
                debug!(entity = %target.reference.id, "Using local WikiDoc snippet");
                partial.description = Some(snippet);
                ArticleOrigin::Local
            }
            None => ArticleOrigin::None,
        };
        partial.article = Some(ArticleProvenance { source_url, origin });
        partial
    }

    /// Overview of a full article: an "Overview" section, else the introduction
    fn page_overview(&self, html: &str) -> Option<String> {
        if html.is_empty() {
            return None;
        }
        extract_section(html, OVERVIEW_HEADINGS, self.char_budget)
            .or_else(|| extract_section(html, &[], self.char_budget))
    }

    /// Prose of a subpage section found through the section index, falling
    /// back to the subpage's own overview
    async fn subpage_text(&self, page: &str, headings: &[&'static str]) -> Option<String> {
        if let Some(fragment) = self.api.section_html(page, headings).await
            && let Some(text) = fragment_text(&fragment, self.char_budget)
        {
            return Some(text);
        }
        let html = self.api.parse_html(page).await?;
        extract_section(&html, &[], self.char_budget)
    }

    /// List items of a subpage section found through the section index
    async fn subpage_items(&self, page: &str, headings: &[&'static str]) -> Vec<String> {
        match self.api.section_html(page, &subpage_headings(headings)).await {
            Some(fragment) => fragment_items(&fragment),
            None => Vec::new(),
        }
    }

    fn sections(&self, html: &str) -> BTreeMap<ArticleSection, String> {
        ArticleSection::ALL
            .iter()
            .filter_map(|section| {
                extract_section(html, section.headings(), self.char_budget)
                    .map(|text| (*section, text))
            })
            .collect()
    }

    async fn fetch_region(&self, target: &FetchTarget) -> PartialEnrichment {
        for candidate in title_candidates(&target.reference) {
            let title = self.resolve_title(&candidate).await;
            let Some(html) = self.api.parse_html(&title).await else {
                continue;
            };
            if let Some(first) = extract_paragraphs(&html).into_iter().next() {
                return PartialEnrichment::empty(SourceId::WikiDoc)
                    .with_description(truncate(&first, self.char_budget));
            }
        }
        PartialEnrichment::empty(SourceId::WikiDoc)
    }
}

#[async_trait]
impl SourceClient for WikidocClient {
    fn id(&self) -> SourceId {
        SourceId::WikiDoc
    }

    fn family(&self) -> SourceFamily {
        SourceFamily::ScrapedArticle
    }

    fn gate(&self) -> Gate {
        Gate::Ungated
    }

    async fn fetch(&self, target: &FetchTarget) -> PartialEnrichment {
        debug!(entity = %target.reference.id, "Fetching from WikiDoc");
        match target.kind() {
            EntityKind::Condition => self.fetch_condition(target).await,
            EntityKind::Region => self.fetch_region(target).await,
        }
    }
}
