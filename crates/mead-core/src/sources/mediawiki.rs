//! MediaWiki action API calls shared by the article sources

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::enrich::types::{EntityReference, SourceId};
use crate::text::page_title;
use crate::transport::{self, TextRequest, Transport};

/// Page titles to try for an entity: display name first, then id
pub fn title_candidates(reference: &EntityReference) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();
    for title in [page_title(reference.title_base()), page_title(&reference.id)]
        .into_iter()
        .flatten()
    {
        if !candidates.contains(&title) {
            candidates.push(title);
        }
    }
    candidates
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: Option<ParseBody>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ParseBody {
    text: ParseText,
}

#[derive(Debug, Deserialize)]
struct ParseText {
    #[serde(rename = "*")]
    html: String,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: String,
}

#[derive(Debug, Deserialize)]
struct SectionsResponse {
    parse: Option<SectionsBody>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct SectionsBody {
    #[serde(default)]
    sections: Vec<SectionEntry>,
}

#[derive(Debug, Deserialize)]
struct SectionEntry {
    #[serde(default)]
    line: String,
    /// A string in MediaWiki output, occasionally a number
    #[serde(default)]
    index: serde_json::Value,
}

impl SectionEntry {
    fn index(&self) -> Option<String> {
        match &self.index {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Whether a section line names `heading`, either exactly or by containing it
fn heading_matches(line: &str, heading: &str) -> bool {
    let line = line.trim().to_lowercase();
    let heading = heading.trim().to_lowercase();
    !heading.is_empty() && line.contains(&heading)
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: HashMap<String, QueryPage>,
}

#[derive(Debug, Deserialize)]
struct QueryPage {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    missing: Option<serde_json::Value>,
}

/// Client for one wiki's `api.php`
#[derive(Clone)]
pub struct MediaWikiApi {
    transport: Arc<dyn Transport>,
    source: SourceId,
    api_url: String,
    user_agent: String,
    timeout: Duration,
}

impl MediaWikiApi {
    pub fn new(
        transport: Arc<dyn Transport>,
        source: SourceId,
        api_url: impl Into<String>,
        config: &SourceConfig,
    ) -> Self {
        Self {
            transport,
            source,
            api_url: api_url.into(),
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    fn request(&self) -> TextRequest {
        TextRequest::new(self.api_url.clone(), self.user_agent.clone(), self.timeout)
    }

    async fn get(&self, request: TextRequest, what: &str) -> Option<String> {
        match transport::get_text(self.transport.as_ref(), &request).await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(source = %self.source, kind = e.kind(), error = %e, "{} request failed", what);
                None
            }
        }
    }

    /// Canonical title after following redirects; `None` if the page is missing
    pub async fn resolve_redirect(&self, title: &str) -> Option<String> {
        let request = self
            .request()
            .param("action", "query")
            .param("titles", title)
            .param("redirects", "1")
            .param("format", "json");
        let body = self.get(request, "Redirect lookup").await?;

        let response: QueryResponse = match serde_json::from_str(&body) {
            Ok(r) => r,
            Err(e) => {
                debug!(source = %self.source, title = %title, error = %e, "Unreadable redirect response");
                return None;
            }
        };
        response
            .query?
            .pages
            .into_values()
            .filter(|page| page.missing.is_none())
            .filter_map(|page| page.title)
            .find(|t| !t.trim().is_empty())
            .map(|t| t.replace(' ', "_"))
    }

    /// Rendered HTML of a page via `action=parse`
    pub async fn parse_html(&self, title: &str) -> Option<String> {
        self.parse_text(title, None).await
    }

    /// Rendered HTML of one section of a page, by its section index
    pub async fn parse_section_html(&self, title: &str, index: &str) -> Option<String> {
        self.parse_text(title, Some(index)).await
    }

    async fn parse_text(&self, title: &str, section: Option<&str>) -> Option<String> {
        let mut request = self
            .request()
            .param("action", "parse")
            .param("page", title)
            .param("prop", "text")
            .param("format", "json");
        if let Some(index) = section {
            request = request.param("section", index);
        }
        let body = self.get(request, "Parse").await?;

        let response: ParseResponse = match serde_json::from_str(&body) {
            Ok(r) => r,
            Err(e) => {
                warn!(source = %self.source, title = %title, error = %e, "Unreadable parse response");
                return None;
            }
        };
        if let Some(error) = response.error {
            debug!(source = %self.source, title = %title, code = %error.code, "Page not available");
            return None;
        }
        response
            .parse
            .map(|p| p.text.html)
            .filter(|html| !html.trim().is_empty())
    }

    /// Index of the page section named by the earliest matching heading.
    ///
    /// Headings are tried in order; a section matches when its line contains
    /// the heading, ignoring case.
    pub async fn section_index(&self, title: &str, headings: &[&str]) -> Option<String> {
        let request = self
            .request()
            .param("action", "parse")
            .param("page", title)
            .param("prop", "sections")
            .param("format", "json");
        let body = self.get(request, "Section lookup").await?;

        let response: SectionsResponse = match serde_json::from_str(&body) {
            Ok(r) => r,
            Err(e) => {
                debug!(source = %self.source, title = %title, error = %e, "Unreadable sections response");
                return None;
            }
        };
        if let Some(error) = response.error {
            debug!(source = %self.source, title = %title, code = %error.code, "Page not available");
            return None;
        }
        let sections = response.parse?.sections;
        headings.iter().find_map(|heading| {
            sections
                .iter()
                .filter(|section| heading_matches(&section.line, heading))
                .find_map(SectionEntry::index)
        })
    }

    /// HTML of the first section named by `headings`, looked up by index
    pub async fn section_html(&self, title: &str, headings: &[&str]) -> Option<String> {
        let index = self.section_index(title, headings).await?;
        debug!(source = %self.source, title = %title, index = %index, "Fetching section");
        self.parse_section_html(title, &index).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::transport::mock::ScriptedTransport;

    fn api(transport: ScriptedTransport) -> MediaWikiApi {
        MediaWikiApi::new(
            Arc::new(transport),
            SourceId::WikiDoc,
            "https://www.wikidoc.org/api.php",
            &Config::default().sources.wikidoc,
        )
    }

    #[test]
    fn test_title_candidates() {
        use crate::enrich::types::EntityKind;

        let reference = EntityReference::new("ile-de-france", "Île-de-France", EntityKind::Region, vec![]);
        assert_eq!(title_candidates(&reference), vec!["Île_de_France", "Ile_De_France"]);

        let reference = EntityReference::new("asthma", "asthma", EntityKind::Condition, vec![]);
        assert_eq!(title_candidates(&reference), vec!["Asthma"]);
    }

    #[tokio::test]
    async fn test_resolve_redirect() {
        let transport = ScriptedTransport::new().text(
            "action=query",
            r#"{"query":{"redirects":[{"from":"Heart attack","to":"Myocardial infarction"}],
                "pages":{"-1":{"title":"Bogus","missing":""},"4567":{"title":"Myocardial infarction"}}}}"#,
        );
        assert_eq!(
            api(transport).resolve_redirect("Heart_attack").await.as_deref(),
            Some("Myocardial_infarction")
        );
    }

    #[tokio::test]
    async fn test_resolve_redirect_missing_page() {
        let transport = ScriptedTransport::new().text(
            "action=query",
            r#"{"query":{"pages":{"-1":{"title":"Nope","missing":""}}}}"#,
        );
        assert!(api(transport).resolve_redirect("Nope").await.is_none());
    }

    const SECTIONS: &str = r#"{"parse":{"title":"Asthma risk factors","sections":[
        {"toclevel":1,"level":"2","line":"Overview","number":"1","index":"1","anchor":"Overview"},
        {"toclevel":1,"level":"2","line":"Common <i>Risk Factors</i>","number":"2","index":"2","anchor":"Common_Risk_Factors"},
        {"toclevel":1,"level":"2","line":"References","number":"3","index":3,"anchor":"References"}]}}"#;

    #[tokio::test]
    async fn test_section_index_prefers_earlier_headings() {
        let api = api(ScriptedTransport::new().text("prop=sections", SECTIONS));

        let index = api
            .section_index("Asthma_risk_factors", &["Risk factors", "Overview"])
            .await;
        assert_eq!(index.as_deref(), Some("2"));

        let index = api.section_index("Asthma_risk_factors", &["references"]).await;
        assert_eq!(index.as_deref(), Some("3"));

        assert!(api.section_index("Asthma_risk_factors", &["Prognosis"]).await.is_none());
    }

    #[tokio::test]
    async fn test_section_html_fetches_by_index() {
        let transport = ScriptedTransport::new()
            .text("page=Asthma_risk_factors&prop=sections", SECTIONS)
            .text(
                "page=Asthma_risk_factors&prop=text&format=json&section=2",
                r#"{"parse":{"text":{"*":"<h2>Risk Factors</h2><ul><li>Obesity</li></ul>"}}}"#,
            );
        let api = api(transport);

        assert_eq!(
            api.section_html("Asthma_risk_factors", &["Risk factors"]).await.as_deref(),
            Some("<h2>Risk Factors</h2><ul><li>Obesity</li></ul>")
        );
        // Known section, but its text request is not answered
        assert!(api.section_html("Asthma_risk_factors", &["Overview"]).await.is_none());
    }

    #[tokio::test]
    async fn test_section_index_missing_page() {
        let transport = ScriptedTransport::new().text(
            "prop=sections",
            r#"{"error":{"code":"missingtitle","info":"The page you specified doesn't exist."}}"#,
        );
        assert!(api(transport).section_index("Nope", &["Overview"]).await.is_none());
    }

    #[tokio::test]
    async fn test_parse_html() {
        let transport = ScriptedTransport::new()
            .text("page=Asthma&", r#"{"parse":{"title":"Asthma","text":{"*":"<p>Body</p>"}}}"#)
            .text(
                "page=Nope&",
                r#"{"error":{"code":"missingtitle","info":"The page you specified doesn't exist."}}"#,
            );
        let api = api(transport);
        assert_eq!(api.parse_html("Asthma").await.as_deref(), Some("<p>Body</p>"));
        assert!(api.parse_html("Nope").await.is_none());
        assert!(api.parse_html("Unscripted").await.is_none());
    }
}
