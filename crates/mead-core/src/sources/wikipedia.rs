//! Wikipedia page summaries for regions

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::mediawiki::{MediaWikiApi, title_candidates};
use super::{FetchTarget, Gate, SourceClient, SourceFamily};
use crate::config::SourceConfig;
use crate::enrich::types::{EntityKind, PartialEnrichment, SourceId};
use crate::text::article::is_placeholder;
use crate::text::normalize::collapse_whitespace;
use crate::transport::{self, TextRequest, Transport};

#[derive(Debug, Deserialize)]
struct Summary {
    #[serde(default, rename = "type")]
    page_type: String,
    #[serde(default)]
    extract: Option<String>,
}

pub struct WikipediaClient {
    transport: Arc<dyn Transport>,
    api: MediaWikiApi,
    summary_base: String,
    user_agent: String,
    timeout: Duration,
}

impl WikipediaClient {
    /// `config.endpoint` is the site root, e.g. `https://en.wikipedia.org`
    pub fn new(transport: Arc<dyn Transport>, config: &SourceConfig) -> Self {
        let root = config.endpoint.trim_end_matches('/');
        Self {
            api: MediaWikiApi::new(
                transport.clone(),
                SourceId::Wikipedia,
                format!("{}/w/api.php", root),
                config,
            ),
            transport,
            summary_base: format!("{}/api/rest_v1/page/summary/", root),
            user_agent: config.user_agent.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    async fn summary(&self, title: &str) -> Option<String> {
        let url = format!("{}{}", self.summary_base, urlencoding::encode(title));
        let request = TextRequest::new(url, self.user_agent.clone(), self.timeout);
        let body = match transport::get_text(self.transport.as_ref(), &request).await {
            Ok(body) => body,
            Err(e) => {
                warn!(source = "wikipedia", title = %title, kind = e.kind(), error = %e, "Summary request failed");
                return None;
            }
        };

        let summary: Summary = match serde_json::from_str(&body) {
            Ok(s) => s,
            Err(e) => {
                debug!(title = %title, error = %e, "Unreadable summary response");
                return None;
            }
        };
        if summary.page_type.eq_ignore_ascii_case("disambiguation") {
            debug!(title = %title, "Skipping disambiguation page");
            return None;
        }
        let extract = collapse_whitespace(summary.extract.as_deref()?);
        (!extract.is_empty() && !is_placeholder(&extract)).then_some(extract)
    }
}

#[async_trait]
impl SourceClient for WikipediaClient {
    fn id(&self) -> SourceId {
        SourceId::Wikipedia
    }

    fn family(&self) -> SourceFamily {
        SourceFamily::ScrapedArticle
    }

    fn gate(&self) -> Gate {
        Gate::Ungated
    }

    fn supports(&self, kind: EntityKind) -> bool {
        kind == EntityKind::Region
    }

    async fn fetch(&self, target: &FetchTarget) -> PartialEnrichment {
        let mut partial = PartialEnrichment::empty(SourceId::Wikipedia);
        if !self.supports(target.kind()) {
            return partial;
        }

        for candidate in title_candidates(&target.reference) {
            let title = self
                .api
                .resolve_redirect(&candidate)
                .await
                .unwrap_or(candidate);
            if let Some(summary) = self.summary(&title).await {
                partial.description = Some(summary);
                break;
            }
        }
        partial
    }
}
