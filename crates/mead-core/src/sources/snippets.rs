//! Locally curated description snippets
//!
//! A snippet is the content of `<dir>/<entity id>.md`, used when no article
//! overview could be fetched.

use std::path::PathBuf;

use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct SnippetStore {
    dir: Option<PathBuf>,
}

impl SnippetStore {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Snippet for an entity; `None` when unconfigured, missing or blank
    pub async fn load(&self, id: &str) -> Option<String> {
        let dir = self.dir.as_ref()?;
        if !is_plain_id(id) {
            warn!(id = %id, "Refusing snippet lookup for id with path components");
            return None;
        }

        let path = dir.join(format!("{}.md", id));
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let content = content.trim();
                (!content.is_empty()).then(|| content.to_string())
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No local snippet");
                None
            }
        }
    }
}

fn is_plain_id(id: &str) -> bool {
    !id.trim().is_empty() && !id.contains(['/', '\\']) && !id.contains("..")
}
