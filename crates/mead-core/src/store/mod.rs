//! Local fact store
//!
//! Maps a local entity id to its display name and reference URIs. The
//! store is read-only while serving; [`FactStore::reload`] re-reads the
//! backing file as an explicit out-of-band step.
//!
//! # File format
//!
//! A JSON array of entity records:
//! ```json
//! [
//!   {
//!     "id": "asthma",
//!     "display_name": "Asthma",
//!     "kind": "condition",
//!     "external_uris": [
//!       "http://www.wikidata.org/entity/Q35869",
//!       "http://dbpedia.org/resource/Asthma"
//!     ]
//!   }
//! ]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::enrich::types::EntityReference;
use crate::error::Error;
use crate::Result;

/// Lookup of locally curated entities
#[async_trait]
pub trait FactStore: Send + Sync {
    /// The entity with this id, if known
    async fn get(&self, id: &str) -> Result<Option<EntityReference>>;

    /// Every entity, ordered by id
    async fn list(&self) -> Result<Vec<EntityReference>>;

    /// Re-read the backing data; returns the number of entities now loaded
    async fn reload(&self) -> Result<usize>;
}

/// Fact store held in memory, optionally backed by a JSON file
#[derive(Debug, Default)]
pub struct InMemoryFactStore {
    path: Option<PathBuf>,
    entities: RwLock<BTreeMap<String, EntityReference>>,
}

impl InMemoryFactStore {
    /// Store with fixed contents and no backing file
    pub fn from_references(references: impl IntoIterator<Item = EntityReference>) -> Result<Self> {
        Ok(Self {
            path: None,
            entities: RwLock::new(index(references)?),
        })
    }

    /// Load a store from a JSON file
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entities = read_file(&path).await?;
        info!(path = %path.display(), entities = entities.len(), "Loaded fact store");
        Ok(Self {
            path: Some(path),
            entities: RwLock::new(entities),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[async_trait]
impl FactStore for InMemoryFactStore {
    async fn get(&self, id: &str) -> Result<Option<EntityReference>> {
        Ok(self.entities.read().await.get(id.trim()).cloned())
    }

    async fn list(&self) -> Result<Vec<EntityReference>> {
        Ok(self.entities.read().await.values().cloned().collect())
    }

    async fn reload(&self) -> Result<usize> {
        let Some(path) = &self.path else {
            return Err(Error::FactStore("store has no backing file to reload".to_string()));
        };
        // Parse before swapping so a bad file leaves the current data in place
        let fresh = read_file(path).await?;
        let count = fresh.len();
        *self.entities.write().await = fresh;
        info!(path = %path.display(), entities = count, "Reloaded fact store");
        Ok(count)
    }
}

async fn read_file(path: &Path) -> Result<BTreeMap<String, EntityReference>> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::FactStore(format!("cannot read {}: {}", path.display(), e))
    })?;
    let references: Vec<EntityReference> = serde_json::from_str(&content)?;
    index(references)
}

fn index(
    references: impl IntoIterator<Item = EntityReference>,
) -> Result<BTreeMap<String, EntityReference>> {
    let mut entities = BTreeMap::new();
    for reference in references {
        let id = reference.id.trim().to_string();
        if id.is_empty() {
            return Err(Error::FactStore("entity with empty id".to_string()));
        }
        let normalized = EntityReference::new(
            id.clone(),
            reference.display_name,
            reference.kind,
            reference
                .external_uris
                .into_iter()
                .map(|uri| uri.trim().to_string())
                .filter(|uri| !uri.is_empty()),
        );
        if entities.insert(id.clone(), normalized).is_some() {
            return Err(Error::FactStore(format!("duplicate entity id '{}'", id)));
        }
    }
    Ok(entities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::types::EntityKind;
    use tempfile::TempDir;

    const FACTS: &str = r#"[
        {"id": "asthma", "display_name": "Asthma", "kind": "condition",
         "external_uris": ["http://www.wikidata.org/entity/Q35869", " http://www.wikidata.org/entity/Q35869 ", ""]},
        {"id": "bavaria", "display_name": "Bavaria", "kind": "region"}
    ]"#;

    #[tokio::test]
    async fn test_open_and_lookup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("facts.json");
        std::fs::write(&path, FACTS).unwrap();

        let store = InMemoryFactStore::open(&path).await.unwrap();
        let asthma = store.get("asthma").await.unwrap().unwrap();
        assert_eq!(asthma.external_uris, vec!["http://www.wikidata.org/entity/Q35869"]);
        assert_eq!(asthma.kind, EntityKind::Condition);

        let bavaria = store.get("bavaria").await.unwrap().unwrap();
        assert_eq!(bavaria.kind, EntityKind::Region);
        assert!(bavaria.external_uris.is_empty());

        assert!(store.get("unknown").await.unwrap().is_none());
        let ids: Vec<String> = store.list().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["asthma", "bavaria"]);
    }

    #[tokio::test]
    async fn test_reload_picks_up_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("facts.json");
        std::fs::write(&path, FACTS).unwrap();
        let store = InMemoryFactStore::open(&path).await.unwrap();

        std::fs::write(&path, r#"[{"id": "paris", "display_name": "Paris", "kind": "region"}]"#).unwrap();
        assert_eq!(store.reload().await.unwrap(), 1);
        assert!(store.get("asthma").await.unwrap().is_none());
        assert!(store.get("paris").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("facts.json");
        std::fs::write(&path, FACTS).unwrap();
        let store = InMemoryFactStore::open(&path).await.unwrap();

        std::fs::write(&path, "not json").unwrap();
        let err = store.reload().await.unwrap_err();
        assert_eq!(err.code(), "E101");
        assert!(store.get("asthma").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_ids_rejected() {
        let reference = EntityReference::new("asthma", "Asthma", EntityKind::Condition, vec![]);
        let err = InMemoryFactStore::from_references(vec![reference.clone(), reference]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[tokio::test]
    async fn test_reload_without_file() {
        let store = InMemoryFactStore::from_references(vec![]).unwrap();
        assert_eq!(store.reload().await.unwrap_err().code(), "E100");
    }
}
