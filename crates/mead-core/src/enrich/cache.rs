//! Memo of source contributions
//!
//! Remembers what each source returned for an entity so repeated
//! enrichments do not go back to the network. Only contributions that
//! carry data are kept; a source that timed out or found nothing is asked
//! again next time.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use super::types::{PartialEnrichment, SourceId};

type CacheKey = (SourceId, String);

/// Source contributions keyed by source and entity id
///
/// Cloning shares the same entries.
#[derive(Debug, Clone)]
pub struct SourceCache {
    entries: Arc<RwLock<HashMap<CacheKey, PartialEnrichment>>>,
    enabled: bool,
}

impl SourceCache {
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            enabled,
        }
    }

    /// A cache that never stores anything
    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&self, source: SourceId, entity: &str) -> Option<PartialEnrichment> {
        if !self.enabled {
            return None;
        }
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.get(&(source, entity.to_string())).cloned())
    }

    /// Remember `partial` for `entity` unless it is empty
    pub fn insert(&self, entity: &str, partial: &PartialEnrichment) {
        if !self.enabled || partial.is_empty() {
            return;
        }
        if let Ok(mut entries) = self.entries.write() {
            entries.insert((partial.source, entity.to_string()), partial.clone());
        }
    }

    /// Forget everything, e.g. after the fact store was reloaded
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            let dropped = entries.len();
            entries.clear();
            debug!(dropped, "Cleared source cache");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SourceCache {
    fn default() -> Self {
        Self::new(true)
    }
}
