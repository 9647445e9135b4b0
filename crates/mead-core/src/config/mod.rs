//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

const DEFAULT_USER_AGENT: &str = "MeAd/0.1 (https://github.com/mead/mead)";

/// MeAd configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sources: SourcesConfig,
    pub extraction: ExtractionConfig,
    pub pool: PoolConfig,
    pub snippets: SnippetConfig,
    pub store: StoreConfig,
    pub cache: CacheConfig,
}

/// Connection settings for one external source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceConfig {
    pub endpoint: String,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl SourceConfig {
    fn new(endpoint: &str, timeout_ms: u64) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            timeout_ms,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub dbpedia: SourceConfig,
    pub wikidata: SourceConfig,
    pub wikidoc: SourceConfig,
    /// Site root; the REST summary and action API paths are derived from it
    pub wikipedia: SourceConfig,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            dbpedia: SourceConfig::new("https://dbpedia.org/sparql", 8000),
            wikidata: SourceConfig::new("https://query.wikidata.org/sparql", 8000),
            wikidoc: SourceConfig::new("https://www.wikidoc.org/api.php", 8000),
            wikipedia: SourceConfig::new("https://en.wikipedia.org", 8000),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Character budget for extracted article text
    pub char_budget: usize,
    /// Upper bound on merged list sizes
    pub max_list_size: usize,
    pub max_label_length: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            char_budget: 2000,
            max_list_size: 30,
            max_label_length: 80,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub size: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { size: 8 }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnippetConfig {
    /// Directory of `<id>.md` fallback descriptions
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON fact-store file used when `--store` is not given
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Remember source contributions until the fact store is reloaded
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

const SOURCE_NAMES: [&str; 4] = ["dbpedia", "wikidata", "wikidoc", "wikipedia"];

impl SourcesConfig {
    fn by_name(&self, name: &str) -> Option<&SourceConfig> {
        match name {
            "dbpedia" => Some(&self.dbpedia),
            "wikidata" => Some(&self.wikidata),
            "wikidoc" => Some(&self.wikidoc),
            "wikipedia" => Some(&self.wikipedia),
            _ => None,
        }
    }

    fn by_name_mut(&mut self, name: &str) -> Option<&mut SourceConfig> {
        match name {
            "dbpedia" => Some(&mut self.dbpedia),
            "wikidata" => Some(&mut self.wikidata),
            "wikidoc" => Some(&mut self.wikidoc),
            "wikipedia" => Some(&mut self.wikipedia),
            _ => None,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("MEAD_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("mead")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Overwrite the config file with defaults
    pub fn reset() -> anyhow::Result<()> {
        Config::default().save()
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        for name in SOURCE_NAMES {
            let Some(source) = self.sources.by_name(name) else {
                continue;
            };
            let endpoint = source.endpoint.trim();
            if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
                return Err(anyhow!(
                    "Invalid endpoint for {}: '{}' (expected an http(s) URL)",
                    name,
                    source.endpoint
                ));
            }
            if source.timeout_ms == 0 {
                return Err(anyhow!("Timeout for {} must be greater than zero", name));
            }
        }
        if self.pool.size == 0 {
            return Err(anyhow!("Worker pool size must be at least 1"));
        }
        if self.extraction.char_budget < 2 {
            return Err(anyhow!("Extraction char_budget must be at least 2"));
        }
        if self.extraction.max_label_length == 0 || self.extraction.max_list_size == 0 {
            return Err(anyhow!(
                "Extraction max_label_length and max_list_size must be non-zero"
            ));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        if let Some((source, field)) = split_source_key(key)
            && let Some(cfg) = self.sources.by_name(source)
        {
            return match field {
                "endpoint" => Ok(cfg.endpoint.clone()),
                "timeout_ms" => Ok(cfg.timeout_ms.to_string()),
                "user_agent" => Ok(cfg.user_agent.clone()),
                _ => Err(unknown_key(key)),
            };
        }

        match key {
            "extraction.char_budget" => Ok(self.extraction.char_budget.to_string()),
            "extraction.max_list_size" => Ok(self.extraction.max_list_size.to_string()),
            "extraction.max_label_length" => Ok(self.extraction.max_label_length.to_string()),
            "pool.size" => Ok(self.pool.size.to_string()),
            "snippets.dir" => Ok(display_path(&self.snippets.dir)),
            "store.path" => Ok(display_path(&self.store.path)),
            "cache.enabled" => Ok(self.cache.enabled.to_string()),
            _ => Err(unknown_key(key)),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        if let Some((source, field)) = split_source_key(key)
            && let Some(cfg) = self.sources.by_name_mut(source)
        {
            match field {
                "endpoint" => cfg.endpoint = value.trim().to_string(),
                "timeout_ms" => {
                    cfg.timeout_ms = value
                        .parse()
                        .with_context(|| format!("Invalid timeout_ms value: {}", value))?;
                }
                "user_agent" => cfg.user_agent = value.to_string(),
                _ => return Err(unknown_key(key)),
            }
            return Ok(());
        }

        match key {
            "extraction.char_budget" => {
                self.extraction.char_budget = value
                    .parse()
                    .with_context(|| format!("Invalid char_budget value: {}", value))?;
            }
            "extraction.max_list_size" => {
                self.extraction.max_list_size = value
                    .parse()
                    .with_context(|| format!("Invalid max_list_size value: {}", value))?;
            }
            "extraction.max_label_length" => {
                self.extraction.max_label_length = value
                    .parse()
                    .with_context(|| format!("Invalid max_label_length value: {}", value))?;
            }
            "pool.size" => {
                let size: usize = value
                    .parse()
                    .with_context(|| format!("Invalid pool size: {}", value))?;
                if size == 0 {
                    return Err(anyhow!("Worker pool size must be at least 1"));
                }
                self.pool.size = size;
            }
            "snippets.dir" => self.snippets.dir = optional_path(value),
            "store.path" => self.store.path = optional_path(value),
            "cache.enabled" => {
                self.cache.enabled = value.trim().parse().with_context(|| {
                    format!("Invalid cache.enabled value: {} (expected true or false)", value)
                })?;
            }
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let mut keys: Vec<String> = Vec::new();
        for name in SOURCE_NAMES {
            for field in ["endpoint", "timeout_ms", "user_agent"] {
                keys.push(format!("sources.{}.{}", name, field));
            }
        }
        keys.extend(
            [
                "extraction.char_budget",
                "extraction.max_list_size",
                "extraction.max_label_length",
                "pool.size",
                "snippets.dir",
                "store.path",
                "cache.enabled",
            ]
            .map(String::from),
        );

        keys.into_iter()
            .map(|key| {
                let value = self.get(&key)?;
                Ok((key, value))
            })
            .collect()
    }
}

fn split_source_key(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_prefix("sources.")?;
    rest.split_once('.')
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow!(
        "Unknown configuration key: {}. Use `mead config list` to see available keys.",
        key
    )
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not set)".to_string())
}

fn optional_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    (!value.is_empty()).then(|| PathBuf::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.pool.size, 8);
        assert_eq!(config.extraction.char_budget, 2000);
        assert_eq!(config.sources.wikidata.timeout_ms, 8000);
        assert_eq!(
            config.sources.dbpedia.endpoint,
            "https://dbpedia.org/sparql"
        );
        assert!(config.snippets.dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_get_and_set_source_keys() {
        let mut config = Config::default();
        config
            .set("sources.wikidoc.timeout_ms", "2500")
            .unwrap();
        config
            .set("sources.wikidoc.user_agent", "test-agent/1.0")
            .unwrap();

        assert_eq!(config.get("sources.wikidoc.timeout_ms").unwrap(), "2500");
        assert_eq!(
            config.get("sources.wikidoc.user_agent").unwrap(),
            "test-agent/1.0"
        );
    }

    #[test]
    fn test_set_rejects_bad_values() {
        let mut config = Config::default();
        assert!(config.set("pool.size", "0").is_err());
        assert!(config.set("pool.size", "many").is_err());
        assert!(config.set("sources.dbpedia.timeout_ms", "-1").is_err());
        assert!(config.set("sources.nowhere.endpoint", "x").is_err());
        assert!(config.get("unknown.key").is_err());
    }

    #[test]
    fn test_cache_toggle() {
        let mut config = Config::default();
        assert_eq!(config.get("cache.enabled").unwrap(), "true");

        config.set("cache.enabled", "false").unwrap();
        assert!(!config.cache.enabled);
        assert!(config.set("cache.enabled", "sometimes").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = Config::default();
        config.sources.dbpedia.endpoint = "dbpedia.org/sparql".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("dbpedia"));
    }

    #[test]
    fn test_list_covers_every_key() {
        let config = Config::default();
        let entries = config.list().unwrap();

        assert_eq!(entries.len(), 4 * 3 + 7);
        assert!(
            entries
                .iter()
                .any(|(k, v)| k == "pool.size" && v == "8")
        );
        assert!(
            entries
                .iter()
                .any(|(k, v)| k == "snippets.dir" && v == "(not set)")
        );
    }

    #[test]
    fn test_load_from_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[pool]\nsize = 3\n\n[sources.wikidata]\nendpoint = \"http://localhost:9999/sparql\"\ntimeout_ms = 100\nuser_agent = \"t\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.pool.size, 3);
        assert_eq!(config.sources.wikidata.timeout_ms, 100);
        assert_eq!(config.sources.dbpedia.timeout_ms, 8000);
        assert_eq!(config.extraction.char_budget, 2000);
    }

    #[test]
    fn test_load_from_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.pool.size, 8);
    }
}
