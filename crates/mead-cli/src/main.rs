//! MeAd CLI - enrich local conditions and regions from external knowledge sources

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use mead_core::config::Config;
use mead_core::enrich::{ArticleSection, EnrichmentService, FactField, ListField, MergedEnrichment};
use mead_core::store::{FactStore, InMemoryFactStore};
use tracing::debug;

#[derive(Parser)]
#[command(name = "mead")]
#[command(author, version, about = "Multi-source enrichment for local knowledge bases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Fact store file (overrides `store.path` from the config)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich one entity from the external sources
    Enrich {
        /// Entity id from the fact store
        id: String,
    },

    /// List entities in the fact store
    List,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so JSON output stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("mead=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Enrich { id } => cmd_enrich(&id, cli.store, cli.format).await,
        Commands::List => cmd_list(cli.store, cli.format, cli.quiet).await,
        Commands::Config { action } => cmd_config(action, cli.quiet),
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

async fn open_store(config: &Config, flag: Option<PathBuf>) -> anyhow::Result<InMemoryFactStore> {
    let path = flag.or_else(|| config.store.path.clone()).ok_or_else(|| {
        anyhow!("No fact store configured. Pass --store <path> or run `mead config set store.path <path>`")
    })?;
    debug!(path = %path.display(), "Opening fact store");
    InMemoryFactStore::open(&path)
        .await
        .with_context(|| format!("Failed to open fact store: {}", path.display()))
}

async fn cmd_enrich(id: &str, store: Option<PathBuf>, format: OutputFormat) -> anyhow::Result<()> {
    let config = Config::load()?;
    let store: Arc<dyn FactStore> = Arc::new(open_store(&config, store).await?);
    let service = EnrichmentService::from_config(&config, store)?;

    let merged = match service.enrich(id).await {
        Ok(merged) => merged,
        Err(e) => {
            if let Some(hint) = e.suggestion() {
                eprintln!("[{}] hint: {}", e.code(), hint);
            }
            return Err(e.into());
        }
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&merged)?),
        OutputFormat::Text => print!("{}", render_text(&merged)),
    }
    Ok(())
}

async fn cmd_list(store: Option<PathBuf>, format: OutputFormat, quiet: bool) -> anyhow::Result<()> {
    let config = Config::load()?;
    let store = open_store(&config, store).await?;
    let entities = store.list().await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entities)?),
        OutputFormat::Text => {
            if entities.is_empty() {
                if !quiet {
                    println!("No entities found.");
                }
                return Ok(());
            }
            if !quiet {
                println!("Entities:");
            }
            for entity in entities {
                println!(
                    "  {} - {} ({}, {} reference URIs)",
                    entity.id,
                    entity.display_name,
                    entity.kind,
                    entity.external_uris.len()
                );
            }
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction, quiet: bool) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = config.get(&key)?;
            println!("{}", value);
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            if !quiet {
                println!("Set {} = {}", key, value);
            }
        }
        ConfigAction::List => {
            let config = Config::load()?;
            for (key, value) in config.list()? {
                println!("{} = {}", key, value);
            }
        }
        ConfigAction::Reset => {
            Config::reset()?;
            if !quiet {
                println!("Configuration reset to defaults.");
            }
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

// ============================================================================
// Text rendering
// ============================================================================

fn list_label(field: ListField) -> &'static str {
    match field {
        ListField::Symptoms => "Symptoms",
        ListField::RiskFactors => "Risk factors",
        ListField::Climates => "Climates",
        ListField::Industries => "Industries",
        ListField::CulturalFactors => "Cultural factors",
    }
}

fn fact_label(field: FactField) -> &'static str {
    match field {
        FactField::PopulationTotal => "Population",
        FactField::PopulationDensity => "Population density",
    }
}

fn section_label(section: ArticleSection) -> &'static str {
    match section {
        ArticleSection::Overview => "Overview",
        ArticleSection::Causes => "Causes",
        ArticleSection::Pathophysiology => "Pathophysiology",
        ArticleSection::Diagnosis => "Diagnosis",
        ArticleSection::Treatment => "Treatment",
        ArticleSection::Prevention => "Prevention",
        ArticleSection::Prognosis => "Prognosis",
        ArticleSection::Epidemiology => "Epidemiology",
    }
}

fn join_sources<T: std::fmt::Display>(items: &[T]) -> String {
    if items.is_empty() {
        return "none".to_string();
    }
    items
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Human-readable rendering of a merged record
fn render_text(merged: &MergedEnrichment) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} ({}, {})\n", merged.display_name, merged.id, merged.kind));

    if let Some(description) = &merged.description {
        out.push_str(&format!("\n{}\n", description));
    }

    for (field, value) in &merged.facts {
        out.push_str(&format!("\n{}: {}", fact_label(*field), value));
    }
    if !merged.facts.is_empty() {
        out.push('\n');
    }

    for (field, values) in &merged.lists {
        out.push_str(&format!("\n{}:\n", list_label(*field)));
        for value in values {
            out.push_str(&format!("  - {}\n", value));
        }
    }

    if !merged.images.is_empty() {
        out.push_str("\nImages:\n");
        for image in &merged.images {
            out.push_str(&format!("  {}\n", image));
        }
    }

    // The overview already printed as the description
    for (section, text) in merged
        .sections
        .iter()
        .filter(|(section, _)| **section != ArticleSection::Overview)
    {
        out.push_str(&format!("\n## {}\n{}\n", section_label(*section), text));
    }

    if let Some(article) = &merged.article
        && !article.source_url.is_empty()
    {
        out.push_str(&format!("\nArticle: {}\n", article.source_url));
    }

    out.push_str(&format!(
        "\nSources: {}\nSkipped: {}\n",
        join_sources(&merged.contributing_sources),
        join_sources(&merged.skipped_sources)
    ));
    out
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
