//! Command-line probe: run one cascade query and print the response as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use civic_search::adapters::{InMemoryIndex, LocalIndexAdapter, SourceRegistry, WebAdapter};
use civic_search::llm::LlmClient;
use civic_search::{
    CascadeConfig, DocumentRelevanceScorer, OpenAiCompatibleClient, SearchCascadeEngine,
    SearchOptions, SearchQuery, SourceType,
};
use civic_web::WebSearchClient;
use tracing_subscriber::EnvFilter;

/// Query the civic search cascade.
#[derive(Parser)]
#[command(name = "civic-probe", version, about)]
struct Cli {
    /// Path to TOML configuration file. Defaults to the user config path
    /// when it exists, else built-in defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON file with an array of local documents to index.
    #[arg(short, long)]
    documents: Option<PathBuf>,

    /// Stop once this many distinct results are accumulated.
    #[arg(long)]
    stop_after: Option<usize>,

    /// Query every selected source, never stopping early.
    #[arg(long)]
    exhaustive: bool,

    /// Restrict the cascade to these sources (snake_case names).
    #[arg(long = "source", value_parser = parse_source)]
    sources: Vec<SourceType>,

    /// Query text.
    #[arg(required = true, num_args = 1..)]
    query: Vec<String>,
}

fn parse_source(raw: &str) -> Result<SourceType, String> {
    SourceType::all()
        .iter()
        .copied()
        .find(|s| s.name() == raw)
        .ok_or_else(|| format!("unknown source '{raw}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays valid JSON.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("civic_search=info,civic_web=info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => CascadeConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => {
            let path = CascadeConfig::default_config_path();
            if path.exists() {
                CascadeConfig::from_file(&path)?
            } else {
                CascadeConfig::default()
            }
        }
    };
    config.validate()?;

    let mut registry = SourceRegistry::new();
    if let Some(ref path) = cli.documents {
        let index = InMemoryIndex::from_json_file(path)
            .with_context(|| format!("loading documents from {}", path.display()))?;
        tracing::info!(documents = index.len(), "local index loaded");
        registry.register(Arc::new(LocalIndexAdapter::new(
            Arc::new(index),
            DocumentRelevanceScorer::new(config.documents.clone()),
        )));
    }
    let web = WebSearchClient::new(config.web.clone())?;
    registry.register(Arc::new(WebAdapter::new(
        Arc::new(web),
        config.cache_ttl_seconds,
    )));

    let llm: Option<Arc<dyn LlmClient>> = match config.llm.clone() {
        Some(endpoint) => Some(Arc::new(OpenAiCompatibleClient::new(endpoint)?)),
        None => None,
    };

    // Only sources with an adapter are worth scheduling here.
    let mut config = config;
    config.sources.retain(|s| registry.contains(s.source_type));
    let engine = SearchCascadeEngine::from_config(&config, registry, llm)?;

    let query = SearchQuery::new(cli.query.join(" "))
        .with_sources(cli.sources)
        .exhaustive(cli.exhaustive);
    let mut options = SearchOptions::default();
    if let Some(n) = cli.stop_after {
        options = options.stop_after(n);
    }

    let response = engine.search(&query, &options).await;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
