use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{OpenAiEmbeddingClient, create_backend, semantic_search};

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(required = true, help = "Search query text")]
    pub query: String,

    #[arg(long, short = 'n', help = "Maximum number of results to return")]
    pub limit: Option<u32>,

    #[arg(long, short = 'c', help = "Collection to search")]
    pub collection: Option<String>,
}

pub async fn handle_search(args: SearchArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("search query cannot be empty");
    }

    let config = Config::load()?.config;
    let formatter = get_formatter(format);

    let limit = args.limit.unwrap_or(config.search.default_limit);
    if limit == 0 {
        anyhow::bail!("limit must be at least 1");
    }
    let collection = args
        .collection
        .unwrap_or_else(|| config.vector_store.collection.clone());

    if verbose {
        eprintln!("Query: \"{query}\"");
        eprintln!("  Limit: {limit}");
        eprintln!("  Collection: {collection}");
    }

    let provider =
        OpenAiEmbeddingClient::new(&config.embedding).context("failed to create embedding client")?;
    let store = create_backend(&config.vector_store).context("failed to connect to vector store")?;

    let results = semantic_search(&provider, store.as_ref(), &collection, query, u64::from(limit))
        .await
        .context("search failed")?;

    if verbose {
        eprintln!("Timing: {}ms", results.duration_ms);
        eprintln!();
    }

    print!("{}", formatter.format_search_results(&results));

    Ok(())
}
