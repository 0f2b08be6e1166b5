use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::get_formatter;
use crate::models::{Config, FailurePolicy, OutputFormat};
use crate::services::artifact;
use crate::services::{
    EmbedStats, EmbeddingBatcher, OpenAiEmbeddingClient, VectorStore, VectorStoreWriter,
    create_backend, embed_and_store,
};

#[derive(Debug, Clone, Args)]
pub struct EmbedArgs {
    #[arg(long, short = 'p', help = "Directory containing processed_documents.json")]
    pub processed: Option<PathBuf>,

    #[arg(long, short = 'c', help = "Target Qdrant collection")]
    pub collection: Option<String>,
}

impl EmbedArgs {
    pub(super) fn apply(&self, config: &mut Config) {
        if let Some(ref dir) = self.processed {
            config.documents.processed_dir = dir.clone();
        }
        if let Some(ref collection) = self.collection {
            config.vector_store.collection = collection.clone();
        }
    }
}

pub async fn handle_embed(args: EmbedArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let mut config = Config::load()?.config;
    args.apply(&mut config);
    let formatter = get_formatter(format);

    if verbose {
        eprintln!("Processed:  {}", config.documents.processed_dir.display());
        eprintln!(
            "Model:      {} ({} dims)",
            config.embedding.model, config.embedding.dimension
        );
        eprintln!(
            "Collection: {} at {}",
            config.vector_store.collection, config.vector_store.url
        );
    }

    let stats = run_embed(&config, format == OutputFormat::Text).await?;

    print!(
        "{}",
        formatter.format_embed_stats(&stats, &config.vector_store.collection)
    );
    report_failures(&config, &stats, formatter.as_ref());

    Ok(())
}

pub(super) fn report_failures(
    config: &Config,
    stats: &EmbedStats,
    formatter: &dyn crate::cli::output::Formatter,
) {
    if stats.failed_embeddings == 0 {
        return;
    }
    let message = match config.vector_store.failure_policy {
        FailurePolicy::Placeholder => format!(
            "{} chunks could not be embedded and were stored with zero vectors; they will not match searches until re-embedded.",
            stats.failed_embeddings
        ),
        FailurePolicy::Skip => format!(
            "{} chunks could not be embedded and were left out of the collection.",
            stats.failed_embeddings
        ),
    };
    eprint!("{}", formatter.format_message(&message));
}

/// Run stage two from the processed-documents artifact and write the summary.
pub(super) async fn run_embed(config: &Config, show_progress: bool) -> Result<EmbedStats> {
    let processed_dir = &config.documents.processed_dir;

    // Artifact first so a missing file fails before any network setup.
    let documents =
        artifact::read_documents(processed_dir).context("failed to load processed documents")?;

    let provider = Arc::new(
        OpenAiEmbeddingClient::new(&config.embedding)
            .context("failed to create embedding client")?,
    );
    let store: Arc<dyn VectorStore> = Arc::from(
        create_backend(&config.vector_store).context("failed to connect to vector store")?,
    );

    let batcher = EmbeddingBatcher::new(provider, &config.embedding).with_progress(show_progress);
    let writer = VectorStoreWriter::new(
        store,
        &config.vector_store,
        config.embedding.dimension as usize,
    )
    .with_progress(show_progress);

    let stats = embed_and_store(&documents, &batcher, &writer)
        .await
        .context("embedding run failed")?;

    let summary = stats.summary(&config.embedding.model, &config.vector_store.collection);
    artifact::write_summary(processed_dir, &summary)
        .context("failed to write embedding summary")?;

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_artifact_fails_before_client_setup() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.documents.processed_dir = dir.path().to_path_buf();
        // No API key: client creation would fail if it were reached.
        config.embedding.api_key = None;

        let err = run_embed(&config, false).await.unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("failed to load processed documents"));
        assert!(chain.contains("docingest process"));
    }

    #[test]
    fn test_overrides_applied() {
        let args = EmbedArgs {
            processed: Some(PathBuf::from("out")),
            collection: Some("handbook".to_string()),
        };
        let mut config = Config::default();
        args.apply(&mut config);
        assert_eq!(config.documents.processed_dir, PathBuf::from("out"));
        assert_eq!(config.vector_store.collection, "handbook");
    }
}
