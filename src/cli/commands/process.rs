use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::artifact;
use crate::services::{DocumentPipeline, FormatExtractor, HfTokenizer, ProcessStats};

#[derive(Debug, Clone, Args)]
pub struct ProcessArgs {
    #[arg(long, short = 'i', help = "Directory to read documents from")]
    pub input: Option<PathBuf>,

    #[arg(long, short = 'o', help = "Directory to write processed_documents.json to")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Tokens per chunk")]
    pub chunk_size: Option<u32>,

    #[arg(long, help = "Tokens shared between consecutive chunks")]
    pub chunk_overlap: Option<u32>,

    #[arg(long, short = 'r', help = "Descend into subdirectories")]
    pub recursive: bool,
}

impl ProcessArgs {
    pub(super) fn apply(&self, config: &mut Config) {
        if let Some(ref input) = self.input {
            config.documents.input_dir = input.clone();
        }
        if let Some(ref output) = self.output {
            config.documents.processed_dir = output.clone();
        }
        if let Some(size) = self.chunk_size {
            config.chunking.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.chunking.chunk_overlap = overlap;
        }
        if self.recursive {
            config.documents.recursive = true;
        }
    }
}

pub async fn handle_process(args: ProcessArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let mut config = Config::load()?.config;
    args.apply(&mut config);
    let formatter = get_formatter(format);

    if verbose {
        eprintln!("Input:  {}", config.documents.input_dir.display());
        eprintln!("Output: {}", config.documents.processed_dir.display());
        eprintln!(
            "Chunks: {} tokens, {} overlap ({})",
            config.chunking.chunk_size, config.chunking.chunk_overlap, config.chunking.tokenizer
        );
    }

    let (stats, artifact) = run_process(&config, format == OutputFormat::Text).await?;

    print!("{}", formatter.format_process_stats(&stats, artifact.as_ref()));
    if artifact.is_none() {
        print!(
            "{}",
            formatter.format_message("No documents were processed; nothing was written.")
        );
    }

    Ok(())
}

/// Run stage one and write the artifact. Returns `None` for the path when no
/// document produced text, in which case nothing is written.
pub(super) async fn run_process(
    config: &Config,
    show_progress: bool,
) -> Result<(ProcessStats, Option<PathBuf>)> {
    config.chunking.validate()?;

    let documents = config.documents.clone();
    let chunking = config.chunking.clone();

    let outcome = tokio::task::spawn_blocking(move || -> Result<_> {
        let tokenizer = HfTokenizer::load(&chunking.tokenizer)
            .with_context(|| format!("failed to load tokenizer '{}'", chunking.tokenizer))?;
        let pipeline = DocumentPipeline::new(
            &documents,
            &chunking,
            Arc::new(tokenizer),
            Arc::new(FormatExtractor),
        )?
        .with_progress(show_progress);

        pipeline
            .process_all(&documents.input_dir)
            .context("failed to process documents")
    })
    .await
    .context("document processing task failed")??;

    if outcome.documents.is_empty() {
        return Ok((outcome.stats, None));
    }

    let path = artifact::write_documents(&config.documents.processed_dir, &outcome.documents)
        .context("failed to write processed documents")?;

    Ok((outcome.stats, Some(path)))
}
