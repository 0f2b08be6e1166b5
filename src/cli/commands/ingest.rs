use anyhow::Result;
use clap::Args;

use super::embed::{report_failures, run_embed};
use super::process::{ProcessArgs, run_process};
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};

#[derive(Debug, Clone, Args)]
pub struct IngestArgs {
    #[command(flatten)]
    pub process: ProcessArgs,

    #[arg(long, short = 'c', help = "Target Qdrant collection")]
    pub collection: Option<String>,
}

pub async fn handle_ingest(args: IngestArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let mut config = Config::load()?.config;
    args.process.apply(&mut config);
    if let Some(ref collection) = args.collection {
        config.vector_store.collection = collection.clone();
    }
    let formatter = get_formatter(format);
    let show_progress = format == OutputFormat::Text;

    let (process_stats, artifact) = run_process(&config, show_progress).await?;
    print!(
        "{}",
        formatter.format_process_stats(&process_stats, artifact.as_ref())
    );

    if artifact.is_none() {
        print!(
            "{}",
            formatter.format_message("No documents were processed; skipping embedding.")
        );
        return Ok(());
    }

    if verbose {
        eprintln!(
            "Embedding into {} at {}",
            config.vector_store.collection, config.vector_store.url
        );
    }

    let embed_stats = run_embed(&config, show_progress).await?;
    print!(
        "{}",
        formatter.format_embed_stats(&embed_stats, &config.vector_store.collection)
    );
    report_failures(&config, &embed_stats, formatter.as_ref());

    Ok(())
}
