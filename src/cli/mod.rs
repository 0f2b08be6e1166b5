//! Command line interface for the ingestion pipeline.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Chunk local documents and load their embeddings into Qdrant.
#[derive(Debug, Parser)]
#[command(name = "docingest")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract, chunk and save documents from the input directory
    Process(commands::ProcessArgs),

    /// Embed processed chunks and store them in the vector database
    Embed(commands::EmbedArgs),

    /// Run process and embed back to back
    Ingest(commands::IngestArgs),

    /// Search the populated collection
    Search(commands::SearchArgs),

    /// Check embedding provider, Qdrant and artifact status
    Status,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_process_overrides() {
        let cli = Cli::parse_from([
            "docingest",
            "process",
            "--input",
            "docs",
            "--chunk-size",
            "200",
            "--chunk-overlap",
            "20",
        ]);
        match cli.command {
            Commands::Process(args) => {
                assert_eq!(args.input.as_deref(), Some(std::path::Path::new("docs")));
                assert_eq!(args.chunk_size, Some(200));
                assert_eq!(args.chunk_overlap, Some(20));
                assert!(args.output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_search_with_format() {
        let cli = Cli::parse_from(["docingest", "search", "refund policy", "-n", "5", "-f", "json"]);
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.query, "refund policy");
                assert_eq!(args.limit, Some(5));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
