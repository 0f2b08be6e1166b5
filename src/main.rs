use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use docingest::cli::commands::{
    handle_config, handle_embed, handle_ingest, handle_process, handle_search, handle_status,
};
use docingest::cli::{Cli, Commands};
use docingest::models::{Config, OutputFormat};

/// Log to stderr so JSON output on stdout stays parseable. `RUST_LOG` wins
/// over the verbosity flag.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("warn,docingest=debug")
        } else {
            EnvFilter::new("warn,docingest=info")
        }
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let resolved = Config::load().unwrap_or_default();
    let format = cli.format.unwrap_or(resolved.config.search.default_format);
    let verbose = cli.verbose;

    tokio::select! {
        result = run_command(cli.command, format, verbose) => {
            result?;
        }
        _ = shutdown_signal() => {
            eprintln!("\nReceived shutdown signal, cleaning up...");
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
    }

    Ok(())
}

async fn run_command(command: Commands, format: OutputFormat, verbose: bool) -> Result<()> {
    match command {
        Commands::Process(args) => handle_process(args, format, verbose).await,
        Commands::Embed(args) => handle_embed(args, format, verbose).await,
        Commands::Ingest(args) => handle_ingest(args, format, verbose).await,
        Commands::Search(args) => handle_search(args, format, verbose).await,
        Commands::Status => handle_status(format, verbose).await,
        Commands::Config(cmd) => handle_config(cmd, format, verbose).await,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
