use anyhow::{Context, Result};
use clap::Subcommand;

use crate::cli::output::{Formatter, get_formatter};
use crate::models::{Config, OutputFormat};

const MASK: &str = "********";

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Initialize configuration file")]
    Init {
        #[arg(
            long,
            short = 'g',
            help = "Create global config instead of project config"
        )]
        global: bool,
        #[arg(long, help = "Force overwrite existing config")]
        force: bool,
    },
    #[command(about = "Show the effective configuration")]
    Show,
    #[command(about = "Show configuration file paths")]
    Path,
}

pub async fn handle_config(cmd: ConfigCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    let formatter = get_formatter(format);

    match cmd {
        ConfigCommand::Init { global, force } => handle_init(global, force, formatter.as_ref()),
        ConfigCommand::Show => handle_show(format),
        ConfigCommand::Path => handle_path(),
    }
}

fn handle_init(global: bool, force: bool, formatter: &dyn Formatter) -> Result<()> {
    let (config_path, scope) = if global {
        (
            Config::global_path()
                .ok_or_else(|| anyhow::anyhow!("could not determine config directory"))?,
            "global",
        )
    } else {
        (
            Config::project_path()
                .ok_or_else(|| anyhow::anyhow!("could not determine project directory"))?,
            "project",
        )
    };

    if config_path.exists() && !force {
        anyhow::bail!(
            "{} config already exists at: {}\nUse --force to overwrite.",
            scope,
            config_path.display()
        );
    }

    let path = if global {
        Config::init_global().context("failed to create global config")?
    } else {
        Config::init_project().context("failed to create project config")?
    };
    print!(
        "{}",
        formatter.format_message(&format!("Created {} config at: {}", scope, path.display()))
    );

    Ok(())
}

/// Effective config with credentials replaced.
fn masked(config: &Config) -> Config {
    let mut config = config.clone();
    if config.embedding.api_key.is_some() {
        config.embedding.api_key = Some(MASK.to_string());
    }
    if config.vector_store.api_key.is_some() {
        config.vector_store.api_key = Some(MASK.to_string());
    }
    config
}

fn handle_show(format: OutputFormat) -> Result<()> {
    let resolved = Config::load()?;
    let config = masked(&resolved.config);

    if format == OutputFormat::Json {
        let output = serde_json::json!({
            "config": config,
            "project_path": resolved.project_path,
            "global_path": resolved.global_path,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(ref path) = resolved.project_path {
        println!("# Project config: {}", path.display());
    }
    if let Some(ref path) = resolved.global_path {
        println!("# Global config: {}", path.display());
    }
    if resolved.project_path.is_none() && resolved.global_path.is_none() {
        println!("# No config file found, using defaults and environment");
    }
    println!();
    print!(
        "{}",
        toml::to_string_pretty(&config).context("failed to render config")?
    );

    Ok(())
}

fn handle_path() -> Result<()> {
    println!("Configuration paths:");
    println!();

    for (label, path) in [
        ("Project config", Config::project_path()),
        ("Global config", Config::global_path()),
    ] {
        let Some(path) = path else {
            continue;
        };
        let state = if path.exists() { "active" } else { "would be" };
        println!("{label} ({state}): {}", path.display());
    }

    if let Ok(cwd) = std::env::current_dir() {
        let env_path = cwd.join(".env");
        let state = if env_path.exists() { "active" } else { "would be" };
        println!(".env file ({state}): {}", env_path.display());
    }

    Ok(())
}
