use anyhow::Result;
use tracing::debug;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::artifact;
use crate::services::create_backend;

pub async fn handle_status(format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?.config;
    let formatter = get_formatter(format);

    let status = collect_status(&config).await;

    if verbose && !status.vector_store_connected {
        eprintln!("Qdrant is not reachable at {}", status.vector_store_url);
    }

    print!("{}", formatter.format_status(&status));

    Ok(())
}

async fn collect_status(config: &Config) -> StatusInfo {
    let processed_dir = &config.documents.processed_dir;
    let documents_artifact = artifact::documents_path(processed_dir);

    let mut status = StatusInfo {
        embedding_model: config.embedding.model.clone(),
        embedding_url: config.embedding.base_url.clone(),
        api_key_configured: config
            .embedding
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty()),
        vector_store_url: config.vector_store.url.clone(),
        vector_store_connected: false,
        collection: config.vector_store.collection.clone(),
        collection_exists: false,
        points: 0,
        vector_size: None,
        documents_artifact_present: documents_artifact.is_file(),
        documents_artifact,
        last_run: artifact::read_summary(processed_dir).ok().flatten(),
    };

    let store = match create_backend(&config.vector_store) {
        Ok(store) => store,
        Err(e) => {
            debug!(error = %e, "vector store client unavailable");
            return status;
        }
    };

    status.vector_store_connected = store.health_check().await.unwrap_or(false);
    if !status.vector_store_connected {
        return status;
    }

    match store.collection_info(&config.vector_store.collection).await {
        Ok(Some(info)) => {
            status.collection_exists = true;
            status.points = info.points_count;
            status.vector_size = info.vector_size;
        }
        Ok(None) => {}
        Err(e) => debug!(error = %e, "failed to read collection info"),
    }

    status
}
