//! JSON files exchanged between the two stages.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::ArtifactError;
use crate::models::{DocumentRecord, EmbeddingSummary};

pub const DOCUMENTS_FILE: &str = "processed_documents.json";
pub const SUMMARY_FILE: &str = "embedding_summary.json";

pub fn documents_path(processed_dir: &Path) -> PathBuf {
    processed_dir.join(DOCUMENTS_FILE)
}

pub fn summary_path(processed_dir: &Path) -> PathBuf {
    processed_dir.join(SUMMARY_FILE)
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Replace the processed-documents artifact with `documents`.
pub fn write_documents(
    processed_dir: &Path,
    documents: &[DocumentRecord],
) -> Result<PathBuf, ArtifactError> {
    let path = documents_path(processed_dir);
    write_json(&path, documents)?;
    info!(path = %path.display(), documents = documents.len(), "wrote processed documents");
    Ok(path)
}

pub fn read_documents(processed_dir: &Path) -> Result<Vec<DocumentRecord>, ArtifactError> {
    let path = documents_path(processed_dir);
    if !path.is_file() {
        return Err(ArtifactError::Missing(path));
    }
    let content = fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn write_summary(
    processed_dir: &Path,
    summary: &EmbeddingSummary,
) -> Result<PathBuf, ArtifactError> {
    let path = summary_path(processed_dir);
    write_json(&path, summary)?;
    info!(path = %path.display(), "wrote embedding summary");
    Ok(path)
}

/// The last run's summary, if one was written.
pub fn read_summary(processed_dir: &Path) -> Result<Option<EmbeddingSummary>, ArtifactError> {
    let path = summary_path(processed_dir);
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&content)?))
}
