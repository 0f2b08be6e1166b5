//! Stage one: files on disk to chunked document records.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{ConfigError, IndexError};
use crate::models::{
    ChunkingConfig, DocumentFormat, DocumentMetadata, DocumentRecord, DocumentsConfig, SourceFile,
};
use crate::services::{TextChunker, TextExtractor, TokenCodec};
use crate::utils::{hash_bytes, progress_bar};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessStats {
    pub files_scanned: u64,
    pub files_processed: u64,
    pub files_skipped: u64,
    pub chunks_created: u64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ProcessOutcome {
    pub documents: Vec<DocumentRecord>,
    pub stats: ProcessStats,
}

/// Why a scanned file produced no document record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Unsupported(String),
    Unreadable(String),
    Extraction(String),
    NoText,
    Tokenizer(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Unsupported(ext) => write!(f, "unsupported file type '{ext}'"),
            SkipReason::Unreadable(e) => write!(f, "could not read file: {e}"),
            SkipReason::Extraction(e) => write!(f, "text extraction failed: {e}"),
            SkipReason::NoText => write!(f, "no text content"),
            SkipReason::Tokenizer(e) => write!(f, "tokenization failed: {e}"),
        }
    }
}

pub struct DocumentPipeline {
    recursive: bool,
    exclude_patterns: Vec<glob::Pattern>,
    chunker: TextChunker,
    extractor: Arc<dyn TextExtractor>,
    show_progress: bool,
}

impl DocumentPipeline {
    pub fn new(
        documents: &DocumentsConfig,
        chunking: &ChunkingConfig,
        tokenizer: Arc<dyn TokenCodec>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Result<Self, ConfigError> {
        let exclude_patterns = documents
            .exclude_patterns
            .iter()
            .map(|p| {
                glob::Pattern::new(p).map_err(|e| {
                    ConfigError::ValidationError(format!("invalid exclude pattern '{p}': {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            recursive: documents.recursive,
            exclude_patterns,
            chunker: TextChunker::new(chunking, tokenizer)?,
            extractor,
            show_progress: false,
        })
    }

    #[must_use]
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        self.exclude_patterns
            .iter()
            .any(|p| p.matches(&path_str) || p.matches(&name))
    }

    /// Regular files under `dir`, ordered by file name within each directory.
    pub fn scan(&self, dir: &Path) -> Result<Vec<PathBuf>, IndexError> {
        if !dir.is_dir() {
            return Err(IndexError::WalkError(format!(
                "input directory not found: {}",
                dir.display()
            )));
        }

        let mut walker = WalkDir::new(dir)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();
        if !self.recursive {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| IndexError::WalkError(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if self.is_excluded(entry.path()) {
                debug!(path = %entry.path().display(), "excluded");
                continue;
            }
            files.push(entry.into_path());
        }

        Ok(files)
    }

    /// Read, extract, hash and chunk one file.
    pub fn process_file(&self, path: &Path) -> Result<DocumentRecord, SkipReason> {
        let format = DocumentFormat::from_path(path).ok_or_else(|| {
            SkipReason::Unsupported(
                path.extension()
                    .map(|e| e.to_string_lossy().to_string())
                    .unwrap_or_default(),
            )
        })?;

        let bytes = std::fs::read(path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;
        let file = SourceFile {
            path: path.to_path_buf(),
            format,
            bytes,
        };

        let text = self
            .extractor
            .extract(&file)
            .map_err(|e| SkipReason::Extraction(e.to_string()))?;
        if text.trim().is_empty() {
            return Err(SkipReason::NoText);
        }

        let metadata = DocumentMetadata {
            source_file: file.file_name(),
            source_type: file.source_type(),
            file_hash: hash_bytes(&file.bytes),
            processed_at: Utc::now(),
        };

        let chunks = self
            .chunker
            .chunk(&text, &metadata)
            .map_err(|e| SkipReason::Tokenizer(e.to_string()))?;

        Ok(DocumentRecord::new(&metadata, &text, chunks))
    }

    /// Process every file in `dir` in scan order. Per-file problems are
    /// logged and counted, never fatal.
    pub fn process_all(&self, dir: &Path) -> Result<ProcessOutcome, IndexError> {
        let start_time = Instant::now();
        let files = self.scan(dir)?;

        info!(dir = %dir.display(), files = files.len(), "processing documents");

        let mut outcome = ProcessOutcome {
            documents: Vec::new(),
            stats: ProcessStats {
                files_scanned: files.len() as u64,
                ..Default::default()
            },
        };

        let pb = progress_bar(files.len() as u64, "processing", self.show_progress);

        for path in &files {
            pb.inc(1);
            match self.process_file(path) {
                Ok(record) => {
                    debug!(
                        file = %record.source_file,
                        chunks = record.chunk_count,
                        chars = record.total_chars,
                        "processed"
                    );
                    outcome.stats.files_processed += 1;
                    outcome.stats.chunks_created += u64::from(record.chunk_count);
                    outcome.documents.push(record);
                }
                Err(reason) => {
                    warn!(path = %path.display(), %reason, "skipping file");
                    outcome.stats.files_skipped += 1;
                }
            }
        }

        pb.finish_and_clear();
        outcome.stats.duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            processed = outcome.stats.files_processed,
            skipped = outcome.stats.files_skipped,
            chunks = outcome.stats.chunks_created,
            "processing finished"
        );

        Ok(outcome)
    }
}
