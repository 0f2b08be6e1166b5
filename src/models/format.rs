//! Document formats accepted by the pipeline.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Input format, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    /// Word documents (`.docx`, `.doc`)
    Docx,
    /// Markdown (`.md`, `.markdown`)
    Markdown,
    /// Plain text (`.txt`)
    PlainText,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" | "doc" => Some(DocumentFormat::Docx),
            "md" | "markdown" => Some(DocumentFormat::Markdown),
            "txt" => Some(DocumentFormat::PlainText),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Pdf => write!(f, "pdf"),
            DocumentFormat::Docx => write!(f, "docx"),
            DocumentFormat::Markdown => write!(f, "markdown"),
            DocumentFormat::PlainText => write!(f, "text"),
        }
    }
}

/// A file read from the input directory.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: std::path::PathBuf,
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    /// Extension without the dot, as written on disk.
    pub fn source_type(&self) -> String {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}
