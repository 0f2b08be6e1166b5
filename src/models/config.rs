use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::search::OutputFormat;
use crate::error::ConfigError;

pub const DEFAULT_EMBEDDING_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "openai/text-embedding-3-small";
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 1536;
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_COLLECTION: &str = "knowledge_base";
pub const DEFAULT_TOKENIZER: &str = "Xenova/gpt-4";

const CONFIG_DIR_NAME: &str = "docingest";
const PROJECT_CONFIG_DIR: &str = ".docingest";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub documents: DocumentsConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

/// Configuration after layering defaults, files and environment.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub config: Config,
    pub global_path: Option<PathBuf>,
    pub project_path: Option<PathBuf>,
}

impl Config {
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(CONFIG_DIR_NAME).join(CONFIG_FILE))
    }

    pub fn project_config_dir() -> Option<PathBuf> {
        std::env::current_dir()
            .ok()
            .map(|p| p.join(PROJECT_CONFIG_DIR))
    }

    pub fn project_path() -> Option<PathBuf> {
        Self::project_config_dir().map(|p| p.join(CONFIG_FILE))
    }

    /// Load defaults, then the global file, then the project file, then the
    /// environment. Later layers win field by field.
    pub fn load() -> Result<ResolvedConfig, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load_layers(Self::global_path(), Self::project_path(), |key| {
            std::env::var(key).ok()
        })
    }

    /// Merge whichever of `global` and `project` exist, overlay the
    /// environment from `lookup`, then validate.
    pub fn load_layers<F>(
        global: Option<PathBuf>,
        project: Option<PathBuf>,
        lookup: F,
    ) -> Result<ResolvedConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let global_path = global.filter(|p| p.exists());
        let project_path = project.filter(|p| p.exists());

        let mut merged = toml::Table::new();
        for path in [&global_path, &project_path].into_iter().flatten() {
            merge_tables(&mut merged, read_table(path)?);
        }

        let mut config: Config = toml::Value::Table(merged).try_into()?;
        config.apply_env(lookup);
        config.validate()?;

        Ok(ResolvedConfig {
            config,
            global_path,
            project_path,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Overlay environment variables using the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENROUTER_API_KEY").or_else(|| lookup("OPENAI_API_KEY")) {
            self.embedding.api_key = Some(key);
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(url) = lookup("EMBEDDING_BASE_URL") {
            self.embedding.base_url = url;
        }

        if let Some(url) = lookup("QDRANT_URL") {
            self.vector_store.url = url;
        } else if let Some(host) = lookup("QDRANT_HOST") {
            let port = lookup("QDRANT_PORT").unwrap_or_else(|| "6334".to_string());
            self.vector_store.url = format!("http://{host}:{port}");
        }
        if let Some(key) = lookup("QDRANT_API_KEY") {
            self.vector_store.api_key = Some(key);
        }
        if let Some(collection) = lookup("QDRANT_COLLECTION") {
            self.vector_store.collection = collection;
        }

        if let Some(dir) = lookup("DOCUMENTS_DIR") {
            self.documents.input_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("PROCESSED_DIR") {
            self.documents.processed_dir = PathBuf::from(dir);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking.validate()?;
        self.embedding.validate()?;
        self.vector_store.validate()?;
        Ok(())
    }

    pub fn init_global() -> Result<PathBuf, ConfigError> {
        let path = Self::global_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;
        Self::default().save_to(&path)?;
        Ok(path)
    }

    pub fn init_project() -> Result<PathBuf, ConfigError> {
        let path = Self::project_path().ok_or_else(|| {
            ConfigError::PathError("could not determine project directory".to_string())
        })?;
        Self::default().save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn read_table(path: &Path) -> Result<toml::Table, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay `overlay` onto `base`; nested tables merge, everything else replaces.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(incoming) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_tables(existing, incoming);
                continue;
            }
            base.insert(key, toml::Value::Table(incoming));
        } else {
            base.insert(key, value);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentsConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: PathBuf,

    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,

    #[serde(default)]
    pub recursive: bool,

    #[serde(default)]
    pub exclude_patterns: Vec<String>,
}

fn default_input_dir() -> PathBuf {
    PathBuf::from("documents")
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("processed")
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            processed_dir: default_processed_dir(),
            recursive: false,
            exclude_patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Tokens per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,

    /// Tokens shared between consecutive chunks. Must be smaller than `chunk_size`.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: u32,

    /// Hub identifier or path to a `tokenizer.json`.
    #[serde(default = "default_tokenizer")]
    pub tokenizer: String,
}

fn default_chunk_size() -> u32 {
    500
}

fn default_chunk_overlap() -> u32 {
    50
}

fn default_tokenizer() -> String {
    DEFAULT_TOKENIZER.to_string()
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::ValidationError(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        // The chunk cursor advances by chunk_size - chunk_overlap
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::ValidationError(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            tokenizer: default_tokenizer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_dimension")]
    pub dimension: u32,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Pause after each successful batch, for provider rate limits.
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Attempts per provider call for transient errors (1 = no retry).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_dimension() -> u32 {
    DEFAULT_EMBEDDING_DIMENSION
}

fn default_batch_size() -> u32 {
    100
}

fn default_batch_delay_ms() -> u64 {
    100
}

fn default_timeout() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.batch_size must be greater than 0".to_string(),
            ));
        }
        if self.dimension == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.dimension must be greater than 0".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "embedding.model is empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_url(),
            model: default_embedding_model(),
            api_key: None,
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

/// How vector IDs are derived from chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    /// Position in the flattened chunk list of the current run.
    #[default]
    Positional,
    /// UUIDv5 of `source_file:chunk_index:file_hash`.
    Stable,
}

/// What the writer does with chunks whose embedding failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Store a zero vector in place of the missing embedding.
    #[default]
    Placeholder,
    /// Leave the chunk out of the collection.
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: u32,

    #[serde(default)]
    pub id_strategy: IdStrategy,

    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_upsert_batch_size() -> u32 {
    100
}

impl VectorStoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "vector_store.url is empty".to_string(),
            ));
        }
        if self.collection.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "vector_store.collection is empty".to_string(),
            ));
        }
        if self.upsert_batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "vector_store.upsert_batch_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            collection: default_collection(),
            api_key: None,
            upsert_batch_size: default_upsert_batch_size(),
            id_strategy: IdStrategy::default(),
            failure_policy: FailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    #[serde(default)]
    pub default_format: OutputFormat,
}

fn default_limit() -> u32 {
    3
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            default_format: OutputFormat::Text,
        }
    }
}
