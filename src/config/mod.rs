//! Configuration management for registrar
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Embedding backend configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Index store configuration
    #[serde(default)]
    pub index: IndexConfig,

    /// Query configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// Generation backend configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Ingestion configuration
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model identifier passed to the backend
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension (must match the model)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Backend base URL
    #[serde(default = "default_embedding_backend_url")]
    pub backend_url: String,

    /// Batch size for ingestion-time embedding
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Retries for failed backend requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Unit chunks are measured in: "words" or "chars"
    #[serde(default = "default_chunk_unit")]
    pub unit: String,

    /// Maximum units per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Units of overlap between consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub overlap: usize,

    /// Break-point search window before a hard cut, as a fraction of chunk_size
    #[serde(default = "default_chunk_slack_ratio")]
    pub slack_ratio: f32,

    /// Final fragments smaller than this fraction of chunk_size are merged
    /// into the previous chunk
    #[serde(default = "default_min_fragment_ratio")]
    pub min_fragment_ratio: f32,
}

/// Index store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Distance metric: "cosine" or "euclidean"
    #[serde(default = "default_index_metric")]
    pub metric: String,
}

/// Query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Number of chunks retrieved per question
    #[serde(default = "default_query_top_k")]
    pub top_k: usize,

    /// Minimum similarity score (0.0 - 1.0); results below are dropped
    #[serde(default = "default_query_min_score")]
    pub min_score: f32,

    /// Merge retrieved chunks that are adjacent within one document
    #[serde(default = "default_merge_adjacent")]
    pub merge_adjacent: bool,
}

/// Generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Backend base URL (Ollama-compatible)
    #[serde(default = "default_generation_backend_url")]
    pub backend_url: String,

    /// Model identifier passed to the backend
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_generation_temperature")]
    pub temperature: f32,

    /// Budget for retrieved context + question, in approximate tokens
    #[serde(default = "default_context_budget")]
    pub context_budget: usize,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    /// Retries for failed backend requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Number of documents processed concurrently
    #[serde(default = "default_ingest_workers")]
    pub workers: usize,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for registrar data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to the SQLite index database
    pub db_file: PathBuf,

    /// Directory holding conversation session files
    pub sessions_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig::default(),
            chunk: ChunkConfig::default(),
            index: IndexConfig::default(),
            query: QueryConfig::default(),
            generation: GenerationConfig::default(),
            ingest: IngestConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            backend_url: default_embedding_backend_url(),
            batch_size: default_embedding_batch_size(),
            timeout_secs: default_embedding_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            unit: default_chunk_unit(),
            chunk_size: default_chunk_size(),
            overlap: default_chunk_overlap(),
            slack_ratio: default_chunk_slack_ratio(),
            min_fragment_ratio: default_min_fragment_ratio(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            metric: default_index_metric(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: default_query_top_k(),
            min_score: default_query_min_score(),
            merge_adjacent: default_merge_adjacent(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend_url: default_generation_backend_url(),
            model: default_generation_model(),
            temperature: default_generation_temperature(),
            context_budget: default_context_budget(),
            timeout_secs: default_generation_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            workers: default_ingest_workers(),
        }
    }
}

impl Config {
    /// Get the default base directory for registrar (~/.registrar)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".registrar")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            db_file: base.join("index.db"),
            sessions_dir: base.join("sessions"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            db_file: base.join("index.db"),
            sessions_dir: base.join("sessions"),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_config_path())
    }

    /// Build a default configuration rooted at the given base directory
    pub fn with_base_dir(base_dir: Option<PathBuf>) -> Self {
        let mut config = Config::default();
        config.init_paths(base_dir);
        config
    }

    /// Save configuration to its config file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        Ok(())
    }

    /// Parsed distance metric for the index store
    pub fn metric(&self) -> Result<crate::store::DistanceMetric> {
        self.index.metric.parse()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimension == 0 {
            return Err(Error::Config(
                "embedding.dimension must be greater than zero".to_string(),
            ));
        }

        Url::parse(&self.embedding.backend_url)
            .map_err(|e| Error::Config(format!("Invalid embedding.backend_url: {}", e)))?;
        Url::parse(&self.generation.backend_url)
            .map_err(|e| Error::Config(format!("Invalid generation.backend_url: {}", e)))?;

        if !matches!(self.chunk.unit.as_str(), "words" | "chars") {
            return Err(Error::Config(format!(
                "chunk.unit must be 'words' or 'chars', got '{}'",
                self.chunk.unit
            )));
        }

        if self.chunk.chunk_size == 0 {
            return Err(Error::Config(
                "chunk.chunk_size must be greater than zero".to_string(),
            ));
        }

        if self.chunk.overlap >= self.chunk.chunk_size {
            return Err(Error::Config(format!(
                "chunk.overlap ({}) must be smaller than chunk.chunk_size ({})",
                self.chunk.overlap, self.chunk.chunk_size
            )));
        }

        for (name, ratio) in [
            ("chunk.slack_ratio", self.chunk.slack_ratio),
            ("chunk.min_fragment_ratio", self.chunk.min_fragment_ratio),
        ] {
            if !(0.0..=1.0).contains(&ratio) {
                return Err(Error::Config(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, ratio
                )));
            }
        }

        if !matches!(self.index.metric.as_str(), "cosine" | "euclidean") {
            return Err(Error::Config(format!(
                "index.metric must be 'cosine' or 'euclidean', got '{}'",
                self.index.metric
            )));
        }

        if self.query.top_k == 0 {
            return Err(Error::Config(
                "query.top_k must be greater than zero".to_string(),
            ));
        }

        if self.ingest.workers == 0 {
            return Err(Error::Config(
                "ingest.workers must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
