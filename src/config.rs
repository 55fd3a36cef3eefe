//! Configuration module for embedex.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides (applied by the command layer)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `EMBEDEX_` and use double underscores
//! to separate nested levels:
//! - `EMBEDEX_SERVER__BIND=0.0.0.0:8000` sets `server.bind`
//! - `EMBEDEX_CHUNKING__CHUNK_SIZE=800` sets `chunking.chunk_size`
//! - `EMBEDEX_EMBEDDING__OPENAI__API_KEY=sk-...` sets `embedding.openai.api_key`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::documents::ChunkingConfig;

/// Directory holding the workspace configuration.
pub const CONFIG_DIR: &str = ".embedex";

/// Settings file name inside [`CONFIG_DIR`].
pub const SETTINGS_FILE: &str = "settings.toml";

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "EMBEDEX_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Configuration file already exists at {0}. Use --force to overwrite")]
    AlreadyExists(PathBuf),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Embedding backend settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Embed server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Ingestion settings
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Chunking settings used during ingestion
    #[serde(default)]
    pub chunking: ChunkingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level for all modules
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides (target = level)
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

/// Which embedding backend produces vectors.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// In-process ONNX model via fastembed.
    #[default]
    Local,
    /// A running embed server (`POST {"text"}` -> `{"embedding"}`).
    Http,
    /// An OpenAI-compatible `/embeddings` endpoint.
    OpenAi,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// Backend used to compute embeddings
    #[serde(default)]
    pub backend: EmbeddingBackend,

    /// Local model name (fastembed variant or sentence-transformers id)
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Directory where downloaded model files are cached
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Show model download progress on first use
    #[serde(default = "default_true")]
    pub show_download_progress: bool,

    /// Number of texts sent to the backend per call during ingestion
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Remote embed server settings
    #[serde(default)]
    pub http: HttpEmbedConfig,

    /// OpenAI-compatible provider settings
    #[serde(default)]
    pub openai: OpenAiConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpEmbedConfig {
    /// Full URL of the embed endpoint
    #[serde(default = "default_embed_url")]
    pub url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OpenAiConfig {
    /// Base URL; `/embeddings` is appended
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Remote model id
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Sent as `HTTP-Referer` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_url: Option<String>,

    /// Sent as `X-Title` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Address the embed server binds to
    #[serde(default = "default_bind")]
    pub bind: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IngestConfig {
    /// Directory scanned for source files
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    /// Directory the index is written to
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,

    /// File name of the index inside `out_dir`
    #[serde(default = "default_index_file")]
    pub index_file: String,

    /// File extensions to ingest (empty means every file)
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Show a progress bar while embedding
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "warn".to_string()
}
fn default_embedding_model() -> String {
    "AllMiniLML6V2".to_string()
}
fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("embedex").join("models"))
        .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("models"))
}
fn default_batch_size() -> usize {
    8
}
fn default_embed_url() -> String {
    "http://127.0.0.1:8000/embed".to_string()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_openai_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}
fn default_out_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_index_file() -> String {
    "index.json".to_string()
}
fn default_extensions() -> Vec<String> {
    ["md", "mdx", "txt", "json"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            logging: LoggingConfig::default(),
            embedding: EmbeddingConfig::default(),
            server: ServerConfig::default(),
            ingest: IngestConfig::default(),
            chunking: ChunkingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend: EmbeddingBackend::default(),
            model: default_embedding_model(),
            cache_dir: default_cache_dir(),
            show_download_progress: true,
            batch_size: default_batch_size(),
            http: HttpEmbedConfig::default(),
            openai: OpenAiConfig::default(),
        }
    }
}

impl Default for HttpEmbedConfig {
    fn default() -> Self {
        Self {
            url: default_embed_url(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            api_key: None,
            model: default_openai_model(),
            site_url: None,
            site_name: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            out_dir: default_out_dir(),
            index_file: default_index_file(),
            extensions: default_extensions(),
            show_progress: true,
        }
    }
}

impl IngestConfig {
    /// Full path of the index file.
    pub fn index_path(&self) -> PathBuf {
        self.out_dir.join(&self.index_file)
    }
}

impl Settings {
    /// Load configuration from all sources.
    ///
    /// The settings file is looked up by walking from the current directory
    /// towards the root until a `.embedex` directory is found.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(SETTINGS_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still honoring env overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings: Settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels; single underscores stay
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values no command can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking.validate().map_err(ConfigError::Invalid)?;
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "embedding.batch_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Find the settings file by looking for a `.embedex` directory.
    /// Searches from current directory up to root.
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .map(|ancestor| ancestor.join(CONFIG_DIR))
            .find(|dir| dir.is_dir())
            .map(|dir| dir.join(SETTINGS_FILE))
    }

    /// Render the settings as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Create a default settings file under `root`.
    pub fn init_config_file(root: &Path, force: bool) -> Result<PathBuf, ConfigError> {
        let config_path = root.join(CONFIG_DIR).join(SETTINGS_FILE);

        if !force && config_path.exists() {
            return Err(ConfigError::AlreadyExists(config_path));
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::ChunkingStrategy;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.server.bind, "127.0.0.1:8000");
        assert_eq!(settings.embedding.backend, EmbeddingBackend::Local);
        assert_eq!(settings.embedding.batch_size, 8);
        assert_eq!(settings.chunking.chunk_size, 1200);
        assert_eq!(settings.chunking.overlap, 150);
        assert_eq!(settings.ingest.index_path(), PathBuf::from("data/index.json"));
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
[server]
bind = "0.0.0.0:9100"

[embedding]
backend = "openai"
batch_size = 32

[embedding.openai]
model = "openai/text-embedding-3-large"

[chunking]
strategy = "sections"
chunk_size = 600
overlap = 60

[ingest]
extensions = ["md"]
"#;
        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.server.bind, "0.0.0.0:9100");
        assert_eq!(settings.embedding.backend, EmbeddingBackend::OpenAi);
        assert_eq!(settings.embedding.batch_size, 32);
        assert_eq!(settings.embedding.openai.model, "openai/text-embedding-3-large");
        assert_eq!(settings.chunking.strategy, ChunkingStrategy::Sections);
        assert_eq!(settings.chunking.chunk_size, 600);
        assert_eq!(settings.ingest.extensions, vec!["md"]);
        // Untouched sections keep their defaults
        assert_eq!(settings.ingest.content_dir, PathBuf::from("content"));
    }

    #[test]
    fn test_invalid_chunking_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "[chunking]\nchunk_size = 100\noverlap = 100\n").unwrap();

        let err = Settings::load_from(&config_path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.server.bind = "127.0.0.1:9999".to_string();
        settings.ingest.out_dir = PathBuf::from("static/data");

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.server.bind, "127.0.0.1:9999");
        assert_eq!(loaded.ingest.out_dir, PathBuf::from("static/data"));
    }

    #[test]
    fn test_init_config_file_refuses_overwrite() {
        let temp_dir = TempDir::new().unwrap();

        let path = Settings::init_config_file(temp_dir.path(), false).unwrap();
        assert!(path.exists());

        let err = Settings::init_config_file(temp_dir.path(), false).unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists(_)));

        assert!(Settings::init_config_file(temp_dir.path(), true).is_ok());
    }
}
