//! Configuration management for ragpack.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults (local-first: trigram embeddings, Ollama for answers)
//! - A YAML file (`RAGPACK_CONFIG`, or `ragpack.yaml` in the current directory)
//! - Environment variables
//! - Command-line flags
//!
//! Nothing here is process-global. The CLI turns an `AppConfig` into explicit
//! provider and chunking settings that are passed into every pack operation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{PackError, PackResult};

/// Embedding providers the pack crate can construct.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 4] = ["trigram", "bow", "ollama", "openai"];

/// LLM providers the llm crate can construct.
pub const KNOWN_LLM_PROVIDERS: [&str; 3] = ["extractive", "ollama", "openai"];

/// A `provider:model` pair, e.g. `openai:text-embedding-3-small`.
///
/// Only the first `:` separates provider from model, so model identifiers
/// such as `models/embedding-001` or `llama3.2:3b` survive intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub provider: String,
    pub model: String,
}

impl ProviderSpec {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// Parse a `provider:model` string.
    pub fn parse(spec: &str) -> PackResult<Self> {
        let (provider, model) = spec.split_once(':').ok_or_else(|| {
            PackError::Config(format!(
                "Invalid provider spec '{}': expected 'provider:model'",
                spec
            ))
        })?;

        let provider = provider.trim().to_lowercase();
        let model = model.trim();
        if provider.is_empty() || model.is_empty() {
            return Err(PackError::Config(format!(
                "Invalid provider spec '{}': provider and model must be non-empty",
                spec
            )));
        }

        Ok(Self::new(provider, model))
    }
}

impl fmt::Display for ProviderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

impl FromStr for ProviderSpec {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Connection settings for one provider backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderEndpoint {
    /// Base URL override (e.g. `http://gpu-box:11434`)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Name of the environment variable holding the API key
    #[serde(default, rename = "apiKeyEnv")]
    pub api_key_env: Option<String>,
}

/// Chunking parameters used when building a pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSettings {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkSettings {
    fn default() -> Self {
        Self {
            size: 512,
            overlap: 64,
        }
    }
}

/// Argon2id cost parameters for encrypted packs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfSettings {
    #[serde(rename = "memoryKib")]
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfSettings {
    fn default() -> Self {
        // 64 MiB, 3 passes
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 1,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Embedding provider used when building packs
    pub embedding: ProviderSpec,

    /// Output dimensionality of the embedding model
    pub embedding_dimensions: usize,

    /// Default LLM provider recorded in new packs
    pub llm: ProviderSpec,

    /// Chunking parameters for new packs
    pub chunking: ChunkSettings,

    /// Key-derivation cost for encrypted packs
    pub kdf: KdfSettings,

    /// Per-provider endpoints and API key variables
    pub providers: HashMap<String, ProviderEndpoint>,

    /// Explicit API key (applies to whichever provider needs one)
    pub api_key: Option<String>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    embedding: Option<EmbeddingSection>,
    llm: Option<ProviderSpec>,
    chunking: Option<ChunkSettings>,
    kdf: Option<KdfSettings>,
    #[serde(default)]
    providers: HashMap<String, ProviderEndpoint>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EmbeddingSection {
    provider: String,
    model: String,
    dimensions: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_file: None,
            embedding: ProviderSpec::new("trigram", "trigram-v1"),
            embedding_dimensions: 384,
            llm: ProviderSpec::new("ollama", "llama3.2"),
            chunking: ChunkSettings::default(),
            kdf: KdfSettings::default(),
            providers: HashMap::new(),
            api_key: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Environment variables:
    /// - `RAGPACK_CONFIG`: Path to config file
    /// - `RAGPACK_EMBEDDING`: Embedding provider spec (`provider:model`)
    /// - `RAGPACK_EMBEDDING_DIMENSIONS`: Embedding dimensionality
    /// - `RAGPACK_LLM`: LLM provider spec (`provider:model`)
    /// - `RAGPACK_API_KEY`: API key
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load(config_file: Option<&Path>) -> PackResult<Self> {
        let explicit = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("RAGPACK_CONFIG").map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(PackError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                Self::default().merge_yaml(&path)?
            }
            None => {
                let local = PathBuf::from("ragpack.yaml");
                if local.exists() {
                    Self::default().merge_yaml(&local)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(spec) = std::env::var("RAGPACK_EMBEDDING") {
            config.embedding = ProviderSpec::parse(&spec)?;
        }

        if let Ok(dimensions) = std::env::var("RAGPACK_EMBEDDING_DIMENSIONS") {
            config.embedding_dimensions = dimensions.parse().map_err(|e| {
                PackError::Config(format!(
                    "Invalid RAGPACK_EMBEDDING_DIMENSIONS '{}': {}",
                    dimensions, e
                ))
            })?;
        }

        if let Ok(spec) = std::env::var("RAGPACK_LLM") {
            config.llm = ProviderSpec::parse(&spec)?;
        }

        config.api_key = std::env::var("RAGPACK_API_KEY").ok();

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var_os("NO_COLOR").is_some() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into a copy of this config.
    fn merge_yaml(&self, path: &Path) -> PackResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PackError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            PackError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();
        result.config_file = Some(path.to_path_buf());

        if let Some(embedding) = config_file.embedding {
            result.embedding = ProviderSpec::new(embedding.provider, embedding.model);
            if let Some(dimensions) = embedding.dimensions {
                result.embedding_dimensions = dimensions;
            }
        }

        if let Some(llm) = config_file.llm {
            result.llm = llm;
        }

        if let Some(chunking) = config_file.chunking {
            result.chunking = chunking;
        }

        if let Some(kdf) = config_file.kdf {
            result.kdf = kdf;
        }

        result.providers.extend(config_file.providers);

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and the
    /// config file.
    pub fn with_overrides(
        mut self,
        embedding: Option<ProviderSpec>,
        embedding_dimensions: Option<usize>,
        llm: Option<ProviderSpec>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(embedding) = embedding {
            self.embedding = embedding;
        }

        if let Some(dimensions) = embedding_dimensions {
            self.embedding_dimensions = dimensions;
        }

        if let Some(llm) = llm {
            self.llm = llm;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Endpoint override configured for a provider.
    pub fn endpoint(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.endpoint.clone())
    }

    /// Name of the environment variable holding a provider's API key.
    pub fn api_key_env(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key_env.clone())
            .or_else(|| default_api_key_env(provider).map(str::to_string))
    }

    /// Resolve the API key for a provider.
    ///
    /// An explicit `RAGPACK_API_KEY` wins over the provider's key variable.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        if let Some(ref key) = self.api_key {
            return Some(key.clone());
        }

        self.api_key_env(provider)
            .and_then(|var| std::env::var(var).ok())
    }

    /// Validate providers and chunking parameters.
    pub fn validate(&self) -> PackResult<()> {
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(PackError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_LLM_PROVIDERS.contains(&self.llm.provider.as_str()) {
            return Err(PackError::Config(format!(
                "Unknown LLM provider: {}. Supported: {}",
                self.llm.provider,
                KNOWN_LLM_PROVIDERS.join(", ")
            )));
        }

        if self.embedding_dimensions == 0 {
            return Err(PackError::Config(
                "Embedding dimensions must be greater than zero".to_string(),
            ));
        }

        if self.chunking.size == 0 {
            return Err(PackError::Config(
                "Chunk size must be greater than zero".to_string(),
            ));
        }

        if self.chunking.overlap >= self.chunking.size {
            return Err(PackError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunking.overlap, self.chunking.size
            )));
        }

        Ok(())
    }
}

/// Conventional API key variable for hosted providers.
fn default_api_key_env(provider: &str) -> Option<&'static str> {
    match provider {
        "openai" => Some("OPENAI_API_KEY"),
        _ => None,
    }
}
