//! Pack type definitions.

use crate::chunker::ChunkConfig;
use crate::crypto::KdfParams;
use crate::embeddings::EmbeddingConfig;
use crate::manifest::EmbeddingDescriptor;
use crate::vectorstore::FLAT_ENGINE;
use ragpack_core::AppConfig;
use ragpack_llm::LlmConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text of a source document, either whole or already split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentContent {
    Text(String),
    Chunks(Vec<String>),
}

/// A document handed to `Pack::build`.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Stable identifier; derived from filename and content when absent
    pub id: Option<String>,

    /// Original filename, used in source references
    pub filename: String,

    pub content: DocumentContent,

    /// Original bytes to keep in the pack (`raw/<id>`)
    pub raw: Option<Vec<u8>>,
}

impl SourceDocument {
    pub fn text(filename: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: None,
            filename: filename.into(),
            content: DocumentContent::Text(text.into()),
            raw: None,
        }
    }

    /// A document whose chunks were produced by an external parser.
    pub fn prechunked(filename: impl Into<String>, chunks: Vec<String>) -> Self {
        Self {
            id: None,
            filename: filename.into(),
            content: DocumentContent::Chunks(chunks),
            raw: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_raw(mut self, raw: Vec<u8>) -> Self {
        self.raw = Some(raw);
        self
    }
}

/// One ingested document as stored in a pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub filename: String,
    pub chunks: Vec<String>,
}

impl DocumentRecord {
    /// Vector identifier of chunk `index`: `<document_id>#<index>`.
    pub fn vector_id(&self, index: usize) -> String {
        format!("{}#{}", self.id, index)
    }

    pub fn vector_ids(&self) -> Vec<String> {
        (0..self.chunks.len()).map(|i| self.vector_id(i)).collect()
    }
}

/// A retrieved chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedChunk {
    pub document_id: String,
    pub filename: String,
    pub chunk_index: usize,
    pub text: String,
    pub score: f32,
}

/// Options for `Pack::build`.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Human-readable pack name
    pub name: String,

    pub chunking: ChunkConfig,

    /// Index engine name
    pub engine: String,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            name: "pack".to_string(),
            chunking: ChunkConfig::default(),
            engine: FLAT_ENGINE.to_string(),
        }
    }
}

impl BuildOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Options for `Pack::save_with`.
#[derive(Clone, Default)]
pub struct SaveOptions {
    /// Encrypt with this password; plaintext pack when `None`
    pub password: Option<String>,

    pub kdf: KdfParams,
}

impl fmt::Debug for SaveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveOptions")
            .field("encrypted", &self.password.is_some())
            .field("kdf", &self.kdf)
            .finish()
    }
}

/// Options for `Pack::load`.
#[derive(Clone, Default)]
pub struct LoadOptions {
    /// Password for encrypted packs; ignored (with a warning) for plain ones
    pub password: Option<String>,

    /// Embedding provider to bind instead of the recorded one
    pub embedding_override: Option<EmbeddingConfig>,

    /// LLM provider to bind instead of the recorded one
    pub llm_override: Option<LlmConfig>,

    /// Endpoints and API keys for the recorded providers
    pub settings: Option<AppConfig>,
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field(
                "embedding_override",
                &self.embedding_override.as_ref().map(|c| c.identity()),
            )
            .field(
                "llm_override",
                &self.llm_override.as_ref().map(|c| c.descriptor().label()),
            )
            .finish()
    }
}

impl LoadOptions {
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_embedding(mut self, config: EmbeddingConfig) -> Self {
        self.embedding_override = Some(config);
        self
    }

    pub fn with_llm(mut self, config: LlmConfig) -> Self {
        self.llm_override = Some(config);
        self
    }

    pub fn with_settings(mut self, settings: AppConfig) -> Self {
        self.settings = Some(settings);
        self
    }
}

/// Options for `Pack::ask`.
#[derive(Debug, Clone)]
pub struct AskOptions {
    /// Number of chunks to retrieve
    pub top_k: usize,

    pub temperature: f32,

    pub max_tokens: u32,

    /// Chunks scoring below this are not used as context
    pub min_score: f32,
}

impl Default for AskOptions {
    fn default() -> Self {
        Self {
            top_k: 5,
            temperature: 0.3,
            max_tokens: 1000,
            min_score: 0.20,
        }
    }
}

/// Outcome of `Pack::rebuild`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildReport {
    pub previous: EmbeddingDescriptor,
    pub current: EmbeddingDescriptor,
    pub documents: usize,
    pub vectors: usize,
    pub duration_secs: f64,
}
