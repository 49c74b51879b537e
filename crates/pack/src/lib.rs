//! Portable RAG packs.
//!
//! A pack bundles source documents, their chunk texts, a vector index and
//! the provider configuration that produced it into one `.rag` file. Packs
//! can be encrypted with a password and reopened with different embedding
//! or LLM providers.
//!
//! # Example
//! ```no_run
//! use ragpack::{BuildOptions, EmbeddingConfig, EmbeddingHandle, LoadOptions, Pack, SourceDocument};
//! use ragpack_llm::{LlmDescriptor, LlmHandle};
//! use std::path::Path;
//!
//! # async fn example() -> ragpack_core::PackResult<()> {
//! let documents = vec![SourceDocument::text("notes.md", "Packs are portable.")];
//! let pack = Pack::build(
//!     documents,
//!     EmbeddingHandle::from_config(EmbeddingConfig::default()),
//!     LlmHandle::from_descriptor(&LlmDescriptor::new("ollama", "llama3.2")),
//!     BuildOptions::named("notes"),
//! )
//! .await?;
//! pack.save(Path::new("notes.rag"), Some("secret")).await?;
//!
//! let (pack, status) = Pack::load(
//!     Path::new("notes.rag"),
//!     LoadOptions::default().with_password("secret"),
//! )?;
//! println!("{}: {:?}", status.label(), pack.query("portable", 3).await?);
//! # Ok(())
//! # }
//! ```

pub mod chunker;
pub mod codec;
pub mod container;
pub mod crypto;
pub mod embeddings;
pub mod manifest;
pub mod pack;
pub mod rag;
pub mod resolver;
pub mod types;
pub mod vectorstore;

#[cfg(test)]
mod tests;

pub use chunker::ChunkConfig;
pub use crypto::KdfParams;
pub use embeddings::{EmbeddingConfig, EmbeddingHandle, EmbeddingProvider};
pub use manifest::{EmbeddingDescriptor, Manifest};
pub use pack::Pack;
pub use rag::{RagAnswer, SourceRef};
pub use resolver::{ProviderMismatch, ResolutionStatus};
pub use types::{
    AskOptions, BuildOptions, DocumentContent, DocumentRecord, LoadOptions, RankedChunk,
    RebuildReport, SaveOptions, SourceDocument,
};
