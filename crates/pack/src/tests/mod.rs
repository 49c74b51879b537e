//! Cross-module pack scenarios.

mod override_flow;
mod roundtrip;

use crate::crypto::test_kdf;
use crate::embeddings::{EmbeddingConfig, EmbeddingHandle};
use crate::pack::Pack;
use crate::types::{BuildOptions, SaveOptions, SourceDocument};
use ragpack_llm::{LlmDescriptor, LlmHandle};

pub(crate) const DIMENSIONS: usize = 64;

pub(crate) fn embedding(provider: &str, model: &str) -> EmbeddingConfig {
    EmbeddingConfig {
        provider: provider.to_string(),
        model: model.to_string(),
        dimensions: DIMENSIONS,
        ..Default::default()
    }
}

pub(crate) fn trigram() -> EmbeddingHandle {
    EmbeddingHandle::from_config(embedding("trigram", "trigram-v1"))
}

pub(crate) fn bow() -> EmbeddingHandle {
    EmbeddingHandle::from_config(embedding("bow", "bow-v1"))
}

pub(crate) fn extractive() -> LlmHandle {
    LlmHandle::from_descriptor(&LlmDescriptor::new("extractive", "extractive-v1"))
}

/// Document "A" with chunks ["alpha", "beta"] and "B" with ["gamma"].
pub(crate) fn sample_documents() -> Vec<SourceDocument> {
    vec![
        SourceDocument::prechunked("a.txt", vec!["alpha".to_string(), "beta".to_string()])
            .with_id("A"),
        SourceDocument::prechunked("b.txt", vec!["gamma".to_string()]).with_id("B"),
    ]
}

pub(crate) async fn sample_pack(embedding: EmbeddingHandle) -> Pack {
    Pack::build(
        sample_documents(),
        embedding,
        extractive(),
        BuildOptions::named("greek"),
    )
    .await
    .unwrap()
}

pub(crate) fn encrypted(password: &str) -> SaveOptions {
    SaveOptions {
        password: Some(password.to_string()),
        kdf: test_kdf(),
    }
}
