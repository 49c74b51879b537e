//! Embedding provider trait and factory.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::providers::{BowProvider, OllamaProvider, OpenAiProvider, TrigramProvider};
use ragpack_core::config::KNOWN_EMBEDDING_PROVIDERS;
use ragpack_core::{PackError, PackResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "openai", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> PackResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> PackResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results.pop().ok_or_else(|| {
            PackError::provider(
                format!("{}:{}", self.provider_name(), self.model_name()),
                "no embedding returned",
            )
        })
    }
}

/// Scale a vector to unit length in place. Zero vectors are left alone.
pub fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

/// Create an embedding provider based on configuration.
///
/// Construction does no I/O; HTTP providers connect on their first call.
///
/// # Errors
/// `ProviderUnavailable` if the provider is unknown, the model is not served
/// by a built-in provider, or a required secret is missing.
pub fn create_provider(config: &EmbeddingConfig) -> PackResult<Arc<dyn EmbeddingProvider>> {
    config.validate()?;

    match config.provider.to_lowercase().as_str() {
        "trigram" => {
            require_model(config, TrigramProvider::MODEL)?;
            Ok(Arc::new(TrigramProvider::new(config.dimensions)))
        }

        "bow" => {
            require_model(config, BowProvider::MODEL)?;
            Ok(Arc::new(BowProvider::new(config.dimensions)))
        }

        "ollama" => Ok(Arc::new(OllamaProvider::new(config)?)),

        "openai" => Ok(Arc::new(OpenAiProvider::new(config)?)),

        _ => Err(PackError::ProviderUnavailable(format!(
            "Unknown embedding provider: '{}'. Supported providers: {}",
            config.provider,
            KNOWN_EMBEDDING_PROVIDERS.join(", ")
        ))),
    }
}

fn require_model(config: &EmbeddingConfig, model: &str) -> PackResult<()> {
    if config.model == model {
        Ok(())
    } else {
        Err(PackError::ProviderUnavailable(format!(
            "{} provides only model '{}', not '{}'",
            config.provider, model, config.model
        )))
    }
}
