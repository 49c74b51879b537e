//! Deferred embedding provider binding.

use crate::embeddings::config::EmbeddingConfig;
use crate::embeddings::provider::{create_provider, EmbeddingProvider};
use crate::manifest::EmbeddingDescriptor;
use ragpack_core::{PackError, PackResult};
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// An embedding provider that is described up front and constructed on
/// first use.
///
/// The descriptor is available immediately (the override resolver needs it
/// at load time); the provider instance is only built when something is
/// embedded. Clones share the same instance.
#[derive(Clone)]
pub struct EmbeddingHandle {
    config: EmbeddingConfig,
    provider: Arc<OnceCell<Arc<dyn EmbeddingProvider>>>,
}

impl fmt::Debug for EmbeddingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingHandle")
            .field("provider", &self.config.identity())
            .field("dimensions", &self.config.dimensions)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl EmbeddingHandle {
    /// Bind lazily from configuration.
    pub fn from_config(config: EmbeddingConfig) -> Self {
        Self {
            config,
            provider: Arc::new(OnceCell::new()),
        }
    }

    /// Bind lazily to the descriptor recorded in a manifest.
    pub fn from_descriptor(descriptor: &EmbeddingDescriptor) -> Self {
        Self::from_config(EmbeddingConfig::from_descriptor(descriptor))
    }

    /// Wrap an already constructed provider.
    pub fn from_instance(provider: Arc<dyn EmbeddingProvider>) -> Self {
        let config = EmbeddingConfig {
            provider: provider.provider_name().to_string(),
            model: provider.model_name().to_string(),
            dimensions: provider.dimensions(),
            ..Default::default()
        };
        Self {
            config,
            provider: Arc::new(OnceCell::new_with(Some(provider))),
        }
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    pub fn descriptor(&self) -> EmbeddingDescriptor {
        self.config.descriptor()
    }

    pub fn identity(&self) -> String {
        self.config.identity()
    }

    pub fn is_initialized(&self) -> bool {
        self.provider.initialized()
    }

    /// The provider instance, constructing it on first call.
    pub async fn provider(&self) -> PackResult<Arc<dyn EmbeddingProvider>> {
        let provider = self
            .provider
            .get_or_try_init(|| async {
                tracing::debug!("Constructing embedding provider {}", self.identity());
                create_provider(&self.config)
            })
            .await?;
        Ok(Arc::clone(provider))
    }

    /// Embed `texts`, checking count and dimensionality of the result.
    ///
    /// Failures carry the `provider:model` identity.
    pub async fn embed_batch(&self, texts: &[String]) -> PackResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let provider = self.provider().await?;
        let embeddings = provider
            .embed_batch(texts)
            .await
            .map_err(|e| self.attribute(e))?;

        if embeddings.len() != texts.len() {
            return Err(PackError::provider(
                self.identity(),
                format!(
                    "returned {} embeddings for {} texts",
                    embeddings.len(),
                    texts.len()
                ),
            ));
        }
        if let Some(bad) = embeddings
            .iter()
            .find(|e| e.len() != self.config.dimensions)
        {
            return Err(PackError::provider(
                self.identity(),
                format!(
                    "returned {} dimensions, expected {}",
                    bad.len(),
                    self.config.dimensions
                ),
            ));
        }

        Ok(embeddings)
    }

    pub async fn embed(&self, text: &str) -> PackResult<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| PackError::provider(self.identity(), "no embedding returned"))
    }

    fn attribute(&self, err: PackError) -> PackError {
        match err {
            e @ (PackError::Provider { .. } | PackError::ProviderUnavailable(_)) => e,
            other => PackError::provider(self.identity(), other),
        }
    }
}
