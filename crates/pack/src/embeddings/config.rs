//! Embedding configuration types.

use crate::manifest::EmbeddingDescriptor;
use ragpack_core::{AppConfig, PackError, PackResult, ProviderSpec};
use serde::{Deserialize, Serialize};

/// Everything needed to construct an embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram", "bow", "ollama", "openai"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Whether to normalize embeddings to unit length
    #[serde(default = "default_normalize")]
    pub normalize: bool,

    /// Maximum batch size for embedding requests
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Base URL override for HTTP providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Resolved API key; never serialized
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Request timeout in seconds for HTTP providers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

fn default_normalize() -> bool {
    true
}

fn default_batch_size() -> usize {
    100
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            normalize: true,
            batch_size: 100,
            endpoint: None,
            api_key: None,
            timeout_secs: None,
        }
    }
}

impl EmbeddingConfig {
    /// Config for a recorded descriptor with no endpoint or credentials.
    pub fn from_descriptor(descriptor: &EmbeddingDescriptor) -> Self {
        Self {
            provider: descriptor.provider.clone(),
            model: descriptor.model.clone(),
            dimensions: descriptor.dimensions,
            ..Default::default()
        }
    }

    /// Config for a `provider:model` spec, taking endpoint and key from the
    /// application config.
    pub fn from_spec(spec: &ProviderSpec, dimensions: usize, app: &AppConfig) -> Self {
        Self {
            provider: spec.provider.clone(),
            model: spec.model.clone(),
            dimensions,
            endpoint: app.endpoint(&spec.provider),
            api_key: app.resolve_api_key(&spec.provider),
            ..Default::default()
        }
    }

    pub fn descriptor(&self) -> EmbeddingDescriptor {
        EmbeddingDescriptor::new(self.provider.clone(), self.model.clone(), self.dimensions)
    }

    /// `provider:model` identity used in errors and logs.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.provider, self.model)
    }

    pub fn validate(&self) -> PackResult<()> {
        if self.dimensions == 0 {
            return Err(PackError::InvalidInput(format!(
                "{} must have positive dimensions",
                self.identity()
            )));
        }
        if self.batch_size == 0 {
            return Err(PackError::InvalidInput(format!(
                "{} must have a positive batch size",
                self.identity()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.model, "trigram-v1");
        assert_eq!(config.dimensions, 384);
        assert!(config.normalize);
        assert_eq!(config.batch_size, 100);
    }

    #[test]
    fn test_descriptor_round_trip() {
        let descriptor = EmbeddingDescriptor::new("ollama", "nomic-embed-text", 768);
        let config = EmbeddingConfig::from_descriptor(&descriptor);
        assert_eq!(config.descriptor(), descriptor);
        assert_eq!(config.identity(), "ollama:nomic-embed-text");
    }

    #[test]
    fn test_from_spec_resolves_key() {
        let mut app = AppConfig::default();
        app.api_key = Some("sk-test".to_string());
        let spec = ProviderSpec::new("openai", "text-embedding-3-small");

        let config = EmbeddingConfig::from_spec(&spec, 1536, &app);
        assert_eq!(config.dimensions, 1536);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_api_key_not_serialized() {
        let config = EmbeddingConfig {
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[test]
    fn test_zero_dimensions_invalid() {
        let config = EmbeddingConfig {
            dimensions: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(PackError::InvalidInput(_))));
    }
}
