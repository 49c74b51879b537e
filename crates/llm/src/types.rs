//! LLM configuration types.

use ragpack_core::{AppConfig, ProviderSpec};
use serde::{Deserialize, Serialize};

/// Provider identity as recorded in a pack manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LlmDescriptor {
    pub provider: String,
    pub model: String,
}

impl LlmDescriptor {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// `provider:model` label used in logs and error messages.
    pub fn label(&self) -> String {
        format!("{}:{}", self.provider, self.model)
    }
}

impl From<&ProviderSpec> for LlmDescriptor {
    fn from(spec: &ProviderSpec) -> Self {
        Self::new(spec.provider.clone(), spec.model.clone())
    }
}

/// Everything needed to construct an LLM client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name: "ollama", "openai", "extractive"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Resolved API key; never serialized
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl LlmConfig {
    /// Config for a descriptor with no endpoint or credentials.
    pub fn from_descriptor(descriptor: &LlmDescriptor) -> Self {
        Self {
            provider: descriptor.provider.clone(),
            model: descriptor.model.clone(),
            ..Default::default()
        }
    }

    /// Config for a descriptor, taking endpoint and key from the app config.
    pub fn from_app_config(descriptor: &LlmDescriptor, app: &AppConfig) -> Self {
        Self {
            provider: descriptor.provider.clone(),
            model: descriptor.model.clone(),
            endpoint: app.endpoint(&descriptor.provider),
            api_key: app.resolve_api_key(&descriptor.provider),
            timeout_secs: None,
        }
    }

    pub fn descriptor(&self) -> LlmDescriptor {
        LlmDescriptor::new(self.provider.clone(), self.model.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_label() {
        let descriptor = LlmDescriptor::new("openai", "gpt-4o-mini");
        assert_eq!(descriptor.label(), "openai:gpt-4o-mini");
    }

    #[test]
    fn test_api_key_never_serialized() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: Some("sk-secret".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }

    #[test]
    fn test_from_spec() {
        let spec = ProviderSpec::new("ollama", "llama3.2");
        let descriptor = LlmDescriptor::from(&spec);
        assert_eq!(descriptor, LlmDescriptor::new("ollama", "llama3.2"));
    }
}
