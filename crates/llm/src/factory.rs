//! LLM provider factory.
//!
//! Maps the provider string stored in a pack manifest (or supplied as an
//! override) to a concrete client.

use crate::client::LlmClient;
use crate::providers::{ollama, openai, ExtractiveClient, OllamaClient, OpenAiClient};
use crate::types::LlmConfig;
use ragpack_core::{PackError, PackResult};
use std::sync::Arc;
use std::time::Duration;

/// Default request timeout for HTTP providers.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Create an LLM client from configuration.
///
/// # Errors
/// Returns `PackError::ProviderUnavailable` if the provider is unknown or a
/// required secret is missing.
pub fn create_client(config: &LlmConfig) -> PackResult<Arc<dyn LlmClient>> {
    let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

    match config.provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = config
                .endpoint
                .clone()
                .or_else(|| std::env::var("OLLAMA_URL").ok())
                .unwrap_or_else(|| ollama::DEFAULT_OLLAMA_URL.to_string());
            let client = OllamaClient::new(base_url, &config.model, timeout)?;
            Ok(Arc::new(client))
        }
        "openai" => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                PackError::ProviderUnavailable(format!(
                    "openai:{} requires an API key (set OPENAI_API_KEY or RAGPACK_API_KEY)",
                    config.model
                ))
            })?;
            let base_url = config
                .endpoint
                .clone()
                .unwrap_or_else(|| openai::DEFAULT_OPENAI_URL.to_string());
            let client = OpenAiClient::new(base_url, &config.model, api_key, timeout)?;
            Ok(Arc::new(client))
        }
        "extractive" => Ok(Arc::new(ExtractiveClient::new(&config.model))),
        _ => Err(PackError::ProviderUnavailable(format!(
            "Unknown LLM provider: '{}'. Supported providers: {}",
            config.provider,
            ragpack_core::config::KNOWN_LLM_PROVIDERS.join(", ")
        ))),
    }
}
