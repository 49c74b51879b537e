//! OpenAI-compatible embeddings provider.
//!
//! Speaks the `/embeddings` wire format, so it also covers hosted services
//! that mirror the OpenAI API behind a configurable endpoint.

use crate::embeddings::provider::{normalize, EmbeddingProvider};
use crate::embeddings::EmbeddingConfig;
use async_trait::async_trait;
use ragpack_core::{PackError, PackResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimensions: usize,
    batch_size: usize,
    normalize: bool,
}

impl OpenAiProvider {
    /// Create a provider.
    ///
    /// # Errors
    /// `ProviderUnavailable` when no API key was resolved.
    pub fn new(config: &EmbeddingConfig) -> PackResult<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            PackError::ProviderUnavailable(format!(
                "{} requires an API key (set OPENAI_API_KEY or RAGPACK_API_KEY)",
                config.identity()
            ))
        })?;

        let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(REQUEST_TIMEOUT_SECS));
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            PackError::ProviderUnavailable(format!(
                "Failed to create HTTP client for {}: {}",
                config.identity(),
                e
            ))
        })?;

        Ok(Self {
            client,
            base_url: config
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key,
            model: config.model.clone(),
            dimensions: config.dimensions,
            batch_size: config.batch_size.max(1),
            normalize: config.normalize,
        })
    }

    fn identity(&self) -> String {
        format!("openai:{}", self.model)
    }

    /// text-embedding-3 models can shorten their output on request.
    fn requested_dimensions(&self) -> Option<usize> {
        self.model
            .starts_with("text-embedding-3")
            .then_some(self.dimensions)
    }

    async fn embed_chunk(&self, texts: &[String]) -> PackResult<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingsRequest {
                model: &self.model,
                input: texts,
                dimensions: self.requested_dimensions(),
            })
            .send()
            .await
            .map_err(|e| PackError::provider(self.identity(), format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PackError::provider(
                self.identity(),
                format!("API error ({}): {}", status, error_text),
            ));
        }

        let mut body: EmbeddingsResponse = response.json().await.map_err(|e| {
            PackError::provider(self.identity(), format!("invalid response: {}", e))
        })?;

        if body.data.len() != texts.len() {
            return Err(PackError::provider(
                self.identity(),
                format!(
                    "returned {} embeddings for {} inputs",
                    body.data.len(),
                    texts.len()
                ),
            ));
        }

        body.data.sort_by_key(|d| d.index);
        body.data
            .into_iter()
            .map(|d| {
                if d.embedding.len() != self.dimensions {
                    return Err(PackError::provider(
                        self.identity(),
                        format!(
                            "returned {} dimensions, expected {}",
                            d.embedding.len(),
                            self.dimensions
                        ),
                    ));
                }
                let mut embedding = d.embedding;
                if self.normalize {
                    normalize(&mut embedding);
                }
                Ok(embedding)
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> PackResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            debug!("Embedding {} texts with {}", chunk.len(), self.identity());
            embeddings.extend(self.embed_chunk(chunk).await?);
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(model: &str) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: "openai".to_string(),
            model: model.to_string(),
            dimensions: 256,
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_requested_dimensions_only_for_v3_models() {
        let v3 = OpenAiProvider::new(&config("text-embedding-3-small")).unwrap();
        assert_eq!(v3.requested_dimensions(), Some(256));

        let ada = OpenAiProvider::new(&config("text-embedding-ada-002")).unwrap();
        assert_eq!(ada.requested_dimensions(), None);
    }

    #[test]
    fn test_missing_key() {
        let mut cfg = config("text-embedding-3-small");
        cfg.api_key = None;
        assert!(matches!(
            OpenAiProvider::new(&cfg),
            Err(PackError::ProviderUnavailable(_))
        ));
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"object":"list","data":[
            {"object":"embedding","index":1,"embedding":[0.0,1.0]},
            {"object":"embedding","index":0,"embedding":[1.0,0.0]}
        ],"model":"m"}"#;
        let mut parsed: EmbeddingsResponse = serde_json::from_str(body).unwrap();
        parsed.data.sort_by_key(|d| d.index);
        assert_eq!(parsed.data[0].embedding, vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn test_empty_batch_makes_no_request() {
        let mut cfg = config("text-embedding-3-small");
        cfg.endpoint = Some("http://127.0.0.1:9".to_string());
        let provider = OpenAiProvider::new(&cfg).unwrap();
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }
}
