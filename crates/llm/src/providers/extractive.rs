//! Offline extractive answerer.
//!
//! Returns the best-matching retrieved passage verbatim instead of generating
//! text. Deterministic and network-free, so packs can be queried on machines
//! without any model runtime, and end-to-end tests stay hermetic.

use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use ragpack_core::PackResult;

/// Answer returned when no passages were retrieved.
pub const NO_ANSWER: &str = "I could not find this information in the available documents.";

#[derive(Debug, Clone)]
pub struct ExtractiveClient {
    model: String,
    max_passages: usize,
}

impl ExtractiveClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_passages: 1,
        }
    }

    /// Include up to `max_passages` passages in the answer.
    pub fn with_max_passages(mut self, max_passages: usize) -> Self {
        self.max_passages = max_passages.max(1);
        self
    }
}

#[async_trait::async_trait]
impl LlmClient for ExtractiveClient {
    fn provider_name(&self) -> &str {
        "extractive"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &LlmRequest) -> PackResult<LlmResponse> {
        let passages: Vec<&str> = request
            .context
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .take(self.max_passages)
            .collect();

        let content = if passages.is_empty() {
            NO_ANSWER.to_string()
        } else {
            passages.join("\n\n")
        };

        let prompt_words = request.prompt.split_whitespace().count() as u32;
        let answer_words = content.split_whitespace().count() as u32;

        Ok(LlmResponse {
            content,
            model: self.model.clone(),
            usage: LlmUsage::new(prompt_words, answer_words),
        })
    }
}
