//! LLM provider implementations.

pub mod extractive;
pub mod ollama;
pub mod openai;

pub use extractive::ExtractiveClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
