//! LLM integration crate for ragpack.
//!
//! Provider-agnostic answer generation behind the `LlmClient` trait.
//!
//! # Providers
//! - **ollama**: Local LLM runtime
//! - **openai**: OpenAI-compatible chat completions endpoints
//! - **extractive**: Offline, returns the best retrieved passage
//!
//! # Example
//! ```no_run
//! use ragpack_llm::{create_client, LlmConfig, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LlmConfig {
//!     provider: "ollama".to_string(),
//!     model: "llama3.2".to_string(),
//!     ..Default::default()
//! };
//! let client = create_client(&config)?;
//! let response = client.complete(&LlmRequest::new("Hello, world!", "llama3.2")).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod handle;
pub mod providers;
pub mod types;

pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use handle::LlmHandle;
pub use types::{LlmConfig, LlmDescriptor};
