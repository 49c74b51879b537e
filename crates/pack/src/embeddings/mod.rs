//! Embedding providers.
//!
//! Provider-agnostic embedding generation. A pack records the descriptor of
//! the provider that built its index; callers bind a provider through an
//! [`EmbeddingHandle`], which constructs the instance on first use.

pub mod config;
pub mod handle;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use handle::EmbeddingHandle;
pub use provider::{create_provider, EmbeddingProvider};
