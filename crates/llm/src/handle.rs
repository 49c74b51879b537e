//! Deferred LLM client binding.

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use crate::factory::create_client;
use crate::types::{LlmConfig, LlmDescriptor};
use ragpack_core::{PackError, PackResult};
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// An LLM client that is described up front and constructed on first use.
///
/// Loading a pack never needs a reachable model runtime; the client is only
/// built when an answer is requested. Clones share the same instance.
#[derive(Clone)]
pub struct LlmHandle {
    config: LlmConfig,
    client: Arc<OnceCell<Arc<dyn LlmClient>>>,
}

impl fmt::Debug for LlmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmHandle")
            .field("provider", &self.descriptor().label())
            .field("initialized", &self.client.initialized())
            .finish()
    }
}

impl LlmHandle {
    pub fn from_config(config: LlmConfig) -> Self {
        Self {
            config,
            client: Arc::new(OnceCell::new()),
        }
    }

    pub fn from_descriptor(descriptor: &LlmDescriptor) -> Self {
        Self::from_config(LlmConfig::from_descriptor(descriptor))
    }

    /// Wrap an already constructed client.
    pub fn from_instance(client: Arc<dyn LlmClient>) -> Self {
        let config = LlmConfig {
            provider: client.provider_name().to_string(),
            model: client.model_name().to_string(),
            ..Default::default()
        };
        Self {
            config,
            client: Arc::new(OnceCell::new_with(Some(client))),
        }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub fn descriptor(&self) -> LlmDescriptor {
        self.config.descriptor()
    }

    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }

    /// The client instance, constructing it on first call.
    pub async fn client(&self) -> PackResult<Arc<dyn LlmClient>> {
        let client = self
            .client
            .get_or_try_init(|| async {
                tracing::debug!("Constructing LLM client {}", self.descriptor().label());
                create_client(&self.config)
            })
            .await?;
        Ok(Arc::clone(client))
    }

    /// Run a completion, attributing failures to this provider.
    pub async fn complete(&self, request: &LlmRequest) -> PackResult<LlmResponse> {
        let client = self.client().await?;
        client.complete(request).await.map_err(|e| match e {
            e @ (PackError::Provider { .. } | PackError::ProviderUnavailable(_)) => e,
            other => PackError::provider(self.descriptor().label(), other),
        })
    }
}
