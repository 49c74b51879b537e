//! Reconciles the providers a pack was built with against caller overrides.

use crate::manifest::EmbeddingDescriptor;
use ragpack_llm::LlmDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An embedding override the stored index cannot serve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMismatch {
    pub recorded: EmbeddingDescriptor,
    pub requested: EmbeddingDescriptor,
}

impl fmt::Display for ProviderMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index was built with {}, requested {}",
            self.recorded.label(),
            self.requested.label()
        )
    }
}

/// Provider binding state of a loaded pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// Recorded providers are used as-is.
    Bound,
    /// LLM replaced, or embedding replaced by a compatible one.
    Overridden,
    /// The stored index must be regenerated before any query.
    RebuildRequired(ProviderMismatch),
    /// Index usable and providers bound.
    Ready,
}

impl ResolutionStatus {
    pub fn needs_rebuild(&self) -> bool {
        matches!(self, ResolutionStatus::RebuildRequired(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResolutionStatus::Bound => "bound",
            ResolutionStatus::Overridden => "overridden",
            ResolutionStatus::RebuildRequired(_) => "rebuild_required",
            ResolutionStatus::Ready => "ready",
        }
    }
}

/// Outcome of [`resolve`]: the status and the providers to bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub status: ResolutionStatus,
    pub embedding: EmbeddingDescriptor,
    pub llm: LlmDescriptor,
}

/// Decide which providers a loaded pack binds.
///
/// An embedding override whose model or dimensionality differs from the
/// recorded one yields `RebuildRequired`; this outranks an LLM override.
pub fn resolve(
    recorded_embedding: &EmbeddingDescriptor,
    recorded_llm: &LlmDescriptor,
    embedding_override: Option<&EmbeddingDescriptor>,
    llm_override: Option<&LlmDescriptor>,
) -> Resolution {
    let embedding = embedding_override.unwrap_or(recorded_embedding).clone();
    let llm = llm_override.unwrap_or(recorded_llm).clone();

    let status = if !recorded_embedding.is_compatible(&embedding) {
        ResolutionStatus::RebuildRequired(ProviderMismatch {
            recorded: recorded_embedding.clone(),
            requested: embedding.clone(),
        })
    } else if embedding != *recorded_embedding || llm != *recorded_llm {
        ResolutionStatus::Overridden
    } else {
        ResolutionStatus::Bound
    };

    Resolution {
        status,
        embedding,
        llm,
    }
}
