//! Error types for ragpack.
//!
//! A single enum covers every failure a pack operation can surface. A wrong
//! password (`AuthenticationFailed`) is reported separately from a damaged
//! file (`CorruptArtifact`) and from a stale index (`RebuildRequired`).

use thiserror::Error;

/// Unified error type for ragpack.
///
/// All fallible functions in the workspace return `Result<T, PackError>`.
#[derive(Error, Debug)]
pub enum PackError {
    /// Structural decode failure: truncated, malformed or inconsistent bytes.
    #[error("Corrupt artifact: {0}")]
    CorruptArtifact(String),

    /// Wrong password or tampered ciphertext.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Unsupported or unknown manifest schema version.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Index blob inconsistent with the declared dimensionality.
    #[error("Index corrupt: {0}")]
    IndexCorrupt(String),

    /// Missing pack file, logical path or document id.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The embedding provider changed and the index has not been rebuilt yet.
    #[error("Index rebuild required: {0}")]
    RebuildRequired(String),

    /// The backing implementation for a provider could not be constructed.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A provider call failed. `provider` is the `provider:model` identity.
    #[error("Provider '{provider}' failed: {message}")]
    Provider { provider: String, message: String },

    /// Caller supplied an argument the pack cannot accept.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl PackError {
    /// Wrap a provider failure with the provider identity.
    pub fn provider(provider: impl Into<String>, message: impl std::fmt::Display) -> Self {
        PackError::Provider {
            provider: provider.into(),
            message: message.to_string(),
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            PackError::CorruptArtifact(_) => "corrupt_artifact",
            PackError::AuthenticationFailed(_) => "authentication_failed",
            PackError::Schema(_) => "schema_error",
            PackError::IndexCorrupt(_) => "index_corrupt",
            PackError::NotFound(_) => "not_found",
            PackError::RebuildRequired(_) => "rebuild_required",
            PackError::ProviderUnavailable(_) => "provider_unavailable",
            PackError::Provider { .. } => "provider_error",
            PackError::InvalidInput(_) => "invalid_input",
            PackError::Config(_) => "config",
            PackError::Io(_) => "io",
            PackError::Serialization(_) => "serialization",
            PackError::Other(_) => "other",
        }
    }
}

impl From<serde_json::Error> for PackError {
    fn from(err: serde_json::Error) -> Self {
        PackError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for PackError {
    fn from(err: serde_yaml::Error) -> Self {
        PackError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with PackError.
pub type PackResult<T> = Result<T, PackError>;
