//! Command handlers for the ragpack CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod create;
pub mod info;
pub mod query;
pub mod rebuild;

pub use ask::AskCommand;
pub use create::CreateCommand;
pub use info::InfoCommand;
pub use query::QueryCommand;
pub use rebuild::RebuildCommand;

use anyhow::Result;
use ragpack::{EmbeddingConfig, KdfParams, LoadOptions, Pack, ResolutionStatus};
use ragpack_core::{AppConfig, ProviderSpec};
use ragpack_llm::{LlmConfig, LlmDescriptor};
use std::path::Path;

/// Provider choices given explicitly on the command line.
///
/// Only these override what a pack recorded; config-file and environment
/// defaults apply to new packs.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub embedding: Option<ProviderSpec>,
    pub dimensions: Option<usize>,
    pub llm: Option<ProviderSpec>,
}

/// Everything a command needs besides its own arguments.
pub struct Context {
    pub config: AppConfig,
    pub overrides: Overrides,
    pub password: Option<String>,
}

impl Context {
    pub fn kdf(&self) -> KdfParams {
        KdfParams::new(
            self.config.kdf.memory_kib,
            self.config.kdf.iterations,
            self.config.kdf.parallelism,
        )
    }

    /// Load a pack, applying command-line provider overrides.
    pub fn load_pack(&self, path: &Path) -> Result<(Pack, ResolutionStatus)> {
        let recorded = Pack::inspect(path)?.index.embedding;

        let mut options = LoadOptions::default().with_settings(self.config.clone());
        if let Some(password) = &self.password {
            options = options.with_password(password.clone());
        }

        let embedding = match (&self.overrides.embedding, self.overrides.dimensions) {
            (Some(spec), dimensions) => {
                // Without explicit dimensions, keep the recorded ones for the
                // same model and fall back to the configured default otherwise.
                let dimensions = dimensions.unwrap_or(if spec.model == recorded.model {
                    recorded.dimensions
                } else {
                    self.config.embedding_dimensions
                });
                Some((spec.clone(), dimensions))
            }
            (None, Some(dimensions)) => Some((
                ProviderSpec::new(recorded.provider.clone(), recorded.model.clone()),
                dimensions,
            )),
            (None, None) => None,
        };
        if let Some((spec, dimensions)) = embedding {
            options = options.with_embedding(EmbeddingConfig::from_spec(
                &spec,
                dimensions,
                &self.config,
            ));
        }

        if let Some(spec) = &self.overrides.llm {
            options = options.with_llm(LlmConfig::from_app_config(
                &LlmDescriptor::from(spec),
                &self.config,
            ));
        }

        let (pack, status) = Pack::load(path, options)?;
        tracing::debug!("Loaded {} with status {}", path.display(), status.label());
        Ok((pack, status))
    }
}

/// Print a value as pretty JSON on stdout.
pub fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
