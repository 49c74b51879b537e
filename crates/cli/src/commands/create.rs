//! Create command handler.
//!
//! Builds a pack from `.txt`/`.md` sources and saves it.

use super::{print_json, Context};
use crate::sources::collect_documents;
use anyhow::{bail, Result};
use clap::Args;
use ragpack::{
    BuildOptions, ChunkConfig, EmbeddingConfig, EmbeddingHandle, Pack, SaveOptions,
};
use ragpack_llm::{LlmConfig, LlmDescriptor, LlmHandle};
use std::path::PathBuf;

/// Build a pack from source files
#[derive(Args, Debug)]
pub struct CreateCommand {
    /// Output pack file (e.g. docs.rag)
    pub output: PathBuf,

    /// Files or directories to ingest
    #[arg(long = "path", required = true)]
    pub paths: Vec<PathBuf>,

    /// Pack name (default: output file stem)
    #[arg(long)]
    pub name: Option<String>,

    /// Chunk size in characters
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Overlap between consecutive chunks in characters
    #[arg(long)]
    pub chunk_overlap: Option<usize>,

    /// Encrypt the pack (password from --password or RAGPACK_PASSWORD)
    #[arg(long)]
    pub encrypt: bool,

    /// Store the original file bytes alongside the extracted text
    #[arg(long)]
    pub keep_raw: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CreateCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        tracing::info!("Executing create command for {}", self.output.display());
        let config = &ctx.config;
        config.validate()?;

        let password = match (self.encrypt, &ctx.password) {
            (true, Some(password)) => Some(password.clone()),
            (true, None) => bail!("--encrypt needs a password (--password or RAGPACK_PASSWORD)"),
            (false, Some(_)) => {
                tracing::warn!("A password was given without --encrypt; the pack is not encrypted");
                None
            }
            (false, None) => None,
        };

        let documents = collect_documents(&self.paths, self.keep_raw)?;
        if documents.is_empty() {
            bail!("No .txt or .md documents found in the given paths");
        }

        let chunking = ChunkConfig::new(self.chunk_size.unwrap_or(config.chunking.size))
            .with_overlap(self.chunk_overlap.unwrap_or(config.chunking.overlap))?;

        let name = self.name.clone().unwrap_or_else(|| {
            self.output
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "pack".to_string())
        });

        let embedding = EmbeddingHandle::from_config(EmbeddingConfig::from_spec(
            &config.embedding,
            config.embedding_dimensions,
            config,
        ));
        let llm = LlmHandle::from_config(LlmConfig::from_app_config(
            &LlmDescriptor::from(&config.llm),
            config,
        ));

        let options = BuildOptions {
            name,
            chunking,
            ..Default::default()
        };
        let pack = Pack::build(documents, embedding, llm, options).await?;

        let save = SaveOptions {
            password,
            kdf: ctx.kdf(),
        };
        pack.save_with(&self.output, &save).await?;

        let manifest = pack.manifest();
        if self.json {
            print_json(&serde_json::json!({
                "path": self.output,
                "name": manifest.name,
                "packId": manifest.pack_id,
                "documents": manifest.documents.len(),
                "chunks": manifest.total_chunks(),
                "embedding": manifest.embedding,
                "llm": manifest.llm,
                "encrypted": save.password.is_some(),
            }))?;
        } else {
            println!(
                "Created {} ({} documents, {} chunks, {}{})",
                self.output.display(),
                manifest.documents.len(),
                manifest.total_chunks(),
                manifest.embedding.label(),
                if save.password.is_some() {
                    ", encrypted"
                } else {
                    ""
                }
            );
        }

        Ok(())
    }
}
