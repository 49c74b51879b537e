//! Info command handler.

use super::print_json;
use anyhow::Result;
use clap::Args;
use ragpack::Pack;
use std::path::PathBuf;

/// Show a pack's manifest (no password needed)
#[derive(Args, Debug)]
pub struct InfoCommand {
    /// Pack file
    pub pack: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl InfoCommand {
    pub async fn execute(&self) -> Result<()> {
        tracing::info!("Executing info command for {}", self.pack.display());

        let manifest = Pack::inspect(&self.pack)?;

        if self.json {
            return print_json(&manifest);
        }

        println!("Pack: {}", manifest.name);
        println!("  Id: {}", manifest.pack_id);
        println!(
            "  Format: {}.{}",
            manifest.format_version, manifest.format_revision
        );
        println!("  Created: {}", manifest.created_at.to_rfc3339());
        println!("  Embedding: {}", manifest.embedding.label());
        println!("  LLM: {}", manifest.llm.label());
        println!(
            "  Chunking: size {}, overlap {}",
            manifest.chunking.chunk_size, manifest.chunking.chunk_overlap
        );
        println!(
            "  Index: {} ({} vectors)",
            manifest.index.engine, manifest.index.vector_count
        );
        match &manifest.encryption {
            Some(encryption) => println!(
                "  Encryption: {} with {} (m={}KiB, t={}, p={})",
                encryption.cipher,
                encryption.kdf.algorithm,
                encryption.kdf.memory_kib,
                encryption.kdf.iterations,
                encryption.kdf.parallelism
            ),
            None => println!("  Encryption: none"),
        }
        println!("  Documents: {}", manifest.documents.len());
        for document in &manifest.documents {
            println!(
                "  - {} ({}, {} chunks)",
                document.filename, document.id, document.chunk_count
            );
        }

        Ok(())
    }
}
