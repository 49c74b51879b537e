//! Query command handler.
//!
//! Retrieves the chunks most similar to a query without calling an LLM.

use super::{print_json, Context};
use anyhow::{bail, Result};
use clap::Args;
use ragpack::ResolutionStatus;
use std::path::PathBuf;

/// Retrieve the most similar chunks from a pack
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// Pack file
    pub pack: PathBuf,

    /// Query text
    pub text: String,

    /// Number of chunks to retrieve
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl QueryCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        tracing::info!("Executing query command for {}", self.pack.display());

        let (pack, status) = ctx.load_pack(&self.pack)?;
        if let ResolutionStatus::RebuildRequired(mismatch) = status {
            bail!(
                "{}. Run `ragpack rebuild` or `ragpack ask --rebuild` first",
                mismatch
            );
        }

        let results = pack.query(&self.text, self.top_k).await?;

        if self.json {
            return print_json(&serde_json::json!({
                "query": self.text,
                "results": results,
            }));
        }

        if results.is_empty() {
            println!("No results.");
            return Ok(());
        }
        for (i, chunk) in results.iter().enumerate() {
            println!(
                "{}. [{:.3}] {} (chunk {})",
                i + 1,
                chunk.score,
                chunk.filename,
                chunk.chunk_index + 1
            );
            println!("   {}", chunk.text.replace('\n', "\n   "));
        }

        Ok(())
    }
}
