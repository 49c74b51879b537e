//! Ask command handler.
//!
//! Answers a question from a pack's documents with the bound LLM.

use super::{print_json, Context};
use anyhow::{bail, Result};
use clap::Args;
use ragpack::{AskOptions, ResolutionStatus};
use std::path::PathBuf;

/// Ask a question answered from a pack
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Pack file
    pub pack: PathBuf,

    /// The question to ask
    pub question: String,

    /// Number of chunks to retrieve as context
    #[arg(short = 'k', long, default_value = "5")]
    pub top_k: usize,

    /// Maximum tokens in response
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Temperature for response generation (0.0-2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Rebuild the index in memory if the embedding override requires it
    #[arg(long)]
    pub rebuild: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        tracing::info!("Executing ask command for {}", self.pack.display());
        tracing::debug!("Ask command options: {:?}", self);

        let (pack, status) = ctx.load_pack(&self.pack)?;
        if let ResolutionStatus::RebuildRequired(mismatch) = &status {
            if !self.rebuild {
                bail!(
                    "{}. Pass --rebuild to re-embed in memory, or run `ragpack rebuild`",
                    mismatch
                );
            }
            let report = pack.rebuild().await?;
            tracing::info!(
                "Rebuilt {} vectors with {} for this session",
                report.vectors,
                report.current.label()
            );
        }

        let mut options = AskOptions {
            top_k: self.top_k,
            ..Default::default()
        };
        if let Some(max_tokens) = self.max_tokens {
            options.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            options.temperature = temperature;
        }

        let response = pack.ask(&self.question, &options).await?;

        tracing::debug!(
            "RAG response: max_score={:.3}, low_confidence={}, sources_count={}",
            response.max_score,
            response.low_confidence,
            response.sources.len()
        );

        if self.json {
            return print_json(&response);
        }

        println!("Answer:");
        println!("{}", response.answer);
        println!();

        if response.sources.is_empty() {
            println!("Sources: (no sources available)");
        } else {
            println!("Sources:");
            for source_ref in &response.sources {
                println!("- {} ({})", source_ref.source, source_ref.location);
            }
        }

        Ok(())
    }
}
