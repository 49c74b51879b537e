//! Rebuild command handler.
//!
//! Re-embeds a pack's stored chunks with another embedding provider and
//! writes the result.

use super::{print_json, Context};
use anyhow::Result;
use clap::Args;
use ragpack::SaveOptions;
use std::path::PathBuf;

/// Re-embed a pack with the given --embedding / --dimensions
#[derive(Args, Debug)]
pub struct RebuildCommand {
    /// Pack file
    pub pack: PathBuf,

    /// Write the rebuilt pack here instead of replacing the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RebuildCommand {
    pub async fn execute(&self, ctx: &Context) -> Result<()> {
        tracing::info!("Executing rebuild command for {}", self.pack.display());

        if ctx.overrides.embedding.is_none() && ctx.overrides.dimensions.is_none() {
            tracing::warn!("No --embedding or --dimensions given; re-embedding with the recorded provider");
        }

        let (pack, status) = ctx.load_pack(&self.pack)?;
        tracing::debug!("Resolution before rebuild: {}", status.label());

        let report = pack.rebuild().await?;

        // Keep encryption as it was.
        let save = SaveOptions {
            password: if pack.manifest().is_encrypted() {
                ctx.password.clone()
            } else {
                None
            },
            kdf: ctx.kdf(),
        };
        let output = self.output.as_ref().unwrap_or(&self.pack);
        pack.save_with(output, &save).await?;

        if self.json {
            print_json(&serde_json::json!({
                "path": output,
                "report": report,
            }))?;
        } else {
            println!(
                "Rebuilt {}: {} -> {} ({} documents, {} vectors in {:.2}s)",
                output.display(),
                report.previous.label(),
                report.current.label(),
                report.documents,
                report.vectors,
                report.duration_secs
            );
        }

        Ok(())
    }
}
