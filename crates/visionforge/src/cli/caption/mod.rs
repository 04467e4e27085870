//! The `visionforge caption` command for batch captioning.

mod run;
mod setup;

use clap::Args;
use std::path::PathBuf;
use visionforge_core::Config;

use super::types::{OptionFlags, ProviderArgs};
use run::run_session;
use setup::prepare_session;

/// Arguments for the `caption` command.
#[derive(Args, Debug)]
pub struct CaptionArgs {
    /// Image files or directories (searched recursively)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// JSONL manifest whose records are preserved in the dataset output
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Captioning prompt (defaults to the configured prompt)
    #[arg(long)]
    pub prompt: Option<String>,

    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(flatten)]
    pub fields: OptionFlags,

    /// Dataset output file (JSONL)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Statistics report file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Do not write the statistics report
    #[arg(long, conflicts_with = "report")]
    pub no_report: bool,
}

/// Manual Default impl for constructing CaptionArgs outside of clap.
impl Default for CaptionArgs {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            manifest: None,
            prompt: None,
            provider: ProviderArgs::default(),
            fields: OptionFlags::default(),
            output: None,
            report: None,
            no_report: false,
        }
    }
}

/// Execute the caption command.
pub async fn execute(args: CaptionArgs, config: &Config) -> anyhow::Result<()> {
    let session = prepare_session(&args, config)?;
    run_session(session).await
}
