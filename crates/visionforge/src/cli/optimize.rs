//! The `visionforge optimize` command: refine a prompt idea with the model.

use clap::Args;
use visionforge_core::{AdapterFactory, Config};

use super::types::ProviderArgs;

/// Arguments for the `optimize` command.
#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Short description of what the captions should focus on
    #[arg(required = true)]
    pub idea: String,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

/// Execute the optimize command.
pub async fn execute(args: OptimizeArgs, config: &Config) -> anyhow::Result<()> {
    let idea = args.idea.trim();
    if idea.is_empty() {
        anyhow::bail!("Prompt idea is empty");
    }

    let provider = args.provider.resolve(config);
    let adapter = AdapterFactory::create(&provider, &config.request)?;

    tracing::info!(provider = %provider.kind, model = %provider.model, "Refining prompt");
    let refined = adapter.refine_prompt(idea).await?;
    println!("{refined}");
    Ok(())
}
