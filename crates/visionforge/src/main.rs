//! VisionForge CLI - batch image captioning for training datasets.
//!
//! Sends images to a vision-language model (Gemini, OpenAI, DeepSeek, Doubao,
//! Qwen, GLM, Claude via OpenRouter, or any OpenAI-compatible endpoint) and
//! writes a JSONL dataset plus a statistics report.
//!
//! # Usage
//!
//! ```bash
//! # Caption a folder with the configured provider
//! visionforge caption ./photos/
//!
//! # Caption with DeepSeek, requesting every optional field
//! visionforge caption ./photos/ --provider deepseek --all-fields -o dataset.jsonl
//!
//! # Turn an idea into a captioning prompt
//! visionforge optimize "product shots for an e-commerce catalog"
//!
//! # View configuration
//! visionforge config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// VisionForge - batch image captioning across vision LLM providers.
#[derive(Parser, Debug)]
#[command(name = "visionforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Caption images and write a JSONL dataset and stats report
    Caption(cli::caption::CaptionArgs),

    /// Refine a short idea into a captioning prompt
    Optimize(cli::optimize::OptimizeArgs),

    /// List supported providers and their defaults
    Providers,

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = match visionforge_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `visionforge config path`."
            );
            visionforge_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("VisionForge v{}", visionforge_core::VERSION);

    match cli.command {
        Commands::Caption(args) => cli::caption::execute(args, &config).await,
        Commands::Optimize(args) => cli::optimize::execute(args, &config).await,
        Commands::Providers => cli::providers::execute().await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
