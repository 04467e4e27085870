//! VisionForge Core - multi-provider image captioning library.
//!
//! VisionForge sends images to a vision-language model and turns the replies
//! into a uniform record per image: a caption plus optional confidence, tags,
//! OCR text, dominant colors, category and reasoning. It is meant for
//! building captioned image datasets.
//!
//! # Architecture
//!
//! ```text
//! ItemCollection → BatchOrchestrator → ProviderAdapter → ResultNormalizer
//!                                                            ↓
//!                        StatsSnapshot / JSONL dataset ← CanonicalResult
//! ```
//!
//! Two provider protocols are supported: Gemini's structured-schema
//! `generateContent`, and OpenAI-compatible chat completions (OpenAI,
//! DeepSeek, Doubao, Qwen, GLM, OpenRouter, custom endpoints).
//!
//! # Usage
//!
//! ```rust,ignore
//! use visionforge_core::{BatchOrchestrator, Config, ImageSource, ItemCollection};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let orchestrator =
//!         BatchOrchestrator::from_config(&config.provider_config(), &config.request)?;
//!
//!     let mut items = ItemCollection::new();
//!     items.add(ImageSource::from_path("./cat.jpg"));
//!
//!     let summary = orchestrator
//!         .run(&mut items, &config.prompt.text, &config.options, |_| {})
//!         .await;
//!     println!("{} captioned", summary.succeeded);
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod batch;
pub mod config;
pub mod discovery;
pub mod error;
pub mod export;
pub mod manifest;
pub mod normalize;
pub mod stats;
pub mod types;

pub use adapter::{AdapterFactory, CaptionRequest, FieldMap, ProviderAdapter};
pub use batch::{BatchOrchestrator, ItemCollection, ProgressEvent, RunSummary};
pub use config::Config;
pub use discovery::ImageDiscovery;
pub use error::{AdapterError, ConfigError};
pub use normalize::ResultNormalizer;
pub use stats::StatsSnapshot;
pub use types::{
    CanonicalResult, ImageItem, ImageSource, ItemId, ItemState, ItemStatus, ProcessingOptions,
    ProviderConfig, ProviderKind,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
