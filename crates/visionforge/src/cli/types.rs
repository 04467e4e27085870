//! Shared CLI argument types: provider selection and option flags.

use clap::{Args, ValueEnum};
use visionforge_core::config::ProviderSection;
use visionforge_core::{Config, ProcessingOptions, ProviderConfig, ProviderKind};

/// Supported providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    /// Google Gemini (structured JSON schema)
    Google,
    /// OpenAI
    Openai,
    /// DeepSeek
    Deepseek,
    /// Doubao (Volcengine Ark)
    Doubao,
    /// Qwen (DashScope compatible mode)
    Qwen,
    /// Zhipu GLM
    Glm,
    /// Claude through OpenRouter or another compatible gateway
    Claude,
    /// Any OpenAI-compatible endpoint (requires --base-url)
    Custom,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Google => ProviderKind::Google,
            ProviderArg::Openai => ProviderKind::Openai,
            ProviderArg::Deepseek => ProviderKind::Deepseek,
            ProviderArg::Doubao => ProviderKind::Doubao,
            ProviderArg::Qwen => ProviderKind::Qwen,
            ProviderArg::Glm => ProviderKind::Glm,
            ProviderArg::Claude => ProviderKind::Claude,
            ProviderArg::Custom => ProviderKind::Custom,
        }
    }
}

impl std::fmt::Display for ProviderArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", ProviderKind::from(*self))
    }
}

/// Provider overrides for a single invocation.
#[derive(Args, Debug, Default, Clone)]
pub struct ProviderArgs {
    /// Provider to use (defaults to the configured provider)
    #[arg(short, long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Model identifier
    #[arg(short, long)]
    pub model: Option<String>,

    /// API base URL (required for the custom provider)
    #[arg(long)]
    pub base_url: Option<String>,

    /// API key (otherwise taken from config or the provider's env var)
    #[arg(long, env = "VISIONFORGE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl ProviderArgs {
    /// Resolve the provider for this run. Switching kind discards the
    /// configured key, model and URL, which belong to the other provider.
    pub fn resolve(&self, config: &Config) -> ProviderConfig {
        let mut config = config.clone();
        if let Some(kind) = self.provider.map(ProviderKind::from) {
            if kind != config.provider.kind {
                config.provider = ProviderSection {
                    kind,
                    ..ProviderSection::default()
                };
            }
        }

        let mut provider = config.provider_config();
        if let Some(model) = &self.model {
            provider.model = model.clone();
        }
        if let Some(base_url) = &self.base_url {
            provider.base_url = Some(base_url.clone());
        }
        if let Some(api_key) = self.api_key.as_ref().filter(|k| !k.is_empty()) {
            provider.api_key = api_key.clone();
        }
        provider
    }
}

/// Flags that toggle the optional output fields.
#[derive(Args, Debug, Default, Clone)]
pub struct OptionFlags {
    /// Request every optional field
    #[arg(long, conflicts_with = "caption_only")]
    pub all_fields: bool,

    /// Request the caption only
    #[arg(long)]
    pub caption_only: bool,

    /// Request a confidence score (0-1)
    #[arg(long)]
    pub confidence: bool,

    /// Request tags
    #[arg(long, conflicts_with = "no_tags")]
    pub tags: bool,

    /// Do not request tags
    #[arg(long)]
    pub no_tags: bool,

    /// Request text visible in the image
    #[arg(long)]
    pub ocr: bool,

    /// Request dominant colors
    #[arg(long)]
    pub colors: bool,

    /// Request a category
    #[arg(long)]
    pub category: bool,

    /// Request the model's reasoning
    #[arg(long)]
    pub reasoning: bool,
}

impl OptionFlags {
    /// Apply the flags on top of the configured defaults.
    pub fn apply(&self, base: ProcessingOptions) -> ProcessingOptions {
        let mut options = if self.all_fields {
            ProcessingOptions::all()
        } else if self.caption_only {
            ProcessingOptions::caption_only()
        } else {
            base
        };

        options.confidence |= self.confidence;
        options.tags = (options.tags || self.tags) && !self.no_tags;
        options.ocr |= self.ocr;
        options.colors |= self.colors;
        options.category |= self.category;
        options.reasoning |= self.reasoning;
        options
    }
}
