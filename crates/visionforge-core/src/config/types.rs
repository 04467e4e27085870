//! Sub-configuration structs with their defaults.

use crate::types::ProviderKind;
use serde::{Deserialize, Serialize};

/// Provider selection and credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProviderSection {
    /// Provider kind ("google", "openai", "deepseek", ...)
    pub kind: ProviderKind,

    /// API key (supports ${ENV_VAR} syntax). Empty falls back to the
    /// provider's conventional env var.
    pub api_key: String,

    /// Base URL override for OpenAI-compatible providers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Model identifier. Empty uses the provider's preset model.
    pub model: String,
}

/// Captioning prompt settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Prompt sent with every image
    pub text: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            text: "Describe this image in detail for use as training data.".to_string(),
        }
    }
}

/// Sampling parameters for the chat completions protocol.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1500,
            temperature: 0.2,
        }
    }
}

/// Input discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Supported input extensions
    pub supported_formats: Vec<String>,

    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            supported_formats: ["jpg", "jpeg", "png", "webp", "gif", "bmp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            max_file_size_mb: 20,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default dataset file (JSONL)
    pub dataset_file: String,

    /// Default statistics report file
    pub report_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dataset_file: "vision_dataset.jsonl".to_string(),
            report_file: "stats_report.txt".to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
