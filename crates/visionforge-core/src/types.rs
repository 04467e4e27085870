//! Core data types: provider selection, processing options, work items and
//! the canonical per-image result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Placeholder caption used when a provider reply carries none.
pub const CAPTION_PLACEHOLDER: &str = "No caption generated";

/// Supported providers.
///
/// `Google` speaks the structured-schema protocol; every other kind speaks the
/// OpenAI-compatible chat completions protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Google,
    Openai,
    Deepseek,
    Doubao,
    Qwen,
    Glm,
    Claude,
    Custom,
}

/// Static defaults for a provider kind.
#[derive(Debug, Clone, Copy)]
pub struct ProviderPreset {
    pub label: &'static str,
    pub default_base_url: Option<&'static str>,
    pub default_model: &'static str,
    pub api_key_env: &'static str,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 8] = [
        ProviderKind::Google,
        ProviderKind::Openai,
        ProviderKind::Deepseek,
        ProviderKind::Doubao,
        ProviderKind::Qwen,
        ProviderKind::Glm,
        ProviderKind::Claude,
        ProviderKind::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Google => "google",
            ProviderKind::Openai => "openai",
            ProviderKind::Deepseek => "deepseek",
            ProviderKind::Doubao => "doubao",
            ProviderKind::Qwen => "qwen",
            ProviderKind::Glm => "glm",
            ProviderKind::Claude => "claude",
            ProviderKind::Custom => "custom",
        }
    }

    /// Parse a provider kind from its lowercase name.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// Whether this kind uses the structured-schema protocol.
    pub fn uses_structured_schema(&self) -> bool {
        matches!(self, ProviderKind::Google)
    }

    pub fn preset(&self) -> ProviderPreset {
        match self {
            ProviderKind::Google => ProviderPreset {
                label: "Google Gemini",
                default_base_url: Some("https://generativelanguage.googleapis.com/v1beta"),
                default_model: "gemini-2.5-flash",
                api_key_env: "GEMINI_API_KEY",
            },
            ProviderKind::Openai => ProviderPreset {
                label: "OpenAI (ChatGPT)",
                default_base_url: Some("https://api.openai.com/v1"),
                default_model: "gpt-4o",
                api_key_env: "OPENAI_API_KEY",
            },
            ProviderKind::Deepseek => ProviderPreset {
                label: "DeepSeek",
                default_base_url: Some("https://api.deepseek.com"),
                default_model: "deepseek-chat",
                api_key_env: "DEEPSEEK_API_KEY",
            },
            ProviderKind::Doubao => ProviderPreset {
                label: "Doubao",
                default_base_url: Some("https://ark.cn-beijing.volces.com/api/v3"),
                default_model: "doubao-vision-pro-32k",
                api_key_env: "ARK_API_KEY",
            },
            ProviderKind::Qwen => ProviderPreset {
                label: "Qwen",
                default_base_url: Some("https://dashscope.aliyuncs.com/compatible-mode/v1"),
                default_model: "qwen-vl-max",
                api_key_env: "DASHSCOPE_API_KEY",
            },
            ProviderKind::Glm => ProviderPreset {
                label: "Zhipu GLM-4V",
                default_base_url: Some("https://open.bigmodel.cn/api/paas/v4"),
                default_model: "glm-4v",
                api_key_env: "ZHIPUAI_API_KEY",
            },
            ProviderKind::Claude => ProviderPreset {
                label: "Claude (via OpenRouter/compatible)",
                default_base_url: Some("https://openrouter.ai/api/v1"),
                default_model: "anthropic/claude-3.5-sonnet",
                api_key_env: "OPENROUTER_API_KEY",
            },
            ProviderKind::Custom => ProviderPreset {
                label: "Custom OpenAI-compatible API",
                default_base_url: None,
                default_model: "",
                api_key_env: "VISIONFORGE_API_KEY",
            },
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved provider settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    /// Overrides the kind's preset base URL when set
    pub base_url: Option<String>,
    pub model: String,
}

impl ProviderConfig {
    /// Provider config with the kind's preset model and no credential.
    pub fn for_kind(kind: ProviderKind) -> Self {
        Self {
            kind,
            api_key: String::new(),
            base_url: None,
            model: kind.preset().default_model.to_string(),
        }
    }

    /// The base URL to call: explicit override, else the preset default.
    pub fn endpoint(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .or(self.kind.preset().default_base_url)
    }
}

/// Which optional fields to request from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingOptions {
    pub confidence: bool,
    pub tags: bool,
    pub ocr: bool,
    pub colors: bool,
    pub category: bool,
    pub reasoning: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            confidence: false,
            tags: true,
            ocr: false,
            colors: false,
            category: false,
            reasoning: false,
        }
    }
}

impl ProcessingOptions {
    /// Options with every optional field disabled (caption only).
    pub fn caption_only() -> Self {
        Self {
            confidence: false,
            tags: false,
            ocr: false,
            colors: false,
            category: false,
            reasoning: false,
        }
    }

    /// Options with every optional field enabled.
    pub fn all() -> Self {
        Self {
            confidence: true,
            tags: true,
            ocr: true,
            colors: true,
            category: true,
            reasoning: true,
        }
    }
}

/// Opaque, unique identifier of an [`ImageItem`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an item's image bytes come from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Read from disk when the item is processed
    File { path: PathBuf, media_type: String },
    /// Already in memory
    Bytes {
        file_name: String,
        media_type: String,
        data: Vec<u8>,
    },
}

impl ImageSource {
    /// Image file on disk; the MIME type is guessed from the extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let media_type = crate::discovery::media_type_for_path(&path).to_string();
        ImageSource::File { path, media_type }
    }

    pub fn from_bytes(file_name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        ImageSource::Bytes {
            file_name: file_name.into(),
            media_type: media_type.into(),
            data,
        }
    }

    /// The source file name, used as the `image` key on export.
    pub fn file_name(&self) -> String {
        match self {
            ImageSource::File { path, .. } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.to_string_lossy().into_owned()),
            ImageSource::Bytes { file_name, .. } => file_name.clone(),
        }
    }

    pub fn media_type(&self) -> &str {
        match self {
            ImageSource::File { media_type, .. } | ImageSource::Bytes { media_type, .. } => {
                media_type
            }
        }
    }
}

/// Data-free view of an item's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Idle,
    Pending,
    Success,
    Error,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ItemStatus::Idle => "idle",
            ItemStatus::Pending => "pending",
            ItemStatus::Success => "success",
            ItemStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Processing state of an item. A result exists only in `Success` and an
/// error message only in `Error`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ItemState {
    #[default]
    Idle,
    Pending,
    Success(CanonicalResult),
    Error(String),
}

impl ItemState {
    pub fn status(&self) -> ItemStatus {
        match self {
            ItemState::Idle => ItemStatus::Idle,
            ItemState::Pending => ItemStatus::Pending,
            ItemState::Success(_) => ItemStatus::Success,
            ItemState::Error(_) => ItemStatus::Error,
        }
    }
}

/// One image in the working set.
#[derive(Debug, Clone)]
pub struct ImageItem {
    id: ItemId,
    pub image: ImageSource,
    state: ItemState,
    /// Fields imported from a dataset manifest, preserved on export
    pub original_fields: Option<serde_json::Map<String, serde_json::Value>>,
}

impl ImageItem {
    /// Create a new idle item with a fresh id.
    pub fn new(image: ImageSource) -> Self {
        Self {
            id: ItemId::generate(),
            image,
            state: ItemState::Idle,
            original_fields: None,
        }
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn state(&self) -> &ItemState {
        &self.state
    }

    pub fn status(&self) -> ItemStatus {
        self.state.status()
    }

    pub fn result(&self) -> Option<&CanonicalResult> {
        match &self.state {
            ItemState::Success(result) => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            ItemState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// Idle and errored items are queued by the next run.
    pub fn is_eligible(&self) -> bool {
        matches!(self.state, ItemState::Idle | ItemState::Error(_))
    }

    pub(crate) fn set_state(&mut self, state: ItemState) {
        self.state = state;
    }
}

/// Provider-agnostic analysis of one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalResult {
    pub caption: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,

    /// Dominant colors as hex strings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    pub model_name: String,

    pub inference_time_ms: u64,

    pub timestamp: DateTime<Utc>,
}
