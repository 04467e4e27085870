//! The option → key mapping shared by both protocols, and the loosely typed
//! field map an adapter hands to the normalizer.

use serde_json::{json, Map, Value};

use crate::types::{ProcessingOptions, CAPTION_PLACEHOLDER};

/// Key of the one field every reply carries.
pub const CAPTION_KEY: &str = "caption";

/// An optional output field, one per processing flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionalField {
    Confidence,
    Tags,
    OcrText,
    Colors,
    Category,
    Reasoning,
}

impl OptionalField {
    pub const ALL: [OptionalField; 6] = [
        OptionalField::Confidence,
        OptionalField::Tags,
        OptionalField::OcrText,
        OptionalField::Colors,
        OptionalField::Category,
        OptionalField::Reasoning,
    ];

    /// Wire key used by both protocols.
    pub fn key(&self) -> &'static str {
        match self {
            OptionalField::Confidence => "confidence",
            OptionalField::Tags => "tags",
            OptionalField::OcrText => "ocr_text",
            OptionalField::Colors => "colors",
            OptionalField::Category => "category",
            OptionalField::Reasoning => "reasoning",
        }
    }

    pub fn is_enabled(&self, options: &ProcessingOptions) -> bool {
        match self {
            OptionalField::Confidence => options.confidence,
            OptionalField::Tags => options.tags,
            OptionalField::OcrText => options.ocr,
            OptionalField::Colors => options.colors,
            OptionalField::Category => options.category,
            OptionalField::Reasoning => options.reasoning,
        }
    }

    /// Property declaration for the structured-schema protocol.
    pub fn schema(&self) -> Value {
        match self {
            OptionalField::Confidence => json!({
                "type": "NUMBER",
                "description": "Confidence score 0-1."
            }),
            OptionalField::Tags => json!({
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Key visual tags."
            }),
            OptionalField::OcrText => json!({
                "type": "STRING",
                "description": "All visible text in the image. Empty if none."
            }),
            OptionalField::Colors => json!({
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Dominant colors in Hex format (e.g. #FF0000)."
            }),
            OptionalField::Category => json!({
                "type": "STRING",
                "description": "General category of the image (e.g. Scenery, Document, Person)."
            }),
            OptionalField::Reasoning => json!({
                "type": "STRING",
                "description": "Brief reasoning for why the caption was generated this way."
            }),
        }
    }

    /// Field line for the free-form JSON instruction block.
    pub fn instruction(&self) -> &'static str {
        match self {
            OptionalField::Confidence => r#""confidence": (number 0-1)"#,
            OptionalField::Tags => r#""tags": ["tag1", "tag2"]"#,
            OptionalField::OcrText => r#""ocr_text": "extracted text from image (if any)""#,
            OptionalField::Colors => {
                r##""colors": ["#HexCode1", "#HexCode2"] (dominant colors)"##
            }
            OptionalField::Category => {
                r#""category": "general category (e.g. Portrait, Landscape, UI)""#
            }
            OptionalField::Reasoning => r#""reasoning": "brief explanation of the analysis""#,
        }
    }

    /// Fields enabled by `options`, in declaration order.
    pub fn enabled(options: &ProcessingOptions) -> impl Iterator<Item = OptionalField> + '_ {
        Self::ALL.into_iter().filter(move |f| f.is_enabled(options))
    }
}

/// How an adapter treats a reply that is not valid JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePolicy {
    /// Keep the raw reply text as the caption
    FallbackToCaption,
    /// Fail the item
    Strict,
}

/// Untyped key/value reply from a provider, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap(Map<String, Value>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field map holding only a caption.
    pub fn caption_only(caption: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert(CAPTION_KEY.to_string(), Value::String(caption.into()));
        Self(map)
    }

    /// Decode reply text under a parse policy.
    ///
    /// Returns `Err(message)` only under [`ParsePolicy::Strict`]; the caller
    /// wraps it into an adapter error with its provider name. Valid JSON that
    /// is not an object carries no fields, so it decodes to an empty map.
    pub fn decode(text: &str, policy: ParsePolicy) -> Result<Self, String> {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(Self(map)),
            Ok(other) => {
                tracing::debug!(
                    "Reply is {}, not an object; no fields decoded",
                    json_kind(&other)
                );
                Ok(Self::new())
            }
            Err(e) => match policy {
                ParsePolicy::Strict => Err(e.to_string()),
                ParsePolicy::FallbackToCaption => {
                    tracing::warn!("Reply is not valid JSON ({e}); using raw text as caption");
                    Ok(Self::fallback(text))
                }
            },
        }
    }

    fn fallback(text: &str) -> Self {
        if text.is_empty() {
            Self::caption_only(CAPTION_PLACEHOLDER)
        } else {
            Self::caption_only(text)
        }
    }

    /// Drop every key other than `caption` and the fields enabled in `options`.
    pub fn restrict_to(mut self, options: &ProcessingOptions) -> Self {
        self.0.retain(|key, _| {
            key == CAPTION_KEY
                || OptionalField::enabled(options).any(|field| field.key() == key)
        });
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for FieldMap {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
