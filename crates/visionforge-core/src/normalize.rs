//! Mapping from an adapter's field map to a [`CanonicalResult`].
//!
//! Only type coercion happens here; out-of-range values (a confidence of 1.7,
//! say) are passed through as the provider sent them.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;

use crate::adapter::{FieldMap, OptionalField, CAPTION_KEY};
use crate::types::{CanonicalResult, CAPTION_PLACEHOLDER};

/// Builds canonical results for one model.
#[derive(Debug, Clone)]
pub struct ResultNormalizer {
    model: String,
}

impl ResultNormalizer {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    /// Normalize a reply that completed just now after `elapsed`.
    pub fn normalize(&self, fields: &FieldMap, elapsed: Duration) -> CanonicalResult {
        self.normalize_at(fields, elapsed, Utc::now())
    }

    pub fn normalize_at(
        &self,
        fields: &FieldMap,
        elapsed: Duration,
        completed_at: DateTime<Utc>,
    ) -> CanonicalResult {
        let caption = fields
            .get(CAPTION_KEY)
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
            .unwrap_or(CAPTION_PLACEHOLDER)
            .to_string();

        CanonicalResult {
            caption,
            confidence: fields
                .get(OptionalField::Confidence.key())
                .and_then(Value::as_f64),
            tags: string_list(fields.get(OptionalField::Tags.key())),
            ocr_text: string(fields.get(OptionalField::OcrText.key())),
            colors: string_list(fields.get(OptionalField::Colors.key())),
            category: string(fields.get(OptionalField::Category.key())),
            reasoning: string(fields.get(OptionalField::Reasoning.key())),
            model_name: self.model.clone(),
            inference_time_ms: round_millis(elapsed),
            timestamp: completed_at,
        }
    }
}

fn round_millis(elapsed: Duration) -> u64 {
    (elapsed.as_secs_f64() * 1000.0).round() as u64
}

fn string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    match value? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        ),
        Value::String(s) => Some(vec![s.clone()]),
        _ => None,
    }
}
