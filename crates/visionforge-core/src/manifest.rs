//! JSONL dataset manifest import.
//!
//! A manifest carries existing per-image records (labels, splits, ids...).
//! Records are matched to items by file name and re-emitted on export.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};

use crate::batch::ItemCollection;

/// Keys checked, in order, for the image path of a record.
const IMAGE_PATH_KEYS: [&str; 3] = ["image", "file_name", "path"];

/// One manifest line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ManifestEntry {
    /// Empty when the line had no usable path or did not parse
    pub image_path: String,
    pub original: Map<String, Value>,
}

impl ManifestEntry {
    /// File name component of `image_path`.
    pub fn file_name(&self) -> Option<&str> {
        if self.image_path.is_empty() {
            return None;
        }
        Path::new(&self.image_path)
            .file_name()
            .and_then(|name| name.to_str())
    }
}

/// Parse manifest text. Blank lines are skipped; a line that is not a JSON
/// object yields an empty entry so line counts stay visible to the caller.
pub fn parse_manifest(text: &str) -> Vec<ManifestEntry> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(n, line)| match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(original)) => ManifestEntry {
                image_path: image_path(&original),
                original,
            },
            Ok(_) | Err(_) => {
                tracing::warn!(line = n + 1, "Skipping manifest record that is not a JSON object");
                ManifestEntry::default()
            }
        })
        .collect()
}

fn image_path(record: &Map<String, Value>) -> String {
    IMAGE_PATH_KEYS
        .iter()
        .filter_map(|key| record.get(*key).and_then(Value::as_str))
        .find(|path| !path.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Attach manifest records to items with the same file name. Later records
/// win when a name repeats. Returns the number of items that received one.
pub fn attach_manifest(items: &mut ItemCollection, entries: &[ManifestEntry]) -> usize {
    let by_name: HashMap<&str, &ManifestEntry> = entries
        .iter()
        .filter_map(|entry| entry.file_name().map(|name| (name, entry)))
        .collect();

    let targets: Vec<_> = items
        .iter()
        .filter_map(|item| {
            by_name
                .get(item.image.file_name().as_str())
                .map(|entry| (item.id().clone(), entry.original.clone()))
        })
        .collect();

    let attached = targets.len();
    for (id, original) in targets {
        if let Some(item) = items.get_mut(&id) {
            item.original_fields = Some(original);
        }
    }

    tracing::debug!(attached, records = entries.len(), "Attached manifest records");
    attached
}
