//! Dataset (JSONL) and statistics report output.

use std::io::{self, Write};

use chrono::{DateTime, Local};
use serde_json::{json, Map, Value};

use crate::stats::StatsSnapshot;
use crate::types::ImageItem;

/// Dataset record for a successful item, `None` otherwise.
///
/// Preserved manifest fields are merged in last, so they replace generated
/// fields of the same name.
pub fn dataset_record(item: &ImageItem) -> Option<Value> {
    let result = item.result()?;

    let mut record = Map::new();
    let mut put = |key: &str, value: Value| {
        record.insert(key.to_string(), value);
    };

    put("image", json!(item.image.file_name()));
    put("prompt_output", json!(result.caption));
    if let Some(confidence) = result.confidence {
        put("confidence", json!(confidence));
    }
    if let Some(tags) = &result.tags {
        put("tags", json!(tags));
    }
    if let Some(ocr_text) = &result.ocr_text {
        put("ocr_text", json!(ocr_text));
    }
    if let Some(colors) = &result.colors {
        put("colors", json!(colors));
    }
    if let Some(category) = &result.category {
        put("category", json!(category));
    }
    if let Some(reasoning) = &result.reasoning {
        put("reasoning", json!(reasoning));
    }
    put(
        "stats",
        json!({ "time_ms": result.inference_time_ms, "model": result.model_name }),
    );

    if let Some(original) = &item.original_fields {
        record.extend(original.clone());
    }

    Some(Value::Object(record))
}

/// Writes dataset records as JSON Lines.
pub struct DatasetWriter<W: Write> {
    writer: W,
    records_written: usize,
}

impl<W: Write> DatasetWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            records_written: 0,
        }
    }

    /// Write the record for `item` if it succeeded. Returns whether a line
    /// was written.
    pub fn write_item(&mut self, item: &ImageItem) -> io::Result<bool> {
        let Some(record) = dataset_record(item) else {
            return Ok(false);
        };
        serde_json::to_writer(&mut self.writer, &record).map_err(io::Error::other)?;
        writeln!(self.writer)?;
        self.records_written += 1;
        Ok(true)
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Write one line per successful item and return the number written.
pub fn write_dataset<'a, W, I>(writer: W, items: I) -> io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a ImageItem>,
{
    let mut dataset = DatasetWriter::new(writer);
    for item in items {
        dataset.write_item(item)?;
    }
    dataset.flush()?;
    Ok(dataset.records_written())
}

/// Render the plain-text statistics report.
pub fn render_report(stats: &StatsSnapshot, generated_at: DateTime<Local>) -> String {
    let mut out = String::new();
    out.push_str("VisionForge Batch Report\n");
    out.push_str("========================\n");
    out.push_str(&format!(
        "Generated:       {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!("Total processed: {}\n", stats.total_processed));
    out.push_str(&format!("Average time:    {:.2} ms\n", stats.average_time_ms));

    out.push_str("\n------------------------\n");
    out.push_str("1. Confidence Distribution\n");
    out.push_str("------------------------\n");
    for (label, count) in stats.histogram() {
        out.push_str(&format!("  [{label:<8}]: {count} images\n"));
    }

    out.push_str("\n------------------------\n");
    out.push_str("2. Top Tags\n");
    out.push_str("------------------------\n");
    for (tag, count) in stats.top_tags(stats.tag_frequency.len()) {
        out.push_str(&format!("- {tag}: {count}\n"));
    }

    out.trim_end().to_string()
}
