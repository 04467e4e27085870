//! Aggregate metrics over successfully captioned items.

use std::collections::HashMap;

use crate::types::{ImageItem, ItemId};

/// Histogram bucket labels, lowest first.
pub const CONFIDENCE_BUCKETS: [&str; 5] = ["0-20%", "20-40%", "40-60%", "60-80%", "80-100%"];

/// Derived statistics. Recomputed from scratch; holds no state between runs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatsSnapshot {
    /// Number of items in `Success`
    pub total_processed: usize,
    /// Mean inference time over successful items; 0 when there are none
    pub average_time_ms: f64,
    pub tag_frequency: HashMap<String, usize>,
    /// Counts per bucket, in [`CONFIDENCE_BUCKETS`] order
    pub confidence_distribution: [usize; 5],
    /// `(id, confidence or 0)` sorted by confidence, highest first
    pub confidence_trend: Vec<(ItemId, f64)>,
}

impl StatsSnapshot {
    /// Compute statistics over the items currently in `Success`.
    pub fn from_items<'a, I>(items: I) -> Self
    where
        I: IntoIterator<Item = &'a ImageItem>,
    {
        let mut snapshot = Self::default();
        let mut total_time_ms = 0u64;

        for item in items {
            let Some(result) = item.result() else {
                continue;
            };
            snapshot.total_processed += 1;
            total_time_ms += result.inference_time_ms;

            for tag in result.tags.iter().flatten() {
                *snapshot.tag_frequency.entry(tag.clone()).or_insert(0) += 1;
            }

            // A missing confidence counts as 0
            let confidence = result.confidence.unwrap_or(0.0);
            if let Some(bucket) = confidence_bucket(confidence) {
                snapshot.confidence_distribution[bucket] += 1;
            }

            snapshot.confidence_trend.push((item.id().clone(), confidence));
        }

        if snapshot.total_processed > 0 {
            snapshot.average_time_ms = total_time_ms as f64 / snapshot.total_processed as f64;
        }

        // sort_by is stable, so equal confidences keep collection order
        snapshot
            .confidence_trend
            .sort_by(|a, b| b.1.total_cmp(&a.1));

        snapshot
    }

    /// Bucket labels paired with their counts.
    pub fn histogram(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        CONFIDENCE_BUCKETS
            .iter()
            .copied()
            .zip(self.confidence_distribution.iter().copied())
    }

    /// The `n` most frequent tags, by descending count then name.
    pub fn top_tags(&self, n: usize) -> Vec<(&str, usize)> {
        let mut tags: Vec<(&str, usize)> = self
            .tag_frequency
            .iter()
            .map(|(tag, count)| (tag.as_str(), *count))
            .collect();
        tags.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        tags.truncate(n);
        tags
    }
}

/// Bucket index for a confidence in `[0, 1]`. Buckets are `[lower, upper)`
/// except the last, which also holds 1.0. Values outside the range, and
/// NaN, have no bucket.
pub fn confidence_bucket(confidence: f64) -> Option<usize> {
    if !(0.0..=1.0).contains(&confidence) {
        return None;
    }
    Some(
        [0.2, 0.4, 0.6, 0.8]
            .iter()
            .filter(|&&lower| confidence >= lower)
            .count(),
    )
}
