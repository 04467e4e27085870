//! Sequential batch captioning.
//!
//! A run snapshots the eligible items (idle or error) of a collection and
//! drives them one at a time through the adapter and the normalizer. Only one
//! provider request is ever in flight. Failures stay scoped to their item and
//! the run always covers the whole queue.

mod collection;

pub use collection::ItemCollection;

use std::time::Instant;

use crate::adapter::{AdapterFactory, CaptionRequest, ImageInput, ProviderAdapter};
use crate::config::RequestConfig;
use crate::error::ConfigError;
use crate::normalize::ResultNormalizer;
use crate::types::{
    CanonicalResult, ItemId, ItemState, ItemStatus, ProcessingOptions, ProviderConfig,
};

/// Message stored on an item whose provider call failed.
pub const ITEM_ERROR_MESSAGE: &str = "API Error";

/// Progress notification emitted during a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// An item was marked pending and is about to be sent.
    ItemStarted {
        id: ItemId,
        /// Zero-based position in the queue
        index: usize,
        total: usize,
    },
    /// An item reached success or error.
    ItemFinished {
        id: ItemId,
        status: ItemStatus,
        completed: usize,
        total: usize,
        /// `completed / total`, reaching 1.0 after the last item
        progress: f64,
        /// Specific failure cause, when the item errored
        error: Option<String>,
    },
}

/// A failed item and the cause that was logged for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFailure {
    pub id: ItemId,
    pub file_name: String,
    pub message: String,
}

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub queued: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<ItemFailure>,
}

/// Drives queued items through a provider adapter, one at a time.
pub struct BatchOrchestrator {
    adapter: Box<dyn ProviderAdapter>,
    normalizer: ResultNormalizer,
}

impl BatchOrchestrator {
    pub fn new(adapter: Box<dyn ProviderAdapter>, model: impl Into<String>) -> Self {
        Self {
            adapter,
            normalizer: ResultNormalizer::new(model),
        }
    }

    /// Build the adapter for `provider`. Fails before any item is touched when
    /// the provider cannot be called.
    pub fn from_config(
        provider: &ProviderConfig,
        request: &RequestConfig,
    ) -> Result<Self, ConfigError> {
        let adapter = AdapterFactory::create(provider, request)?;
        Ok(Self::new(adapter, provider.model.clone()))
    }

    pub fn adapter(&self) -> &dyn ProviderAdapter {
        self.adapter.as_ref()
    }

    /// Run one pass over the eligible items of `items`.
    ///
    /// Items already in `Success` are never touched. `on_progress` is called
    /// before and after each item.
    pub async fn run<F>(
        &self,
        items: &mut ItemCollection,
        prompt: &str,
        options: &ProcessingOptions,
        mut on_progress: F,
    ) -> RunSummary
    where
        F: FnMut(&ProgressEvent),
    {
        let queue = items.eligible_ids();
        let total = queue.len();
        let mut summary = RunSummary {
            queued: total,
            ..RunSummary::default()
        };

        if queue.is_empty() {
            tracing::debug!("Nothing to caption; all items already succeeded");
            return summary;
        }

        tracing::info!(
            provider = self.adapter.name(),
            queued = total,
            "Starting captioning run"
        );

        for (index, id) in queue.into_iter().enumerate() {
            items.set_state(&id, ItemState::Pending);
            on_progress(&ProgressEvent::ItemStarted {
                id: id.clone(),
                index,
                total,
            });

            let outcome = match items.get(&id) {
                Some(item) => {
                    let request = match ImageInput::load(&item.image).await {
                        Ok(image) => Ok(CaptionRequest {
                            image,
                            prompt: prompt.to_string(),
                            options: *options,
                        }),
                        Err(e) => Err(format!("Failed to read image: {e}")),
                    };
                    match request {
                        Ok(request) => self.caption_one(&request).await,
                        Err(message) => Err(message),
                    }
                }
                None => Err("item disappeared from the collection".to_string()),
            };

            let (status, error) = match outcome {
                Ok(result) => {
                    items.set_state(&id, ItemState::Success(result));
                    summary.succeeded += 1;
                    (ItemStatus::Success, None)
                }
                Err(message) => {
                    let file_name = items
                        .get(&id)
                        .map(|item| item.image.file_name())
                        .unwrap_or_default();
                    tracing::error!(item = %id, file = %file_name, "Captioning failed: {message}");
                    items.set_state(&id, ItemState::Error(ITEM_ERROR_MESSAGE.to_string()));
                    summary.failed += 1;
                    summary.failures.push(ItemFailure {
                        id: id.clone(),
                        file_name,
                        message: message.clone(),
                    });
                    (ItemStatus::Error, Some(message))
                }
            };

            let completed = index + 1;
            on_progress(&ProgressEvent::ItemFinished {
                id,
                status,
                completed,
                total,
                progress: completed as f64 / total as f64,
                error,
            });
        }

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Captioning run finished"
        );

        summary
    }

    async fn caption_one(&self, request: &CaptionRequest) -> Result<CanonicalResult, String> {
        let started = Instant::now();
        let fields = self.adapter.adapt(request).await.map_err(|e| e.to_string())?;
        Ok(self.normalizer.normalize(&fields, started.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{FieldMap, ParsePolicy};
    use crate::error::AdapterError;
    use crate::stats::StatsSnapshot;
    use crate::types::{ImageSource, CAPTION_PLACEHOLDER};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Mock adapter whose reply text is produced per call index and decoded
    /// under the configured parse policy, like the real adapters do.
    struct MockAdapter {
        reply_fn: Box<dyn Fn(u32) -> Result<String, AdapterError> + Send + Sync>,
        policy: ParsePolicy,
        call_count: Arc<AtomicU32>,
    }

    impl MockAdapter {
        fn replies(replies: Vec<Result<&str, u16>>, policy: ParsePolicy) -> Self {
            let replies: Vec<Result<String, u16>> = replies
                .into_iter()
                .map(|r| r.map(str::to_string))
                .collect();
            Self {
                reply_fn: Box::new(move |idx| match &replies[idx as usize] {
                    Ok(text) => Ok(text.clone()),
                    Err(status) => Err(AdapterError::Transport {
                        provider: "mock".to_string(),
                        status: Some(*status),
                        body: "upstream failure".to_string(),
                    }),
                }),
                policy,
                call_count: Arc::new(AtomicU32::new(0)),
            }
        }

        fn always(text: &str) -> Self {
            let text = text.to_string();
            Self {
                reply_fn: Box::new(move |_| Ok(text.clone())),
                policy: ParsePolicy::Strict,
                call_count: Arc::new(AtomicU32::new(0)),
            }
        }

        fn call_count_handle(&self) -> Arc<AtomicU32> {
            self.call_count.clone()
        }
    }

    #[async_trait]
    impl ProviderAdapter for MockAdapter {
        fn name(&self) -> &str {
            "mock"
        }

        fn parse_policy(&self) -> ParsePolicy {
            self.policy
        }

        async fn adapt(&self, request: &CaptionRequest) -> Result<FieldMap, AdapterError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            let text = (self.reply_fn)(idx)?;
            self.decode_reply(&text, &request.options)
        }

        async fn refine_prompt(&self, idea: &str) -> Result<String, AdapterError> {
            Ok(idea.to_string())
        }
    }

    fn collection(names: &[&str]) -> (ItemCollection, Vec<ItemId>) {
        let mut items = ItemCollection::new();
        let ids = names
            .iter()
            .map(|name| items.add(ImageSource::from_bytes(*name, "image/png", vec![1, 2, 3])))
            .collect();
        (items, ids)
    }

    async fn run(
        orchestrator: &BatchOrchestrator,
        items: &mut ItemCollection,
        options: ProcessingOptions,
    ) -> (RunSummary, Vec<ProgressEvent>) {
        let mut events = Vec::new();
        let summary = orchestrator
            .run(items, "Describe", &options, |event| events.push(event.clone()))
            .await;
        (summary, events)
    }

    fn finished_progress(events: &[ProgressEvent]) -> Vec<f64> {
        events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::ItemFinished { progress, .. } => Some(*progress),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_three_item_run_with_one_failure() {
        let adapter = MockAdapter::replies(
            vec![
                Ok(r#"{"caption":"a","confidence":0.9,"tags":["x"]}"#),
                Err(500),
                Ok(r#"{"caption":"c","confidence":0.5,"tags":["x","y"]}"#),
            ],
            ParsePolicy::Strict,
        );
        let orchestrator = BatchOrchestrator::new(Box::new(adapter), "mock-model");
        let (mut items, ids) = collection(&["a.png", "b.png", "c.png"]);
        let options = ProcessingOptions {
            confidence: true,
            tags: true,
            ..ProcessingOptions::caption_only()
        };

        let (summary, events) = run(&orchestrator, &mut items, options).await;

        assert_eq!(summary.queued, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].id, ids[1]);
        assert_eq!(summary.failures[0].file_name, "b.png");
        assert!(summary.failures[0].message.contains("HTTP 500"));

        assert_eq!(items.get(&ids[0]).unwrap().status(), ItemStatus::Success);
        assert_eq!(items.get(&ids[1]).unwrap().status(), ItemStatus::Error);
        assert_eq!(items.get(&ids[1]).unwrap().error_message(), Some(ITEM_ERROR_MESSAGE));
        assert_eq!(items.get(&ids[2]).unwrap().status(), ItemStatus::Success);

        let a = items.get(&ids[0]).unwrap().result().unwrap();
        assert_eq!(a.caption, "a");
        assert_eq!(a.confidence, Some(0.9));
        assert_eq!(a.model_name, "mock-model");

        let progress = finished_progress(&events);
        assert_eq!(progress.len(), 3);
        assert!((progress[0] - 1.0 / 3.0).abs() < 1e-9);
        assert!((progress[1] - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(progress[2], 1.0);
    }

    #[tokio::test]
    async fn test_three_item_run_feeds_statistics() {
        let adapter = MockAdapter::replies(
            vec![
                Ok(r#"{"caption":"a cat","confidence":0.9,"tags":["cat","pet"]}"#),
                Err(502),
                Ok(r#"{"caption":"a dog","confidence":0.4,"tags":["dog"]}"#),
            ],
            ParsePolicy::Strict,
        );
        let orchestrator = BatchOrchestrator::new(Box::new(adapter), "mock-model");
        let (mut items, ids) = collection(&["1.png", "2.png", "3.png"]);
        let options = ProcessingOptions {
            confidence: true,
            tags: true,
            ..ProcessingOptions::caption_only()
        };

        run(&orchestrator, &mut items, options).await;

        let first = items.get(&ids[0]).unwrap().result().unwrap().clone();
        let third = items.get(&ids[2]).unwrap().result().unwrap().clone();
        assert_eq!(first.confidence, Some(0.9));
        assert_eq!(items.get(&ids[1]).unwrap().status(), ItemStatus::Error);
        assert_eq!(third.confidence, Some(0.4));

        let stats = StatsSnapshot::from_items(&items);
        assert_eq!(stats.total_processed, 2);
        assert_eq!(
            stats.average_time_ms,
            (first.inference_time_ms + third.inference_time_ms) as f64 / 2.0
        );
        assert_eq!(stats.confidence_distribution, [0, 0, 1, 0, 1]);
        assert_eq!(
            stats.confidence_trend,
            vec![(ids[0].clone(), 0.9), (ids[2].clone(), 0.4)]
        );
        assert_eq!(stats.tag_frequency.len(), 3);
    }

    #[tokio::test]
    async fn test_rerun_only_requeues_failed_items() {
        let adapter = MockAdapter::replies(
            vec![
                Ok(r#"{"caption":"first"}"#),
                Err(503),
                Ok(r#"{"caption":"second try"}"#),
            ],
            ParsePolicy::Strict,
        );
        let calls = adapter.call_count_handle();
        let orchestrator = BatchOrchestrator::new(Box::new(adapter), "m");
        let (mut items, ids) = collection(&["a.png", "b.png"]);

        run(&orchestrator, &mut items, ProcessingOptions::caption_only()).await;
        let before = items.get(&ids[0]).unwrap().result().cloned();

        let (summary, events) = run(&orchestrator, &mut items, ProcessingOptions::caption_only()).await;

        assert_eq!(summary.queued, 1);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(items.get(&ids[0]).unwrap().result().cloned(), before);
        assert_eq!(
            items.get(&ids[1]).unwrap().result().unwrap().caption,
            "second try"
        );
        assert!(events.iter().all(|e| match e {
            ProgressEvent::ItemStarted { id, .. } | ProgressEvent::ItemFinished { id, .. } =>
                id == &ids[1],
        }));
    }

    #[tokio::test]
    async fn test_strict_prose_reply_fails_item_and_run_continues() {
        let adapter = MockAdapter::replies(
            vec![Ok("This image shows a cat."), Ok(r#"{"caption":"dog"}"#)],
            ParsePolicy::Strict,
        );
        let orchestrator = BatchOrchestrator::new(Box::new(adapter), "m");
        let (mut items, ids) = collection(&["cat.png", "dog.png"]);

        let (summary, events) = run(&orchestrator, &mut items, ProcessingOptions::default()).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(items.get(&ids[0]).unwrap().status(), ItemStatus::Error);
        assert_eq!(items.get(&ids[1]).unwrap().status(), ItemStatus::Success);
        let first_error = events.iter().find_map(|e| match e {
            ProgressEvent::ItemFinished { error, .. } => error.clone(),
            _ => None,
        });
        assert!(first_error.unwrap().contains("mock"));
    }

    #[tokio::test]
    async fn test_fallback_policy_turns_prose_into_caption() {
        let adapter = MockAdapter::replies(vec![Ok("not json")], ParsePolicy::FallbackToCaption);
        let orchestrator = BatchOrchestrator::new(Box::new(adapter), "gemini-2.5-flash");
        let (mut items, ids) = collection(&["a.png"]);

        let (summary, _) = run(&orchestrator, &mut items, ProcessingOptions::all()).await;

        assert_eq!(summary.succeeded, 1);
        let result = items.get(&ids[0]).unwrap().result().unwrap();
        assert_eq!(result.caption, "not json");
        assert!(result.tags.is_none());
        assert!(result.confidence.is_none());
    }

    #[tokio::test]
    async fn test_empty_caption_becomes_placeholder() {
        let orchestrator =
            BatchOrchestrator::new(Box::new(MockAdapter::always(r#"{"caption":""}"#)), "m");
        let (mut items, ids) = collection(&["a.png"]);
        run(&orchestrator, &mut items, ProcessingOptions::default()).await;
        assert_eq!(
            items.get(&ids[0]).unwrap().result().unwrap().caption,
            CAPTION_PLACEHOLDER
        );
    }

    #[tokio::test]
    async fn test_strict_non_object_json_reply_gets_placeholder() {
        let orchestrator =
            BatchOrchestrator::new(Box::new(MockAdapter::always("\"a string\"")), "m");
        let (mut items, ids) = collection(&["a.png"]);
        let (summary, _) = run(&orchestrator, &mut items, ProcessingOptions::default()).await;

        assert_eq!(summary.succeeded, 1);
        let result = items.get(&ids[0]).unwrap().result().unwrap();
        assert_eq!(result.caption, CAPTION_PLACEHOLDER);
        assert_eq!(result.tags, None);
    }

    #[tokio::test]
    async fn test_empty_queue_is_a_noop() {
        let adapter = MockAdapter::always(r#"{"caption":"x"}"#);
        let calls = adapter.call_count_handle();
        let orchestrator = BatchOrchestrator::new(Box::new(adapter), "m");
        let mut items = ItemCollection::new();

        let (summary, events) = run(&orchestrator, &mut items, ProcessingOptions::default()).await;

        assert_eq!(summary, RunSummary::default());
        assert!(events.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_image_file_fails_without_calling_provider() {
        let adapter = MockAdapter::always(r#"{"caption":"x"}"#);
        let calls = adapter.call_count_handle();
        let orchestrator = BatchOrchestrator::new(Box::new(adapter), "m");
        let mut items = ItemCollection::new();
        let id = items.add(ImageSource::from_path("/nonexistent/path/ghost.jpg"));

        let (summary, _) = run(&orchestrator, &mut items, ProcessingOptions::default()).await;

        assert_eq!(summary.failed, 1);
        assert!(summary.failures[0].message.contains("Failed to read image"));
        assert_eq!(items.get(&id).unwrap().status(), ItemStatus::Error);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_items_processed_in_queue_order() {
        let orchestrator =
            BatchOrchestrator::new(Box::new(MockAdapter::always(r#"{"caption":"x"}"#)), "m");
        let (mut items, ids) = collection(&["1.png", "2.png", "3.png", "4.png"]);

        let (_, events) = run(&orchestrator, &mut items, ProcessingOptions::default()).await;

        let started: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::ItemStarted { id, index, total } => {
                    assert_eq!(*total, 4);
                    Some((id.clone(), *index))
                }
                _ => None,
            })
            .collect();
        let expected: Vec<_> = ids.into_iter().enumerate().map(|(i, id)| (id, i)).collect();
        assert_eq!(started, expected);
        // started/finished alternate: never two items in flight
        for pair in events.chunks(2) {
            assert!(matches!(pair[0], ProgressEvent::ItemStarted { .. }));
            assert!(matches!(pair[1], ProgressEvent::ItemFinished { .. }));
        }
    }

    #[test]
    fn test_from_config_refuses_missing_credential() {
        let provider = ProviderConfig {
            api_key: String::new(),
            ..ProviderConfig::for_kind(crate::types::ProviderKind::Deepseek)
        };
        let err = BatchOrchestrator::from_config(&provider, &RequestConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::MissingCredential { .. }));
    }
}
