//! Provider adapters.
//!
//! Two protocol families sit behind one [`ProviderAdapter`] contract: the
//! structured-schema protocol (Gemini) and the OpenAI-compatible chat
//! completions protocol (every other provider kind). Each adapter turns an
//! image + prompt + options into a wire request and the reply into a
//! [`FieldMap`] restricted to `caption` plus the enabled option keys.

mod chat;
mod fields;
mod gemini;
mod image;

pub use chat::ChatCompletionsAdapter;
pub use fields::{FieldMap, OptionalField, ParsePolicy, CAPTION_KEY};
pub use gemini::GeminiAdapter;
pub use image::ImageInput;

use crate::config::RequestConfig;
use crate::error::{AdapterError, ConfigError};
use crate::types::{ProcessingOptions, ProviderConfig};
use async_trait::async_trait;

/// One captioning request.
#[derive(Debug, Clone)]
pub struct CaptionRequest {
    pub image: ImageInput,
    pub prompt: String,
    pub options: ProcessingOptions,
}

/// Trait that both protocol families implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the orchestrator holds a `Box<dyn ProviderAdapter>`).
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Provider name for logging (e.g., "google", "deepseek").
    fn name(&self) -> &str;

    /// How replies that are not valid JSON are treated.
    fn parse_policy(&self) -> ParsePolicy;

    /// Caption one image.
    async fn adapt(&self, request: &CaptionRequest) -> Result<FieldMap, AdapterError>;

    /// Refine a short idea into a captioning prompt.
    async fn refine_prompt(&self, idea: &str) -> Result<String, AdapterError>;

    /// Decode reply text under this adapter's policy and restrict it to the
    /// requested keys.
    fn decode_reply(
        &self,
        text: &str,
        options: &ProcessingOptions,
    ) -> Result<FieldMap, AdapterError> {
        FieldMap::decode(text, self.parse_policy())
            .map(|fields| fields.restrict_to(options))
            .map_err(|message| AdapterError::Parse {
                provider: self.name().to_string(),
                message,
            })
    }
}

/// Instruction sent for prompt refinement.
pub fn refine_instruction(idea: &str) -> String {
    format!(
        "You are an expert Prompt Engineer. Refine this idea into a precise image \
         captioning prompt (keep language consistent with input): \"{idea}\""
    )
}

/// Factory that creates the right adapter for a provider config.
pub struct AdapterFactory;

impl AdapterFactory {
    /// Create an adapter, refusing configs that cannot make a single call.
    pub fn create(
        config: &ProviderConfig,
        request: &RequestConfig,
    ) -> Result<Box<dyn ProviderAdapter>, ConfigError> {
        let preset = config.kind.preset();
        if config.api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential {
                provider: config.kind.to_string(),
                env_var: preset.api_key_env.to_string(),
            });
        }
        let endpoint = config
            .endpoint()
            .ok_or_else(|| ConfigError::MissingEndpoint {
                provider: config.kind.to_string(),
            })?;
        if config.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "no model configured for provider {}",
                config.kind
            )));
        }

        tracing::debug!(
            provider = %config.kind,
            model = %config.model,
            endpoint,
            "Creating provider adapter"
        );

        if config.kind.uses_structured_schema() {
            Ok(Box::new(GeminiAdapter::new(
                endpoint,
                &config.api_key,
                &config.model,
            )))
        } else {
            Ok(Box::new(
                ChatCompletionsAdapter::new(
                    config.kind.as_str(),
                    endpoint,
                    &config.api_key,
                    &config.model,
                )
                .with_sampling(request.max_tokens, request.temperature),
            ))
        }
    }
}
