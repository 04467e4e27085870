//! OpenAI-compatible Chat Completions adapter.
//!
//! Used for OpenAI, DeepSeek, Doubao, Qwen, GLM, OpenRouter and custom
//! endpoints. The image goes in as a data URL; the expected JSON structure is
//! described in the text part, so replies are parsed strictly.

use super::fields::{OptionalField, ParsePolicy};
use super::{refine_instruction, CaptionRequest, FieldMap, ProviderAdapter};
use crate::error::AdapterError;
use crate::types::ProcessingOptions;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Adapter for any `/chat/completions` endpoint.
pub struct ChatCompletionsAdapter {
    provider: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
    endpoint: String,
    max_tokens: u32,
    temperature: f32,
}

impl ChatCompletionsAdapter {
    /// `base_url` is the API root (e.g. `https://api.openai.com/v1`).
    pub fn new(provider: &str, base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            provider: provider.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            max_tokens: 1500,
            temperature: 0.2,
        }
    }

    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    async fn post<T: Serialize>(&self, body: &T) -> Result<String, AdapterError> {
        tracing::debug!(provider = %self.provider, endpoint = %self.endpoint, "POST chat completion");

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| AdapterError::Transport {
                provider: self.provider.clone(),
                status: None,
                body: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AdapterError::Transport {
                provider: self.provider.clone(),
                status: Some(status.as_u16()),
                body: text,
            });
        }

        let chat_resp: ChatResponse = resp.json().await.map_err(|e| AdapterError::Parse {
            provider: self.provider.clone(),
            message: format!("malformed chat completion envelope: {e}"),
        })?;

        chat_resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AdapterError::Parse {
                provider: self.provider.clone(),
                message: "reply has no choices[0].message.content".to_string(),
            })
    }
}

/// Build the instruction block listing exactly the enabled keys.
pub(crate) fn json_instruction(prompt: &str, options: &ProcessingOptions) -> String {
    let mut fields = vec![r#""caption": "detailed description...""#];
    fields.extend(OptionalField::enabled(options).map(|f| f.instruction()));

    format!(
        "Please respond in strict JSON format without markdown code blocks.\n\
         Your main task is to caption the image based on the prompt: \"{prompt}\"\n\
         \n\
         Required JSON Structure:\n\
         {{\n  {}\n}}",
        fields.join(",\n  ")
    )
}

/// Remove ```json fences some models wrap around their JSON.
pub(crate) fn strip_code_fences(content: &str) -> String {
    content
        .replace("```json\n", "")
        .replace("```json", "")
        .replace("\n```", "")
        .replace("```", "")
        .trim()
        .to_string()
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ChatContent>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl ProviderAdapter for ChatCompletionsAdapter {
    fn name(&self) -> &str {
        &self.provider
    }

    fn parse_policy(&self) -> ParsePolicy {
        ParsePolicy::Strict
    }

    async fn adapt(&self, request: &CaptionRequest) -> Result<FieldMap, AdapterError> {
        let body = ChatRequest {
            model: self.model.clone(),
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: MessageContent::Parts(vec![
                    ChatContent::Text {
                        text: json_instruction(&request.prompt, &request.options),
                    },
                    ChatContent::ImageUrl {
                        image_url: ImageUrl {
                            url: request.image.data_url(),
                        },
                    },
                ]),
            }],
        };

        let content = self.post(&body).await?;
        self.decode_reply(&strip_code_fences(&content), &request.options)
    }

    async fn refine_prompt(&self, idea: &str) -> Result<String, AdapterError> {
        let body = ChatRequest {
            model: self.model.clone(),
            max_tokens: None,
            temperature: None,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: MessageContent::Text(refine_instruction(idea)),
            }],
        };
        Ok(self.post(&body).await?.trim().to_string())
    }
}
