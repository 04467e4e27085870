//! Gemini adapter using `generateContent` with a declared response schema.
//!
//! The model is asked for a single JSON object validated against a schema
//! whose only required field is `caption`. If the returned text still fails
//! to parse, the raw text becomes the caption.

use super::fields::{OptionalField, ParsePolicy, CAPTION_KEY};
use super::{refine_instruction, CaptionRequest, FieldMap, ProviderAdapter};
use crate::error::AdapterError;
use crate::types::ProcessingOptions;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

const PROVIDER: &str = "google";

/// Adapter for the Gemini Generative Language REST API.
pub struct GeminiAdapter {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiAdapter {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn generate(&self, body: &GenerateRequest) -> Result<String, AdapterError> {
        tracing::debug!(model = %self.model, "POST generateContent");

        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| AdapterError::Transport {
                provider: PROVIDER.to_string(),
                status: None,
                body: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AdapterError::Transport {
                provider: PROVIDER.to_string(),
                status: Some(status.as_u16()),
                body: text,
            });
        }

        let generated: GenerateResponse = resp.json().await.map_err(|e| AdapterError::Parse {
            provider: PROVIDER.to_string(),
            message: format!("malformed generateContent envelope: {e}"),
        })?;

        Ok(generated.text())
    }
}

/// Build the response schema: `caption` required, one property per enabled flag.
pub(crate) fn response_schema(options: &ProcessingOptions) -> Value {
    let mut properties = Map::new();
    properties.insert(
        CAPTION_KEY.to_string(),
        json!({ "type": "STRING", "description": "Detailed description based on prompt." }),
    );
    for field in OptionalField::enabled(options) {
        properties.insert(field.key().to_string(), field.schema());
    }

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": [CAPTION_KEY],
    })
}

// --- Request types ---

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    InlineData { inline_data: InlineData },
    Text { text: String },
    Other(Value),
}

#[derive(Serialize, Deserialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
}

// --- Response types ---

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate; empty if none.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| match p {
                        Part::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ProviderAdapter for GeminiAdapter {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn parse_policy(&self) -> ParsePolicy {
        ParsePolicy::FallbackToCaption
    }

    async fn adapt(&self, request: &CaptionRequest) -> Result<FieldMap, AdapterError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: request.image.media_type.clone(),
                            data: request.image.data.clone(),
                        },
                    },
                    Part::Text {
                        text: request.prompt.clone(),
                    },
                ],
            }],
            generation_config: Some(GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(&request.options),
            }),
        };

        let text = self.generate(&body).await?;
        self.decode_reply(&text, &request.options)
    }

    async fn refine_prompt(&self, idea: &str) -> Result<String, AdapterError> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part::Text {
                    text: refine_instruction(idea),
                }],
            }],
            generation_config: None,
        };
        Ok(self.generate(&body).await?.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ImageInput;
    use mockito::Matcher;

    fn request(options: ProcessingOptions) -> CaptionRequest {
        CaptionRequest {
            image: ImageInput::from_bytes(b"abc", "image/jpeg"),
            prompt: "Describe the photo".to_string(),
            options,
        }
    }

    fn reply(text: &str) -> String {
        json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        })
        .to_string()
    }

    #[test]
    fn test_schema_caption_only() {
        let schema = response_schema(&ProcessingOptions::caption_only());
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["required"], json!(["caption"]));
        assert_eq!(schema["properties"].as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_schema_adds_one_property_per_flag() {
        let schema = response_schema(&ProcessingOptions::all());
        let props = schema["properties"].as_object().unwrap();
        assert_eq!(props.len(), 7);
        assert_eq!(props["confidence"]["type"], "NUMBER");
        assert_eq!(props["tags"]["type"], "ARRAY");
        assert_eq!(props["tags"]["items"]["type"], "STRING");
        assert_eq!(props["ocr_text"]["type"], "STRING");
        assert_eq!(props["colors"]["type"], "ARRAY");
        assert_eq!(props["category"]["type"], "STRING");
        assert_eq!(props["reasoning"]["type"], "STRING");
        assert_eq!(schema["required"], json!(["caption"]));
    }

    #[test]
    fn test_request_serializes_inline_data() {
        let body = GenerateRequest {
            contents: vec![Content {
                role: None,
                parts: vec![Part::InlineData {
                    inline_data: InlineData {
                        mime_type: "image/png".to_string(),
                        data: "AQID".to_string(),
                    },
                }],
            }],
            generation_config: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            json!({ "contents": [{ "parts": [{ "inline_data": { "mime_type": "image/png", "data": "AQID" } }] }] })
        );
    }

    #[tokio::test]
    async fn test_adapt_parses_schema_reply() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_header("x-goog-api-key", "g-key")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": { "required": ["caption"] }
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(reply(r#"{"caption":"a dog","tags":["dog","grass"]}"#))
            .create_async()
            .await;

        let adapter = GeminiAdapter::new(
            &format!("{}/v1beta/", server.url()),
            "g-key",
            "gemini-2.5-flash",
        );
        let fields = adapter.adapt(&request(ProcessingOptions::default())).await.unwrap();

        mock.assert_async().await;
        assert_eq!(fields.get("caption"), Some(&json!("a dog")));
        assert_eq!(fields.get("tags"), Some(&json!(["dog", "grass"])));
    }

    #[tokio::test]
    async fn test_adapt_malformed_json_falls_back_to_caption() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(reply("not json"))
            .create_async()
            .await;

        let adapter = GeminiAdapter::new(&server.url(), "k", "gemini-2.5-flash");
        let options = ProcessingOptions::all();
        let fields = adapter.adapt(&request(options)).await.unwrap();

        assert_eq!(fields.get("caption"), Some(&json!("not json")));
        assert_eq!(fields.len(), 1);
    }

    #[tokio::test]
    async fn test_adapt_without_candidates_yields_empty_map() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(200)
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let adapter = GeminiAdapter::new(&server.url(), "k", "gemini-2.5-flash");
        let fields = adapter.adapt(&request(ProcessingOptions::default())).await.unwrap();
        assert_eq!(
            fields.get("caption"),
            Some(&json!(crate::types::CAPTION_PLACEHOLDER))
        );
    }

    #[tokio::test]
    async fn test_adapt_http_error_is_transport_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .with_status(403)
            .with_body(r#"{"error":{"message":"API key not valid"}}"#)
            .create_async()
            .await;

        let adapter = GeminiAdapter::new(&server.url(), "bad", "gemini-2.5-flash");
        let err = adapter
            .adapt(&request(ProcessingOptions::default()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert!(err.to_string().contains("API key not valid"));
    }

    #[tokio::test]
    async fn test_refine_prompt_returns_trimmed_text() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_body(Matcher::Regex("expert Prompt Engineer".to_string()))
            .with_status(200)
            .with_body(reply("\nDescribe each animal's pose and surroundings.\n"))
            .create_async()
            .await;

        let adapter = GeminiAdapter::new(&server.url(), "k", "gemini-2.5-flash");
        let refined = adapter.refine_prompt("animals").await.unwrap();

        mock.assert_async().await;
        assert_eq!(refined, "Describe each animal's pose and surroundings.");
    }
}
