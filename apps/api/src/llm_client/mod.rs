//! LLM Client: the single point of entry for all model provider calls.
//!
//! No other module may call the provider API directly. Handlers reach the
//! provider through the `ModelProvider` trait carried in `AppState`.
//!
//! Targets the OpenAI Responses API (`/responses`) and Files API (`/files`).
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

const MAX_RETRIES: u32 = 3;
/// Sampling temperature for every call; resume extraction wants stable output.
pub const TEMPERATURE: f32 = 0.2;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("File upload returned no file id")]
    MissingFileId,
}

/// One piece of a multimodal user message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputPart {
    InputText { text: String },
    InputImage { image_url: String, detail: String },
    InputFile { file_id: String },
}

impl InputPart {
    pub fn text(text: impl Into<String>) -> Self {
        InputPart::InputText { text: text.into() }
    }

    pub fn image(data_url: impl Into<String>) -> Self {
        InputPart::InputImage {
            image_url: data_url.into(),
            detail: "auto".to_string(),
        }
    }

    pub fn file(file_id: impl Into<String>) -> Self {
        InputPart::InputFile {
            file_id: file_id.into(),
        }
    }
}

/// Message content: either plain text or a list of typed parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<InputPart>),
}

/// A provider-agnostic completion request: fixed system prompt plus one user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub system: String,
    pub user: MessageContent,
}

/// A file handed to the provider's file-input channel.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub bytes: Bytes,
    pub filename: String,
    pub mime: String,
}

/// The seam between handlers and the model provider.
///
/// Carried in `AppState` as `Arc<dyn ModelProvider>`.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Sends one request and returns the model's concatenated text output.
    async fn respond(&self, request: &ModelRequest) -> Result<String, LlmError>;

    /// Uploads a file and returns the provider's file id.
    async fn upload_file(&self, file: FileUpload) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ResponsesRequest<'a> {
    model: &'a str,
    temperature: f32,
    input: Vec<ResponsesMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ResponsesMessage<'a> {
    role: &'a str,
    content: &'a MessageContent,
}

#[derive(Debug, Deserialize)]
pub struct ResponsesResponse {
    #[serde(default)]
    pub output: Vec<OutputItem>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct OutputItem {
    #[serde(rename = "type")]
    pub item_type: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl ResponsesResponse {
    /// Concatenates every `output_text` block of every message item.
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .filter(|item| item.item_type == "message")
            .flat_map(|item| item.content.iter())
            .filter(|block| block.block_type == "output_text")
            .filter_map(|block| block.text.as_deref())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// The single LLM client used by every service.
/// Wraps the Responses and Files APIs with retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends a request built by `build`, retrying on 429, 5xx and transport
    /// errors with exponential backoff. Other non-2xx statuses fail immediately.
    async fn send_with_retry<F>(&self, build: F) -> Result<reqwest::Response, LlmError>
    where
        F: Fn() -> Result<RequestBuilder, LlmError>,
    {
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match build()?.bearer_auth(&self.api_key).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: provider_message(body),
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: provider_message(body),
                });
            }

            return Ok(response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl ModelProvider for LlmClient {
    async fn respond(&self, request: &ModelRequest) -> Result<String, LlmError> {
        let system = MessageContent::Text(request.system.clone());
        let body = ResponsesRequest {
            model: &self.model,
            temperature: TEMPERATURE,
            input: vec![
                ResponsesMessage {
                    role: "system",
                    content: &system,
                },
                ResponsesMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
        };
        let url = format!("{}/responses", self.base_url);

        let response = self
            .send_with_retry(|| Ok(self.client.post(&url).json(&body)))
            .await?;
        let parsed: ResponsesResponse = response.json().await?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }

        Ok(parsed.output_text())
    }

    async fn upload_file(&self, file: FileUpload) -> Result<String, LlmError> {
        let url = format!("{}/files", self.base_url);

        let response = self
            .send_with_retry(|| {
                let part = multipart::Part::bytes(file.bytes.to_vec())
                    .file_name(file.filename.clone())
                    .mime_str(&file.mime)?;
                let form = multipart::Form::new()
                    .text("purpose", "assistants")
                    .part("file", part);
                Ok(self.client.post(&url).multipart(form))
            })
            .await?;

        let uploaded: UploadedFile = response.json().await?;
        let id = uploaded.id.ok_or(LlmError::MissingFileId)?;
        debug!("Uploaded {} ({} bytes) as {id}", file.filename, file.bytes.len());
        Ok(id)
    }
}

/// Pulls `error.message` out of a provider error body, falling back to the raw body.
fn provider_message(body: String) -> String {
    serde_json::from_str::<ProviderError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_text_joins_message_blocks() {
        let response: ResponsesResponse = serde_json::from_value(json!({
            "output": [
                {"type": "reasoning", "content": []},
                {"type": "message", "content": [
                    {"type": "output_text", "text": "{\"name\":"},
                    {"type": "refusal", "text": "ignored"},
                    {"type": "output_text", "text": "\"Ada\"}"}
                ]}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 4}
        }))
        .unwrap();
        assert_eq!(response.output_text(), "{\"name\":\"Ada\"}");
    }

    #[test]
    fn test_output_text_empty_when_no_message() {
        let response: ResponsesResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(response.output_text(), "");
    }

    #[test]
    fn test_multimodal_parts_serialize_with_type_tags() {
        let content = MessageContent::Parts(vec![
            InputPart::text("contract"),
            InputPart::image("data:image/png;base64,AAAA"),
            InputPart::file("file-123"),
        ]);
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(
            value,
            json!([
                {"type": "input_text", "text": "contract"},
                {"type": "input_image", "image_url": "data:image/png;base64,AAAA", "detail": "auto"},
                {"type": "input_file", "file_id": "file-123"}
            ])
        );
    }

    #[test]
    fn test_request_body_carries_system_then_user() {
        let system = MessageContent::Text("sys".into());
        let user = MessageContent::Text("hello".into());
        let body = ResponsesRequest {
            model: "gpt-4o-mini",
            temperature: TEMPERATURE,
            input: vec![
                ResponsesMessage {
                    role: "system",
                    content: &system,
                },
                ResponsesMessage {
                    role: "user",
                    content: &user,
                },
            ],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["input"][0], json!({"role": "system", "content": "sys"}));
        assert_eq!(value["input"][1], json!({"role": "user", "content": "hello"}));
    }

    #[test]
    fn test_provider_message_prefers_error_field() {
        let body = r#"{"error": {"message": "Invalid API key", "type": "auth"}}"#.to_string();
        assert_eq!(provider_message(body), "Invalid API key");
        assert_eq!(provider_message("bad gateway".into()), "bad gateway");
    }
}
