//! AI transport: performs exactly one chat request against one model.
//!
//! `HttpTransport` speaks the OpenAI-compatible chat-completions protocol to a
//! gateway that fronts every provider in the catalog. Errors carry the status
//! and the provider's own message so the orchestrator can classify them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::ai::types::{
    AiResponse, ChatMessage, ChatRequest, ContentPart, MessageBody, MessageContent, Usage,
};
use crate::platform::{FileStore, PlatformError};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Could not attach {path}: {source}")]
    Attachment {
        path: String,
        #[source]
        source: PlatformError,
    },
}

#[async_trait]
pub trait AiTransport: Send + Sync {
    async fn send(&self, model: &str, request: &ChatRequest) -> Result<AiResponse, TransportError>;
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: WireContent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireContent<'a> {
    Text(&'a str),
    Parts(Vec<WirePart<'a>>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WirePart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: WireImageUrl<'a> },
    File { file: WireFile },
}

#[derive(Debug, Serialize)]
struct WireImageUrl<'a> {
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct WireFile {
    filename: String,
    file_data: String,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<WireChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireReply,
}

#[derive(Debug, Deserialize)]
struct WireReply {
    content: Option<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: WireErrorBody,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    message: String,
}

/// HTTP transport to an OpenAI-compatible gateway.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    files: Arc<dyn FileStore>,
}

impl HttpTransport {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        files: Arc<dyn FileStore>,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()?,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            files,
        })
    }

    /// Reads every `File` part once so they can be inlined as base64 data.
    async fn load_attachments(
        &self,
        messages: &[ChatMessage],
    ) -> Result<Vec<WireFile>, TransportError> {
        let mut attachments = Vec::new();
        for message in messages {
            let MessageBody::Parts(parts) = &message.content else {
                continue;
            };
            for part in parts {
                if let ContentPart::File { path } = part {
                    let bytes =
                        self.files
                            .read(path)
                            .await
                            .map_err(|source| TransportError::Attachment {
                                path: path.clone(),
                                source,
                            })?;
                    attachments.push(WireFile {
                        filename: file_name(path).to_string(),
                        file_data: format!(
                            "data:{};base64,{}",
                            mime_for(path),
                            BASE64.encode(&bytes)
                        ),
                    });
                }
            }
        }
        Ok(attachments)
    }
}

#[async_trait]
impl AiTransport for HttpTransport {
    async fn send(&self, model: &str, request: &ChatRequest) -> Result<AiResponse, TransportError> {
        let attachments = self.load_attachments(&request.messages).await?;
        let body = wire_request(model, request, attachments);

        let mut builder = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<WireError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(TransportError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let wire: WireResponse = response.json().await?;
        let parsed = parse_completion(model, wire)?;
        if let Some(usage) = parsed.usage {
            debug!(
                "{model} usage: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }
        Ok(parsed)
    }
}

/// Builds the wire body; `attachments` are consumed in `File` part order.
fn wire_request<'a>(
    model: &'a str,
    request: &'a ChatRequest,
    attachments: Vec<WireFile>,
) -> WireRequest<'a> {
    let mut attachments = attachments.into_iter();
    let messages = request
        .messages
        .iter()
        .map(|m| WireMessage {
            role: &m.role,
            content: match &m.content {
                MessageBody::Text(text) => WireContent::Text(text),
                MessageBody::Parts(parts) => WireContent::Parts(
                    parts
                        .iter()
                        .filter_map(|part| match part {
                            ContentPart::Text { text } => Some(WirePart::Text { text }),
                            ContentPart::ImageUrl { url } => Some(WirePart::ImageUrl {
                                image_url: WireImageUrl { url },
                            }),
                            ContentPart::File { .. } => {
                                attachments.next().map(|file| WirePart::File { file })
                            }
                        })
                        .collect(),
                ),
            },
        })
        .collect();

    WireRequest {
        model,
        messages,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    }
}

/// Resolves the response content to text, once, here.
fn parse_completion(model: &str, wire: WireResponse) -> Result<AiResponse, TransportError> {
    let text = wire
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| TransportError::Malformed("response has no choices".to_string()))?
        .message
        .content
        .and_then(MessageContent::into_text)
        .ok_or_else(|| TransportError::Malformed("response has no text content".to_string()))?;

    Ok(AiResponse {
        model: wire.model.unwrap_or_else(|| model.to_string()),
        text,
        usage: wire.usage,
    })
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn mime_for(path: &str) -> &'static str {
    let lower = path.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        "application/pdf"
    } else if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else {
        "application/octet-stream"
    }
}
