//! Request payloads and the normalized response shared by every AI call.

use serde::{Deserialize, Serialize};

/// One part of a multi-part chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    /// A stored file, referenced by its platform path.
    File { path: String },
    ImageUrl { url: String },
}

/// Message body: plain text or a list of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageBody {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageBody,
}

impl ChatMessage {
    pub fn user(content: MessageBody) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

/// What the caller wants to send: a bare prompt or a full message list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatPayload {
    Prompt(String),
    Messages(Vec<ChatMessage>),
}

/// Per-request options. `model` is a preferred model, tried before the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub image_url: Option<String>,
}

/// The fully resolved request handed to the transport for one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Folds payload and options into a message list. A bare prompt with an
    /// `image_url` becomes a single user message carrying both.
    pub fn from_payload(payload: ChatPayload, options: &ChatOptions) -> Self {
        let messages = match (payload, options.image_url.as_deref()) {
            (ChatPayload::Prompt(text), Some(url)) => vec![ChatMessage::user(MessageBody::Parts(
                vec![
                    ContentPart::Text { text },
                    ContentPart::ImageUrl {
                        url: url.to_string(),
                    },
                ],
            ))],
            (ChatPayload::Prompt(text), None) => vec![ChatMessage::user(MessageBody::Text(text))],
            (ChatPayload::Messages(messages), _) => messages,
        };
        Self {
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }
}

/// Content of a provider's reply as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

impl MessageContent {
    /// Plain text as-is; for blocks, the first text block.
    pub fn into_text(self) -> Option<String> {
        match self {
            MessageContent::Text(text) => Some(text),
            MessageContent::Blocks(blocks) => blocks
                .into_iter()
                .find(|b| b.block_type == "text")
                .and_then(|b| b.text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// A successful reply, already normalized to text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiResponse {
    pub model: String,
    pub text: String,
    pub usage: Option<Usage>,
}
