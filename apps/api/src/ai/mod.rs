/// AI Client: the single point of entry for every model call in the service.
///
/// No other module talks to a transport directly. Each call builds a candidate
/// list from the catalog and hands it to an `Orchestrator`, which owns fallback,
/// backoff and failure classification.
use std::sync::Arc;
use std::time::Duration;

use crate::errors::AppError;

pub mod catalog;
pub mod handlers;
pub mod orchestrator;
pub mod transport;
pub mod types;

use catalog::{models_for_use_case, UseCase};
use orchestrator::Orchestrator;
use transport::AiTransport;
use types::{AiResponse, ChatMessage, ChatOptions, ChatPayload, ChatRequest, ContentPart, MessageBody};

/// Output budget for resume analysis; the feedback JSON is long.
const FEEDBACK_MAX_TOKENS: u32 = 4096;

#[derive(Clone)]
pub struct AiClient {
    /// `None` when no gateway is configured: every call fails fast.
    transport: Option<Arc<dyn AiTransport>>,
    attempt_timeout: Duration,
}

impl AiClient {
    pub fn new(transport: Option<Arc<dyn AiTransport>>, attempt_timeout: Duration) -> Self {
        Self {
            transport,
            attempt_timeout,
        }
    }

    /// General chat. Availability-first model order; `options.model` is tried first.
    pub async fn chat(
        &self,
        payload: ChatPayload,
        options: ChatOptions,
    ) -> Result<AiResponse, AppError> {
        let candidates = models_for_use_case(UseCase::Chat, options.model.as_deref());
        let request = ChatRequest::from_payload(payload, &options);
        self.run(UseCase::Chat, &candidates, &request).await
    }

    /// Resume analysis of a stored file. Quality-first model order.
    pub async fn feedback(&self, path: &str, instructions: &str) -> Result<AiResponse, AppError> {
        let candidates = models_for_use_case(UseCase::Feedback, None);
        let request = ChatRequest {
            messages: vec![feedback_message(path, instructions)],
            temperature: None,
            max_tokens: Some(FEEDBACK_MAX_TOKENS),
        };
        self.run(UseCase::Feedback, &candidates, &request).await
    }

    async fn run(
        &self,
        use_case: UseCase,
        candidates: &[String],
        request: &ChatRequest,
    ) -> Result<AiResponse, AppError> {
        let transport = self
            .transport
            .as_ref()
            .ok_or(AppError::TransportUnavailable)?;

        let completion = Orchestrator::new(use_case)
            .with_attempt_timeout(self.attempt_timeout)
            .execute(candidates, |model| {
                let transport = Arc::clone(transport);
                async move { transport.send(&model, request).await }
            })
            .await?;

        Ok(completion.response)
    }
}

/// `{role: "user", content: [{type: "file", path}, {type: "text", text}]}`
pub fn feedback_message(path: &str, instructions: &str) -> ChatMessage {
    ChatMessage::user(MessageBody::Parts(vec![
        ContentPart::File {
            path: path.to_string(),
        },
        ContentPart::Text {
            text: instructions.to_string(),
        },
    ]))
}
