use std::time::Duration;

use async_trait::async_trait;
use geomind_core::{Coordinates, ReqwestErrorExt};
use reqwest::Client;
use tracing::instrument;

use crate::error::ServiceError;
use crate::types::{ChatReply, Message, Mode};
use crate::wire::{ErrorEnvelope, GenerateContentRequest, GenerateContentResponse};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Reply text used when the model returns no text at all.
pub const NO_TEXT_FALLBACK: &str = "I couldn't generate a text response.";

/// Everything one chat turn needs.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub prompt: String,
    /// Transcript before this turn's prompt
    pub history: Vec<Message>,
    pub mode: Mode,
    pub location: Option<Coordinates>,
}

/// The seam between the transcript orchestrator and a chat provider.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, request: ChatRequest) -> Result<ChatReply, ServiceError>;
}

/// Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(api_key: &str, timeout: Option<Duration>) -> Result<Self, ServiceError> {
        Self::with_base_url(api_key, GEMINI_API_URL, timeout)
    }

    pub fn with_base_url(
        api_key: &str,
        base_url: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, ServiceError> {
        if api_key.trim().is_empty() {
            return Err(ServiceError::MissingApiKey);
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| e.into_network_error())?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Send one turn. History is serialised ahead of the prompt; tools and
    /// location bias depend on `mode` alone.
    #[instrument(skip(self, history), fields(turns = history.len()), level = "info")]
    pub async fn generate(
        &self,
        prompt: &str,
        history: &[Message],
        mode: Mode,
        location: Option<Coordinates>,
    ) -> Result<ChatReply, ServiceError> {
        let body = GenerateContentRequest::build(prompt, history, mode, location);
        let url = format!("{}/models/{}:generateContent", self.base_url, mode.model_id());

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Gemini request failed: {}", e);
                ServiceError::from(e.into_network_error())
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceError::from(e.into_network_error()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|env| env.error.message)
                .unwrap_or_default();
            tracing::error!("Gemini API error {}: {}", status, message);
            return Err(ServiceError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;

        let reply = ChatReply {
            text: parsed
                .text()
                .unwrap_or_else(|| NO_TEXT_FALLBACK.to_string()),
            grounding_chunks: parsed.grounding_chunks(),
        };
        tracing::debug!(
            "Gemini replied with {} chars and {} citations",
            reply.text.len(),
            reply.grounding_chunks.as_ref().map_or(0, Vec::len)
        );
        Ok(reply)
    }
}

#[async_trait]
impl ChatBackend for GeminiClient {
    async fn send(&self, request: ChatRequest) -> Result<ChatReply, ServiceError> {
        self.generate(
            &request.prompt,
            &request.history,
            request.mode,
            request.location,
        )
        .await
    }
}
