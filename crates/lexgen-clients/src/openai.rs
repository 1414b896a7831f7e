//! OpenAI-compatible chat completions source

use crate::http::{join_url, success_body, transport_error};
use lexgen_core::{CompletionRequest, GenerativeSource, OpenAiConfig, ServiceError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions over HTTP
#[derive(Clone)]
pub struct OpenAiChatSource {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl std::fmt::Debug for OpenAiChatSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatSource")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl OpenAiChatSource {
    /// Create from config; a missing key surfaces on the first call
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        config: &OpenAiConfig,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            endpoint: join_url(&config.base_url, "chat/completions"),
            model: config.model.clone(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            timeout,
        }
    }

    /// Request URL
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl GenerativeSource for OpenAiChatSource {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ServiceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ServiceError::NotConfigured("OpenAI API key".to_string()));
        };

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            max_tokens: request.max_output_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
        };

        tracing::debug!(
            model = %self.model,
            max_tokens = body.max_tokens,
            "chat completion request"
        );
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&e, self.timeout))?;

        let text = success_body(response, self.timeout).await?;
        parse_chat_response(&text)
    }
}

/// Extract `choices[0].message.content`, trimmed
///
/// # Errors
/// - `ServiceError::UnexpectedShape` if the body is not a completion
pub fn parse_chat_response(body: &str) -> Result<String, ServiceError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::UnexpectedShape(format!("chat completion: {e}")))?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| ServiceError::UnexpectedShape("chat completion has no content".to_string()))
}
