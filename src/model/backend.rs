use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ModelSettings;
use crate::errors::ModelCallError;
use crate::util::truncate_chars;

/// Longest error body kept from a failed response.
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Raw text plus usage accounting from one successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,
    pub completion_tokens: Option<u64>,
}

/// A single request/response exchange with a chat-completion endpoint.
/// Implementations do not retry.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(
        &self,
        api_key: &str,
        conversation: &[ChatMessage],
    ) -> Result<ChatReply, ModelCallError>;
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct CompletionUsage {
    #[serde(default)]
    completion_tokens: Option<u64>,
}

/// OpenAI-compatible `POST {endpoint}/chat/completions` backend.
#[derive(Debug, Clone)]
pub struct HttpChatBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl HttpChatBackend {
    pub fn new(settings: &ModelSettings) -> anyhow::Result<Self> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("repo-showcase/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client for model endpoint")?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint)
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(
        &self,
        api_key: &str,
        conversation: &[ChatMessage],
    ) -> Result<ChatReply, ModelCallError> {
        let request = CompletionRequest {
            model: &self.model,
            messages: conversation,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        debug!(model = %self.model, turns = conversation.len(), "sending chat completion");

        let resp = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport(e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelCallError::Http {
                status: status.as_u16(),
                body: truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS).to_string(),
            });
        }

        let parsed: CompletionResponse = resp
            .json()
            .await
            .map_err(|e| ModelCallError::Transport(format!("invalid completion body: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(ModelCallError::EmptyContent);
        }

        Ok(ChatReply {
            content,
            completion_tokens: parsed.usage.and_then(|u| u.completion_tokens),
        })
    }
}

impl HttpChatBackend {
    fn map_transport(&self, err: reqwest::Error) -> ModelCallError {
        if err.is_timeout() {
            ModelCallError::Timeout(self.timeout)
        } else {
            ModelCallError::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server: &MockServer) -> ModelSettings {
        ModelSettings {
            endpoint: format!("{}/v1", server.uri()),
            ..ModelSettings::default()
        }
    }

    #[tokio::test]
    async fn test_send_parses_content_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "<html></html>"}}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 42}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = HttpChatBackend::new(&settings_for(&server)).unwrap();
        let reply = backend
            .send("sk-test", &[ChatMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(reply.content, "<html></html>");
        assert_eq!(reply.completion_tokens, Some(42));
    }

    #[tokio::test]
    async fn test_send_maps_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let backend = HttpChatBackend::new(&settings_for(&server)).unwrap();
        let err = backend
            .send("k", &[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        match err {
            ModelCallError::Http { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "rate limited");
            }
            other => panic!("Expected Http error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_empty_content_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "  "}}]
            })))
            .mount(&server)
            .await;

        let backend = HttpChatBackend::new(&settings_for(&server)).unwrap();
        let err = backend
            .send("k", &[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, ModelCallError::EmptyContent));
    }

    #[tokio::test]
    async fn test_send_missing_choices_is_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let backend = HttpChatBackend::new(&settings_for(&server)).unwrap();
        let err = backend
            .send("k", &[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, ModelCallError::EmptyContent));
    }

    #[test]
    fn test_chat_message_serializes_lowercase_role() {
        let json = serde_json::to_value(ChatMessage::system("be brief")).unwrap();
        assert_eq!(json["role"], "system");
        assert_eq!(json["content"], "be brief");
    }
}
