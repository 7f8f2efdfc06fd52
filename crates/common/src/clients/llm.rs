//! Language model client
//!
//! OpenRouter-compatible chat completion client with a plain and a
//! streaming (SSE) variant. Service-status failures are distinguishable
//! from transport failures so the caller can label degraded responses
//! correctly.

use crate::config::LlmConfig;
use crate::errors::{AppError, Result};
use crate::types::{ChatMessage, Role};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;

/// Stream of incremental answer tokens
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Trait for chat completion
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run a chat completion and return the full response text
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String>;

    /// Run a chat completion, yielding tokens as they arrive
    async fn complete_stream(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<TokenStream>;
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// OpenRouter HTTP client
pub struct OpenRouterClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl OpenRouterClient {
    /// Create a new client with a shared connection pool
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { client, config })
    }

    fn build_request<'a>(
        &'a self,
        system_prompt: &'a str,
        messages: &'a [ChatMessage],
        max_tokens: u32,
        temperature: f32,
        stream: bool,
    ) -> ChatRequest<'a> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(WireMessage {
            role: "system",
            content: system_prompt,
        });
        for m in messages {
            wire.push(WireMessage {
                role: role_name(m.role),
                content: &m.content,
            });
        }
        ChatRequest {
            model: &self.config.model,
            messages: wire,
            max_tokens,
            temperature,
            stream,
        }
    }

    async fn send(
        &self,
        request: &ChatRequest<'_>,
    ) -> Result<reqwest::Response> {
        let mut builder = self.client.post(&self.config.endpoint).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status, body = %body, "LLM service returned error status");
            return Err(AppError::LlmStatus {
                status,
                message: body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let request = self.build_request(system_prompt, messages, max_tokens, temperature, false);
        let response = self.send(&request).await?;

        let data: ChatResponse = response.json().await.map_err(|e| AppError::LlmMalformed {
            message: format!("Failed to parse response: {}", e),
        })?;

        data.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::LlmMalformed {
                message: "Response contained no choices".to_string(),
            })
    }

    async fn complete_stream(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<TokenStream> {
        let request = self.build_request(system_prompt, messages, max_tokens, temperature, true);
        let response = self.send(&request).await?;

        let (tx, rx) = tokio::sync::mpsc::channel::<Result<String>>(64);

        tokio::spawn(async move {
            let mut bytes = response.bytes_stream();
            let mut buf: Vec<u8> = Vec::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(c) => c,
                    Err(e) => {
                        let _ = tx.send(Err(AppError::HttpClient(e))).await;
                        return;
                    }
                };
                buf.extend_from_slice(&chunk);

                // SSE frames are newline-delimited; a chunk may split a
                // line (or a UTF-8 sequence), so only consume full lines
                while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buf.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line);
                    let line = line.trim();

                    let Some(data) = line.strip_prefix("data: ") else {
                        continue;
                    };
                    if data == "[DONE]" {
                        return;
                    }
                    let Ok(parsed) = serde_json::from_str::<StreamChunk>(data) else {
                        continue;
                    };
                    let token = parsed
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content);
                    if let Some(token) = token {
                        // Receiver dropped means the client disconnected;
                        // stop reading
                        if tx.send(Ok(token)).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

/// Scripted mock LLM for tests
#[derive(Default)]
pub struct MockLlm {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<String>>,
    fail: bool,
}

impl MockLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that answers every call with `response`
    pub fn with_response(response: impl Into<String>) -> Self {
        let mock = Self::new();
        mock.push_response(response);
        mock
    }

    /// Mock that fails every call with a service-status error
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Queue a scripted response (FIFO; the last queued response is
    /// repeated once the queue is empty)
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().unwrap().push_back(response.into());
    }

    /// User-message content of every call received so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_response(&self, messages: &[ChatMessage]) -> Result<String> {
        if let Some(last) = messages.last() {
            self.calls.lock().unwrap().push(last.content.clone());
        }
        if self.fail {
            return Err(AppError::LlmStatus {
                status: 503,
                message: "mock llm unavailable".to_string(),
            });
        }
        let mut queue = self.responses.lock().unwrap();
        let response = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| "Mock answer.".to_string())
        };
        Ok(response)
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(
        &self,
        _system_prompt: &str,
        messages: &[ChatMessage],
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<String> {
        self.next_response(messages)
    }

    async fn complete_stream(
        &self,
        _system_prompt: &str,
        messages: &[ChatMessage],
        _max_tokens: u32,
        _temperature: f32,
    ) -> Result<TokenStream> {
        let response = self.next_response(messages)?;
        let tokens: Vec<Result<String>> = response
            .split_inclusive(' ')
            .map(|t| Ok(t.to_string()))
            .collect();
        Ok(Box::pin(futures::stream::iter(tokens)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_scripted_responses() {
        let llm = MockLlm::new();
        llm.push_response("first");
        llm.push_response("second");

        let msgs = vec![ChatMessage::user("q")];
        assert_eq!(llm.complete("", &msgs, 100, 0.3).await.unwrap(), "first");
        assert_eq!(llm.complete("", &msgs, 100, 0.3).await.unwrap(), "second");
        // Last response repeats
        assert_eq!(llm.complete("", &msgs, 100, 0.3).await.unwrap(), "second");
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn test_mock_stream_reassembles() {
        let llm = MockLlm::with_response("one two three");
        let msgs = vec![ChatMessage::user("q")];
        let mut stream = llm.complete_stream("", &msgs, 100, 0.3).await.unwrap();

        let mut out = String::new();
        while let Some(token) = stream.next().await {
            out.push_str(&token.unwrap());
        }
        assert_eq!(out, "one two three");
    }

    #[tokio::test]
    async fn test_mock_failure_is_service_error() {
        let llm = MockLlm::failing();
        let msgs = vec![ChatMessage::user("q")];
        let err = llm.complete("", &msgs, 100, 0.3).await.unwrap_err();
        assert!(matches!(err, AppError::LlmStatus { status: 503, .. }));
    }
}
