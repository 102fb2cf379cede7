//! Reasoner backed by an OpenAI-compatible chat completions server.
//!
//! Works with Ollama, vLLM, and any endpoint exposing
//! `/v1/chat/completions`; the deployment target is a locally hosted
//! model, hence the name.
//!
//! Supports:
//! - Single-shot completions
//! - Schema-constrained completions (`response_format: json_schema`)
//! - Streaming SSE completions
//! - Readiness probing against `/models`

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use windlass_config::ReasonerConfig;
use windlass_core::error::CapabilityError;
use windlass_core::message::ChatHistory;
use windlass_core::reasoner::{Reasoner, StreamChunk};

/// A reasoning capability speaking the OpenAI chat protocol.
pub struct LocalReasoner {
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

impl LocalReasoner {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
            temperature: 0.7,
            max_tokens: 4096,
            client,
        }
    }

    pub fn from_config(config: &ReasonerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            client,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn to_api_messages(history: &ChatHistory) -> Vec<serde_json::Value> {
        history
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role.as_str(),
                    "content": m.content,
                })
            })
            .collect()
    }

    fn request(&self, url: &str, body: &serde_json::Value) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }
        builder
    }

    fn completion_body(&self, history: &ChatHistory, stream: bool) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": Self::to_api_messages(history),
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": stream,
        })
    }

    /// Map a non-200 response to an error, draining the body for context.
    async fn status_error(response: reqwest::Response) -> CapabilityError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        warn!(status, body = %body, "Reasoner returned error");
        CapabilityError::ApiError {
            status_code: status,
            message: body,
        }
    }

    async fn send_completion(
        &self,
        body: serde_json::Value,
    ) -> Result<ApiResponse, CapabilityError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .request(&url, &body)
            .send()
            .await
            .map_err(|e| CapabilityError::Network(e.to_string()))?;

        if response.status().as_u16() != 200 {
            return Err(Self::status_error(response).await);
        }

        response.json().await.map_err(|e| CapabilityError::ApiError {
            status_code: 200,
            message: format!("Failed to parse response: {e}"),
        })
    }

    fn first_content(api_response: ApiResponse) -> Result<String, CapabilityError> {
        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.is_empty() {
            return Err(CapabilityError::EmptyCompletion);
        }
        Ok(content)
    }
}

#[async_trait]
impl Reasoner for LocalReasoner {
    fn name(&self) -> &str {
        "local"
    }

    async fn call(&self, history: &ChatHistory) -> Result<String, CapabilityError> {
        debug!(model = %self.model, "Sending completion request");
        let body = self.completion_body(history, false);
        let api_response = self.send_completion(body).await?;
        Self::first_content(api_response)
    }

    async fn call_structured(
        &self,
        history: &ChatHistory,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, CapabilityError> {
        debug!(model = %self.model, "Sending structured completion request");
        let mut body = self.completion_body(history, false);
        body["response_format"] = serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": "decision",
                "schema": schema,
                "strict": true,
            },
        });

        let api_response = self.send_completion(body).await?;
        let content = Self::first_content(api_response)?;

        serde_json::from_str(&content).map_err(|e| CapabilityError::Decode {
            reason: e.to_string(),
            payload: truncate_payload(&content),
        })
    }

    async fn stream(
        &self,
        history: &ChatHistory,
    ) -> Result<mpsc::Receiver<Result<StreamChunk, CapabilityError>>, CapabilityError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.completion_body(history, true);

        debug!(model = %self.model, "Sending streaming request");

        let response = self
            .request(&url, &body)
            .header("Accept", "text/event-stream")
            .send()
            .await
            .map_err(|e| CapabilityError::Network(e.to_string()))?;

        if response.status().as_u16() != 200 {
            return Err(Self::status_error(response).await);
        }

        let (tx, rx) = mpsc::channel(64);

        // Spawn task to read the SSE byte stream and parse chunks
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(CapabilityError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // Process complete lines
                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim_end_matches('\r').to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    // Skip empty lines and SSE comments
                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    if let Some(data) = line.strip_prefix("data: ") {
                        let data = data.trim();

                        if data == "[DONE]" {
                            let _ = tx.send(Ok(StreamChunk::done())).await;
                            return;
                        }

                        match serde_json::from_str::<StreamResponse>(data) {
                            Ok(stream_resp) => {
                                if let Some(choice) = stream_resp.choices.first() {
                                    if let Some(content) = &choice.delta.content {
                                        if !content.is_empty()
                                            && tx
                                                .send(Ok(StreamChunk::content(content)))
                                                .await
                                                .is_err()
                                        {
                                            return; // receiver dropped
                                        }
                                    }

                                    if choice.finish_reason.is_some() {
                                        let _ = tx.send(Ok(StreamChunk::done())).await;
                                        return;
                                    }
                                }
                            }
                            Err(e) => {
                                trace!(data = %data, error = %e, "Ignoring unparseable SSE chunk");
                            }
                        }
                    }
                }
            }

            // Stream ended without [DONE]
            let _ = tx.send(Ok(StreamChunk::done())).await;
        });

        Ok(rx)
    }

    async fn health_check(&self) -> Result<(), CapabilityError> {
        let url = format!("{}/models", self.base_url);
        let mut builder = self.client.get(&url);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| CapabilityError::Network(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CapabilityError::NotReady(format!(
                "model server responded with status {}",
                response.status().as_u16()
            )))
        }
    }
}

fn truncate_payload(content: &str) -> String {
    const MAX: usize = 200;
    if content.len() <= MAX {
        content.to_string()
    } else {
        let mut end = MAX;
        while !content.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &content[..end])
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

// --- Streaming SSE types ---

/// A single SSE `data: {...}` chunk from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}
