//! Reasoning capability abstraction.
//!
//! The workflow consumes exactly three operations: single-shot completion,
//! schema-constrained completion, and incremental streaming. Implementations
//! live in `windlass-providers`; tests script the trait directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::CapabilityError;
use crate::message::ChatHistory;

/// A chunk of streamed completion output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Incremental content
    pub content: String,

    /// Whether this is the final chunk
    pub done: bool,
}

impl StreamChunk {
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            done: false,
        }
    }

    pub fn done() -> Self {
        Self {
            content: String::new(),
            done: true,
        }
    }
}

/// The call boundary to a reasoning model.
///
/// Streams are finite and not restartable: one receiver per call, drained
/// until the `done` chunk or an error.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Implementation name for logging ("local", "mock", ...).
    fn name(&self) -> &str;

    /// Single-shot text completion.
    ///
    /// An empty completion is an error; callers rely on content being
    /// present (`CapabilityError::EmptyCompletion`).
    async fn call(&self, history: &ChatHistory) -> Result<String, CapabilityError>;

    /// Completion constrained to a JSON schema, returned as raw JSON.
    ///
    /// Implementations must not repair or default a malformed response;
    /// decoding into a typed value happens at the call site and fails
    /// loudly there.
    async fn call_structured(
        &self,
        history: &ChatHistory,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, CapabilityError>;

    /// Streaming completion. Default implementation wraps `call` into a
    /// single-chunk stream for capabilities without native streaming.
    async fn stream(
        &self,
        history: &ChatHistory,
    ) -> Result<mpsc::Receiver<Result<StreamChunk, CapabilityError>>, CapabilityError> {
        let content = self.call(history).await?;
        let (tx, rx) = mpsc::channel(2);
        let _ = tx.send(Ok(StreamChunk::content(content))).await;
        let _ = tx.send(Ok(StreamChunk::done())).await;
        Ok(rx)
    }

    /// Readiness probe. Defaults to healthy for implementations without a
    /// meaningful check.
    async fn health_check(&self) -> Result<(), CapabilityError> {
        Ok(())
    }
}
