//! Scripted fakes shared by the workflow tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;
use windlass_core::error::{CapabilityError, ToolError};
use windlass_core::message::ChatHistory;
use windlass_core::payload::Mode;
use windlass_core::payload::WorkflowRequest;
use windlass_core::reasoner::{Reasoner, StreamChunk};
use windlass_core::tool::{Tool, ToolOutcome, ToolRequest, ToolSchema};

use crate::state::WorkflowState;

/// One scripted reply. The script is consumed strictly in order; pulling a
/// reply of the wrong kind panics so mis-sequenced tests fail loudly.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Reply to `call_structured`.
    Structured(serde_json::Value),
    /// Reply to `call` (or `stream`, as a single chunk).
    Text(String),
    /// Reply to `stream` as multiple chunks.
    Chunks(Vec<String>),
    /// Fail whichever method pulls it.
    Fail(String),
}

pub struct MockReasoner {
    script: Mutex<VecDeque<MockResponse>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl MockReasoner {
    pub fn scripted(responses: Vec<MockResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn empty() -> Self {
        Self::scripted(Vec::new())
    }

    /// Sleep before every reply; used to widen cancellation windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls_made(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }

    async fn next(&self, wanted: &str) -> MockResponse {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("mock script exhausted while serving a {wanted} request"))
    }
}

#[async_trait]
impl Reasoner for MockReasoner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn call(&self, _history: &ChatHistory) -> Result<String, CapabilityError> {
        match self.next("text").await {
            MockResponse::Text(text) => Ok(text),
            MockResponse::Fail(message) => Err(CapabilityError::Network(message)),
            other => panic!("mock script expected a text reply, found {other:?}"),
        }
    }

    async fn call_structured(
        &self,
        _history: &ChatHistory,
        _schema: &serde_json::Value,
    ) -> Result<serde_json::Value, CapabilityError> {
        match self.next("structured").await {
            MockResponse::Structured(value) => Ok(value),
            MockResponse::Fail(message) => Err(CapabilityError::Network(message)),
            other => panic!("mock script expected a structured reply, found {other:?}"),
        }
    }

    async fn stream(
        &self,
        _history: &ChatHistory,
    ) -> Result<mpsc::Receiver<Result<StreamChunk, CapabilityError>>, CapabilityError> {
        let pieces = match self.next("stream").await {
            MockResponse::Text(text) => vec![text],
            MockResponse::Chunks(chunks) => chunks,
            MockResponse::Fail(message) => return Err(CapabilityError::Network(message)),
            other => panic!("mock script expected a stream reply, found {other:?}"),
        };
        let (tx, rx) = mpsc::channel(pieces.len() + 1);
        for piece in pieces {
            let _ = tx.send(Ok(StreamChunk::content(piece))).await;
        }
        let _ = tx.send(Ok(StreamChunk::done())).await;
        Ok(rx)
    }
}

// --- Script entries ---

pub fn structured(value: serde_json::Value) -> MockResponse {
    MockResponse::Structured(value)
}

pub fn text(content: &str) -> MockResponse {
    MockResponse::Text(content.to_string())
}

pub fn chunks(pieces: &[&str]) -> MockResponse {
    MockResponse::Chunks(pieces.iter().map(|s| s.to_string()).collect())
}

pub fn tag_choice(tag: &str) -> MockResponse {
    structured(json!({ "tag": tag }))
}

pub fn mode_choice(mode: &str) -> MockResponse {
    structured(json!({ "mode": mode }))
}

pub fn verdict(needs_more_research: bool, rationale: &str) -> MockResponse {
    structured(json!({
        "needs_more_research": needs_more_research,
        "rationale": rationale,
    }))
}

pub fn directive_call(thought: &str, tool_name: &str, args: &[(&str, &str)]) -> MockResponse {
    let tool_args: serde_json::Map<String, serde_json::Value> = args
        .iter()
        .map(|(k, v)| (k.to_string(), json!(v)))
        .collect();
    structured(json!({
        "thought": thought,
        "action": "call_tool",
        "tool_name": tool_name,
        "tool_args": tool_args,
    }))
}

pub fn directive_finalize(thought: &str) -> MockResponse {
    structured(json!({ "thought": thought, "action": "finalize" }))
}

// --- Scripted tools ---

/// A tool with a fixed schema and a fixed outcome.
pub struct ScriptedTool {
    name: String,
    description: String,
    schema: ToolSchema,
    outcome: ToolOutcome,
}

impl ScriptedTool {
    pub fn new(name: &str, schema: ToolSchema, outcome: ToolOutcome) -> Self {
        Self {
            name: name.to_string(),
            description: format!("Scripted {name} for tests."),
            schema,
            outcome,
        }
    }
}

#[async_trait]
impl Tool for ScriptedTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> ToolSchema {
        self.schema.clone()
    }

    async fn execute(&self, _request: &ToolRequest) -> Result<ToolOutcome, ToolError> {
        Ok(self.outcome.clone())
    }
}

/// A tool whose body always raises.
pub struct FlakyTool {
    name: String,
    message: String,
}

impl FlakyTool {
    pub fn new(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl Tool for FlakyTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Always raises from its body."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new().open()
    }

    async fn execute(&self, _request: &ToolRequest) -> Result<ToolOutcome, ToolError> {
        Err(ToolError::ExecutionFailed {
            tool_name: self.name.clone(),
            reason: self.message.clone(),
        })
    }
}

// --- State helpers ---

pub fn request_with_user(text: &str) -> WorkflowRequest {
    let mut chat = ChatHistory::new();
    chat.push_user(text).unwrap();
    WorkflowRequest::new(chat, Mode::Auto)
}

pub fn state_with_user(text: &str) -> WorkflowState {
    WorkflowState::from_request(request_with_user(text), 4)
}
