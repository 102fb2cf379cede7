//! Events delivered on the answer stream of a [`WorkflowHandle`].
//!
//! [`WorkflowHandle`]: crate::bridge::WorkflowHandle

use serde::{Deserialize, Serialize};
use windlass_core::payload::Tag;

/// One item on the consumer-facing answer stream.
///
/// A stream is zero or more `Chunk`s followed by exactly one terminal
/// event, either `Complete` or `Error`. Nothing follows the terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerEvent {
    /// A piece of the answer text, in order.
    Chunk { content: String },

    /// The run failed after streaming began; no more events follow.
    Error { message: String },

    /// The run finished; no more events follow.
    Complete {
        tag: Tag,
        /// Research iterations consumed.
        iterations: u32,
        /// Tool invocations made.
        tool_calls: u32,
    },
}

impl AnswerEvent {
    pub fn chunk(content: impl Into<String>) -> Self {
        AnswerEvent::Chunk {
            content: content.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        AnswerEvent::Error {
            message: message.into(),
        }
    }

    /// Wire name, used as the SSE event name by the gateway.
    pub fn event_type(&self) -> &'static str {
        match self {
            AnswerEvent::Chunk { .. } => "chunk",
            AnswerEvent::Error { .. } => "error",
            AnswerEvent::Complete { .. } => "complete",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AnswerEvent::Chunk { .. })
    }
}
