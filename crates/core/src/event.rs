//! Domain event system: decoupled observability for workflow runs.
//!
//! Nodes publish progress events as they run; the gateway can relay them
//! to monitoring clients without the workflow knowing who is listening.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::payload::{Mode, Tag};

/// All workflow progress events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// A graph node began executing
    NodeStarted {
        chat_id: String,
        node: String,
        timestamp: DateTime<Utc>,
    },

    /// A graph node finished and routed onward
    NodeFinished {
        chat_id: String,
        node: String,
        next: String,
        timestamp: DateTime<Utc>,
    },

    /// The request's routing tag was resolved
    TagResolved {
        chat_id: String,
        tag: Tag,
        timestamp: DateTime<Utc>,
    },

    /// An auto-mode request was classified
    ModeResolved {
        chat_id: String,
        mode: Mode,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed
    ToolExecuted {
        chat_id: String,
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The research loop hit its iteration ceiling
    ForcedFinalize {
        chat_id: String,
        iterations: u32,
        timestamp: DateTime<Utc>,
    },

    /// An error surfaced from a workflow run
    ErrorOccurred {
        chat_id: String,
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    /// The chat this event belongs to.
    pub fn chat_id(&self) -> &str {
        match self {
            WorkflowEvent::NodeStarted { chat_id, .. }
            | WorkflowEvent::NodeFinished { chat_id, .. }
            | WorkflowEvent::TagResolved { chat_id, .. }
            | WorkflowEvent::ModeResolved { chat_id, .. }
            | WorkflowEvent::ToolExecuted { chat_id, .. }
            | WorkflowEvent::ForcedFinalize { chat_id, .. }
            | WorkflowEvent::ErrorOccurred { chat_id, .. } => chat_id,
        }
    }
}

/// A broadcast-based event bus for workflow events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub. Slow
/// subscribers lag and drop old events instead of blocking publishers.
pub struct EventBus {
    sender: broadcast::Sender<Arc<WorkflowEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: WorkflowEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<WorkflowEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
