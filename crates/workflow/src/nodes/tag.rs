//! Tag check: resolve the business area and report it early.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use windlass_core::error::Result;
use windlass_core::event::{EventBus, WorkflowEvent};
use windlass_core::reasoner::Reasoner;

use crate::bridge::TagTap;
use crate::decisions::{TagChoice, decide};
use crate::graph::{Next, Node};
use crate::prompts;
use crate::state::WorkflowState;

/// Resolves the conversation's tag, classifying when the caller did not
/// supply one, and fires the early-result tap the moment it is known.
pub struct TagCheckNode {
    reasoner: Arc<dyn Reasoner>,
    events: Arc<EventBus>,
    tap: Option<Arc<TagTap>>,
}

impl TagCheckNode {
    pub fn new(reasoner: Arc<dyn Reasoner>, events: Arc<EventBus>) -> Self {
        Self {
            reasoner,
            events,
            tap: None,
        }
    }

    /// Attach the early-result tap of a streaming handle.
    pub fn with_tap(mut self, tap: Arc<TagTap>) -> Self {
        self.tap = Some(tap);
        self
    }
}

#[async_trait]
impl Node<WorkflowState> for TagCheckNode {
    fn id(&self) -> &str {
        super::TAG_CHECK
    }

    async fn run(&self, mut state: WorkflowState) -> Result<(WorkflowState, Next)> {
        let tag = match state.tag {
            Some(tag) => tag,
            None => {
                let prompt = prompts::tag_prompt(&state.chat)?;
                let choice: TagChoice = decide(self.reasoner.as_ref(), &prompt).await?;
                choice.tag.into()
            }
        };
        state.tag = Some(tag);

        if let Some(tap) = &self.tap {
            tap.resolve(tag);
        }
        self.events.publish(WorkflowEvent::TagResolved {
            chat_id: state.chat_id.to_string(),
            tag,
            timestamp: Utc::now(),
        });
        debug!(chat_id = %state.chat_id, tag = %tag, "conversation tagged");

        Ok((state, Next::Continue))
    }
}
