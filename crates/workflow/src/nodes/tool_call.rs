//! Tool call: resolve, validate, and execute the pending request.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;
use windlass_core::error::{Error, Result, ValidationError};
use windlass_core::event::{EventBus, WorkflowEvent};
use windlass_core::tool::{ToolOutcome, ToolRegistry};

use crate::graph::{Next, Node};
use crate::state::WorkflowState;

/// Executes the request queued by the reasoning step.
///
/// An unknown tool name aborts the run. Argument validation failures and
/// errors raised inside the tool body are lowered into failed outcomes so
/// the loop can see what went wrong and adjust course.
pub struct ToolCallNode {
    registry: Arc<ToolRegistry>,
    events: Arc<EventBus>,
}

impl ToolCallNode {
    pub fn new(registry: Arc<ToolRegistry>, events: Arc<EventBus>) -> Self {
        Self { registry, events }
    }
}

#[async_trait]
impl Node<WorkflowState> for ToolCallNode {
    fn id(&self) -> &str {
        super::TOOL_CALL
    }

    async fn run(&self, mut state: WorkflowState) -> Result<(WorkflowState, Next)> {
        let request = state
            .pending_request
            .clone()
            .ok_or_else(|| Error::Internal("tool-call node ran without a pending request".into()))?;

        let tool = self
            .registry
            .get(&request.tool_name)
            .ok_or_else(|| ValidationError::UnknownTool(request.tool_name.clone()))?;

        let started = Instant::now();
        let outcome = match tool.schema().validate(&request.tool_name, &request.arguments) {
            Err(validation) => {
                warn!(
                    chat_id = %state.chat_id,
                    tool = %request.tool_name,
                    %validation,
                    "tool arguments rejected"
                );
                ToolOutcome::failed(validation.to_string())
            }
            Ok(()) => match tool.execute(&request).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!(
                        chat_id = %state.chat_id,
                        tool = %request.tool_name,
                        error = %err,
                        "tool execution raised an error"
                    );
                    ToolOutcome::failed(err.to_string())
                }
            },
        };

        self.events.publish(WorkflowEvent::ToolExecuted {
            chat_id: state.chat_id.to_string(),
            tool_name: request.tool_name.clone(),
            success: outcome.success,
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        });

        state.turns.attach_observation(outcome.clone());
        state.last_outcome = Some(outcome);
        Ok((state, Next::Continue))
    }
}
