//! Reason: decide the next research step.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use windlass_core::error::Result;
use windlass_core::reasoner::Reasoner;
use windlass_core::tool::ToolRegistry;

use crate::decisions::{Directive, DirectiveAction, decide};
use crate::graph::{Next, Node};
use crate::prompts;
use crate::state::{StopReason, WorkflowState};

/// Asks the model for a directive: call one tool, or finalize.
///
/// Every directive opens a turn, including finalize decisions, so the turn
/// history reads as a complete account of the loop.
pub struct ReasonNode {
    reasoner: Arc<dyn Reasoner>,
    registry: Arc<ToolRegistry>,
}

impl ReasonNode {
    pub fn new(reasoner: Arc<dyn Reasoner>, registry: Arc<ToolRegistry>) -> Self {
        Self { reasoner, registry }
    }
}

#[async_trait]
impl Node<WorkflowState> for ReasonNode {
    fn id(&self) -> &str {
        super::REASON
    }

    async fn run(&self, mut state: WorkflowState) -> Result<(WorkflowState, Next)> {
        let definitions = self.registry.definitions();
        let prompt = prompts::reason_prompt(&state, &definitions)?;
        let directive: Directive = decide(self.reasoner.as_ref(), &prompt).await?;

        match directive.action {
            DirectiveAction::Finalize => {
                debug!(chat_id = %state.chat_id, thought = %directive.thought, "model chose to finalize");
                state.turns.open(directive.thought, None);
                state.stop_reason = Some(StopReason::ModelChoice);
                Ok((state, Next::goto(super::SYNTHESIZE)))
            }
            DirectiveAction::CallTool => {
                let thought = directive.thought.clone();
                let request = directive.into_request()?;
                debug!(
                    chat_id = %state.chat_id,
                    tool = %request.tool_name,
                    "model requested a tool call"
                );
                state.turns.open(thought, Some(request.clone()));
                state.pending_request = Some(request);
                Ok((state, Next::goto(super::TOOL_CALL)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        directive_call, directive_finalize, state_with_user, structured, MockReasoner,
    };
    use serde_json::json;

    fn registry() -> Arc<ToolRegistry> {
        Arc::new(ToolRegistry::new())
    }

    #[tokio::test]
    async fn call_directive_queues_a_request_and_opens_a_turn() {
        let reasoner = Arc::new(MockReasoner::scripted(vec![directive_call(
            "need current thresholds",
            "web_search",
            &[("query", "vat threshold 2026")],
        )]));
        let node = ReasonNode::new(reasoner, registry());

        let state = state_with_user("Do I need to register for VAT?");
        let (state, next) = node.run(state).await.unwrap();

        assert_eq!(next, Next::goto(super::super::TOOL_CALL));
        let pending = state.pending_request.unwrap();
        assert_eq!(pending.tool_name, "web_search");
        assert_eq!(state.turns.len(), 1);
        assert!(state.turns.last().unwrap().request.is_some());
    }

    #[tokio::test]
    async fn finalize_directive_opens_a_turn_and_routes_to_synthesis() {
        let reasoner = Arc::new(MockReasoner::scripted(vec![directive_finalize(
            "the conversation already has what I need",
        )]));
        let node = ReasonNode::new(reasoner, registry());

        let state = state_with_user("Summarize our discussion.");
        let (state, next) = node.run(state).await.unwrap();

        assert_eq!(next, Next::goto(super::super::SYNTHESIZE));
        assert_eq!(state.stop_reason, Some(StopReason::ModelChoice));
        assert_eq!(state.turns.len(), 1);
        assert!(state.turns.last().unwrap().request.is_none());
    }

    #[tokio::test]
    async fn call_directive_without_tool_name_fails() {
        let reasoner = Arc::new(MockReasoner::scripted(vec![structured(json!({
            "thought": "search for it",
            "action": "call_tool"
        }))]));
        let node = ReasonNode::new(reasoner, registry());

        let state = state_with_user("Find the filing deadline.");
        let err = node.run(state).await.err().unwrap();
        assert!(err.to_string().contains("directive"));
    }
}
