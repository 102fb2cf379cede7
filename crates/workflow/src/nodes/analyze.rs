//! Analyze: decide whether to keep researching.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};
use windlass_core::error::Result;
use windlass_core::event::{EventBus, WorkflowEvent};
use windlass_core::reasoner::Reasoner;

use crate::decisions::{Verdict, decide};
use crate::graph::{Next, Node};
use crate::state::{StopReason, WorkflowState};

/// Routes back to reasoning only when the model wants more material AND
/// the iteration ceiling has room. At the ceiling, finalization is forced
/// without consulting the model.
pub struct AnalyzeNode {
    reasoner: Arc<dyn Reasoner>,
    events: Arc<EventBus>,
}

impl AnalyzeNode {
    pub fn new(reasoner: Arc<dyn Reasoner>, events: Arc<EventBus>) -> Self {
        Self { reasoner, events }
    }
}

#[async_trait]
impl Node<WorkflowState> for AnalyzeNode {
    fn id(&self) -> &str {
        super::ANALYZE
    }

    async fn run(&self, mut state: WorkflowState) -> Result<(WorkflowState, Next)> {
        if state.at_iteration_limit() {
            warn!(
                chat_id = %state.chat_id,
                iterations = state.loop_count,
                "iteration ceiling reached, forcing finalization"
            );
            self.events.publish(WorkflowEvent::ForcedFinalize {
                chat_id: state.chat_id.to_string(),
                iterations: state.loop_count,
                timestamp: Utc::now(),
            });
            state.stop_reason = Some(StopReason::IterationLimit {
                iterations: state.loop_count,
            });
            return Ok((state, Next::goto(super::SYNTHESIZE)));
        }

        let prompt = crate::prompts::analyze_prompt(&state)?;
        let verdict: Verdict = decide(self.reasoner.as_ref(), &prompt).await?;
        debug!(
            chat_id = %state.chat_id,
            needs_more = verdict.needs_more_research,
            rationale = %verdict.rationale,
            "sufficiency verdict"
        );

        if verdict.needs_more_research {
            Ok((state, Next::goto(super::REASON)))
        } else {
            state.stop_reason = Some(StopReason::ModelChoice);
            Ok((state, Next::goto(super::SYNTHESIZE)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{state_with_user, verdict, MockReasoner};

    #[tokio::test]
    async fn ceiling_forces_finalization_without_a_model_call() {
        let reasoner = Arc::new(MockReasoner::empty());
        let node = AnalyzeNode::new(reasoner.clone(), Arc::new(EventBus::default()));

        let mut state = state_with_user("research this");
        state.max_iterations = 2;
        state.loop_count = 2;

        let (state, next) = node.run(state).await.unwrap();
        assert_eq!(next, Next::goto(super::super::SYNTHESIZE));
        assert_eq!(
            state.stop_reason,
            Some(StopReason::IterationLimit { iterations: 2 })
        );
        assert_eq!(reasoner.calls_made(), 0);
    }

    #[tokio::test]
    async fn insufficient_verdict_loops_back() {
        let reasoner = Arc::new(MockReasoner::scripted(vec![verdict(
            true,
            "still missing the current rate",
        )]));
        let node = AnalyzeNode::new(reasoner, Arc::new(EventBus::default()));

        let mut state = state_with_user("research this");
        state.loop_count = 1;

        let (state, next) = node.run(state).await.unwrap();
        assert_eq!(next, Next::goto(super::super::REASON));
        assert!(state.stop_reason.is_none());
    }

    #[tokio::test]
    async fn sufficient_verdict_finalizes() {
        let reasoner = Arc::new(MockReasoner::scripted(vec![verdict(false, "enough")]));
        let node = AnalyzeNode::new(reasoner, Arc::new(EventBus::default()));

        let mut state = state_with_user("research this");
        state.loop_count = 1;

        let (state, next) = node.run(state).await.unwrap();
        assert_eq!(next, Next::goto(super::super::SYNTHESIZE));
        assert_eq!(state.stop_reason, Some(StopReason::ModelChoice));
    }
}
