//! Mode decision: pick the pipeline branch for this request.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use windlass_core::error::Result;
use windlass_core::event::{EventBus, WorkflowEvent};
use windlass_core::payload::Mode;
use windlass_core::reasoner::Reasoner;

use crate::decisions::{ModeChoice, decide};
use crate::graph::{Next, Node};
use crate::prompts;
use crate::state::WorkflowState;

/// Resolves `Auto` into a concrete mode and routes to the matching branch.
///
/// Voice requests always take the fast branch; spoken replies cannot wait
/// for a research loop. Thinking mode keeps the research pipeline but
/// trims its iteration allowance.
pub struct ModeDecisionNode {
    reasoner: Arc<dyn Reasoner>,
    events: Arc<EventBus>,
    thinking_iterations: u32,
}

impl ModeDecisionNode {
    pub fn new(reasoner: Arc<dyn Reasoner>, events: Arc<EventBus>, thinking_iterations: u32) -> Self {
        Self {
            reasoner,
            events,
            thinking_iterations,
        }
    }
}

#[async_trait]
impl Node<WorkflowState> for ModeDecisionNode {
    fn id(&self) -> &str {
        super::MODE_DECISION
    }

    async fn run(&self, mut state: WorkflowState) -> Result<(WorkflowState, Next)> {
        let mode = if state.is_voice {
            Mode::Fast
        } else {
            match state.mode {
                Mode::Auto => {
                    let prompt = prompts::mode_prompt(&state.chat)?;
                    let choice: ModeChoice = decide(self.reasoner.as_ref(), &prompt).await?;
                    choice.mode.into()
                }
                fixed => fixed,
            }
        };
        state.mode = mode;
        if mode == Mode::Thinking {
            state.max_iterations = state.max_iterations.min(self.thinking_iterations);
        }

        self.events.publish(WorkflowEvent::ModeResolved {
            chat_id: state.chat_id.to_string(),
            mode,
            timestamp: Utc::now(),
        });
        debug!(chat_id = %state.chat_id, mode = %mode, "mode resolved");

        let next = if mode == Mode::Fast {
            Next::goto(super::FAST_ANSWER)
        } else {
            Next::goto(super::REASON)
        };
        Ok((state, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{mode_choice, state_with_user, MockReasoner};

    fn node(reasoner: Arc<MockReasoner>) -> ModeDecisionNode {
        ModeDecisionNode::new(reasoner, Arc::new(EventBus::default()), 2)
    }

    #[tokio::test]
    async fn auto_mode_is_classified() {
        let reasoner = Arc::new(MockReasoner::scripted(vec![mode_choice("thinking")]));
        let node = node(reasoner);

        let state = state_with_user("Compare leasing vs buying a van for my bakery.");
        let (state, next) = node.run(state).await.unwrap();
        assert_eq!(state.mode, Mode::Thinking);
        assert_eq!(next, Next::goto(super::super::REASON));
        // Thinking trims the allowance.
        assert_eq!(state.max_iterations, 2);
    }

    #[tokio::test]
    async fn voice_requests_take_the_fast_branch_without_a_model_call() {
        let reasoner = Arc::new(MockReasoner::empty());
        let node = node(reasoner.clone());

        let mut state = state_with_user("What time is the VAT deadline?");
        state.is_voice = true;
        let (state, next) = node.run(state).await.unwrap();
        assert_eq!(state.mode, Mode::Fast);
        assert_eq!(next, Next::goto(super::super::FAST_ANSWER));
        assert_eq!(reasoner.calls_made(), 0);
    }

    #[tokio::test]
    async fn explicit_research_mode_keeps_its_allowance() {
        let reasoner = Arc::new(MockReasoner::empty());
        let node = node(reasoner);

        let mut state = state_with_user("Deep dive on import duties.");
        state.mode = Mode::Research;
        let (state, next) = node.run(state).await.unwrap();
        assert_eq!(state.mode, Mode::Research);
        assert_eq!(state.max_iterations, 4);
        assert_eq!(next, Next::goto(super::super::REASON));
    }
}
