//! Fast answer: terminal node for requests that need no research.

use async_trait::async_trait;
use windlass_core::error::Result;

use crate::graph::{Next, Node};
use crate::prompts;
use crate::state::WorkflowState;

/// Builds the completion input straight from persona and conversation.
#[derive(Default)]
pub struct FastAnswerNode;

impl FastAnswerNode {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Node<WorkflowState> for FastAnswerNode {
    fn id(&self) -> &str {
        super::FAST_ANSWER
    }

    async fn run(&self, mut state: WorkflowState) -> Result<(WorkflowState, Next)> {
        state.final_prompt = Some(prompts::fast_prompt(&state));
        Ok((state, Next::End))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::state_with_user;
    use windlass_core::payload::Tag;

    #[tokio::test]
    async fn final_prompt_carries_persona_and_conversation() {
        let mut state = state_with_user("What is a reasonable markup for baked goods?");
        state.tag = Some(Tag::Finance);
        state.profile.username = Some("Priya".into());

        let (state, next) = FastAnswerNode::new().run(state).await.unwrap();
        assert_eq!(next, Next::End);

        let prompt = state.final_prompt.unwrap();
        let system = prompt.system_text().unwrap();
        assert!(system.contains("Priya"));
        assert!(system.contains("finance"));
        assert_eq!(
            prompt.last_user_text(),
            Some("What is a reasonable markup for baked goods?")
        );
    }
}
