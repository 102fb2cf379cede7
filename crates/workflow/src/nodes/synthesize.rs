//! Synthesize: terminal node for the research path.

use async_trait::async_trait;
use windlass_core::error::Result;

use crate::graph::{Next, Node};
use crate::prompts;
use crate::state::WorkflowState;

/// Builds the completion input from persona, the cited evidence block, and
/// the conversation. Runs whether research produced material or not.
#[derive(Default)]
pub struct SynthesizeNode;

impl SynthesizeNode {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Node<WorkflowState> for SynthesizeNode {
    fn id(&self) -> &str {
        super::SYNTHESIZE
    }

    async fn run(&self, mut state: WorkflowState) -> Result<(WorkflowState, Next)> {
        state.final_prompt = Some(prompts::synthesis_prompt(&state));
        Ok((state, Next::End))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StopReason;
    use crate::test_support::state_with_user;
    use crate::trace::Evidence;
    use serde_json::json;

    #[tokio::test]
    async fn prompt_carries_numbered_evidence() {
        let mut state = state_with_user("What notice period does my contract have?");
        state.evidence.push(Evidence::new(
            "fetch_file",
            "Clause 4: 30 days notice",
            json!({"file_url": "https://example.com/contract.txt"}),
        ));

        let (state, next) = SynthesizeNode::new().run(state).await.unwrap();
        assert_eq!(next, Next::End);
        let system = state.final_prompt.unwrap().system_text().unwrap().to_string();
        assert!(system.contains("[1] [fetch_file] Clause 4"));
    }

    #[tokio::test]
    async fn empty_pool_states_the_absence_and_forced_stop_is_noted() {
        let mut state = state_with_user("What changed in the rules?");
        state.stop_reason = Some(StopReason::IterationLimit { iterations: 3 });

        let (state, _) = SynthesizeNode::new().run(state).await.unwrap();
        let system = state.final_prompt.unwrap().system_text().unwrap().to_string();
        assert!(system.contains("No research material"));
        assert!(system.contains("3 iterations"));
    }
}
