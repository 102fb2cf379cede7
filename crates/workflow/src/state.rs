//! Mutable state threaded through the workflow graph.

use windlass_core::message::ChatHistory;
use windlass_core::payload::{ChatId, Mode, Profile, Tag, WorkflowRequest};
use windlass_core::tool::{ToolOutcome, ToolRequest};

use crate::trace::{EvidencePool, TurnHistory};

/// Why the research loop stopped proposing tool calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The model decided it had enough material.
    ModelChoice,
    /// The iteration ceiling was reached and finalization was forced.
    IterationLimit { iterations: u32 },
}

impl StopReason {
    /// Short note woven into the synthesis prompt so the answer can be
    /// honest about truncated research.
    pub fn describe(&self) -> Option<String> {
        match self {
            StopReason::ModelChoice => None,
            StopReason::IterationLimit { iterations } => Some(format!(
                "Research stopped after reaching the limit of {iterations} iterations; answer \
                 from the material gathered so far."
            )),
        }
    }
}

/// Everything a node may read or write while a request is in flight.
///
/// State holds data only. Capabilities live on the nodes themselves.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub chat_id: ChatId,
    pub chat: ChatHistory,
    pub profile: Profile,
    pub system_override: Option<String>,
    pub file_url: Option<String>,
    pub is_voice: bool,

    /// Business area, resolved by the tag check when not supplied upstream.
    pub tag: Option<Tag>,
    /// Pipeline depth. `Auto` until the mode decision resolves it.
    pub mode: Mode,

    /// Completed research iterations (observation counted, not proposal).
    pub loop_count: u32,
    /// Ceiling on research iterations for this run.
    pub max_iterations: u32,

    /// Tool invocation produced by the last reasoning step, consumed by the
    /// observe step after execution.
    pub pending_request: Option<ToolRequest>,
    /// Raw outcome of the last tool execution, consumed by the observe step.
    pub last_outcome: Option<ToolOutcome>,

    pub turns: TurnHistory,
    pub evidence: EvidencePool,

    /// Completion input assembled by a terminal node.
    pub final_prompt: Option<ChatHistory>,
    pub stop_reason: Option<StopReason>,
}

impl WorkflowState {
    pub fn from_request(request: WorkflowRequest, max_iterations: u32) -> Self {
        Self {
            chat_id: request.chat_id,
            chat: request.messages,
            profile: request.profile,
            system_override: request.system,
            file_url: request.file_url,
            is_voice: request.is_voice,
            tag: request.tag,
            mode: request.mode,
            loop_count: 0,
            max_iterations,
            pending_request: None,
            last_outcome: None,
            turns: TurnHistory::new(),
            evidence: EvidencePool::new(),
            final_prompt: None,
            stop_reason: None,
        }
    }

    /// True once the iteration ceiling has been consumed.
    pub fn at_iteration_limit(&self) -> bool {
        self.loop_count >= self.max_iterations
    }
}
