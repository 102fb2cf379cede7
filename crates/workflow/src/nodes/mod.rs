//! The workflow's graph nodes.
//!
//! Wiring lives in the runner; each node here owns one decision or side
//! effect and routes onward by name.

mod analyze;
mod fast_answer;
mod mode;
mod observe;
mod reason;
mod synthesize;
mod tag;
mod tool_call;

pub use analyze::AnalyzeNode;
pub use fast_answer::FastAnswerNode;
pub use mode::ModeDecisionNode;
pub use observe::ObserveNode;
pub use reason::ReasonNode;
pub use synthesize::SynthesizeNode;
pub use tag::TagCheckNode;
pub use tool_call::ToolCallNode;

// Node identifiers, used for wiring and Goto routing.
pub const TAG_CHECK: &str = "tag_check";
pub const MODE_DECISION: &str = "mode_decision";
pub const FAST_ANSWER: &str = "fast_answer";
pub const REASON: &str = "reason";
pub const TOOL_CALL: &str = "tool_call";
pub const OBSERVE: &str = "observe";
pub const ANALYZE: &str = "analyze";
pub const SYNTHESIZE: &str = "synthesize";
