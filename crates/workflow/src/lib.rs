//! windlass-workflow: the orchestration core.
//!
//! A request flows through a compiled graph of nodes: tag check, mode
//! decision, then either a direct answer or the research cycle of reason,
//! tool call, observe, and analyze, ending in synthesis. The
//! [`runner::WorkflowRunner`] assembles the graph and bridges each run to
//! its consumer through a [`bridge::WorkflowHandle`].

pub mod bridge;
pub mod decisions;
pub mod events;
pub mod graph;
pub mod nodes;
pub mod prompts;
pub mod runner;
pub mod state;
pub mod trace;

#[cfg(test)]
mod test_support;

pub use bridge::{CollectedAnswer, TagTap, WorkflowHandle};
pub use events::AnswerEvent;
pub use graph::{CompiledGraph, Next, Node, StateGraph, StepObserver};
pub use runner::{RunnerSettings, WorkflowRunner};
pub use state::{StopReason, WorkflowState};
pub use trace::{Evidence, EvidencePool, Turn, TurnHistory};
