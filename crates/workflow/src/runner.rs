//! Graph assembly and run lifecycle.
//!
//! The runner owns the node wiring. `start` launches a worker task and
//! hands back the consumer-facing [`WorkflowHandle`]; the worker drives the
//! graph, streams the final completion, and always closes the answer stream
//! with exactly one terminal event.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::error;
use windlass_core::error::{Error, Result, WorkflowError};
use windlass_core::event::{EventBus, WorkflowEvent};
use windlass_core::payload::{Tag, WorkflowRequest};
use windlass_core::reasoner::Reasoner;
use windlass_core::tool::ToolRegistry;

use crate::bridge::{CollectedAnswer, TagTap, WorkflowHandle};
use crate::events::AnswerEvent;
use crate::graph::{CompiledGraph, Next, StateGraph, StepObserver};
use crate::nodes::{
    AnalyzeNode, FastAnswerNode, ModeDecisionNode, ObserveNode, ReasonNode, SynthesizeNode,
    TagCheckNode, ToolCallNode,
};
use crate::state::WorkflowState;

/// Assembly-time knobs for a runner.
#[derive(Debug, Clone, Copy)]
pub struct RunnerSettings {
    /// Research iteration ceiling.
    pub max_iterations: u32,
    /// Reduced ceiling applied when the mode decision picks thinking.
    pub thinking_iterations: u32,
    /// Hard cap on node executions per run.
    pub step_budget: u32,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            max_iterations: 4,
            thinking_iterations: 2,
            step_budget: 64,
        }
    }
}

/// Builds workflow graphs and launches runs against shared capabilities.
pub struct WorkflowRunner {
    reasoner: Arc<dyn Reasoner>,
    registry: Arc<ToolRegistry>,
    events: Arc<EventBus>,
    settings: RunnerSettings,
}

impl WorkflowRunner {
    pub fn new(reasoner: Arc<dyn Reasoner>, registry: Arc<ToolRegistry>) -> Self {
        Self {
            reasoner,
            registry,
            events: Arc::new(EventBus::default()),
            settings: RunnerSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: RunnerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.events
    }

    fn build_graph(
        &self,
        chat_id: &str,
        tap: Option<Arc<TagTap>>,
    ) -> Result<CompiledGraph<WorkflowState>> {
        let mut tag_node = TagCheckNode::new(self.reasoner.clone(), self.events.clone());
        if let Some(tap) = tap {
            tag_node = tag_node.with_tap(tap);
        }

        StateGraph::new()
            .with_step_budget(self.settings.step_budget)
            .with_observer(Arc::new(BusObserver {
                events: self.events.clone(),
                chat_id: chat_id.to_string(),
            }))
            .add_node(Box::new(tag_node))
            .add_node(Box::new(ModeDecisionNode::new(
                self.reasoner.clone(),
                self.events.clone(),
                self.settings.thinking_iterations,
            )))
            .add_node(Box::new(FastAnswerNode::new()))
            .add_node(Box::new(ReasonNode::new(
                self.reasoner.clone(),
                self.registry.clone(),
            )))
            .add_node(Box::new(ToolCallNode::new(
                self.registry.clone(),
                self.events.clone(),
            )))
            .add_node(Box::new(ObserveNode::new()))
            .add_node(Box::new(AnalyzeNode::new(
                self.reasoner.clone(),
                self.events.clone(),
            )))
            .add_node(Box::new(SynthesizeNode::new()))
            .compile()
    }

    /// Launch a run. Returns immediately; the graph executes on a worker
    /// task and reports through the handle.
    pub fn start(&self, request: WorkflowRequest) -> WorkflowHandle {
        let (tag_tx, tag_rx) = oneshot::channel();
        let (event_tx, event_rx) = mpsc::channel(128);
        let cancel = CancellationToken::new();
        let tap = TagTap::new(tag_tx);

        let state = WorkflowState::from_request(request, self.settings.max_iterations);
        let chat_id = state.chat_id.to_string();
        let graph = self.build_graph(&chat_id, Some(tap.clone()));
        let reasoner = self.reasoner.clone();
        let events = self.events.clone();
        let worker_cancel = cancel.clone();

        tokio::spawn(async move {
            match drive(graph, state, reasoner, &event_tx, &worker_cancel).await {
                Ok(terminal) => {
                    let _ = event_tx.send(terminal).await;
                }
                Err(err) => {
                    error!(chat_id = %chat_id, error = %err, "workflow run failed");
                    events.publish(WorkflowEvent::ErrorOccurred {
                        chat_id,
                        context: "workflow".into(),
                        error_message: err.to_string(),
                        timestamp: Utc::now(),
                    });
                    let message = err.to_string();
                    // Reaches the early future when the tag was still
                    // unresolved; the stream gets its terminal either way.
                    tap.fail(err);
                    let _ = event_tx.send(AnswerEvent::error(message)).await;
                }
            }
        });

        WorkflowHandle::new(tag_rx, event_rx, cancel)
    }

    /// Run to completion and return the drained answer.
    pub async fn run_collected(&self, request: WorkflowRequest) -> Result<CollectedAnswer> {
        self.start(request).collect().await
    }
}

/// Relays node boundaries onto the event bus.
struct BusObserver {
    events: Arc<EventBus>,
    chat_id: String,
}

impl StepObserver for BusObserver {
    fn node_started(&self, node: &str) {
        self.events.publish(WorkflowEvent::NodeStarted {
            chat_id: self.chat_id.clone(),
            node: node.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn node_finished(&self, node: &str, next: &Next) {
        self.events.publish(WorkflowEvent::NodeFinished {
            chat_id: self.chat_id.clone(),
            node: node.to_string(),
            next: next.to_string(),
            timestamp: Utc::now(),
        });
    }
}

/// Execute the graph, then relay the final completion stream.
///
/// Chunks are forwarded as they arrive; the terminal event is returned to
/// the caller so there is exactly one place that enqueues it.
async fn drive(
    graph: Result<CompiledGraph<WorkflowState>>,
    state: WorkflowState,
    reasoner: Arc<dyn Reasoner>,
    events_tx: &mpsc::Sender<AnswerEvent>,
    cancel: &CancellationToken,
) -> Result<AnswerEvent> {
    let graph = graph?;
    let state = graph.invoke(state, cancel).await?;
    let prompt = state
        .final_prompt
        .as_ref()
        .ok_or(Error::Workflow(WorkflowError::MissingFinalPrompt))?;

    let mut chunks = reasoner.stream(prompt).await.map_err(Error::from)?;
    while let Some(chunk) = chunks.recv().await {
        if cancel.is_cancelled() {
            return Err(WorkflowError::Cancelled.into());
        }
        let chunk = chunk?;
        if chunk.done {
            break;
        }
        if chunk.content.is_empty() {
            continue;
        }
        if events_tx
            .send(AnswerEvent::chunk(chunk.content))
            .await
            .is_err()
        {
            // Consumer dropped the handle; stop producing.
            return Err(WorkflowError::Cancelled.into());
        }
    }

    Ok(AnswerEvent::Complete {
        tag: state.tag.unwrap_or(Tag::General),
        iterations: state.loop_count,
        tool_calls: state.turns.tool_call_count() as u32,
    })
}
