//! Directed workflow graph: nodes, routing decisions, and the dispatch loop.
//!
//! A [`StateGraph`] is assembled from named nodes and a declared traversal
//! order, then [`compile`](StateGraph::compile)d into an immutable
//! [`CompiledGraph`] that can be invoked many times. Nodes own the domain
//! logic; the graph owns sequencing, the step budget, and cancellation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use windlass_core::error::{Error, Result, WorkflowError};

// --- Routing ---

/// Where execution goes after a node finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    /// Proceed to the node that follows the current one in declaration order.
    Continue,
    /// Jump to a named node.
    Goto(String),
    /// Stop traversal and return the state as-is.
    End,
}

impl Next {
    pub fn goto(id: impl Into<String>) -> Self {
        Next::Goto(id.into())
    }
}

impl std::fmt::Display for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Next::Continue => f.write_str("continue"),
            Next::Goto(target) => write!(f, "goto {target}"),
            Next::End => f.write_str("end"),
        }
    }
}

// --- Node contract ---

/// A single unit of work in the workflow.
///
/// Nodes receive the state by value, transform it, and hand it back together
/// with a routing decision. Capabilities (reasoner, tool registry, event bus)
/// are captured by the node at construction time, not threaded through state.
#[async_trait]
pub trait Node<S>: Send + Sync {
    /// Stable identifier used for wiring and routing.
    fn id(&self) -> &str;

    /// Run the node against the current state.
    async fn run(&self, state: S) -> Result<(S, Next)>;
}

/// Observes node execution boundaries during an invocation.
///
/// Both methods default to no-ops so implementors can watch only the side
/// they care about. Observers must be cheap; they run inline on the
/// dispatch loop.
pub trait StepObserver: Send + Sync {
    fn node_started(&self, _node: &str) {}

    fn node_finished(&self, _node: &str, _next: &Next) {}
}

// --- Graph builder ---

/// Mutable builder for a workflow graph.
pub struct StateGraph<S> {
    nodes: HashMap<String, Box<dyn Node<S>>>,
    order: Vec<String>,
    step_budget: u32,
    observer: Option<Arc<dyn StepObserver>>,
}

impl<S> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            step_budget: 64,
            observer: None,
        }
    }

    /// Cap on node executions per invocation. Guards against wiring mistakes
    /// that would otherwise loop forever.
    pub fn with_step_budget(mut self, budget: u32) -> Self {
        self.step_budget = budget;
        self
    }

    /// Attach a step observer, notified around every node execution.
    pub fn with_observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Register a node and append it to the traversal order.
    ///
    /// Declaration order defines what [`Next::Continue`] means: the node
    /// after the current one in the order it was added.
    pub fn add_node(mut self, node: Box<dyn Node<S>>) -> Self {
        let id = node.id().to_string();
        self.order.push(id.clone());
        self.nodes.insert(id, node);
        self
    }

    /// Validate the wiring and freeze the graph.
    pub fn compile(self) -> Result<CompiledGraph<S>> {
        let first = self
            .order
            .first()
            .cloned()
            .ok_or(Error::Workflow(WorkflowError::MissingEntry))?;
        for id in &self.order {
            if !self.nodes.contains_key(id) {
                return Err(WorkflowError::UnknownNode(id.clone()).into());
            }
        }
        Ok(CompiledGraph {
            nodes: self.nodes,
            order: self.order,
            entry: first,
            step_budget: self.step_budget,
            observer: self.observer,
        })
    }
}

// --- Compiled graph ---

/// Immutable, invokable workflow graph.
pub struct CompiledGraph<S> {
    nodes: HashMap<String, Box<dyn Node<S>>>,
    order: Vec<String>,
    entry: String,
    step_budget: u32,
    observer: Option<Arc<dyn StepObserver>>,
}

impl<S: Send + 'static> CompiledGraph<S> {
    /// Drive the graph from its entry node until a node returns [`Next::End`].
    ///
    /// Cancellation is checked between nodes; a cancelled token stops the
    /// traversal with [`WorkflowError::Cancelled`] before the next node runs.
    pub async fn invoke(&self, state: S, cancel: &CancellationToken) -> Result<S> {
        let mut state = state;
        let mut position = self.position_of(&self.entry)?;
        let mut steps = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(WorkflowError::Cancelled.into());
            }
            steps += 1;
            if steps > self.step_budget {
                return Err(WorkflowError::StepBudgetExceeded(self.step_budget).into());
            }

            let id = &self.order[position];
            let node = self
                .nodes
                .get(id)
                .ok_or_else(|| WorkflowError::UnknownNode(id.clone()))?;
            debug!(node = %id, step = steps, "running workflow node");
            if let Some(observer) = &self.observer {
                observer.node_started(id);
            }

            let (next_state, next) = node.run(state).await?;
            state = next_state;
            if let Some(observer) = &self.observer {
                observer.node_finished(id, &next);
            }

            match next {
                Next::Continue => {
                    position += 1;
                    if position >= self.order.len() {
                        return Ok(state);
                    }
                }
                Next::Goto(target) => {
                    position = self.position_of(&target)?;
                }
                Next::End => return Ok(state),
            }
        }
    }

    fn position_of(&self, id: &str) -> Result<usize> {
        self.order
            .iter()
            .position(|n| n == id)
            .ok_or_else(|| WorkflowError::UnknownNode(id.to_string()).into())
    }
}
