//! Error types for the windlass domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all windlass operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Conversation errors ---
    #[error("Conversation error: {0}")]
    Conversation(#[from] ConversationError),

    // --- Validation errors ---
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    // --- Reasoning capability errors ---
    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Workflow errors ---
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Violations of the conversation shape invariants.
///
/// These are construction-time failures: the history is left unchanged and
/// the caller gets the offending role back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversationError {
    #[error("Consecutive {role} messages are not allowed")]
    ConsecutiveRole { role: String },

    #[error("Conversation already contains a system message")]
    DuplicateSystem,

    #[error("System message must be the first message")]
    SystemNotFirst,
}

/// Rejections of malformed workflow inputs.
///
/// Always fatal to the current node and never silently defaulted; every
/// variant names the offending field or value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool {tool_name} is missing required argument '{field}'")]
    MissingArgument { tool_name: String, field: String },

    #[error("Tool {tool_name} received an empty value for required argument '{field}'")]
    EmptyArgument { tool_name: String, field: String },

    #[error("Tool {tool_name} does not accept argument '{field}'")]
    UnexpectedArgument { tool_name: String, field: String },

    #[error("Malformed reasoning directive: {0}")]
    MalformedDirective(String),

    #[error("Invalid mode classification: {0}")]
    InvalidMode(String),

    #[error("Invalid tag classification: {0}")]
    InvalidTag(String),
}

/// Failures at the reasoning capability boundary.
#[derive(Debug, Clone, Error)]
pub enum CapabilityError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Capability not ready: {0}")]
    NotReady(String),

    #[error("Completion was empty where content was required")]
    EmptyCompletion,

    #[error("Structured response did not match the expected schema: {reason} (payload: {payload})")]
    Decode { reason: String, payload: String },

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures raised from inside a tool body.
///
/// Expected failure modes (timeouts, empty results) come back as an
/// unsuccessful `ToolOutcome` instead; these variants are the
/// programming-error path the tool-call node catches.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Tool execution failed in {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}

/// Failures of the graph machinery itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Graph references unknown node: {0}")]
    UnknownNode(String),

    #[error("Graph has no entry node")]
    MissingEntry,

    #[error("Graph exceeded its step budget of {0} node executions")]
    StepBudgetExceeded(u32),

    #[error("Workflow was cancelled")]
    Cancelled,

    #[error("Terminal node finished without producing a final prompt")]
    MissingFinalPrompt,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_names_offending_field() {
        let err = Error::Validation(ValidationError::MissingArgument {
            tool_name: "fetch".into(),
            field: "url".into(),
        });
        assert!(err.to_string().contains("fetch"));
        assert!(err.to_string().contains("url"));
    }

    #[test]
    fn decode_error_carries_payload() {
        let err = Error::Capability(CapabilityError::Decode {
            reason: "missing field `mode`".into(),
            payload: "{\"mod\":\"fast\"}".into(),
        });
        assert!(err.to_string().contains("missing field"));
        assert!(err.to_string().contains("mod"));
    }

    #[test]
    fn workflow_error_displays_node_name() {
        let err = Error::Workflow(WorkflowError::UnknownNode("observe".into()));
        assert!(err.to_string().contains("observe"));
    }
}
