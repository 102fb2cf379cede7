//! # Windlass Core
//!
//! Domain types, traits, and error definitions for the windlass reasoning
//! workflow engine. Every capability the workflow consumes is a trait in
//! this crate; the implementations live in the outer crates, which all
//! depend inward on this one.
//!
//! The two seams are [`Reasoner`] (the model call boundary) and [`Tool`]
//! (the invocation contract), plus the conversation, payload, and event
//! types they exchange.

pub mod error;
pub mod event;
pub mod message;
pub mod payload;
pub mod reasoner;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{
    CapabilityError, ConversationError, Error, Result, ToolError, ValidationError, WorkflowError,
};
pub use event::{EventBus, WorkflowEvent};
pub use message::{ChatHistory, ChatMessage, Role};
pub use payload::{ChatId, Mode, Profile, Tag, WorkflowRequest};
pub use reasoner::{Reasoner, StreamChunk};
pub use tool::{ArgKind, ArgSpec, Tool, ToolOutcome, ToolRegistry, ToolRequest, ToolSchema};
