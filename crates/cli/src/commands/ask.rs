//! `windlass ask`: run one workflow request from the terminal.
//!
//! Streams the answer to stdout as it is produced; the resolved business
//! area and the run statistics go to stderr so piped output stays clean.

use std::io::Write;
use std::sync::Arc;

use windlass_config::AppConfig;
use windlass_core::message::ChatHistory;
use windlass_core::payload::{Mode, Tag, WorkflowRequest};
use windlass_workflow::{AnswerEvent, RunnerSettings, WorkflowRunner};

pub async fn run(
    question: String,
    tag: Option<String>,
    mode: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let mode = Mode::parse(&mode).ok_or_else(|| format!("Unknown mode '{mode}'"))?;
    let tag = match tag.as_deref() {
        Some(raw) => Some(Tag::parse(raw).ok_or_else(|| format!("Unknown tag '{raw}'"))?),
        None => None,
    };

    let reasoner = windlass_providers::build_from_config(&config);
    let registry = Arc::new(windlass_tools::default_registry(&config.tools));
    let runner = WorkflowRunner::new(reasoner, registry).with_settings(RunnerSettings {
        max_iterations: config.workflow.max_iterations,
        thinking_iterations: config.workflow.thinking_iterations,
        step_budget: config.workflow.step_budget,
    });

    let mut messages = ChatHistory::new();
    messages.push_user(question)?;
    let mut request = WorkflowRequest::new(messages, mode);
    request.tag = tag;

    let mut handle = runner.start(request);

    // Resolved before the answer starts; lets the user see the routing
    // while the model is still working.
    let resolved = handle.early_tag().await?;
    eprintln!("  [{resolved}]");

    let mut stdout = std::io::stdout();
    while let Some(event) = handle.next_event().await {
        match event {
            AnswerEvent::Chunk { content } => {
                print!("{content}");
                stdout.flush()?;
            }
            AnswerEvent::Error { message } => {
                println!();
                return Err(message.into());
            }
            AnswerEvent::Complete {
                iterations,
                tool_calls,
                ..
            } => {
                println!();
                if iterations > 0 {
                    eprintln!("  ({iterations} iteration(s), {tool_calls} tool call(s))");
                }
            }
        }
    }

    Ok(())
}
