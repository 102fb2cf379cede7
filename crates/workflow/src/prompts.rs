//! Prompt assembly for every decision point and for final synthesis.
//!
//! All builders are pure functions of workflow state. The synthesis prompt
//! carries the evidence block with stable `[n]` citation numbers; the exact
//! wording is free to evolve as long as the cited numbering stays aligned
//! with the evidence pool order.

use windlass_core::error::ConversationError;
use windlass_core::message::ChatHistory;
use windlass_core::payload::{Profile, Tag};

use crate::state::WorkflowState;
use crate::trace::{Evidence, EvidencePool, TurnHistory};

// --- Persona ---

/// System prompt describing who the assistant is for this caller.
///
/// A caller-supplied override wins outright; otherwise the persona is built
/// from the profile and the resolved business area.
pub fn persona(profile: &Profile, tag: Option<Tag>, override_text: Option<&str>) -> String {
    if let Some(text) = override_text {
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut sections = vec![
        "You are Windlass, a pragmatic assistant for small-business owners. \
         Answer concretely, cite gathered material by its [n] number when you \
         rely on it, and say so when you are unsure."
            .to_string(),
    ];

    if let Some(tag) = tag {
        sections.push(format!(
            "The conversation concerns the {} area; weight your advice accordingly.",
            tag.as_str()
        ));
    }
    if let Some(name) = profile.display_name() {
        sections.push(format!("Address the user as {name}."));
    }
    if let Some(info) = non_empty(&profile.user_info) {
        sections.push(format!("About the user: {info}"));
    }
    if let Some(info) = non_empty(&profile.business_info) {
        sections.push(format!("Their business: {info}"));
    }
    if let Some(extra) = non_empty(&profile.additional_instructions) {
        sections.push(format!("Standing instructions from the user: {extra}"));
    }

    sections.join("\n\n")
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

// --- Classification prompts ---

/// Prompt asking for the business-area tag of the conversation.
pub fn tag_prompt(chat: &ChatHistory) -> Result<ChatHistory, ConversationError> {
    let areas = Tag::ALL
        .iter()
        .map(Tag::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let mut prompt = ChatHistory::new();
    prompt.set_system(format!(
        "Classify the conversation into exactly one business area: {areas}. \
         Pick general when nothing fits clearly."
    ));
    prompt.push_user(format!("Conversation so far:\n{}", chat.transcript()))?;
    Ok(prompt)
}

/// Prompt asking whether the request needs research or a direct answer.
pub fn mode_prompt(chat: &ChatHistory) -> Result<ChatHistory, ConversationError> {
    let mut prompt = ChatHistory::new();
    prompt.set_system(
        "Decide how to handle the user's latest request. Answer with mode \
         \"fast\" when the conversation already contains what is needed for a \
         good reply, and \"thinking\" when fresh material, a document, or \
         multi-step research would clearly improve it.",
    );
    prompt.push_user(format!("Conversation so far:\n{}", chat.transcript()))?;
    Ok(prompt)
}

// --- Research loop prompts ---

/// Prompt for the next research directive.
pub fn reason_prompt(
    state: &WorkflowState,
    tools: &[serde_json::Value],
) -> Result<ChatHistory, ConversationError> {
    let catalog = serde_json::to_string_pretty(tools).unwrap_or_default();
    let mut system = format!(
        "You are running a research loop on behalf of the user. Decide the \
         single next step: call one tool to gather material, or finalize when \
         you have enough to answer well.\n\nAvailable tools:\n{catalog}"
    );
    system.push_str(&format!(
        "\n\nIterations used: {} of {}.",
        state.loop_count, state.max_iterations
    ));
    if !state.turns.is_empty() {
        system.push_str(&format!("\n\n{}", turn_notes(&state.turns)));
    }
    if !state.evidence.is_empty() {
        system.push_str(&format!(
            "\n\nMaterial gathered so far ({} items):\n{}",
            state.evidence.len(),
            evidence_lines(&state.evidence)
        ));
    }

    let mut user = format!("Conversation so far:\n{}", state.chat.transcript());
    if let Some(url) = &state.file_url {
        user.push_str(&format!(
            "\n\nThe user attached a file at {url}; the fetch_file tool can read it."
        ));
    }

    let mut prompt = ChatHistory::new();
    prompt.set_system(system);
    prompt.push_user(user)?;
    Ok(prompt)
}

/// Prompt asking whether the gathered material suffices.
pub fn analyze_prompt(state: &WorkflowState) -> Result<ChatHistory, ConversationError> {
    let mut system = String::from(
        "Judge whether the material gathered so far is enough to answer the \
         user's request well. Be strict about gaps, but do not ask for more \
         research when the remaining questions are matters of judgement.",
    );
    system.push_str(&format!(
        "\n\n{}\n\nMaterial gathered ({} items):\n{}",
        turn_notes(&state.turns),
        state.evidence.len(),
        if state.evidence.is_empty() {
            "(none)".to_string()
        } else {
            evidence_lines(&state.evidence)
        }
    ));

    let mut prompt = ChatHistory::new();
    prompt.set_system(system);
    prompt.push_user(format!(
        "Conversation so far:\n{}",
        state.chat.transcript()
    ))?;
    Ok(prompt)
}

// --- Terminal prompts ---

/// Completion input for the fast path: persona plus the conversation as-is.
pub fn fast_prompt(state: &WorkflowState) -> ChatHistory {
    let mut persona_text = persona(
        &state.profile,
        state.tag,
        state.system_override.as_deref(),
    );
    if state.is_voice {
        persona_text.push_str(
            "\n\nThis reply will be spoken aloud. Keep it short and plainly \
             worded, with no markup or lists.",
        );
    }
    let mut prompt = state.chat.clone();
    prompt.set_system(persona_text);
    prompt
}

/// Completion input for the research path: persona, evidence block, and the
/// conversation.
pub fn synthesis_prompt(state: &WorkflowState) -> ChatHistory {
    let mut system = persona(
        &state.profile,
        state.tag,
        state.system_override.as_deref(),
    );
    system.push_str("\n\n");
    system.push_str(&research_block(&state.evidence, &state.turns));
    if let Some(note) = state.stop_reason.as_ref().and_then(|r| r.describe()) {
        system.push_str(&format!("\n\nNote: {note}"));
    }

    let mut prompt = state.chat.clone();
    prompt.set_system(system);
    prompt
}

// --- Evidence rendering ---

/// The research section of the synthesis prompt.
///
/// Citation numbers follow evidence pool order, so `[1]` always refers to
/// the first item gathered. An empty pool renders an explicit statement
/// instead of silently omitting the section.
pub fn research_block(evidence: &EvidencePool, turns: &TurnHistory) -> String {
    if evidence.is_empty() {
        return "No research material was gathered for this request. State that \
                plainly if the user asked for researched facts, and answer from \
                general knowledge."
            .to_string();
    }
    let mut block = format!(
        "Research material, cite by number when used:\n{}",
        evidence_lines(evidence)
    );
    if !turns.is_empty() {
        block.push_str(&format!("\n\n{}", turn_notes(turns)));
    }
    block
}

fn evidence_lines(evidence: &EvidencePool) -> String {
    evidence
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| format!("[{}] {}", i + 1, evidence_line(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn evidence_line(item: &Evidence) -> String {
    match source_hint(&item.source) {
        Some(hint) => format!("[{}] {} (source: {hint})", item.tool_name, item.summary),
        None => format!("[{}] {}", item.tool_name, item.summary),
    }
}

fn source_hint(source: &serde_json::Value) -> Option<&str> {
    for key in ["url", "file_url", "file_name", "path"] {
        if let Some(hint) = source.get(key).and_then(|v| v.as_str()) {
            if !hint.is_empty() {
                return Some(hint);
            }
        }
    }
    None
}

fn turn_notes(turns: &TurnHistory) -> String {
    let lines = turns
        .iter()
        .enumerate()
        .map(|(i, turn)| {
            let outcome = match (&turn.request, &turn.observation) {
                (Some(req), Some(obs)) if obs.success => {
                    format!("{}: ok", req.tool_name)
                }
                (Some(req), Some(obs)) => format!(
                    "{}: failed, {}",
                    req.tool_name,
                    obs.error.as_deref().unwrap_or("no detail")
                ),
                (Some(req), None) => format!("{}: pending", req.tool_name),
                (None, _) => "no tool".to_string(),
            };
            format!("{}. {} ({outcome})", i + 1, turn.reasoning_summary)
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("Steps taken:\n{lines}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use windlass_core::tool::ToolOutcome;

    #[test]
    fn persona_override_wins() {
        let profile = Profile {
            username: Some("Dana".into()),
            ..Profile::default()
        };
        let text = persona(&profile, Some(Tag::Finance), Some("You are a pirate."));
        assert_eq!(text, "You are a pirate.");

        let text = persona(&profile, Some(Tag::Finance), Some("   "));
        assert!(text.contains("Dana"));
        assert!(text.contains("finance"));
    }

    #[test]
    fn citation_numbers_follow_pool_order() {
        let mut pool = EvidencePool::new();
        pool.push(Evidence::new(
            "web_search",
            "VAT registration threshold is 90k",
            json!({"url": "https://example.com/vat"}),
        ));
        pool.push(Evidence::new(
            "fetch_file",
            "Contract clause 4 covers termination",
            json!({"file_url": "https://example.com/contract.txt"}),
        ));

        let block = research_block(&pool, &TurnHistory::new());
        let first = block.find("[1] [web_search] VAT registration").unwrap();
        let second = block.find("[2] [fetch_file] Contract clause 4").unwrap();
        assert!(first < second);
        assert!(block.contains("https://example.com/vat"));
    }

    #[test]
    fn empty_pool_states_the_absence() {
        let block = research_block(&EvidencePool::new(), &TurnHistory::new());
        assert!(block.contains("No research material"));
    }

    #[test]
    fn turn_notes_show_failures() {
        let mut turns = TurnHistory::new();
        turns.open(
            "check the filing deadline",
            Some(windlass_core::tool::ToolRequest::new("web_search", "deadline")),
        );
        turns.attach_observation(ToolOutcome::failed("network unreachable"));

        let notes = turn_notes(&turns);
        assert!(notes.contains("web_search: failed"));
        assert!(notes.contains("network unreachable"));
    }

    #[test]
    fn voice_fast_prompt_adds_spoken_guidance() {
        let mut chat = ChatHistory::new();
        chat.push_user("What is my VAT rate?").unwrap();
        let request = windlass_core::payload::WorkflowRequest::new(
            chat,
            windlass_core::payload::Mode::Fast,
        );
        let mut state = crate::state::WorkflowState::from_request(request, 4);
        state.is_voice = true;

        let prompt = fast_prompt(&state);
        assert!(prompt.system_text().unwrap().contains("spoken aloud"));
    }
}
