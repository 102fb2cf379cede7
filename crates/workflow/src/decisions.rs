//! Structured decisions returned by the reasoning model.
//!
//! Every decision point in the graph asks for a closed JSON object and
//! decodes it strictly. A payload that does not match its schema is a hard
//! failure carried as [`CapabilityError::Decode`]; there is no free-text
//! fallback parsing anywhere in the workflow.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use windlass_core::error::{CapabilityError, ValidationError};
use windlass_core::message::ChatHistory;
use windlass_core::payload::{Mode, Tag};
use windlass_core::reasoner::Reasoner;
use windlass_core::tool::ToolRequest;

/// A decision type the model can be asked for: a deserialize target plus
/// the JSON schema sent along with the request.
pub trait Decision: DeserializeOwned + JsonSchema {
    fn schema() -> serde_json::Value {
        serde_json::to_value(schemars::schema_for!(Self)).unwrap_or_default()
    }
}

/// Ask the reasoner for a structured decision and decode it.
///
/// Decode failures surface the serde reason together with a truncated copy
/// of the offending payload.
pub async fn decide<T: Decision>(
    reasoner: &dyn Reasoner,
    prompt: &ChatHistory,
) -> Result<T, CapabilityError> {
    let schema = T::schema();
    let raw = reasoner.call_structured(prompt, &schema).await?;
    serde_json::from_value(raw.clone()).map_err(|err| CapabilityError::Decode {
        reason: err.to_string(),
        payload: preview(&raw),
    })
}

/// First 200 characters of the payload, enough to debug without logging
/// entire completions.
fn preview(value: &serde_json::Value) -> String {
    let text = value.to_string();
    if text.len() <= 200 {
        return text;
    }
    let mut end = 200;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

// --- Tag classification ---

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChosenTag {
    General,
    Finance,
    Law,
    Marketing,
    Management,
}

impl From<ChosenTag> for Tag {
    fn from(value: ChosenTag) -> Self {
        match value {
            ChosenTag::General => Tag::General,
            ChosenTag::Finance => Tag::Finance,
            ChosenTag::Law => Tag::Law,
            ChosenTag::Marketing => Tag::Marketing,
            ChosenTag::Management => Tag::Management,
        }
    }
}

/// Business-area classification of the conversation.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TagChoice {
    pub tag: ChosenTag,
}

impl Decision for TagChoice {}

// --- Mode classification ---

#[derive(Debug, Clone, Copy, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChosenMode {
    Fast,
    Thinking,
}

impl From<ChosenMode> for Mode {
    fn from(value: ChosenMode) -> Self {
        match value {
            ChosenMode::Fast => Mode::Fast,
            ChosenMode::Thinking => Mode::Thinking,
        }
    }
}

/// Fast-versus-thinking routing decision.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ModeChoice {
    pub mode: ChosenMode,
}

impl Decision for ModeChoice {}

// --- Research directive ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveAction {
    CallTool,
    Finalize,
}

/// One step of the research loop: either invoke a tool or stop researching.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Directive {
    /// Short reasoning for this step, recorded in the turn history.
    pub thought: String,
    pub action: DirectiveAction,
    /// Required when action is `call_tool`.
    #[serde(default)]
    pub tool_name: Option<String>,
    /// String-valued arguments for the tool.
    #[serde(default)]
    pub tool_args: Option<BTreeMap<String, String>>,
}

impl Decision for Directive {}

impl Directive {
    /// Convert a `call_tool` directive into a tool request.
    ///
    /// A call directive without a usable tool name is malformed, not a
    /// silent no-op.
    pub fn into_request(self) -> Result<ToolRequest, ValidationError> {
        let name = match self.tool_name.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                return Err(ValidationError::MalformedDirective(
                    "call_tool directive did not name a tool".to_string(),
                ));
            }
        };
        let mut request = ToolRequest::new(&name, &self.thought);
        if let Some(args) = self.tool_args {
            for (key, value) in args {
                request = request.with_arg(key, value);
            }
        }
        Ok(request)
    }
}

// --- Sufficiency verdict ---

/// Whether the gathered material is enough to answer.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Verdict {
    pub needs_more_research: bool,
    /// One sentence on what is missing or why the material suffices.
    pub rationale: String,
}

impl Decision for Verdict {}
