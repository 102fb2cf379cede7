//! Request payload types: mode, tag, caller profile.
//!
//! These are the value objects the gateway deserializes and the workflow
//! consumes. Mode and tag use lowercase wire names to match the client
//! protocol.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::message::ChatHistory;

/// Unique identifier for a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub String);

impl ChatId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ChatId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the workflow should treat an incoming request.
///
/// `Auto` must be resolved to a concrete mode by the mode-decision node
/// before any pipeline branch runs; downstream nodes assume it never leaks
/// past that point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Answer directly from the conversation, no research loop
    Fast,
    /// Research loop with a reduced iteration allowance
    Thinking,
    /// Full research loop
    Research,
    /// Let the workflow pick between fast and thinking
    #[default]
    Auto,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Fast => "fast",
            Mode::Thinking => "thinking",
            Mode::Research => "research",
            Mode::Auto => "auto",
        }
    }

    /// True for the modes that run the research cycle.
    pub fn is_research(&self) -> bool {
        matches!(self, Mode::Thinking | Mode::Research)
    }

    pub fn parse(s: &str) -> Option<Mode> {
        match s.to_ascii_lowercase().as_str() {
            "fast" => Some(Mode::Fast),
            "thinking" => Some(Mode::Thinking),
            "research" => Some(Mode::Research),
            "auto" => Some(Mode::Auto),
            _ => None,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain routing classification for a conversation.
///
/// Requests may arrive untagged; the workflow classifies them and reports
/// the resolved tag as the early result of the streaming handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    General,
    Finance,
    Law,
    Marketing,
    Management,
}

impl Tag {
    pub const ALL: [Tag; 5] = [
        Tag::General,
        Tag::Finance,
        Tag::Law,
        Tag::Marketing,
        Tag::Management,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::General => "general",
            Tag::Finance => "finance",
            Tag::Law => "law",
            Tag::Marketing => "marketing",
            Tag::Management => "management",
        }
    }

    pub fn parse(s: &str) -> Option<Tag> {
        match s.to_ascii_lowercase().as_str() {
            "general" => Some(Tag::General),
            "finance" => Some(Tag::Finance),
            "law" => Some(Tag::Law),
            "marketing" => Some(Tag::Marketing),
            "management" => Some(Tag::Management),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller persona attached to a request.
///
/// Everything here is optional free text; prompt building decides which
/// sections are worth rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub login: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    /// Free-form description of who the user is
    #[serde(default)]
    pub user_info: Option<String>,

    /// Free-form description of the user's business context
    #[serde(default)]
    pub business_info: Option<String>,

    /// Extra standing instructions the user configured
    #[serde(default)]
    pub additional_instructions: Option<String>,
}

impl Profile {
    /// Best display name available, if any.
    pub fn display_name(&self) -> Option<&str> {
        self.username
            .as_deref()
            .or(self.login.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// An incoming workflow request: conversation plus routing hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRequest {
    pub messages: ChatHistory,

    #[serde(default)]
    pub chat_id: ChatId,

    /// Clients send `""` for "not classified yet"; that normalizes to `None`.
    #[serde(default, deserialize_with = "empty_tag_as_none")]
    pub tag: Option<Tag>,

    #[serde(default)]
    pub mode: Mode,

    /// Caller-supplied system prompt override
    #[serde(default)]
    pub system: Option<String>,

    /// Attachment to make available to the fetch tool
    #[serde(default)]
    pub file_url: Option<String>,

    /// Voice transcripts skip the research pipeline
    #[serde(default)]
    pub is_voice: bool,

    #[serde(default)]
    pub profile: Profile,
}

impl WorkflowRequest {
    pub fn new(messages: ChatHistory, mode: Mode) -> Self {
        Self {
            messages,
            chat_id: ChatId::new(),
            tag: None,
            mode,
            system: None,
            file_url: None,
            is_voice: false,
            profile: Profile::default(),
        }
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_chat_id(mut self, chat_id: ChatId) -> Self {
        self.chat_id = chat_id;
        self
    }
}

fn empty_tag_as_none<'de, D>(deserializer: D) -> Result<Option<Tag>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => Tag::parse(s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown tag: {s}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_wire_names_are_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Fast).unwrap(), "\"fast\"");
        let mode: Mode = serde_json::from_str("\"research\"").unwrap();
        assert_eq!(mode, Mode::Research);
    }

    #[test]
    fn mode_parse_accepts_any_case() {
        assert_eq!(Mode::parse("Thinking"), Some(Mode::Thinking));
        assert_eq!(Mode::parse("AUTO"), Some(Mode::Auto));
        assert_eq!(Mode::parse("turbo"), None);
    }

    #[test]
    fn empty_tag_normalizes_to_none() {
        let payload: WorkflowRequest = serde_json::from_str(
            r#"{"messages":[{"role":"user","content":"hi"}],"tag":""}"#,
        )
        .unwrap();
        assert_eq!(payload.tag, None);
        assert_eq!(payload.mode, Mode::Auto);
        assert!(!payload.is_voice);
    }

    #[test]
    fn known_tag_parses() {
        let payload: WorkflowRequest = serde_json::from_str(
            r#"{"messages":[{"role":"user","content":"hi"}],"tag":"finance","mode":"fast"}"#,
        )
        .unwrap();
        assert_eq!(payload.tag, Some(Tag::Finance));
        assert_eq!(payload.mode, Mode::Fast);
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let payload: Result<WorkflowRequest, _> = serde_json::from_str(
            r#"{"messages":[{"role":"user","content":"hi"}],"tag":"astrology"}"#,
        );
        assert!(payload.is_err());
    }

    #[test]
    fn profile_display_name_prefers_username() {
        let profile = Profile {
            login: Some("acme-ops".into()),
            username: Some("Dana".into()),
            ..Profile::default()
        };
        assert_eq!(profile.display_name(), Some("Dana"));

        let profile = Profile {
            login: Some("acme-ops".into()),
            ..Profile::default()
        };
        assert_eq!(profile.display_name(), Some("acme-ops"));
    }
}
