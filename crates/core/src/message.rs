//! Conversation domain types.
//!
//! A [`ChatHistory`] is the ordered message sequence threaded through the
//! whole workflow: the gateway deserializes one from the request payload,
//! every graph node reads or extends it, and the final-answer prompt is
//! itself a `ChatHistory` handed to the reasoning capability.
//!
//! Shape invariants (enforced at construction time, never patched up):
//! - at most one system message, and it sits at index 0;
//! - user and assistant messages strictly alternate.

use serde::{Deserialize, Serialize};

use crate::error::ConversationError;

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions (persona, rules)
    System,
    /// The end user
    User,
    /// The reasoning model
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// Optional client-side message identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            id: None,
        }
    }
}

/// An ordered conversation upholding the role-alternation invariant.
///
/// Deserializing a `ChatHistory` runs the same validation as the mutators,
/// so a malformed wire payload is rejected before any node sees it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ChatMessage>", into = "Vec<ChatMessage>")]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and adopt an existing message sequence.
    pub fn try_from_messages(messages: Vec<ChatMessage>) -> Result<Self, ConversationError> {
        validate_sequence(&messages)?;
        Ok(Self { messages })
    }

    /// Replace the system message, or prepend one if none exists.
    ///
    /// This is the only way a system message enters a history, which keeps
    /// the at-most-one invariant trivially true.
    pub fn set_system(&mut self, content: impl Into<String>) {
        self.messages.retain(|m| m.role != Role::System);
        self.messages.insert(0, ChatMessage::system(content));
    }

    /// Append a user message; fails if it would follow another user message.
    pub fn push_user(&mut self, content: impl Into<String>) -> Result<(), ConversationError> {
        self.push_alternating(ChatMessage::user(content))
    }

    /// Append an assistant message; fails if it would follow another
    /// assistant message.
    pub fn push_assistant(&mut self, content: impl Into<String>) -> Result<(), ConversationError> {
        self.push_alternating(ChatMessage::assistant(content))
    }

    fn push_alternating(&mut self, message: ChatMessage) -> Result<(), ConversationError> {
        if let Some(last) = self.messages.last() {
            if last.role == message.role {
                return Err(ConversationError::ConsecutiveRole {
                    role: message.role.to_string(),
                });
            }
        }
        self.messages.push(message);
        Ok(())
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ChatMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Content of the system message, if one is present.
    pub fn system_text(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }

    /// Content of the most recent user message.
    pub fn last_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Render the conversation as role-prefixed plain text.
    ///
    /// Used when a whole dialogue must be embedded inside a single prompt
    /// message (classification calls) and in trace logging.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for message in &self.messages {
            out.push_str(message.role.as_str());
            out.push_str(": ");
            out.push_str(&message.content);
            out.push('\n');
        }
        out
    }
}

impl TryFrom<Vec<ChatMessage>> for ChatHistory {
    type Error = ConversationError;

    fn try_from(messages: Vec<ChatMessage>) -> Result<Self, Self::Error> {
        Self::try_from_messages(messages)
    }
}

impl From<ChatHistory> for Vec<ChatMessage> {
    fn from(history: ChatHistory) -> Self {
        history.messages
    }
}

fn validate_sequence(messages: &[ChatMessage]) -> Result<(), ConversationError> {
    let mut previous: Option<Role> = None;
    for (index, message) in messages.iter().enumerate() {
        if message.role == Role::System {
            if index != 0 {
                // A second system message is also "not first", so report the
                // more specific duplicate error when one already led.
                return if messages[0].role == Role::System {
                    Err(ConversationError::DuplicateSystem)
                } else {
                    Err(ConversationError::SystemNotFirst)
                };
            }
            continue;
        }
        if previous == Some(message.role) {
            return Err(ConversationError::ConsecutiveRole {
                role: message.role.to_string(),
            });
        }
        previous = Some(message.role);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternation_is_enforced_on_push() {
        let mut history = ChatHistory::new();
        history.push_user("hello").unwrap();
        let err = history.push_user("again").unwrap_err();
        assert_eq!(
            err,
            ConversationError::ConsecutiveRole {
                role: "user".into()
            }
        );
        // Failed push leaves the history untouched
        assert_eq!(history.len(), 1);

        history.push_assistant("hi").unwrap();
        assert!(history.push_assistant("hi again").is_err());
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn set_system_replaces_instead_of_duplicating() {
        let mut history = ChatHistory::new();
        history.push_user("question").unwrap();
        history.set_system("persona v1");
        history.set_system("persona v2");

        assert_eq!(history.system_text(), Some("persona v2"));
        assert_eq!(history.len(), 2);
        assert_eq!(history.messages()[0].role, Role::System);
    }

    #[test]
    fn system_insertion_keeps_alternation_valid() {
        let mut history = ChatHistory::new();
        history.set_system("persona");
        history.push_user("question").unwrap();
        history.push_assistant("answer").unwrap();
        history.push_user("follow-up").unwrap();
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn try_from_rejects_consecutive_roles() {
        let err = ChatHistory::try_from_messages(vec![
            ChatMessage::user("one"),
            ChatMessage::user("two"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConversationError::ConsecutiveRole { .. }));
    }

    #[test]
    fn try_from_rejects_misplaced_system() {
        let err = ChatHistory::try_from_messages(vec![
            ChatMessage::user("one"),
            ChatMessage::system("late"),
        ])
        .unwrap_err();
        assert_eq!(err, ConversationError::SystemNotFirst);

        let err = ChatHistory::try_from_messages(vec![
            ChatMessage::system("first"),
            ChatMessage::system("second"),
        ])
        .unwrap_err();
        assert_eq!(err, ConversationError::DuplicateSystem);
    }

    #[test]
    fn wire_deserialization_validates_shape() {
        let good: ChatHistory = serde_json::from_str(
            r#"[{"role":"system","content":"p"},{"role":"user","content":"q"}]"#,
        )
        .unwrap();
        assert_eq!(good.last_user_text(), Some("q"));

        let bad: Result<ChatHistory, _> = serde_json::from_str(
            r#"[{"role":"user","content":"a"},{"role":"user","content":"b"}]"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn transcript_prefixes_roles() {
        let mut history = ChatHistory::new();
        history.set_system("be brief");
        history.push_user("2+2?").unwrap();
        let text = history.transcript();
        assert!(text.starts_with("system: be brief\n"));
        assert!(text.contains("user: 2+2?\n"));
    }
}
