//! Conversation messages.
//!
//! The history is an ordered `Vec<Message>` in the shape used by
//! OpenAI-compatible chat endpoints: four roles, assistant messages that may
//! carry tool calls, and tool messages that answer one call by id.
//!
//! # Examples
//!
//! ```
//! use trace_agent::types::{Message, Role, ToolCall};
//!
//! let call = ToolCall::new("call_1", "read_file", r#"{"path":"main.go"}"#);
//! let history = vec![
//!     Message::user("what is in main.go?"),
//!     Message::assistant_with_calls("", vec![call]),
//!     Message::tool_result("call_1", "package main"),
//! ];
//! assert_eq!(history[2].role, Role::Tool);
//! assert!(trace_agent::types::message::unlinked_tool_results(&history).is_empty());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Participant role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the session.
    System,
    /// The human at the keyboard.
    User,
    /// The model.
    Assistant,
    /// The result of a tool call.
    Tool,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        };
        f.write_str(name)
    }
}

/// A tool invocation requested by the model.
///
/// `arguments` is kept as the raw JSON text the endpoint sent; tools parse it
/// themselves so that a malformed payload becomes a tool error instead of a
/// decode failure of the whole response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// One entry of the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Calls requested by the model. Only ever non-empty on assistant messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// The call this message answers. Only set on tool messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Creates an assistant message that requests tool calls.
    #[must_use]
    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::plain(Role::Assistant, content)
        }
    }

    /// Creates a tool message answering `tool_call_id`.
    #[must_use]
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::plain(Role::Tool, content)
        }
    }

    /// Returns true for assistant messages that carry calls but no text.
    #[must_use]
    pub fn is_tool_call_only(&self) -> bool {
        self.role == Role::Assistant && self.content.is_empty() && !self.tool_calls.is_empty()
    }
}

/// Returns the ids of tool messages that do not answer a call of the nearest
/// preceding assistant message.
///
/// An empty result means the history satisfies the linking invariant.
#[must_use]
pub fn unlinked_tool_results(history: &[Message]) -> Vec<&str> {
    let mut open_calls: &[ToolCall] = &[];
    let mut unlinked = Vec::new();

    for message in history {
        match message.role {
            Role::Assistant => open_calls = &message.tool_calls,
            Role::Tool => {
                let id = message.tool_call_id.as_deref().unwrap_or_default();
                if !open_calls.iter().any(|call| call.id == id) {
                    unlinked.push(id);
                }
            }
            Role::System | Role::User => {}
        }
    }

    unlinked
}
