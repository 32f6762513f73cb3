//! Completion endpoint client.
//!
//! [`CompletionClient`] is the seam between the agent loop and the network.
//! [`OpenAiClient`] talks to any OpenAI-compatible `/chat/completions`
//! endpoint; tests substitute scripted clients.

pub mod client;
pub mod tools;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{Message, ToolCall};

pub use client::OpenAiClient;
pub use tools::{default_tools, ToolDefinition};

/// A decoded completion response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub choices: Vec<Choice>,
}

impl Completion {
    /// Builds a single-choice completion. Mostly useful for tests.
    #[must_use]
    pub fn single(message: AssistantReply) -> Self {
        Self {
            choices: vec![Choice {
                message,
                finish_reason: None,
            }],
        }
    }
}

/// One candidate answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Choice {
    pub message: AssistantReply,
    pub finish_reason: Option<String>,
}

/// The assistant message carried by a choice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssistantReply {
    /// Text content. Empty when the endpoint sent `null`.
    pub content: String,
    /// Requested tool calls, in the order returned.
    pub tool_calls: Vec<ToolCall>,
}

/// Sends a conversation and the tool schemas to a model.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Requests one completion for `messages`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failures, non-success statuses and
    /// undecodable bodies.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<Completion, ApiError>;

    /// Model identifier, shown in the status bar.
    fn model(&self) -> &str;
}
