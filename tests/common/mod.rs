//! Common test utilities and fixtures for Trace.
//!
//! - [`TestContext`] for filesystem fixtures
//! - [`ScriptedClient`], a completion client that replays canned replies

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use trace_agent::api::{AssistantReply, Completion, CompletionClient, ToolDefinition};
use trace_agent::error::ApiError;
use trace_agent::types::{Message, ToolCall};

/// Test context providing common setup for integration tests.
pub struct TestContext {
    /// Temporary directory for test file operations.
    pub temp_dir: tempfile::TempDir,
}

impl TestContext {
    /// Creates a new test context with a temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            temp_dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    /// Returns the path to the temporary directory.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }

    /// Creates a file in the temporary directory with the given content.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be created or written.
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        std::fs::write(&path, content).expect("failed to write file");
        path
    }

    /// Reads a file from the temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be read.
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.temp_dir.path().join(name)).expect("failed to read file")
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Completion client that replays scripted replies in order.
///
/// Once the script runs out it answers with zero choices.
pub struct ScriptedClient {
    replies: Mutex<VecDeque<Result<Completion, ApiError>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<Result<Completion, ApiError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Replays successful replies only.
    pub fn replying(replies: Vec<Completion>) -> Arc<Self> {
        Self::new(replies.into_iter().map(Ok).collect())
    }

    /// Number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Messages sent with each request.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        messages: &[Message],
        _tools: &[ToolDefinition],
    ) -> Result<Completion, ApiError> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Completion::default()))
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

/// A reply with text content and no tool calls.
pub fn text_reply(content: &str) -> Completion {
    Completion::single(AssistantReply {
        content: content.to_string(),
        tool_calls: Vec::new(),
    })
}

/// A reply that only requests tool calls.
pub fn tool_reply(calls: Vec<ToolCall>) -> Completion {
    Completion::single(AssistantReply {
        content: String::new(),
        tool_calls: calls,
    })
}

pub fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
    ToolCall::new(id, name, arguments)
}
