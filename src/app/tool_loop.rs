//! Bounded agentic tool-call loop.
//!
//! One invocation sends the history and tool schemas to the model, runs any
//! requested synchronous tools, and repeats until the model answers without
//! tool calls. Out-of-band tools (process execution and window control) are
//! not run here: the loop suspends and hands the request back to the caller,
//! together with any later calls from the same reply.
//!
//! # State Machine
//!
//! ```text
//!            ┌───────────────────────────────┐
//!            ▼                               │ sync tools ran
//! ┌─────────────────┐  tool calls   ┌────────┴────────┐
//! │ Request (≤ B×)  │ ────────────► │ Process calls   │
//! └───────┬─────────┘               └────────┬────────┘
//!         │ no tool calls                    │ out-of-band call
//!         ▼                                  ▼
//!     ┌───────┐                        ┌──────────┐
//!     │ Final │                        │ Suspend  │ ── resume(history, deferred)
//!     └───────┘                        └──────────┘
//! ```
//!
//! The history is taken by value and returned in the outcome; the caller's
//! copy is never touched.

use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::api::tools::{MANAGE_WINDOW, RUN_COMMAND};
use crate::api::{AssistantReply, CompletionClient, ToolDefinition};
use crate::error::AgentError;
use crate::shell::ProcessRequest;
use crate::tools::ToolRegistry;
use crate::types::{Message, ToolCall};

/// Round trips allowed per invocation.
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Sidebar visibility change requested by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowAction {
    Open,
    Close,
}

impl WindowAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
        }
    }
}

impl fmt::Display for WindowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `manage_window` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRequest {
    pub action: WindowAction,
    pub target: String,
    pub call_id: String,
}

/// Tool calls the UI executes on the loop's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncToolRequest {
    RunCommand(ProcessRequest),
    ManageWindow(WindowRequest),
}

#[derive(Deserialize)]
struct CommandArgs {
    command: String,
    #[serde(default)]
    args: Vec<String>,
}

#[derive(Deserialize)]
struct WindowArgs {
    action: WindowAction,
    #[serde(default)]
    target: String,
}

impl AsyncToolRequest {
    /// Classifies a tool call.
    ///
    /// Returns `None` for synchronous tools and `Some(Err(_))` for an
    /// out-of-band tool whose arguments do not decode.
    #[must_use]
    pub fn from_call(call: &ToolCall) -> Option<Result<Self, serde_json::Error>> {
        match call.name.as_str() {
            RUN_COMMAND => Some(
                serde_json::from_str::<CommandArgs>(&call.arguments).map(|args| {
                    Self::RunCommand(ProcessRequest::new(args.command, args.args, &call.id))
                }),
            ),
            MANAGE_WINDOW => Some(serde_json::from_str::<WindowArgs>(&call.arguments).map(
                |args| {
                    Self::ManageWindow(WindowRequest {
                        action: args.action,
                        target: args.target,
                        call_id: call.id.clone(),
                    })
                },
            )),
            _ => None,
        }
    }

    /// The tool call this request answers.
    #[must_use]
    pub fn call_id(&self) -> &str {
        match self {
            Self::RunCommand(request) => &request.call_id,
            Self::ManageWindow(request) => &request.call_id,
        }
    }
}

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered without tool calls.
    Final {
        content: String,
        history: Vec<Message>,
    },
    /// An out-of-band tool must run before the loop can continue.
    Suspend {
        request: AsyncToolRequest,
        history: Vec<Message>,
        /// Calls from the same reply that came after `request`.
        deferred: Vec<ToolCall>,
    },
}

/// Drives the model and the tool registry.
pub struct ToolLoop {
    client: Arc<dyn CompletionClient>,
    registry: Arc<ToolRegistry>,
    definitions: Vec<ToolDefinition>,
    max_iterations: usize,
}

impl fmt::Debug for ToolLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolLoop")
            .field("model", &self.client.model())
            .field("tools", &self.definitions.len())
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

impl ToolLoop {
    /// Creates a loop that advertises every tool in `registry`.
    #[must_use]
    pub fn new(client: Arc<dyn CompletionClient>, registry: Arc<ToolRegistry>) -> Self {
        let definitions = registry.definitions();
        Self {
            client,
            registry,
            definitions,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Number of tools advertised to the model.
    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.definitions.len()
    }

    #[must_use]
    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Runs the loop on `history`.
    ///
    /// # Errors
    ///
    /// See [`ToolLoop::resume`].
    pub async fn invoke(&self, history: Vec<Message>) -> Result<TurnOutcome, AgentError> {
        self.resume(history, Vec::new()).await
    }

    /// Answers `deferred` calls, then runs the loop.
    ///
    /// # Errors
    ///
    /// - [`AgentError::Api`] if the client fails
    /// - [`AgentError::NoResponse`] if a response has no choices
    /// - [`AgentError::MaxIterations`] if the model keeps calling tools
    pub async fn resume(
        &self,
        mut history: Vec<Message>,
        deferred: Vec<ToolCall>,
    ) -> Result<TurnOutcome, AgentError> {
        if let Some(outcome) = self.process_calls(&mut history, deferred).await {
            return Ok(outcome);
        }

        for iteration in 0..self.max_iterations {
            info!(
                iteration,
                model = %self.client.model(),
                message_count = history.len(),
                "Calling model"
            );

            let completion = self
                .client
                .complete(&history, &self.definitions)
                .await
                .map_err(|e| {
                    error!(error = %e, "Completion request failed");
                    AgentError::from(e)
                })?;

            let Some(choice) = completion.choices.into_iter().next() else {
                warn!("No choices in response");
                return Err(AgentError::NoResponse);
            };

            let AssistantReply {
                content,
                tool_calls,
            } = choice.message;
            info!(
                finish_reason = ?choice.finish_reason,
                tool_call_count = tool_calls.len(),
                content_length = content.len(),
                "Model responded"
            );

            if tool_calls.is_empty() {
                history.push(Message::assistant(content.clone()));
                return Ok(TurnOutcome::Final { content, history });
            }

            history.push(Message::assistant_with_calls(content, tool_calls.clone()));
            if let Some(outcome) = self.process_calls(&mut history, tool_calls).await {
                return Ok(outcome);
            }
        }

        warn!(max_iterations = self.max_iterations, "Max iterations reached");
        Err(AgentError::MaxIterations(self.max_iterations))
    }

    /// Answers `calls` in order, stopping at the first out-of-band call.
    async fn process_calls(
        &self,
        history: &mut Vec<Message>,
        calls: Vec<ToolCall>,
    ) -> Option<TurnOutcome> {
        let mut calls = calls.into_iter();

        while let Some(call) = calls.next() {
            match AsyncToolRequest::from_call(&call) {
                Some(Ok(request)) => {
                    info!(tool = %call.name, call_id = %call.id, "Suspending for out-of-band tool");
                    return Some(TurnOutcome::Suspend {
                        request,
                        history: std::mem::take(history),
                        deferred: calls.collect(),
                    });
                }
                Some(Err(e)) => {
                    warn!(
                        tool = %call.name,
                        call_id = %call.id,
                        error = %e,
                        "Malformed arguments for out-of-band tool, running synchronously"
                    );
                }
                None => {}
            }

            let content = self.execute_sync(&call).await;
            history.push(Message::tool_result(call.id, content));
        }

        None
    }

    async fn execute_sync(&self, call: &ToolCall) -> String {
        let registry = Arc::clone(&self.registry);
        let name = call.name.clone();
        let arguments = call.arguments.clone();
        info!(tool = %name, call_id = %call.id, "Executing tool");

        let joined =
            tokio::task::spawn_blocking(move || registry.execute(&name, &arguments)).await;

        match joined {
            Ok(Ok(output)) => {
                info!(tool = %call.name, result_length = output.len(), "Tool executed");
                output
            }
            Ok(Err(e)) => {
                error!(tool = %call.name, error = %e, "Tool execution failed");
                format!("Error executing tool: {e}")
            }
            Err(e) => {
                error!(tool = %call.name, error = %e, "Tool task failed");
                format!("Error executing tool: {e}")
            }
        }
    }
}
