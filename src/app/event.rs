//! Events consumed and effects produced by the UI state machine.

use crossterm::event::KeyEvent;

use super::tool_loop::TurnOutcome;
use crate::error::AgentError;
use crate::shell::{ProcessExit, ProcessRequest};
use crate::types::{Message, ToolCall};

/// Everything that can advance the state machine.
#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Paste(String),
    Resize { width: u16, height: u16 },
    /// Throbber animation tick while thinking.
    Tick,
    /// An agent loop invocation finished.
    AgentFinished(Result<TurnOutcome, AgentError>),
    /// The current turn is done; dispatch the next queued message, if any.
    TurnComplete,
    ProcessOutput(String),
    ProcessExited(ProcessExit),
}

/// Work the dispatcher performs on behalf of a transition.
#[derive(Debug)]
pub enum Effect {
    /// Run the agent loop on a snapshot of the history.
    InvokeAgent {
        history: Vec<Message>,
        deferred: Vec<ToolCall>,
    },
    /// Start a process, discarding any earlier run.
    StartProcess(ProcessRequest),
    /// Feed an event back into the state machine.
    Schedule(AppEvent),
    Quit,
}
