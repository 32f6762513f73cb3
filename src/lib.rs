//! Trace - terminal coding assistant
//!
//! A chat UI that drives a bounded tool-calling loop against any
//! OpenAI-compatible completion endpoint. Long-running commands stream into
//! the UI while the loop is suspended.
//!
//! This library exposes the core types and functionality for testing and extension.

pub mod api;
pub mod app;
pub mod error;
pub mod session;
pub mod shell;
pub mod terminal;
pub mod tools;
pub mod tui;
pub mod types;

// Re-export core types for convenient access
pub use error::{AgentError, ApiError, ToolError};
pub use types::{Config, Message, Role, ToolCall};
