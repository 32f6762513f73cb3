//! Error types for Trace.
//!
//! Errors are split by the layer that produces them:
//!
//! - [`ApiError`] - failures talking to the completion endpoint
//! - [`AgentError`] - terminal failures of one agent loop invocation
//! - [`ToolError`] - failures of a synchronous tool, recovered by the loop
//!
//! Only `AgentError` ever reaches the user as a visible failure. Tool errors
//! are turned into tool-result messages so the model can adapt, and process
//! start failures travel through the normal completion path of the process
//! runner.
//!
//! # Example
//!
//! ```
//! use trace_agent::error::{AgentError, ApiError};
//!
//! let err = AgentError::from(ApiError::Status {
//!     status: 401,
//!     body: "invalid key".to_string(),
//! });
//! assert!(err.to_string().contains("401"));
//! ```

use thiserror::Error;

/// Result alias for tool executions.
pub type ToolResult<T> = Result<T, ToolError>;

/// Failure reported by a completion client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (DNS, TLS, connection reset, ...).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body, surfaced verbatim.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Terminal failure of an agent loop invocation.
///
/// Every variant ends the current invocation, is shown to the user as an
/// error message, and returns the session to idle. None are retried.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Network or API failure from the completion client.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The endpoint answered with zero choices.
    #[error("no response from model")]
    NoResponse,

    /// The iteration bound was exhausted without a final answer.
    #[error("max iterations reached ({0}) - possible infinite loop")]
    MaxIterations(usize),
}

/// Failure of a synchronous tool.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The argument payload did not match the tool's schema.
    #[error("invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    /// No tool with this name is registered.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The path is protected.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The tool declined to process the input.
    #[error("skipped: {0}")]
    Skipped(String),

    /// `edit_file` could not find the search block.
    #[error("search block not found in {0}. Ensure exact match (including whitespace).")]
    SearchBlockNotFound(String),

    /// Underlying I/O failure.
    #[error("{context}: {source}")]
    Io {
        /// What the tool was doing.
        context: String,
        /// The original error.
        #[source]
        source: std::io::Error,
    },

    /// Any other failure, already rendered as text.
    #[error("{0}")]
    Failed(String),
}

impl ToolError {
    /// Wraps an I/O error with a short description of the operation.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
