//! Core type definitions for Trace.
//!
//! - [`config`] - runtime configuration assembled by the binary
//! - [`message`] - conversation messages, roles and tool calls
//!
//! # Re-exports
//!
//! ```
//! use trace_agent::types::{Message, Role, ToolCall};
//! ```

pub mod config;
pub mod message;

pub use config::Config;
pub use message::{Message, Role, ToolCall};
