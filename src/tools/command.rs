//! Synchronous fallbacks for the out-of-band tools.
//!
//! The agent loop normally hands `run_command` and `manage_window` to the UI.
//! These implementations only run when the arguments could not be decoded
//! into an out-of-band request, so they stay conservative.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::info;

use super::{parse_args, Tool};
use crate::api::tools::{manage_window_tool, run_command_tool};
use crate::api::ToolDefinition;
use crate::error::{ToolError, ToolResult};
use crate::shell::resolve_binary;

#[derive(Debug, Deserialize)]
struct CommandArgs {
    command: String,
    #[serde(default)]
    args: Vec<String>,
}

/// Runs a command to completion and returns its combined output.
#[derive(Debug, Clone)]
pub struct RunCommand {
    root: PathBuf,
}

impl RunCommand {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl Tool for RunCommand {
    fn definition(&self) -> ToolDefinition {
        run_command_tool()
    }

    fn call(&self, arguments: &str) -> ToolResult<String> {
        let args: CommandArgs = parse_args(arguments)?;
        let program = resolve_binary(&args.command);
        info!(command = %program, args = ?args.args, "Running command synchronously");

        let output = Command::new(&program)
            .args(&args.args)
            .current_dir(&self.root)
            .output()
            .map_err(|e| ToolError::io(format!("failed to start {program}"), e))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(combined)
        } else {
            Ok(format!("Error: {}\nOutput:\n{combined}", output.status))
        }
    }
}

#[derive(Debug, Deserialize)]
struct WindowArgs {
    action: String,
    #[serde(default)]
    target: String,
}

/// Validates a window request and acknowledges it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManageWindow;

impl Tool for ManageWindow {
    fn definition(&self) -> ToolDefinition {
        manage_window_tool()
    }

    fn call(&self, arguments: &str) -> ToolResult<String> {
        let args: WindowArgs = parse_args(arguments)?;
        if args.action != "open" && args.action != "close" {
            return Err(ToolError::Failed(format!("invalid action: {}", args.action)));
        }
        Ok(format!(
            "Window action '{}' triggered for target '{}'",
            args.action, args.target
        ))
    }
}
