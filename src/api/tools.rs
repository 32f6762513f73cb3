//! Tool schemas sent with every completion request.
//!
//! Each definition is wrapped as `{"type": "function", "function": ...}` by
//! the client. Two tools are out-of-band: [`RUN_COMMAND`] and
//! [`MANAGE_WINDOW`] are intercepted by the agent loop and executed by the
//! UI rather than by the registry.
//!
//! # Example
//!
//! ```rust
//! use trace_agent::api::tools::{default_tools, RUN_COMMAND};
//!
//! let tools = default_tools();
//! assert!(tools.iter().any(|t| t.name == RUN_COMMAND));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Name of the process execution tool.
pub const RUN_COMMAND: &str = "run_command";

/// Name of the window control tool.
pub const MANAGE_WINDOW: &str = "manage_window";

/// A function tool the model may call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    /// The unique name of the tool (e.g., "read_file").
    pub name: String,

    /// What the tool does. The model uses this to decide when to call it.
    pub description: String,

    /// JSON Schema for the arguments object.
    pub parameters: Value,
}

impl ToolDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Returns every tool Trace offers, in the order they are advertised.
#[must_use]
pub fn default_tools() -> Vec<ToolDefinition> {
    vec![
        read_file_tool(),
        list_files_tool(),
        run_command_tool(),
        init_project_tool(),
        write_file_tool(),
        edit_file_tool(),
        manage_window_tool(),
    ]
}

/// Creates the read_file tool definition.
#[must_use]
pub fn read_file_tool() -> ToolDefinition {
    ToolDefinition::new(
        "read_file",
        "Read the contents of a given relative file path.",
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The relative path of a file in the working directory."
                }
            },
            "required": ["path"],
            "additionalProperties": false
        }),
    )
}

/// Creates the list_files tool definition.
#[must_use]
pub fn list_files_tool() -> ToolDefinition {
    ToolDefinition::new(
        "list_files",
        "List files in the project. Respects .gitignore.",
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Optional relative path to list files from. Defaults to current directory."
                }
            },
            "required": [],
            "additionalProperties": false
        }),
    )
}

/// Creates the run_command tool definition.
///
/// Output is streamed into the UI while the command runs.
#[must_use]
pub fn run_command_tool() -> ToolDefinition {
    ToolDefinition::new(
        RUN_COMMAND,
        "Run a shell command. Use this for git commands like 'git diff', 'git status', 'git log'.",
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The command to run."
                },
                "args": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Arguments for the command."
                }
            },
            "required": ["command", "args"],
            "additionalProperties": false
        }),
    )
}

/// Creates the init_project tool definition.
#[must_use]
pub fn init_project_tool() -> ToolDefinition {
    ToolDefinition::new(
        "init_project",
        "Initialize a new git project with a .gitignore. Can create a new directory.",
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Optional name of the project directory. If empty, uses current directory."
                },
                "description": {
                    "type": "string",
                    "description": "Short description of the project."
                }
            },
            "required": [],
            "additionalProperties": false
        }),
    )
}

/// Creates the write_file tool definition.
#[must_use]
pub fn write_file_tool() -> ToolDefinition {
    ToolDefinition::new(
        "write_file",
        "Write content to a file. Creates the file if it doesn't exist, or overwrites it if it does.",
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The relative path of the file to write."
                },
                "content": {
                    "type": "string",
                    "description": "The content to write to the file."
                }
            },
            "required": ["path", "content"],
            "additionalProperties": false
        }),
    )
}

/// Creates the edit_file tool definition.
#[must_use]
pub fn edit_file_tool() -> ToolDefinition {
    ToolDefinition::new(
        "edit_file",
        "Edit a file by replacing a specific block of text with new text. Uses exact string matching.",
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The relative path of the file to edit"
                },
                "search_text": {
                    "type": "string",
                    "description": "The exact block of text to replace. Must match exactly."
                },
                "replace_text": {
                    "type": "string",
                    "description": "The new text to insert in place of the search_text."
                }
            },
            "required": ["path", "search_text", "replace_text"],
            "additionalProperties": false
        }),
    )
}

/// Creates the manage_window tool definition.
#[must_use]
pub fn manage_window_tool() -> ToolDefinition {
    ToolDefinition::new(
        MANAGE_WINDOW,
        "Control the interface layout, such as opening or closing the sidebar to show terminal output.",
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["open", "close"],
                    "description": "Action to perform: 'open' or 'close'."
                },
                "target": {
                    "type": "string",
                    "description": "Target view: 'terminal' (default)."
                }
            },
            "required": ["action"],
            "additionalProperties": false
        }),
    )
}
