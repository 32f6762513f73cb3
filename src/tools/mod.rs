//! Synchronous tools the agent loop can execute inline.
//!
//! Every tool implements [`Tool`]: it advertises a [`ToolDefinition`] and
//! turns a raw JSON argument string into result text. [`ToolRegistry`] keys
//! them by name. Paths are resolved against the registry's working
//! directory.
//!
//! # Example
//!
//! ```no_run
//! use trace_agent::tools::ToolRegistry;
//!
//! let registry = ToolRegistry::with_defaults(".");
//! let listing = registry.execute("list_files", "{}").unwrap();
//! assert!(listing.starts_with("Project"));
//! ```

pub mod command;
pub mod files;
pub mod listing;
pub mod project;

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::api::ToolDefinition;
use crate::error::{ToolError, ToolResult};

pub use listing::project_files;

/// A synchronous tool.
pub trait Tool: Send + Sync {
    /// Schema advertised to the model.
    fn definition(&self) -> ToolDefinition;

    /// Runs the tool with the raw JSON arguments the model sent.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] describing why the call failed. The agent loop
    /// reports it back to the model as text.
    fn call(&self, arguments: &str) -> ToolResult<String>;
}

/// Name-keyed collection of tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.tools.iter().map(|t| t.definition().name).collect();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with every built-in tool rooted at `root`.
    #[must_use]
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut registry = Self::new();
        registry.register(files::ReadFile::new(&root));
        registry.register(listing::ListFiles::new(&root));
        registry.register(command::RunCommand::new(&root));
        registry.register(project::InitProject::new(&root));
        registry.register(files::WriteFile::new(&root));
        registry.register(files::EditFile::new(&root));
        registry.register(command::ManageWindow);
        registry
    }

    /// Adds a tool. A tool with the same name replaces the earlier one.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.definition().name;
        self.tools.retain(|t| t.definition().name != name);
        self.tools.push(Box::new(tool));
    }

    /// Schemas of all registered tools, in registration order.
    #[must_use]
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Executes the tool called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::UnknownTool`] if nothing is registered under
    /// `name`, otherwise whatever the tool reports.
    pub fn execute(&self, name: &str, arguments: &str) -> ToolResult<String> {
        let tool = self
            .tools
            .iter()
            .find(|t| t.definition().name == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        debug!(tool = %name, "Executing tool");
        tool.call(arguments)
    }
}

/// Decodes tool arguments. A blank payload is read as `{}`.
///
/// # Errors
///
/// Returns [`ToolError::InvalidArguments`] if the payload does not match `T`.
pub fn parse_args<T: DeserializeOwned>(arguments: &str) -> ToolResult<T> {
    let arguments = if arguments.trim().is_empty() {
        "{}"
    } else {
        arguments
    };
    Ok(serde_json::from_str(arguments)?)
}

/// Returns true for paths the file tools must not touch.
#[must_use]
pub fn is_protected(path: &str) -> bool {
    path.ends_with(".env")
}

pub(crate) fn resolve(root: &Path, path: &str) -> PathBuf {
    root.join(path)
}

pub(crate) fn ensure_unprotected(path: &str) -> ToolResult<()> {
    if is_protected(path) {
        return Err(ToolError::AccessDenied(".env files are protected".to_string()));
    }
    Ok(())
}
