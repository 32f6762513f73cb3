//! File tools: `read_file`, `write_file` and `edit_file`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::{ensure_unprotected, parse_args, resolve, Tool};
use crate::api::tools::{edit_file_tool, read_file_tool, write_file_tool};
use crate::api::ToolDefinition;
use crate::error::{ToolError, ToolResult};

/// Largest file `read_file` will return.
pub const MAX_READ_BYTES: u64 = 100 * 1024;

#[derive(Debug, Deserialize)]
struct ReadArgs {
    path: String,
}

#[derive(Debug, Deserialize)]
struct WriteArgs {
    path: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct EditArgs {
    path: String,
    search_text: String,
    replace_text: String,
}

/// Returns a file's content behind a short metadata header.
#[derive(Debug, Clone)]
pub struct ReadFile {
    root: PathBuf,
}

impl ReadFile {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl Tool for ReadFile {
    fn definition(&self) -> ToolDefinition {
        read_file_tool()
    }

    fn call(&self, arguments: &str) -> ToolResult<String> {
        let args: ReadArgs = parse_args(arguments)?;
        ensure_unprotected(&args.path)?;

        let full = resolve(&self.root, &args.path);
        let metadata =
            std::fs::metadata(&full).map_err(|e| ToolError::io("failed to read file", e))?;
        if metadata.len() > MAX_READ_BYTES {
            return Err(ToolError::Skipped("file too large (>100KB)".to_string()));
        }

        let bytes = std::fs::read(&full).map_err(|e| ToolError::io("failed to read file", e))?;
        let size = bytes.len();
        let content = String::from_utf8(bytes)
            .map_err(|_| ToolError::Skipped("appears to be binary".to_string()))?;
        let lines = content.matches('\n').count() + 1;

        Ok(format!(
            "File: {}\nSize: {size} bytes\nLines: {lines}\n\n{content}",
            args.path
        ))
    }
}

/// Creates or overwrites a file, creating parent directories.
#[derive(Debug, Clone)]
pub struct WriteFile {
    root: PathBuf,
}

impl WriteFile {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl Tool for WriteFile {
    fn definition(&self) -> ToolDefinition {
        write_file_tool()
    }

    fn call(&self, arguments: &str) -> ToolResult<String> {
        let args: WriteArgs = parse_args(arguments)?;
        ensure_unprotected(&args.path)?;

        let full = resolve(&self.root, &args.path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ToolError::io("failed to create directory", e))?;
        }
        std::fs::write(&full, &args.content)
            .map_err(|e| ToolError::io("failed to write file", e))?;

        Ok(format!(
            "Successfully wrote to {} (Length: {} characters)",
            args.path,
            args.content.chars().count()
        ))
    }
}

/// Replaces the first exact occurrence of a block of text.
#[derive(Debug, Clone)]
pub struct EditFile {
    root: PathBuf,
}

impl EditFile {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl Tool for EditFile {
    fn definition(&self) -> ToolDefinition {
        edit_file_tool()
    }

    fn call(&self, arguments: &str) -> ToolResult<String> {
        let args: EditArgs = parse_args(arguments)?;
        ensure_unprotected(&args.path)?;

        let full = resolve(&self.root, &args.path);
        let content =
            std::fs::read_to_string(&full).map_err(|e| ToolError::io("failed to read file", e))?;

        if !content.contains(&args.search_text) {
            return Err(ToolError::SearchBlockNotFound(args.path));
        }

        let updated = content.replacen(&args.search_text, &args.replace_text, 1);
        std::fs::write(&full, updated).map_err(|e| ToolError::io("failed to write file", e))?;

        Ok(format!("Successfully edited {}", args.path))
    }
}
