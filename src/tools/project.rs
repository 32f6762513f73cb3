//! The `init_project` tool.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{parse_args, resolve, Tool};
use crate::api::tools::init_project_tool;
use crate::api::ToolDefinition;
use crate::error::{ToolError, ToolResult};

const GITIGNORE: &str = ".DS_Store\nnode_modules/\ndist/\nbin/\n.env\n";

#[derive(Debug, Deserialize)]
struct InitArgs {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// Runs `git init` and seeds a `.gitignore` and `README.md`.
///
/// Existing files are never overwritten.
#[derive(Debug, Clone)]
pub struct InitProject {
    root: PathBuf,
}

impl InitProject {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

fn write_if_absent(path: &Path, content: &str) -> ToolResult<()> {
    if path.exists() {
        return Ok(());
    }
    std::fs::write(path, content)
        .map_err(|e| ToolError::io(format!("failed to create {}", path.display()), e))
}

impl Tool for InitProject {
    fn definition(&self) -> ToolDefinition {
        init_project_tool()
    }

    fn call(&self, arguments: &str) -> ToolResult<String> {
        let args: InitArgs = parse_args(arguments)?;
        let name = args.name.filter(|n| !n.trim().is_empty());

        let target = match &name {
            Some(name) => {
                let dir = resolve(&self.root, name);
                std::fs::create_dir_all(&dir)
                    .map_err(|e| ToolError::io("failed to create directory", e))?;
                dir
            }
            None => self.root.clone(),
        };

        let output = Command::new("git")
            .arg("init")
            .current_dir(&target)
            .output()
            .map_err(|e| ToolError::io("failed to run git init", e))?;
        if !output.status.success() {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(ToolError::Failed(format!("git init failed: {}", text.trim())));
        }

        let title = name.as_deref().unwrap_or("Project");
        let readme = match args.description.as_deref().map(str::trim) {
            Some(description) if !description.is_empty() => {
                format!("# {title}\n\n{description}\n")
            }
            _ => format!("# {title}\n"),
        };
        write_if_absent(&target.join("README.md"), &readme)?;
        write_if_absent(&target.join(".gitignore"), GITIGNORE)?;

        Ok(format!(
            "Initialized project in '{}' with git, README.md, and .gitignore.",
            name.as_deref().unwrap_or(".")
        ))
    }
}
