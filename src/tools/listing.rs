//! Project file discovery and the `list_files` tool.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;
use walkdir::WalkDir;

use super::{parse_args, resolve, Tool};
use crate::api::tools::list_files_tool;
use crate::api::ToolDefinition;
use crate::error::{ToolError, ToolResult};

const ROOT_LABEL: &str = "Project";

/// Runs `git ls-files` for tracked and untracked, non-ignored files.
fn git_ls_files(dir: &Path) -> Option<Vec<String>> {
    let output = Command::new("git")
        .args(["ls-files", "-c", "-o", "--exclude-standard"])
        .current_dir(dir)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    Some(
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect(),
    )
}

fn is_agent_artifact(path: &str) -> bool {
    path.starts_with("bin/") || path == "agent" || path == "trace" || path == ".env"
}

/// Files offered for `@` tagging, in `git ls-files` order.
///
/// Outside a git repository the list is empty.
#[must_use]
pub fn project_files(dir: &Path) -> Vec<String> {
    let Some(files) = git_ls_files(dir) else {
        debug!(dir = %dir.display(), "Not a git repository, no files to tag");
        return Vec::new();
    };

    files
        .into_iter()
        .filter(|path| !path.starts_with(".git") && !is_agent_artifact(path))
        .collect()
}

/// Walks `dir` when git is unavailable, skipping `.git` and `bin`.
fn walk_files(dir: &Path) -> ToolResult<Vec<String>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(dir).into_iter().filter_entry(|entry| {
        !(entry.file_type().is_dir() && entry.depth() > 0 && {
            let name = entry.file_name();
            name == ".git" || name == "bin"
        })
    });

    for entry in walker {
        let entry = entry.map_err(|e| ToolError::Failed(format!("failed to walk directory: {e}")))?;
        if entry.file_type().is_dir() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(dir) {
            let path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            files.push(path);
        }
    }

    Ok(files)
}

#[derive(Debug, Default)]
struct TreeNode {
    files: Vec<String>,
    dirs: BTreeMap<String, TreeNode>,
}

impl TreeNode {
    fn insert(&mut self, path: &str) {
        match path.split_once('/') {
            Some((dir, rest)) => self.dirs.entry(dir.to_string()).or_default().insert(rest),
            None => self.files.push(path.to_string()),
        }
    }

    fn render(&self, prefix: &str, out: &mut String) {
        let total = self.files.len() + self.dirs.len();
        let children = self
            .files
            .iter()
            .map(|name| (name.as_str(), None))
            .chain(self.dirs.iter().map(|(name, node)| (name.as_str(), Some(node))));

        for (index, (name, node)) in children.enumerate() {
            let last = index + 1 == total;
            let (branch, indent) = if last {
                ("╰── ", "    ")
            } else {
                ("├── ", "│   ")
            };
            out.push('\n');
            out.push_str(prefix);
            out.push_str(branch);
            out.push_str(name);
            if let Some(node) = node {
                node.render(&format!("{prefix}{indent}"), out);
            }
        }
    }
}

/// Renders sorted paths as a rounded box-drawing tree under `root`.
///
/// Files of a directory come first, then its subdirectories.
///
/// ```
/// use trace_agent::tools::listing::render_tree;
///
/// let tree = render_tree("Project", &["Cargo.toml".into(), "src/main.rs".into()]);
/// assert_eq!(tree, "Project\n├── Cargo.toml\n╰── src\n    ╰── main.rs");
/// ```
#[must_use]
pub fn render_tree(root: &str, paths: &[String]) -> String {
    let mut tree = TreeNode::default();
    for path in paths {
        tree.insert(path);
    }

    let mut out = root.to_string();
    tree.render("", &mut out);
    out
}

#[derive(Debug, Deserialize)]
struct ListArgs {
    #[serde(default)]
    path: Option<String>,
}

/// Lists project files as a tree.
#[derive(Debug, Clone)]
pub struct ListFiles {
    root: PathBuf,
}

impl ListFiles {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl Tool for ListFiles {
    fn definition(&self) -> ToolDefinition {
        list_files_tool()
    }

    fn call(&self, arguments: &str) -> ToolResult<String> {
        let args: ListArgs = parse_args(arguments)?;
        let requested = args.path.filter(|p| !p.is_empty() && p != ".");
        let dir = match &requested {
            Some(path) => resolve(&self.root, path),
            None => self.root.clone(),
        };

        let files = match git_ls_files(&dir) {
            Some(files) => files,
            None => walk_files(&dir)?,
        };

        let mut files: Vec<String> = files
            .into_iter()
            .filter(|path| !path.starts_with(".git/") && !is_agent_artifact(path))
            .collect();
        files.sort();

        let label = requested.as_deref().unwrap_or(ROOT_LABEL);
        Ok(render_tree(label, &files))
    }
}
