//! Transcript export.
//!
//! When the UI exits, the visible conversation is written to
//! `trace_session_<unix-seconds>.md` in the working directory.
//!
//! # Example
//!
//! ```no_run
//! use trace_agent::session::export_transcript;
//! use trace_agent::types::Message;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let history = vec![Message::user("explain @src/main.rs"), Message::assistant("Sure.")];
//! if let Some(path) = export_transcript(&history, std::path::Path::new(".")).await? {
//!     println!("saved to {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tracing::info;

use crate::app::tags::{strip_file_hint, TAG_PREFIX};
use crate::types::{Message, Role};

/// Rewrites `@path` tokens as relative markdown links.
///
/// Whitespace between tokens collapses to single spaces.
fn link_tags(content: &str) -> String {
    content
        .split_whitespace()
        .map(|word| match word.strip_prefix(TAG_PREFIX) {
            Some(path) => format!("[{word}](./{path})"),
            None => word.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders the exportable part of `history` as markdown.
///
/// System and tool messages are skipped, as are assistant messages that only
/// carry tool calls. User messages lose their file-reference hint and get
/// their tags linked.
#[must_use]
pub fn render_transcript(history: &[Message]) -> String {
    let mut out = String::new();

    for message in history {
        let (heading, content) = match message.role {
            Role::System | Role::Tool => continue,
            Role::Assistant if message.is_tool_call_only() => continue,
            Role::Assistant => ("Trace", message.content.clone()),
            Role::User => ("User", link_tags(strip_file_hint(&message.content).trim())),
        };
        let _ = write!(out, "## {heading}\n\n{content}\n\n---\n\n");
    }

    out
}

/// Writes the transcript into `dir`.
///
/// Returns `Ok(None)` without touching the filesystem when `history` is empty.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub async fn export_transcript(history: &[Message], dir: &Path) -> Result<Option<PathBuf>> {
    if history.is_empty() {
        return Ok(None);
    }

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let path = dir.join(format!("trace_session_{stamp}.md"));

    fs::write(&path, render_transcript(history))
        .await
        .with_context(|| format!("Failed to write transcript to {}", path.display()))?;

    info!(path = %path.display(), messages = history.len(), "Transcript exported");
    Ok(Some(path))
}
