//! Transcript rendering.
//!
//! Turns the conversation history into pre-wrapped lines so the caller can
//! scroll from the bottom by line count.

use once_cell::sync::Lazy;
use ratatui::text::{Line, Span};
use regex::Regex;

use super::theme::TraceTheme;
use crate::app::state::AppState;
use crate::app::tags::strip_file_hint;
use crate::types::config::GREETING_PROMPT;
use crate::types::{Message, Role};

static TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@[\w./-]+").expect("tag regex should compile"));

const ERROR_PREFIX: &str = "**Error:**";
const QUEUED_PREVIEW_CHARS: usize = 50;

/// Whether a history entry shows up in the transcript.
///
/// System prompts, tool results, the hidden greeting and assistant
/// messages that only carry tool calls are internal.
#[must_use]
pub fn is_visible(message: &Message) -> bool {
    match message.role {
        Role::System | Role::Tool => false,
        Role::User => message.content != GREETING_PROMPT,
        Role::Assistant => !message.is_tool_call_only(),
    }
}

/// Splits `text` into spans, highlighting `@file` tags.
fn highlight_tags(text: &str, style: ratatui::style::Style) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    let mut last = 0;

    for m in TAG.find_iter(text) {
        if m.start() > last {
            spans.push(Span::styled(text[last..m.start()].to_string(), style));
        }
        spans.push(Span::styled(m.as_str().to_string(), TraceTheme::tag()));
        last = m.end();
    }
    if last < text.len() {
        spans.push(Span::styled(text[last..].to_string(), style));
    }
    spans
}

fn push_wrapped(lines: &mut Vec<Line<'static>>, text: &str, width: usize, style: ratatui::style::Style) {
    for raw in text.lines() {
        for wrapped in textwrap::wrap(raw, width) {
            lines.push(Line::from(highlight_tags(&wrapped, style)));
        }
    }
}

/// Shortens a queued message for display.
fn preview(text: &str) -> String {
    let clean = strip_file_hint(text);
    let clean = clean.trim();
    if clean.chars().count() > QUEUED_PREVIEW_CHARS {
        let cut: String = clean.chars().take(QUEUED_PREVIEW_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        clean.to_string()
    }
}

struct Builder {
    lines: Vec<Line<'static>>,
    width: usize,
    blocks: usize,
}

impl Builder {
    fn separate(&mut self) {
        if self.blocks > 0 {
            self.lines.push(Line::default());
            self.lines.push(Line::styled(
                "─".repeat(self.width),
                TraceTheme::border(),
            ));
            self.lines.push(Line::default());
        }
        self.blocks += 1;
    }

    fn message(&mut self, message: &Message) {
        for call in &message.tool_calls {
            self.separate();
            self.lines.push(Line::from(vec![
                Span::styled("Calling tool: ", TraceTheme::tool_header()),
                Span::styled(call.name.clone(), TraceTheme::tag()),
            ]));
        }
        if message.content.is_empty() {
            return;
        }

        self.separate();
        let title = match message.role {
            Role::User => Span::styled("You", TraceTheme::user_label()),
            _ => Span::styled("Trace", TraceTheme::assistant_label()),
        };
        self.lines.push(Line::from(title));
        self.lines.push(Line::default());

        let body = strip_file_hint(&message.content);
        let style = if body.starts_with(ERROR_PREFIX) {
            TraceTheme::error()
        } else {
            TraceTheme::body()
        };
        push_wrapped(&mut self.lines, body.trim(), self.width, style);
    }
}

/// Builds the transcript for `state`, wrapped to `width` columns.
#[must_use]
pub fn transcript_lines(state: &AppState, width: usize) -> Vec<Line<'static>> {
    let mut builder = Builder {
        lines: Vec::new(),
        width: width.max(1),
        blocks: 0,
    };

    for message in state.history().iter().filter(|m| is_visible(m)) {
        builder.message(message);
    }

    for (i, queued) in state.queue().iter().enumerate() {
        builder.separate();
        let text = format!("(Queued #{}): {}", i + 1, preview(queued));
        push_wrapped(&mut builder.lines, &text, builder.width, TraceTheme::muted());
    }

    if !state.show_sidebar() && !state.process_output().is_empty() {
        builder.separate();
        builder
            .lines
            .push(Line::styled("Process Output:", TraceTheme::tool_header()));
        push_wrapped(
            &mut builder.lines,
            state.process_output(),
            builder.width,
            TraceTheme::process_output(),
        );
    }

    builder.lines
}
