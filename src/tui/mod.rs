//! Terminal UI rendering

pub mod theme;
pub mod transcript;
pub mod widgets;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::state::AppState;
use theme::TraceTheme;
use transcript::transcript_lines;
use widgets::AutocompletePopup;

const PLACEHOLDER: &str = "Ask Trace... (Type @ to tag files)";
const PROMPT: &str = "| ";
const MIN_SIDEBAR_WIDTH: u16 = 40;
const MIN_INPUT_LINES: u16 = 3;

/// Screen regions for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaneLayout {
    /// The whole terminal.
    pub area: Rect,
    pub transcript: Rect,
    /// Process output pane, present while the sidebar is open.
    pub sidebar: Option<Rect>,
    pub thinking: Rect,
    pub input: Rect,
    pub status: Rect,
}

/// Splits `area` into panes.
///
/// The input box takes a tenth of the height (at least three lines) plus
/// its borders. The sidebar takes a third of the width, at least 40 columns.
#[must_use]
pub fn compute_layout(area: Rect, sidebar: bool) -> PaneLayout {
    let input_height = (area.height / 10).max(MIN_INPUT_LINES) + 2;

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),                // Transcript (and sidebar)
            Constraint::Length(1),             // Thinking line
            Constraint::Length(input_height),  // Input
            Constraint::Length(1),             // Status bar
        ])
        .split(area);

    let (transcript, sidebar) = if sidebar {
        let width = (area.width / 3).max(MIN_SIDEBAR_WIDTH).min(area.width);
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(width)])
            .split(rows[0]);
        (columns[0], Some(columns[1]))
    } else {
        (rows[0], None)
    };

    PaneLayout {
        area,
        transcript,
        sidebar,
        thinking: rows[1],
        input: rows[2],
        status: rows[3],
    }
}

/// First line to show so that the view ends `offset` lines above the bottom.
fn scroll_top(total: usize, height: usize, offset: usize) -> u16 {
    let max_scroll = total.saturating_sub(height);
    let top = max_scroll - offset.min(max_scroll);
    u16::try_from(top).unwrap_or(u16::MAX)
}

pub fn render(frame: &mut Frame, state: &AppState) {
    let area = frame.area();
    let layout = if state.layout().area == area {
        *state.layout()
    } else {
        compute_layout(area, state.show_sidebar())
    };

    render_transcript(frame, layout.transcript, state);
    if let Some(sidebar) = layout.sidebar {
        render_sidebar(frame, sidebar, state);
    }
    render_thinking(frame, layout.thinking, state);
    render_input(frame, layout.input, state);
    render_status_bar(frame, layout.status, state);

    if state.autocomplete().is_active() {
        let popup = AutocompletePopup::new(state.autocomplete());
        let popup_area = popup.popup_area(area, layout.input);
        if popup_area.height > 0 {
            frame.render_widget(popup, popup_area);
        }
    }
}

fn render_transcript(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(TraceTheme::border());
    let inner = block.inner(area);

    let lines = transcript_lines(state, inner.width as usize);
    let top = scroll_top(lines.len(), inner.height as usize, state.scroll_offset());

    let messages = Paragraph::new(lines).block(block).scroll((top, 0));
    frame.render_widget(messages, area);
}

fn render_sidebar(frame: &mut Frame, area: Rect, state: &AppState) {
    let title = match state.running_command() {
        Some(command) => format!(" Terminal: {command} "),
        None => " Terminal ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(TraceTheme::border())
        .title(title);
    let inner = block.inner(area);

    let width = (inner.width as usize).max(1);
    let lines: Vec<Line> = state
        .process_output()
        .lines()
        .flat_map(|line| textwrap::wrap(line, width))
        .map(|line| Line::styled(line.into_owned(), TraceTheme::process_output()))
        .collect();
    // Follow the tail.
    let top = scroll_top(lines.len(), inner.height as usize, 0);

    frame.render_widget(Paragraph::new(lines).block(block).scroll((top, 0)), area);
}

fn render_thinking(frame: &mut Frame, area: Rect, state: &AppState) {
    if !state.is_thinking() {
        return;
    }

    let label = match state.running_command() {
        Some(command) => format!("Running {command}..."),
        None => "Thinking...".to_string(),
    };
    let line = Line::from(vec![
        Span::styled(format!(" {} ", state.throbber_char()), TraceTheme::throbber()),
        Span::styled(label, TraceTheme::muted()),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_input(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(TraceTheme::border_focused());
    let inner = block.inner(area);

    let input = state.input();
    let body = if input.is_empty() {
        Span::styled(PLACEHOLDER, TraceTheme::muted())
    } else {
        Span::styled(input, TraceTheme::body())
    };

    // Keep the cursor inside the box by scrolling long input horizontally.
    let before_cursor = input
        .char_indices()
        .nth(state.cursor_position())
        .map_or(input, |(i, _)| &input[..i]);
    let cursor_col = u16::try_from(PROMPT.width() + before_cursor.width()).unwrap_or(u16::MAX);
    let hscroll = cursor_col.saturating_sub(inner.width.saturating_sub(1));

    let paragraph = Paragraph::new(Line::from(vec![
        Span::styled(PROMPT, TraceTheme::prompt()),
        body,
    ]))
    .block(block)
    .scroll((0, hscroll));
    frame.render_widget(paragraph, area);

    if inner.width > 0 && inner.height > 0 {
        frame.set_cursor_position((inner.x + cursor_col - hscroll, inner.y));
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState) {
    let content = format!(
        " Model: {} │ Tools: {} │ Messages: {} ",
        state.model(),
        state.tool_count(),
        state.history().len()
    );
    frame.render_widget(
        Paragraph::new(content).style(TraceTheme::status_bar()),
        area,
    );
}
