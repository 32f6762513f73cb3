//! File autocomplete popup.
//!
//! Drawn above the input box while an `@` tag is being typed.
//!
//! # Keybindings
//!
//! - `Up` / `Down` - Move the selection
//! - `Tab` or `Enter` - Insert the selected file
//! - `Esc` - Close the popup

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

use crate::app::autocomplete::Autocomplete;
use crate::tui::theme::TraceTheme;

const HINT: &str = "↑↓: Navigate | Tab/Enter: Select | Esc: Cancel";

pub struct AutocompletePopup<'a> {
    autocomplete: &'a Autocomplete,
}

impl<'a> AutocompletePopup<'a> {
    #[must_use]
    pub fn new(autocomplete: &'a Autocomplete) -> Self {
        Self { autocomplete }
    }

    /// Area for the popup, sitting directly above `input` inside `frame`.
    ///
    /// Shrinks to fit when the frame is short.
    #[must_use]
    pub fn popup_area(&self, frame: Rect, input: Rect) -> Rect {
        // Header, candidates, blank line, hint, two borders.
        let wanted = self.autocomplete.candidates().len() as u16 + 5;
        let height = wanted.min(input.y.saturating_sub(frame.y));
        let width = frame.width.saturating_sub(4);

        Rect::new(frame.x + 2, input.y.saturating_sub(height), width, height)
    }
}

impl Widget for AutocompletePopup<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        Clear.render(area, buf);

        let mut lines = vec![Line::styled("Files:", TraceTheme::muted())];
        for (i, file) in self.autocomplete.candidates().iter().enumerate() {
            let line = if i == self.autocomplete.selected() {
                Span::styled(format!("> {file}"), TraceTheme::file_selected())
            } else {
                Span::styled(format!("  {file}"), TraceTheme::file_normal())
            };
            lines.push(Line::from(line));
        }
        lines.push(Line::default());
        lines.push(Line::styled(HINT, TraceTheme::muted()));

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(ratatui::style::Style::default().fg(TraceTheme::POPUP_BORDER));

        Paragraph::new(lines).block(block).render(area, buf);
    }
}
