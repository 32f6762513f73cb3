//! Trace color theme, built on the Nord palette.
//!
//! - Polar Night for borders and muted text
//! - Frost for the assistant and focus
//! - Aurora green for the user, red and yellow for status
//!
//! # Usage
//!
//! ```rust
//! use trace_agent::tui::theme::TraceTheme;
//!
//! let style = TraceTheme::assistant_label();
//! assert_eq!(style.fg, Some(TraceTheme::FROST_2));
//! ```

use ratatui::style::{Color, Modifier, Style};

/// Trace color constants and pre-built styles.
pub struct TraceTheme;

impl TraceTheme {
    // =========================================================================
    // Polar Night
    // =========================================================================

    /// Hex: `#2e3440`
    pub const POLAR_NIGHT_1: Color = Color::Rgb(46, 52, 64);

    /// Hex: `#4c566a`
    pub const POLAR_NIGHT_4: Color = Color::Rgb(76, 86, 106);

    // =========================================================================
    // Snow Storm and Frost
    // =========================================================================

    /// Hex: `#eceff4`
    pub const SNOW_STORM: Color = Color::Rgb(236, 239, 244);

    /// Hex: `#8fbcbb`
    pub const FROST_1: Color = Color::Rgb(143, 188, 187);

    /// Hex: `#88c0d0`
    pub const FROST_2: Color = Color::Rgb(136, 192, 208);

    /// Hex: `#81a1c1`
    pub const FROST_3: Color = Color::Rgb(129, 161, 193);

    // =========================================================================
    // Aurora
    // =========================================================================

    /// Hex: `#a3be8c`
    pub const AURORA_GREEN: Color = Color::Rgb(163, 190, 140);

    /// Hex: `#b48ead`
    pub const AURORA_PURPLE: Color = Color::Rgb(180, 142, 173);

    /// Hex: `#bf616a`
    pub const AURORA_RED: Color = Color::Rgb(191, 97, 106);

    /// Hex: `#ebcb8b`
    pub const AURORA_YELLOW: Color = Color::Rgb(235, 203, 139);

    // =========================================================================
    // Roles
    // =========================================================================

    pub const USER_LABEL: Color = Self::AURORA_GREEN;
    pub const ASSISTANT_LABEL: Color = Self::FROST_2;
    pub const MUTED: Color = Self::POLAR_NIGHT_4;
    pub const BORDER: Color = Self::POLAR_NIGHT_4;
    pub const BORDER_FOCUSED: Color = Self::FROST_2;
    pub const POPUP_BORDER: Color = Color::Indexed(205);
    pub const STATUS_TEXT: Color = Color::Indexed(241);
    pub const STATUS_BG: Color = Color::Indexed(235);

    // =========================================================================
    // Pre-built Styles
    // =========================================================================

    /// Style for the "You" title.
    #[must_use]
    pub fn user_label() -> Style {
        Style::default()
            .fg(Self::USER_LABEL)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for the "Trace" title.
    #[must_use]
    pub fn assistant_label() -> Style {
        Style::default()
            .fg(Self::ASSISTANT_LABEL)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn body() -> Style {
        Style::default().fg(Self::SNOW_STORM)
    }

    /// Style for `@file` tags inside messages.
    #[must_use]
    pub fn tag() -> Style {
        Style::default()
            .fg(Self::FROST_1)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for queued messages and separators.
    #[must_use]
    pub fn muted() -> Style {
        Style::default()
            .fg(Self::MUTED)
            .add_modifier(Modifier::ITALIC)
    }

    /// Style for "Calling tool" lines.
    #[must_use]
    pub fn tool_header() -> Style {
        Style::default()
            .fg(Self::AURORA_PURPLE)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for process output lines.
    #[must_use]
    pub fn process_output() -> Style {
        Style::default().fg(Self::FROST_3)
    }

    #[must_use]
    pub fn error() -> Style {
        Style::default().fg(Self::AURORA_RED)
    }

    /// Style for the throbber.
    #[must_use]
    pub fn throbber() -> Style {
        Style::default().fg(Self::FROST_2)
    }

    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    #[must_use]
    pub fn border_focused() -> Style {
        Style::default().fg(Self::BORDER_FOCUSED)
    }

    /// Style for the selected autocomplete entry.
    #[must_use]
    pub fn file_selected() -> Style {
        Style::default()
            .fg(Self::FROST_2)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn file_normal() -> Style {
        Style::default().fg(Self::SNOW_STORM)
    }

    #[must_use]
    pub fn prompt() -> Style {
        Style::default()
            .fg(Self::AURORA_YELLOW)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn status_bar() -> Style {
        Style::default().fg(Self::STATUS_TEXT).bg(Self::STATUS_BG)
    }
}
