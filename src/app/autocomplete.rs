//! File-tag autocomplete.
//!
//! The state is derived entirely from the input text and the known file list;
//! [`Autocomplete::refresh`] runs after every edit.

use super::tags::TAG_PREFIX;

/// Most candidates shown at once.
pub const MAX_CANDIDATES: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Autocomplete {
    active: bool,
    candidates: Vec<String>,
    selected: usize,
}

impl Autocomplete {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    #[must_use]
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Recomputes the candidates for `input`.
    ///
    /// Active when the last token starts with `@` and does not already name a
    /// known file. Candidates keep the order of `files`.
    pub fn refresh(&mut self, input: &str, files: &[String]) {
        let partial = input
            .split_whitespace()
            .last()
            .and_then(|word| word.strip_prefix(TAG_PREFIX));

        let Some(partial) = partial else {
            self.deactivate();
            return;
        };
        if files.iter().any(|f| f == partial) {
            self.deactivate();
            return;
        }

        self.candidates = files
            .iter()
            .filter(|f| f.contains(partial))
            .take(MAX_CANDIDATES)
            .cloned()
            .collect();

        if self.candidates.is_empty() {
            self.deactivate();
            return;
        }
        self.active = true;
        self.selected = self.selected.min(self.candidates.len() - 1);
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.candidates.len() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// Replaces the last token of `input` with the selected tag plus a space.
    ///
    /// Returns `None` when inactive.
    pub fn confirm(&mut self, input: &str) -> Option<String> {
        if !self.active {
            return None;
        }
        let choice = self.candidates.get(self.selected)?.clone();

        let trimmed = input.trim_end();
        let start = trimmed
            .rfind(char::is_whitespace)
            .map_or(0, |i| i + trimmed[i..].chars().next().map_or(1, char::len_utf8));
        let completed = format!("{}{TAG_PREFIX}{choice} ", &trimmed[..start]);

        self.deactivate();
        Some(completed)
    }

    /// Hides the popup without touching the input.
    pub fn cancel(&mut self) {
        self.deactivate();
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.candidates.clear();
        self.selected = 0;
    }
}
