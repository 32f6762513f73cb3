//! Custom ratatui widgets for the Trace terminal UI.

pub mod autocomplete;

pub use autocomplete::AutocompletePopup;
