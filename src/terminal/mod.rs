//! Terminal setup and teardown.
//!
//! [`TerminalGuard`] puts the terminal into raw mode on the alternate screen
//! with bracketed paste enabled, and undoes all of it when dropped. A panic
//! hook installed by [`install_panic_hook`] restores the terminal before the
//! panic message is printed.

use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use tracing::{debug, warn};

pub type TraceTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Owns the terminal for the lifetime of the UI.
pub struct TerminalGuard {
    terminal: TraceTerminal,
}

impl TerminalGuard {
    /// Enters raw mode and the alternate screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be configured. Any partial
    /// setup is undone first.
    pub fn setup() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableBracketedPaste) {
            restore();
            return Err(e);
        }

        match Terminal::new(CrosstermBackend::new(stdout)) {
            Ok(terminal) => {
                debug!("Terminal initialized");
                Ok(Self { terminal })
            }
            Err(e) => {
                restore();
                Err(e)
            }
        }
    }

    pub fn terminal_mut(&mut self) -> &mut TraceTerminal {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
        if let Err(e) = self.terminal.show_cursor() {
            warn!(error = %e, "Failed to show cursor");
        }
        debug!("Terminal restored");
    }
}

/// Leaves the alternate screen and raw mode. Safe to call more than once.
pub fn restore() {
    if let Err(e) = execute!(io::stdout(), DisableBracketedPaste, LeaveAlternateScreen) {
        warn!(error = %e, "Failed to leave alternate screen");
    }
    if let Err(e) = disable_raw_mode() {
        warn!(error = %e, "Failed to disable raw mode");
    }
}

/// Chains a hook that restores the terminal before the default panic output.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore();
        previous(info);
    }));
}
