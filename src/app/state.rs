//! Application state management.
//!
//! [`AppState`] is the single owner of session state. The dispatcher feeds it
//! one [`AppEvent`] at a time through [`AppState::update`] and performs the
//! [`Effect`]s it returns; nothing else mutates it.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::Rect;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use super::autocomplete::Autocomplete;
use super::event::{AppEvent, Effect};
use super::tags::resolve_file_tags;
use super::tool_loop::{AsyncToolRequest, TurnOutcome, WindowAction, WindowRequest};
use crate::error::{AgentError, ToolError};
use crate::shell::{ProcessExit, ProcessRequest};
use crate::tui::{compute_layout, PaneLayout};
use crate::types::config::GREETING_PROMPT;
use crate::types::{Message, ToolCall};

const PAGE_SCROLL: usize = 10;
const THROBBER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Whether new input is dispatched or queued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Thinking,
}

#[derive(Default)]
struct DirtyFlags {
    messages: bool,
    input: bool,
    full: bool,
}

impl DirtyFlags {
    fn any(&self) -> bool {
        self.messages || self.input || self.full
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

pub struct AppState {
    history: Vec<Message>,
    input: String,
    cursor_pos: usize,
    /// Lines scrolled up from the bottom of the transcript.
    scroll_offset: usize,
    working_dir: PathBuf,

    phase: Phase,
    queue: VecDeque<String>,
    deferred: Vec<ToolCall>,
    /// Deferred calls handed to the running invocation. Unanswered in
    /// `history` until it returns.
    in_flight: Vec<ToolCall>,

    process_output: String,
    running_command: Option<String>,

    show_sidebar: bool,
    layout: PaneLayout,

    files: Vec<String>,
    autocomplete: Autocomplete,

    model: String,
    tool_count: usize,
    throbber_frame: usize,
    dirty: DirtyFlags,
}

impl AppState {
    pub fn new(working_dir: PathBuf, files: Vec<String>) -> Self {
        Self {
            history: Vec::new(),
            input: String::new(),
            cursor_pos: 0,
            scroll_offset: 0,
            working_dir,
            phase: Phase::Idle,
            queue: VecDeque::new(),
            deferred: Vec::new(),
            in_flight: Vec::new(),
            process_output: String::new(),
            running_command: None,
            show_sidebar: false,
            layout: compute_layout(Rect::default(), false),
            files,
            autocomplete: Autocomplete::new(),
            model: String::new(),
            tool_count: 0,
            throbber_frame: 0,
            dirty: DirtyFlags {
                full: true,
                ..Default::default()
            },
        }
    }

    /// Sets what the status bar reports.
    #[must_use]
    pub fn with_status(mut self, model: impl Into<String>, tool_count: usize) -> Self {
        self.model = model.into();
        self.tool_count = tool_count;
        self
    }

    /// Seeds the history with the system prompt and, optionally, the hidden
    /// greeting that makes the model introduce itself.
    pub fn seed(&mut self, system_prompt: &str, greeting: bool) -> Vec<Effect> {
        self.history.push(Message::system(system_prompt));
        if !greeting {
            return Vec::new();
        }

        self.history.push(Message::user(GREETING_PROMPT));
        self.phase = Phase::Thinking;
        self.dirty.messages = true;
        vec![self.invoke_agent(Vec::new())]
    }

    /// Advances the state by one event.
    pub fn update(&mut self, event: AppEvent) -> Vec<Effect> {
        match event {
            AppEvent::Key(key) => self.handle_key(key),
            AppEvent::Paste(text) => {
                self.insert_str(&text.replace(['\r', '\n'], " "));
                self.refresh_autocomplete();
                Vec::new()
            }
            AppEvent::Resize { width, height } => {
                self.resize(width, height);
                Vec::new()
            }
            AppEvent::Tick => {
                self.tick_throbber();
                Vec::new()
            }
            AppEvent::AgentFinished(Ok(outcome)) => self.on_agent_outcome(outcome),
            AppEvent::AgentFinished(Err(e)) => self.on_agent_failed(&e),
            AppEvent::TurnComplete => self.on_turn_complete(),
            AppEvent::ProcessOutput(line) => {
                self.on_process_output(&line);
                Vec::new()
            }
            AppEvent::ProcessExited(exit) => self.on_process_exited(exit),
        }
    }

    fn invoke_agent(&mut self, deferred: Vec<ToolCall>) -> Effect {
        self.in_flight.clone_from(&deferred);
        Effect::InvokeAgent {
            history: self.history.clone(),
            deferred,
        }
    }

    // ========================================================================
    // Session transitions
    // ========================================================================

    /// Submits the input: dispatched when idle, queued while thinking.
    pub fn submit(&mut self) -> Vec<Effect> {
        if self.input.trim().is_empty() {
            return Vec::new();
        }

        let raw = self.take_input();
        self.autocomplete.cancel();
        let tagged = resolve_file_tags(&raw, &self.files);
        self.scroll_offset = 0;
        self.dirty.messages = true;

        match self.phase {
            Phase::Idle => {
                self.history.push(Message::user(tagged));
                self.phase = Phase::Thinking;
                vec![self.invoke_agent(Vec::new())]
            }
            Phase::Thinking => {
                debug!(queued = self.queue.len() + 1, "Queued message while thinking");
                self.queue.push_back(tagged);
                Vec::new()
            }
        }
    }

    fn on_agent_outcome(&mut self, outcome: TurnOutcome) -> Vec<Effect> {
        self.in_flight.clear();
        self.dirty.messages = true;
        self.scroll_offset = 0;

        match outcome {
            TurnOutcome::Final { history, .. } => {
                self.history = history;
                vec![Effect::Schedule(AppEvent::TurnComplete)]
            }
            TurnOutcome::Suspend {
                request: AsyncToolRequest::RunCommand(request),
                history,
                deferred,
            } => self.start_process(request, history, deferred),
            TurnOutcome::Suspend {
                request: AsyncToolRequest::ManageWindow(request),
                history,
                deferred,
            } => self.apply_window_request(&request, history, deferred),
        }
    }

    fn start_process(
        &mut self,
        request: ProcessRequest,
        history: Vec<Message>,
        deferred: Vec<ToolCall>,
    ) -> Vec<Effect> {
        info!(command = %request.display(), call_id = %request.call_id, "Starting process");
        self.history = history;
        self.process_output.clear();
        self.deferred = deferred;
        self.running_command = Some(request.display());
        self.phase = Phase::Thinking;
        vec![Effect::StartProcess(request)]
    }

    fn apply_window_request(
        &mut self,
        request: &WindowRequest,
        history: Vec<Message>,
        deferred: Vec<ToolCall>,
    ) -> Vec<Effect> {
        info!(action = %request.action, target = %request.target, "Window control");
        self.history = history;
        self.show_sidebar = request.action == WindowAction::Open;
        self.history.push(Message::tool_result(
            &request.call_id,
            format!("Window action '{}' triggered.", request.action),
        ));
        self.relayout();
        self.phase = Phase::Thinking;
        vec![self.invoke_agent(deferred)]
    }

    fn on_agent_failed(&mut self, e: &AgentError) -> Vec<Effect> {
        error!(error = %e, "Agent loop failed");
        for call in std::mem::take(&mut self.in_flight) {
            let skipped = ToolError::Skipped("the turn failed before this call ran".to_string());
            self.history.push(Message::tool_result(
                call.id,
                format!("Error executing tool: {skipped}"),
            ));
        }
        self.history.push(Message::assistant(format!("**Error:** {e}")));
        self.phase = Phase::Idle;
        self.deferred.clear();
        self.scroll_offset = 0;
        self.dirty.messages = true;

        if self.queue.is_empty() {
            Vec::new()
        } else {
            vec![Effect::Schedule(AppEvent::TurnComplete)]
        }
    }

    fn on_turn_complete(&mut self) -> Vec<Effect> {
        self.dirty.messages = true;
        let Some(next) = self.queue.pop_front() else {
            self.phase = Phase::Idle;
            return Vec::new();
        };

        self.history.push(Message::user(next));
        self.phase = Phase::Thinking;
        vec![self.invoke_agent(Vec::new())]
    }

    fn on_process_output(&mut self, line: &str) {
        self.process_output.push_str(line);
        self.process_output.push('\n');
        if !self.show_sidebar {
            self.scroll_offset = 0;
        }
        self.dirty.messages = true;
    }

    fn on_process_exited(&mut self, exit: ProcessExit) -> Vec<Effect> {
        let status = match &exit.error {
            None => "Process finished successfully.".to_string(),
            Some(e) => format!("Process exited with error: {e}"),
        };
        info!(call_id = %exit.call_id, status = %status, "Process finished");

        let content = if self.show_sidebar {
            status
        } else {
            format!("Process Output:\n```\n{}```\n{status}", self.process_output)
        };
        self.history.push(Message::tool_result(exit.call_id, content));
        self.process_output.clear();
        self.running_command = None;
        self.phase = Phase::Thinking;
        self.dirty.messages = true;

        let deferred = std::mem::take(&mut self.deferred);
        vec![self.invoke_agent(deferred)]
    }

    // ========================================================================
    // Keyboard
    // ========================================================================

    pub fn handle_key(&mut self, key: KeyEvent) -> Vec<Effect> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) | (KeyCode::Esc, _) => {
                if self.autocomplete.is_active() {
                    self.autocomplete.cancel();
                    self.dirty.input = true;
                    return Vec::new();
                }
                return vec![Effect::Quit];
            }
            (KeyCode::Char('d'), KeyModifiers::CONTROL) => return vec![Effect::Quit],

            (KeyCode::Enter, _) => {
                if self.autocomplete.is_active() {
                    self.confirm_autocomplete();
                    return Vec::new();
                }
                return self.submit();
            }
            (KeyCode::Tab, _) => self.confirm_autocomplete(),

            (KeyCode::Up, _) if self.autocomplete.is_active() => {
                self.autocomplete.select_prev();
                self.dirty.input = true;
            }
            (KeyCode::Down, _) if self.autocomplete.is_active() => {
                self.autocomplete.select_next();
                self.dirty.input = true;
            }
            (KeyCode::Up, _) => self.scroll_up(1),
            (KeyCode::Down, _) => self.scroll_down(1),
            (KeyCode::PageUp, _) => self.scroll_up(PAGE_SCROLL),
            (KeyCode::PageDown, _) => self.scroll_down(PAGE_SCROLL),

            (KeyCode::Left, _) => self.cursor_left(),
            (KeyCode::Right, _) => self.cursor_right(),
            (KeyCode::Home, _) => self.cursor_home(),
            (KeyCode::End, _) => self.cursor_end(),

            (KeyCode::Backspace, _) => {
                self.delete_char();
                self.refresh_autocomplete();
            }
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                self.insert_char(c);
                self.refresh_autocomplete();
            }
            _ => {}
        }

        Vec::new()
    }

    fn confirm_autocomplete(&mut self) {
        if let Some(completed) = self.autocomplete.confirm(&self.input) {
            self.input = completed;
            self.cursor_end();
        }
        self.dirty.input = true;
    }

    fn refresh_autocomplete(&mut self) {
        self.autocomplete.refresh(&self.input, &self.files);
        self.dirty.input = true;
    }

    // ========================================================================
    // Input editing
    // ========================================================================

    fn byte_index(&self, char_pos: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_pos)
            .map_or(self.input.len(), |(i, _)| i)
    }

    /// Inserts a character at the cursor.
    pub fn insert_char(&mut self, c: char) {
        let byte_pos = self.byte_index(self.cursor_pos);
        self.input.insert(byte_pos, c);
        self.cursor_pos += 1;
        self.dirty.input = true;
    }

    /// Inserts text at the cursor.
    pub fn insert_str(&mut self, text: &str) {
        let byte_pos = self.byte_index(self.cursor_pos);
        self.input.insert_str(byte_pos, text);
        self.cursor_pos += text.chars().count();
        self.dirty.input = true;
    }

    /// Deletes the character before the cursor.
    pub fn delete_char(&mut self) {
        if self.cursor_pos > 0 {
            let byte_pos = self.byte_index(self.cursor_pos - 1);
            self.input.remove(byte_pos);
            self.cursor_pos -= 1;
        }
        self.dirty.input = true;
    }

    /// Takes the input, clearing the buffer and resetting the cursor.
    pub fn take_input(&mut self) -> String {
        self.dirty.input = true;
        self.cursor_pos = 0;
        std::mem::take(&mut self.input)
    }

    pub fn cursor_left(&mut self) {
        self.cursor_pos = self.cursor_pos.saturating_sub(1);
        self.dirty.input = true;
    }

    pub fn cursor_right(&mut self) {
        if self.cursor_pos < self.input.chars().count() {
            self.cursor_pos += 1;
        }
        self.dirty.input = true;
    }

    pub fn cursor_home(&mut self) {
        self.cursor_pos = 0;
        self.dirty.input = true;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_pos = self.input.chars().count();
        self.dirty.input = true;
    }

    // ========================================================================
    // View
    // ========================================================================

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines);
        self.dirty.messages = true;
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
        self.dirty.messages = true;
    }

    fn resize(&mut self, width: u16, height: u16) {
        self.layout = compute_layout(Rect::new(0, 0, width, height), self.show_sidebar);
        self.dirty.full = true;
    }

    fn relayout(&mut self) {
        self.layout = compute_layout(self.layout.area, self.show_sidebar);
        self.dirty.full = true;
    }

    pub fn tick_throbber(&mut self) {
        self.throbber_frame = (self.throbber_frame + 1) % THROBBER.len();
        self.dirty.messages = true;
    }

    #[must_use]
    pub fn throbber_char(&self) -> char {
        THROBBER[self.throbber_frame]
    }

    #[must_use]
    pub fn needs_render(&self) -> bool {
        self.dirty.any()
    }

    pub fn mark_rendered(&mut self) {
        self.dirty.clear();
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Cursor position in characters.
    #[must_use]
    pub fn cursor_position(&self) -> usize {
        self.cursor_pos
    }

    #[must_use]
    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn is_thinking(&self) -> bool {
        self.phase == Phase::Thinking
    }

    /// Messages waiting for the current turn to finish.
    #[must_use]
    pub fn queue(&self) -> &VecDeque<String> {
        &self.queue
    }

    /// Calls held back while an out-of-band tool runs.
    #[must_use]
    pub fn deferred(&self) -> &[ToolCall] {
        &self.deferred
    }

    #[must_use]
    pub fn process_output(&self) -> &str {
        &self.process_output
    }

    #[must_use]
    pub fn running_command(&self) -> Option<&str> {
        self.running_command.as_deref()
    }

    #[must_use]
    pub fn show_sidebar(&self) -> bool {
        self.show_sidebar
    }

    #[must_use]
    pub fn layout(&self) -> &PaneLayout {
        &self.layout
    }

    #[must_use]
    pub fn files(&self) -> &[String] {
        &self.files
    }

    #[must_use]
    pub fn autocomplete(&self) -> &Autocomplete {
        &self.autocomplete
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[must_use]
    pub fn tool_count(&self) -> usize {
        self.tool_count
    }
}
