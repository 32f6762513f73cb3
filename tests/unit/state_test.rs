//! Tests for the UI state machine: dispatch, queueing, out-of-band tools,
//! failures and input editing.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::PathBuf;

use trace_agent::app::event::{AppEvent, Effect};
use trace_agent::app::state::{AppState, Phase};
use trace_agent::app::tool_loop::{AsyncToolRequest, TurnOutcome, WindowAction, WindowRequest};
use trace_agent::error::AgentError;
use trace_agent::shell::{ProcessExit, ProcessRequest};
use trace_agent::types::message::unlinked_tool_results;
use trace_agent::types::{Message, Role, ToolCall};

/// Helper to create a new AppState for testing.
fn new_state() -> AppState {
    AppState::new(
        PathBuf::from("/tmp/test"),
        vec!["main.go".into(), "model.go".into(), "styles.go".into()],
    )
}

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn ctrl(c: char) -> AppEvent {
    AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
}

fn type_text(state: &mut AppState, text: &str) {
    for c in text.chars() {
        state.update(key(KeyCode::Char(c)));
    }
}

fn submit(state: &mut AppState, text: &str) -> Vec<Effect> {
    type_text(state, text);
    state.update(key(KeyCode::Enter))
}

fn invoked_history(effects: &[Effect]) -> &[Message] {
    match effects {
        [Effect::InvokeAgent { history, .. }] => history,
        other => panic!("expected a single agent invocation, got {other:?}"),
    }
}

fn suspend(request: AsyncToolRequest, history: Vec<Message>, deferred: Vec<ToolCall>) -> AppEvent {
    AppEvent::AgentFinished(Ok(TurnOutcome::Suspend {
        request,
        history,
        deferred,
    }))
}

fn run_command(state: &AppState, call_id: &str) -> AppEvent {
    let mut history = state.history().to_vec();
    history.push(Message::assistant_with_calls(
        "",
        vec![ToolCall::new(call_id, "run_command", r#"{"command":"make"}"#)],
    ));
    suspend(
        AsyncToolRequest::RunCommand(ProcessRequest::new("make", vec![], call_id)),
        history,
        vec![],
    )
}

fn open_sidebar(state: &mut AppState) {
    let history = state.history().to_vec();
    state.update(suspend(
        AsyncToolRequest::ManageWindow(WindowRequest {
            action: WindowAction::Open,
            target: "terminal".into(),
            call_id: "w1".into(),
        }),
        history,
        vec![],
    ));
}

// ============================================================================
// Dispatch and queueing
// ============================================================================

#[test]
fn test_submit_while_idle_dispatches() {
    let mut state = new_state();
    let effects = submit(&mut state, "foo");

    let history = invoked_history(&effects);
    assert_eq!(history.last().unwrap().content, "foo");
    assert_eq!(state.phase(), Phase::Thinking);
    assert!(state.queue().is_empty());
    assert!(state.input().is_empty());
}

#[test]
fn test_submit_while_thinking_queues() {
    let mut state = new_state();
    submit(&mut state, "foo");
    let effects = submit(&mut state, "bar");

    assert!(effects.is_empty());
    assert_eq!(state.queue().iter().collect::<Vec<_>>(), vec!["bar"]);
    assert_eq!(state.history().last().unwrap().content, "foo");
}

#[test]
fn test_blank_input_is_ignored() {
    let mut state = new_state();
    let effects = submit(&mut state, "   ");
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Idle);
}

#[test]
fn test_submit_resolves_tags() {
    let mut state = new_state();
    submit(&mut state, "explain @main.go ");

    let content = &state.history().last().unwrap().content;
    assert!(content.contains("[User has referenced these files: main.go."));
}

#[test]
fn test_final_then_turn_complete_drains_queue() {
    let mut state = new_state();
    submit(&mut state, "foo");
    submit(&mut state, "bar");

    let mut history = state.history().to_vec();
    history.push(Message::assistant("done with foo"));
    let effects = state.update(AppEvent::AgentFinished(Ok(TurnOutcome::Final {
        content: "done with foo".into(),
        history,
    })));
    assert!(matches!(effects.as_slice(), [Effect::Schedule(AppEvent::TurnComplete)]));

    let effects = state.update(AppEvent::TurnComplete);
    let history = invoked_history(&effects);
    assert_eq!(history.last().unwrap().content, "bar");
    assert!(state.queue().is_empty());
    assert!(state.is_thinking());

    assert!(state.update(AppEvent::TurnComplete).is_empty());
    assert_eq!(state.phase(), Phase::Idle);
}

#[test]
fn test_seed_with_greeting_invokes_agent() {
    let mut state = new_state();
    let effects = state.seed("You are Trace.", true);

    let history = invoked_history(&effects);
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, Role::System);
    assert!(state.is_thinking());
}

#[test]
fn test_seed_without_greeting_stays_idle() {
    let mut state = new_state();
    assert!(state.seed("You are Trace.", false).is_empty());
    assert_eq!(state.history().len(), 1);
    assert_eq!(state.phase(), Phase::Idle);
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_failure_shows_error_and_returns_to_idle() {
    let mut state = new_state();
    submit(&mut state, "foo");

    let effects = state.update(AppEvent::AgentFinished(Err(AgentError::MaxIterations(10))));
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Idle);

    let last = state.history().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert!(last.content.starts_with("**Error:** max iterations reached (10)"));
}

#[test]
fn test_failure_with_queue_schedules_next_turn() {
    let mut state = new_state();
    submit(&mut state, "foo");
    submit(&mut state, "bar");

    let effects = state.update(AppEvent::AgentFinished(Err(AgentError::NoResponse)));
    assert!(matches!(effects.as_slice(), [Effect::Schedule(AppEvent::TurnComplete)]));
}

// ============================================================================
// Process execution
// ============================================================================

#[test]
fn test_process_output_folds_into_tool_result() {
    let mut state = new_state();
    submit(&mut state, "build it");

    let effects = state.update(run_command(&state, "c1"));
    assert!(matches!(effects.as_slice(), [Effect::StartProcess(req)] if req.call_id == "c1"));
    assert_eq!(state.running_command(), Some("make"));

    state.update(AppEvent::ProcessOutput("compiling".into()));
    state.update(AppEvent::ProcessOutput("linking".into()));
    assert_eq!(state.process_output(), "compiling\nlinking\n");

    let effects = state.update(AppEvent::ProcessExited(ProcessExit {
        call_id: "c1".into(),
        error: None,
    }));

    let history = invoked_history(&effects);
    let result = history.last().unwrap();
    assert_eq!(result.tool_call_id.as_deref(), Some("c1"));
    assert_eq!(
        result.content,
        "Process Output:\n```\ncompiling\nlinking\n```\nProcess finished successfully."
    );
    assert!(state.process_output().is_empty());
    assert!(state.running_command().is_none());
}

#[test]
fn test_sidebar_keeps_output_out_of_history() {
    let mut state = new_state();
    submit(&mut state, "build it");
    open_sidebar(&mut state);
    assert!(state.show_sidebar());

    state.update(run_command(&state, "c2"));
    state.update(AppEvent::ProcessOutput("noise".into()));
    let effects = state.update(AppEvent::ProcessExited(ProcessExit {
        call_id: "c2".into(),
        error: Some("exit status: 2".into()),
    }));

    let result = invoked_history(&effects).last().unwrap().clone();
    assert_eq!(result.content, "Process exited with error: exit status: 2");
    assert!(state.process_output().is_empty());
}

#[test]
fn test_deferred_calls_resume_after_process() {
    let mut state = new_state();
    submit(&mut state, "build it");

    let deferred = vec![ToolCall::new("c2", "list_files", "{}")];
    let history = state.history().to_vec();
    state.update(suspend(
        AsyncToolRequest::RunCommand(ProcessRequest::new("make", vec![], "c1")),
        history,
        deferred.clone(),
    ));
    assert_eq!(state.deferred(), deferred.as_slice());

    let effects = state.update(AppEvent::ProcessExited(ProcessExit {
        call_id: "c1".into(),
        error: None,
    }));
    match effects.as_slice() {
        [Effect::InvokeAgent { deferred: sent, .. }] => assert_eq!(sent, &deferred),
        other => panic!("expected invocation, got {other:?}"),
    }
    assert!(state.deferred().is_empty());
}

#[test]
fn test_failed_resume_answers_deferred_calls() {
    let mut state = new_state();
    submit(&mut state, "build and list");

    let mut history = state.history().to_vec();
    history.push(Message::assistant_with_calls(
        "",
        vec![
            ToolCall::new("a", "run_command", r#"{"command":"make"}"#),
            ToolCall::new("b", "list_files", "{}"),
        ],
    ));
    state.update(suspend(
        AsyncToolRequest::RunCommand(ProcessRequest::new("make", vec![], "a")),
        history,
        vec![ToolCall::new("b", "list_files", "{}")],
    ));
    state.update(AppEvent::ProcessExited(ProcessExit {
        call_id: "a".into(),
        error: None,
    }));
    state.update(AppEvent::AgentFinished(Err(AgentError::NoResponse)));

    let answered: Vec<&str> = state
        .history()
        .iter()
        .filter_map(|m| m.tool_call_id.as_deref())
        .collect();
    assert_eq!(answered, ["a", "b"]);
    assert!(unlinked_tool_results(state.history()).is_empty());
    assert!(state.history()[state.history().len() - 2]
        .content
        .starts_with("Error executing tool: skipped"));
    assert!(state.history().last().unwrap().content.starts_with("**Error:**"));
    assert_eq!(state.phase(), Phase::Idle);
}

#[test]
fn test_failed_plain_turn_adds_no_tool_results() {
    let mut state = new_state();
    submit(&mut state, "hello");
    state.update(AppEvent::AgentFinished(Err(AgentError::NoResponse)));

    assert!(state.history().iter().all(|m| m.role != Role::Tool));
}

#[test]
fn test_window_open_and_close() {
    let mut state = new_state();
    state.update(AppEvent::Resize {
        width: 120,
        height: 40,
    });
    submit(&mut state, "show me");
    open_sidebar(&mut state);

    assert!(state.show_sidebar());
    assert!(state.layout().sidebar.is_some());
    let last = state.history().last().unwrap();
    assert_eq!(last.tool_call_id.as_deref(), Some("w1"));
    assert_eq!(last.content, "Window action 'open' triggered.");

    let history = state.history().to_vec();
    let effects = state.update(suspend(
        AsyncToolRequest::ManageWindow(WindowRequest {
            action: WindowAction::Close,
            target: "terminal".into(),
            call_id: "w2".into(),
        }),
        history,
        vec![],
    ));
    assert_eq!(effects.len(), 1);
    assert!(!state.show_sidebar());
    assert!(state.layout().sidebar.is_none());
}

// ============================================================================
// Keyboard
// ============================================================================

#[test]
fn test_quit_keys() {
    let mut state = new_state();
    assert!(matches!(state.update(ctrl('c')).as_slice(), [Effect::Quit]));
    assert!(matches!(state.update(ctrl('d')).as_slice(), [Effect::Quit]));
    assert!(matches!(state.update(key(KeyCode::Esc)).as_slice(), [Effect::Quit]));
}

#[test]
fn test_escape_closes_autocomplete_first() {
    let mut state = new_state();
    type_text(&mut state, "@ma");
    assert!(state.autocomplete().is_active());

    assert!(state.update(key(KeyCode::Esc)).is_empty());
    assert!(!state.autocomplete().is_active());
    assert_eq!(state.input(), "@ma");
}

#[test]
fn test_tab_completes_selected_file() {
    let mut state = new_state();
    type_text(&mut state, "explain @m");
    state.update(key(KeyCode::Down));
    state.update(key(KeyCode::Tab));

    assert_eq!(state.input(), "explain @model.go ");
    assert_eq!(state.cursor_position(), state.input().chars().count());
}

#[test]
fn test_enter_confirms_instead_of_submitting() {
    let mut state = new_state();
    type_text(&mut state, "@st");
    let effects = state.update(key(KeyCode::Enter));

    assert!(effects.is_empty());
    assert_eq!(state.input(), "@styles.go ");
    assert_eq!(state.phase(), Phase::Idle);
}

#[test]
fn test_release_events_are_ignored() {
    let mut state = new_state();
    let mut release = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
    release.kind = KeyEventKind::Release;
    state.update(AppEvent::Key(release));
    assert!(state.input().is_empty());
}

#[test]
fn test_cursor_editing_with_multibyte_input() {
    let mut state = new_state();
    type_text(&mut state, "héllo");
    state.update(key(KeyCode::Left));
    state.update(key(KeyCode::Left));
    state.update(key(KeyCode::Backspace));
    assert_eq!(state.input(), "hélo");
    assert_eq!(state.cursor_position(), 2);

    state.update(key(KeyCode::Home));
    state.update(key(KeyCode::Char('>')));
    assert_eq!(state.input(), ">hélo");
}

#[test]
fn test_paste_flattens_newlines() {
    let mut state = new_state();
    state.update(AppEvent::Paste("one\ntwo".into()));
    assert_eq!(state.input(), "one two");
}

#[test]
fn test_scrolling() {
    let mut state = new_state();
    state.update(key(KeyCode::PageUp));
    assert_eq!(state.scroll_offset(), 10);
    state.update(key(KeyCode::Down));
    assert_eq!(state.scroll_offset(), 9);
    state.update(key(KeyCode::PageDown));
    assert_eq!(state.scroll_offset(), 0);
}

#[test]
fn test_dirty_tracking() {
    let mut state = new_state();
    assert!(state.needs_render());
    state.mark_rendered();
    assert!(!state.needs_render());

    state.update(AppEvent::Tick);
    assert!(state.needs_render());
}
