//! Application core
//!
//! [`run`] owns the terminal and the single-threaded dispatcher. Keyboard
//! input, agent outcomes, process events and throbber ticks are funneled
//! into [`AppState::update`] one at a time; the returned effects spawn the
//! background work that later feeds events back in.

use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};

pub mod autocomplete;
pub mod event;
pub mod state;
pub mod tags;
pub mod tool_loop;

use event::{AppEvent, Effect};
use state::AppState;
use tool_loop::ToolLoop;

use crate::api::OpenAiClient;
use crate::session::export_transcript;
use crate::shell::{spawn_process, ProcessEvent, ProcessRun};
use crate::terminal::{install_panic_hook, TerminalGuard, TraceTerminal};
use crate::tools::{project_files, ToolRegistry};
use crate::tui;

pub use crate::types::Config;

const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Runs the UI until the user quits, then exports the transcript.
///
/// # Errors
///
/// Returns an error if the API client or the terminal cannot be set up, or
/// if drawing fails.
pub async fn run(config: Config) -> Result<()> {
    let Config {
        api_key,
        base_url,
        model,
        working_dir,
        system_prompt,
        greeting,
        max_iterations,
    } = config;
    let files = project_files(&working_dir);
    info!(dir = %working_dir.display(), files = files.len(), "Indexed project files");

    let registry = Arc::new(ToolRegistry::with_defaults(working_dir.clone()));
    let client =
        OpenAiClient::new(&base_url, api_key, model).context("Failed to create API client")?;
    let tool_loop =
        Arc::new(ToolLoop::new(Arc::new(client), registry).with_max_iterations(max_iterations));

    let mut state = AppState::new(working_dir, files)
        .with_status(tool_loop.model(), tool_loop.tool_count());

    install_panic_hook();
    let mut guard = TerminalGuard::setup().context("Failed to initialize terminal")?;

    let initial = state.seed(&system_prompt, greeting);
    let result = event_loop(guard.terminal_mut(), &tool_loop, &mut state, initial).await;
    drop(guard);

    match export_transcript(state.history(), state.working_dir()).await {
        Ok(Some(path)) => info!(path = %path.display(), "Session saved"),
        Ok(None) => {}
        Err(e) => warn!(error = %e, "Failed to export transcript"),
    }

    result
}

/// What woke the dispatcher up.
enum Incoming {
    Terminal(Event),
    TerminalClosed,
    App(AppEvent),
    /// `None` once the current run has delivered its exit event.
    Process(Option<ProcessEvent>),
    Tick,
}

async fn next_process_event(run: &mut Option<ProcessRun>) -> Option<ProcessEvent> {
    match run {
        Some(run) => run.next_event().await,
        None => std::future::pending().await,
    }
}

/// Performs `effects`. Returns `true` when the UI should exit.
fn apply_effects(
    effects: Vec<Effect>,
    tool_loop: &Arc<ToolLoop>,
    state: &AppState,
    tx: &mpsc::UnboundedSender<AppEvent>,
    process: &mut Option<ProcessRun>,
) -> bool {
    let mut quit = false;

    for effect in effects {
        match effect {
            Effect::InvokeAgent { history, deferred } => {
                debug!(messages = history.len(), deferred = deferred.len(), "Invoking agent");
                let tool_loop = Arc::clone(tool_loop);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let outcome = tool_loop.resume(history, deferred).await;
                    let _ = tx.send(AppEvent::AgentFinished(outcome));
                });
            }
            Effect::StartProcess(request) => {
                if let Some(stale) = process.take() {
                    warn!(call_id = %stale.call_id(), "Discarding unfinished process run");
                }
                *process = Some(spawn_process(&request, state.working_dir()));
            }
            Effect::Schedule(event) => {
                let _ = tx.send(event);
            }
            Effect::Quit => quit = true,
        }
    }

    quit
}

async fn event_loop(
    terminal: &mut TraceTerminal,
    tool_loop: &Arc<ToolLoop>,
    state: &mut AppState,
    initial: Vec<Effect>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut events = EventStream::new();
    let mut process: Option<ProcessRun> = None;
    let mut throbber_interval = interval(TICK_INTERVAL);

    let size = terminal.size().context("Failed to read terminal size")?;
    state.update(AppEvent::Resize {
        width: size.width,
        height: size.height,
    });
    if apply_effects(initial, tool_loop, state, &tx, &mut process) {
        return Ok(());
    }

    loop {
        if state.needs_render() {
            terminal.draw(|frame| tui::render(frame, state))?;
            state.mark_rendered();
        }

        let incoming = tokio::select! {
            biased;

            event = events.next() => match event {
                Some(Ok(event)) => Incoming::Terminal(event),
                Some(Err(e)) => {
                    warn!(error = %e, "Failed to read terminal event");
                    continue;
                }
                None => Incoming::TerminalClosed,
            },

            Some(event) = rx.recv() => Incoming::App(event),

            event = next_process_event(&mut process) => Incoming::Process(event),

            _ = throbber_interval.tick(), if state.is_thinking() => Incoming::Tick,
        };

        let event = match incoming {
            Incoming::Terminal(Event::Key(key)) => AppEvent::Key(key),
            Incoming::Terminal(Event::Paste(text)) => AppEvent::Paste(text),
            Incoming::Terminal(Event::Resize(width, height)) => AppEvent::Resize { width, height },
            Incoming::Terminal(_) => continue,
            Incoming::TerminalClosed => {
                info!("Terminal event stream closed");
                break;
            }
            Incoming::App(event) => event,
            Incoming::Process(Some(ProcessEvent::Output(line))) => AppEvent::ProcessOutput(line),
            Incoming::Process(Some(ProcessEvent::Exited(exit))) => AppEvent::ProcessExited(exit),
            Incoming::Process(None) => {
                process = None;
                continue;
            }
            Incoming::Tick => AppEvent::Tick,
        };

        let effects = state.update(event);
        if apply_effects(effects, tool_loop, state, &tx, &mut process) {
            info!("Quit requested");
            break;
        }
    }

    Ok(())
}
