//! Process runner with streamed output.
//!
//! [`spawn_process`] starts a command with piped stdout and stderr. Two
//! reader tasks publish each line onto a shared channel and a waiter task
//! publishes exactly one [`ProcessExit`] once the child has exited and both
//! readers stopped. The consumer drives everything through
//! [`ProcessRun::next_event`].
//!
//! After the child exits, a reader keeps going only while its pipe yields
//! data within [`EXIT_GRACE`]. Background grandchildren that inherited the
//! pipes therefore cannot hold back the exit event.
//!
//! The line channel has capacity 1, so a consumer that stops draining stalls
//! the readers. Dropping the [`ProcessRun`] discards the run: readers keep
//! draining their pipes so the child can finish, but nothing is delivered.
//!
//! # Examples
//!
//! ```no_run
//! use trace_agent::shell::{spawn_process, ProcessEvent, ProcessRequest};
//!
//! # async fn example() {
//! let request = ProcessRequest::new("git", vec!["status".into()], "call_1");
//! let mut run = spawn_process(&request, std::path::Path::new("."));
//! while let Some(event) = run.next_event().await {
//!     match event {
//!         ProcessEvent::Output(line) => println!("{line}"),
//!         ProcessEvent::Exited(exit) => println!("done: {:?}", exit.error),
//!     }
//! }
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// How long a pipe may stay silent after the child exited before its reader
/// gives up on it.
pub const EXIT_GRACE: Duration = Duration::from_millis(500);

/// Substitutes tried when a command is not on `PATH`.
const BINARY_FALLBACKS: &[(&str, &str)] = &[("python", "python3"), ("pip", "pip3")];

fn find_on_path(program: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Resolves `command` to an executable name, applying the fallback table when
/// the command itself is not on `PATH`.
///
/// Commands containing a path separator are returned unchanged.
///
/// ```
/// use trace_agent::shell::resolve_binary;
///
/// assert_eq!(resolve_binary("./build.sh"), "./build.sh");
/// ```
#[must_use]
pub fn resolve_binary(command: &str) -> String {
    if command.contains(std::path::MAIN_SEPARATOR) || command.contains('/') {
        return command.to_string();
    }
    if find_on_path(command).is_some() {
        return command.to_string();
    }

    BINARY_FALLBACKS
        .iter()
        .find(|(missing, substitute)| *missing == command && find_on_path(substitute).is_some())
        .map_or_else(|| command.to_string(), |(_, substitute)| (*substitute).to_string())
}

/// A command to run on behalf of a tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRequest {
    pub command: String,
    pub args: Vec<String>,
    /// The tool call this process answers.
    pub call_id: String,
}

impl ProcessRequest {
    #[must_use]
    pub fn new(command: impl Into<String>, args: Vec<String>, call_id: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args,
            call_id: call_id.into(),
        }
    }

    /// The command line as shown to the user.
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Terminal event of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    pub call_id: String,
    /// `None` when the process exited successfully.
    pub error: Option<String>,
}

/// Event yielded by a [`ProcessRun`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// One line of stdout or stderr, without its line terminator.
    Output(String),
    /// The process finished. Always the last event.
    Exited(ProcessExit),
}

/// Handle to one running process.
#[derive(Debug)]
pub struct ProcessRun {
    call_id: String,
    output: mpsc::Receiver<String>,
    done: Option<oneshot::Receiver<ProcessExit>>,
}

impl ProcessRun {
    /// The tool call this run answers.
    #[must_use]
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Waits for the next event. Returns `None` after the exit event.
    ///
    /// Cancel-safe: dropping the future loses no events.
    pub async fn next_event(&mut self) -> Option<ProcessEvent> {
        if let Some(line) = self.output.recv().await {
            return Some(ProcessEvent::Output(line));
        }

        let done = self.done.as_mut()?;
        let exit = done.await.unwrap_or_else(|_| ProcessExit {
            call_id: self.call_id.clone(),
            error: Some("process runner stopped unexpectedly".to_string()),
        });
        self.done = None;
        Some(ProcessEvent::Exited(exit))
    }
}

/// Sends one line without its terminator. Returns `false` once the run is
/// discarded.
async fn forward(raw: &[u8], lines: &mpsc::Sender<String>) -> bool {
    let line = String::from_utf8_lossy(raw)
        .trim_end_matches('\n')
        .trim_end_matches('\r')
        .to_string();
    lines.send(line).await.is_ok()
}

fn spawn_reader<R>(
    pipe: R,
    lines: mpsc::Sender<String>,
    mut exited: watch::Receiver<bool>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        let mut forwarding = true;
        let mut child_done = false;

        loop {
            // `read_until` keeps partial data in `buf` when cancelled, so a
            // retry continues the same line.
            let read = if child_done {
                match timeout(EXIT_GRACE, reader.read_until(b'\n', &mut buf)).await {
                    Ok(read) => read,
                    Err(_) => {
                        debug!("Pipe still open after exit, detaching reader");
                        break;
                    }
                }
            } else {
                tokio::select! {
                    read = reader.read_until(b'\n', &mut buf) => read,
                    _ = exited.changed() => {
                        child_done = true;
                        continue;
                    }
                }
            };

            match read {
                Ok(0) => break,
                Ok(_) if !forwarding => {}
                Ok(_) => {
                    if !forward(&buf, &lines).await {
                        // Run discarded; keep the pipe empty until EOF.
                        forwarding = false;
                    }
                }
                Err(e) => {
                    debug!(error = %e, "Pipe read failed");
                    break;
                }
            }
            buf.clear();
        }

        if forwarding && !buf.is_empty() {
            forward(&buf, &lines).await;
        }
    })
}

/// Starts `request` in `working_dir` and returns a handle to its events.
///
/// Must be called inside a tokio runtime. A start failure is reported as an
/// immediate exit event carrying the error; no output events precede it.
pub fn spawn_process(request: &ProcessRequest, working_dir: &Path) -> ProcessRun {
    let (line_tx, line_rx) = mpsc::channel(1);
    let (done_tx, done_rx) = oneshot::channel();
    let program = resolve_binary(&request.command);
    let call_id = request.call_id.clone();

    let spawned = Command::new(&program)
        .args(&request.args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn();

    match spawned {
        Err(e) => {
            warn!(command = %program, error = %e, "Failed to start process");
            let _ = done_tx.send(ProcessExit {
                call_id: call_id.clone(),
                error: Some(format!("failed to start {program}: {e}")),
            });
        }
        Ok(mut child) => {
            info!(command = %program, args = ?request.args, call_id = %call_id, "Process started");
            let (exited_tx, exited_rx) = watch::channel(false);
            let readers: Vec<JoinHandle<()>> = [
                child
                    .stdout
                    .take()
                    .map(|out| spawn_reader(out, line_tx.clone(), exited_rx.clone())),
                child
                    .stderr
                    .take()
                    .map(|err| spawn_reader(err, line_tx.clone(), exited_rx.clone())),
            ]
            .into_iter()
            .flatten()
            .collect();

            let waiter_call_id = call_id.clone();
            tokio::spawn(async move {
                let status = child.wait().await;
                let _ = exited_tx.send(true);
                for reader in readers {
                    let _ = reader.await;
                }

                let error = match status {
                    Ok(status) if status.success() => None,
                    Ok(status) => Some(status.to_string()),
                    Err(e) => Some(e.to_string()),
                };
                debug!(call_id = %waiter_call_id, error = ?error, "Process exited");
                let _ = done_tx.send(ProcessExit {
                    call_id: waiter_call_id,
                    error,
                });
            });
        }
    }
    drop(line_tx);

    ProcessRun {
        call_id,
        output: line_rx,
        done: Some(done_rx),
    }
}
