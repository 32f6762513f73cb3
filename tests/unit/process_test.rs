//! Tests for the streaming process runner.

use std::path::Path;

use trace_agent::shell::{spawn_process, ProcessEvent, ProcessRequest, ProcessRun};

use crate::common::TestContext;

async fn collect(run: &mut ProcessRun) -> Vec<ProcessEvent> {
    let mut events = Vec::new();
    while let Some(event) = run.next_event().await {
        events.push(event);
    }
    events
}

fn sh(script: &str, call_id: &str) -> ProcessRequest {
    ProcessRequest::new("sh", vec!["-c".into(), script.into()], call_id)
}

#[cfg(unix)]
#[tokio::test]
async fn test_lines_then_clean_exit() {
    let mut run = spawn_process(&sh("echo a; echo b", "c1"), Path::new("."));
    let events = collect(&mut run).await;

    assert_eq!(events.len(), 3);
    assert_eq!(events[0], ProcessEvent::Output("a".into()));
    assert_eq!(events[1], ProcessEvent::Output("b".into()));
    match &events[2] {
        ProcessEvent::Exited(exit) => {
            assert_eq!(exit.call_id, "c1");
            assert!(exit.error.is_none());
        }
        other => panic!("expected exit, got {other:?}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn test_stderr_is_streamed() {
    let mut run = spawn_process(&sh("echo oops >&2; exit 3", "c2"), Path::new("."));
    let events = collect(&mut run).await;

    assert_eq!(events[0], ProcessEvent::Output("oops".into()));
    let Some(ProcessEvent::Exited(exit)) = events.last() else {
        panic!("expected exit event last");
    };
    assert!(exit.error.as_deref().unwrap().contains('3'));
}

#[cfg(unix)]
#[tokio::test]
async fn test_runs_in_working_dir() {
    let ctx = TestContext::new();
    ctx.create_file("marker.txt", "");

    let mut run = spawn_process(&sh("ls", "c3"), &ctx.path());
    let events = collect(&mut run).await;
    assert!(events.contains(&ProcessEvent::Output("marker.txt".into())));
}

#[cfg(unix)]
#[tokio::test]
async fn test_crlf_and_partial_last_line() {
    let mut run = spawn_process(&sh(r"printf 'one\r\ntwo'", "c4"), Path::new("."));
    let events = collect(&mut run).await;

    assert_eq!(events[0], ProcessEvent::Output("one".into()));
    assert_eq!(events[1], ProcessEvent::Output("two".into()));
    assert!(matches!(events[2], ProcessEvent::Exited(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_dropped_run_does_not_block_child() {
    let run = spawn_process(&sh("seq 1 2000", "old"), Path::new("."));
    drop(run);

    let mut fresh = spawn_process(&sh("echo fresh", "new"), Path::new("."));
    let events = collect(&mut fresh).await;
    assert_eq!(events[0], ProcessEvent::Output("fresh".into()));
    assert_eq!(fresh.call_id(), "new");
}

#[tokio::test]
async fn test_missing_binary_reports_start_failure() {
    let request = ProcessRequest::new("definitely-not-a-real-binary-xyz", vec![], "c5");
    let mut run = spawn_process(&request, Path::new("."));
    let events = collect(&mut run).await;

    assert_eq!(events.len(), 1);
    let ProcessEvent::Exited(exit) = &events[0] else {
        panic!("expected exit event");
    };
    assert!(exit.error.as_deref().unwrap().contains("failed to start"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_background_child_does_not_hold_back_exit() {
    let mut run = spawn_process(&sh("echo started; sleep 20 &", "c8"), Path::new("."));

    let events = tokio::time::timeout(std::time::Duration::from_secs(5), collect(&mut run))
        .await
        .expect("exit event should arrive while the background child still runs");

    assert_eq!(events.first(), Some(&ProcessEvent::Output("started".into())));
    match events.last() {
        Some(ProcessEvent::Exited(exit)) => {
            assert_eq!(exit.call_id, "c8");
            assert!(exit.error.is_none());
        }
        other => panic!("expected exit, got {other:?}"),
    }
}
