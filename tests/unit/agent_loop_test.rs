//! Tests for the bounded tool-call loop, driven by a scripted client.

use std::sync::Arc;

use trace_agent::api::CompletionClient;
use trace_agent::app::tool_loop::{AsyncToolRequest, ToolLoop, TurnOutcome};
use trace_agent::error::{AgentError, ApiError};
use trace_agent::tools::ToolRegistry;
use trace_agent::types::{Message, Role};

use crate::common::{call, text_reply, tool_reply, ScriptedClient, TestContext};

fn tool_loop(client: &Arc<ScriptedClient>, ctx: &TestContext) -> ToolLoop {
    let client: Arc<dyn CompletionClient> = client.clone();
    ToolLoop::new(client, Arc::new(ToolRegistry::with_defaults(ctx.path())))
}

fn list_files_call(n: usize) -> trace_agent::types::ToolCall {
    call(&format!("call_{n}"), "list_files", "{}")
}

// ============================================================================
// Iteration bound
// ============================================================================

#[tokio::test]
async fn test_final_on_tenth_call() {
    let ctx = TestContext::new();
    let mut script: Vec<_> = (0..9).map(|n| tool_reply(vec![list_files_call(n)])).collect();
    script.push(text_reply("done"));
    let client = ScriptedClient::replying(script);

    let outcome = tool_loop(&client, &ctx)
        .invoke(vec![Message::user("go")])
        .await
        .unwrap();

    match outcome {
        TurnOutcome::Final { content, history } => {
            assert_eq!(content, "done");
            assert_eq!(history.last().unwrap().content, "done");
        }
        other => panic!("expected final outcome, got {other:?}"),
    }
    assert_eq!(client.call_count(), 10);
}

#[tokio::test]
async fn test_max_iterations_after_exactly_ten_calls() {
    let ctx = TestContext::new();
    let script: Vec<_> = (0..12).map(|n| tool_reply(vec![list_files_call(n)])).collect();
    let client = ScriptedClient::replying(script);

    let err = tool_loop(&client, &ctx)
        .invoke(vec![Message::user("go")])
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::MaxIterations(10)));
    assert_eq!(client.call_count(), 10);
}

#[tokio::test]
async fn test_custom_bound() {
    let ctx = TestContext::new();
    let script: Vec<_> = (0..5).map(|n| tool_reply(vec![list_files_call(n)])).collect();
    let client = ScriptedClient::replying(script);

    let err = tool_loop(&client, &ctx)
        .with_max_iterations(3)
        .invoke(vec![Message::user("go")])
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::MaxIterations(3)));
    assert_eq!(client.call_count(), 3);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_tool_error_does_not_abort() {
    let ctx = TestContext::new();
    let client = ScriptedClient::replying(vec![
        tool_reply(vec![call("c1", "read_file", r#"{"path":"missing.txt"}"#)]),
        text_reply("that file does not exist"),
    ]);

    let outcome = tool_loop(&client, &ctx)
        .invoke(vec![Message::user("read it")])
        .await
        .unwrap();
    assert!(matches!(outcome, TurnOutcome::Final { .. }));

    let second = &client.requests()[1];
    let result = second
        .iter()
        .find(|m| m.role == Role::Tool)
        .expect("tool result in second request");
    assert_eq!(result.tool_call_id.as_deref(), Some("c1"));
    assert!(result.content.starts_with("Error executing tool: "));
    assert!(result.content.len() > "Error executing tool: ".len());
}

#[tokio::test]
async fn test_unknown_tool_is_reported_to_model() {
    let ctx = TestContext::new();
    let client = ScriptedClient::replying(vec![
        tool_reply(vec![call("c1", "teleport", "{}")]),
        text_reply("sorry"),
    ]);

    tool_loop(&client, &ctx)
        .invoke(vec![Message::user("beam me up")])
        .await
        .unwrap();

    let tool_message = client.requests()[1].last().cloned().unwrap();
    assert_eq!(tool_message.content, "Error executing tool: unknown tool: teleport");
}

#[tokio::test]
async fn test_api_error_is_terminal() {
    let ctx = TestContext::new();
    let client = ScriptedClient::new(vec![Err(ApiError::Status {
        status: 500,
        body: "boom".to_string(),
    })]);

    let err = tool_loop(&client, &ctx)
        .invoke(vec![Message::user("hi")])
        .await
        .unwrap_err();

    assert!(matches!(err, AgentError::Api(_)));
    assert!(err.to_string().contains("boom"));
    assert_eq!(client.call_count(), 1);
}

#[tokio::test]
async fn test_no_choices_is_no_response() {
    let ctx = TestContext::new();
    let client = ScriptedClient::replying(vec![]);

    let err = tool_loop(&client, &ctx)
        .invoke(vec![Message::user("hi")])
        .await
        .unwrap_err();
    assert!(matches!(err, AgentError::NoResponse));
}

// ============================================================================
// Out-of-band tools
// ============================================================================

#[tokio::test]
async fn test_run_command_suspends_with_sync_results_in_history() {
    let ctx = TestContext::new();
    ctx.create_file("a.txt", "alpha");
    let client = ScriptedClient::replying(vec![tool_reply(vec![
        call("c1", "read_file", r#"{"path":"a.txt"}"#),
        call("c2", "run_command", r#"{"command":"cargo","args":["test"]}"#),
        call("c3", "list_files", "{}"),
    ])]);

    let outcome = tool_loop(&client, &ctx)
        .invoke(vec![Message::user("test it")])
        .await
        .unwrap();

    let TurnOutcome::Suspend {
        request,
        history,
        deferred,
    } = outcome
    else {
        panic!("expected suspension");
    };

    match request {
        AsyncToolRequest::RunCommand(process) => {
            assert_eq!(process.command, "cargo");
            assert_eq!(process.args, vec!["test".to_string()]);
            assert_eq!(process.call_id, "c2");
        }
        other => panic!("expected run_command, got {other:?}"),
    }
    assert_eq!(deferred.len(), 1);
    assert_eq!(deferred[0].id, "c3");

    let read = history.last().unwrap();
    assert_eq!(read.tool_call_id.as_deref(), Some("c1"));
    assert!(read.content.contains("alpha"));
}

#[tokio::test]
async fn test_resume_continues_after_suspension() {
    let ctx = TestContext::new();
    let client = ScriptedClient::replying(vec![text_reply("all tests pass")]);
    let tl = tool_loop(&client, &ctx);

    let history = vec![
        Message::user("test it"),
        Message::assistant_with_calls(
            "",
            vec![
                call("c2", "run_command", r#"{"command":"true"}"#),
                call("c3", "list_files", "{}"),
            ],
        ),
        Message::tool_result("c2", "Process finished successfully."),
    ];

    let outcome = tl
        .resume(history, vec![call("c3", "list_files", "{}")])
        .await
        .unwrap();
    assert!(matches!(outcome, TurnOutcome::Final { .. }));

    let sent = &client.requests()[0];
    let ids: Vec<_> = sent
        .iter()
        .filter_map(|m| m.tool_call_id.as_deref())
        .collect();
    assert_eq!(ids, vec!["c2", "c3"]);
}
