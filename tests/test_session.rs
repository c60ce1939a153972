//! Integration tests for `GdbSession` driven against a mock MI-speaking
//! subprocess (`tests/fixtures/mock-gdb.sh`) rather than a real GDB install,
//! mirroring the original implementation's `mock-gdb.sh`-based test fixture
//! (`test-session.c`) so the pipeline's phases -- write, settle, read until
//! prompt, classify -- are exercised end to end without an external
//! dependency.

use gdb_mcp_server::enums::SessionState;
use gdb_mcp_server::error::GdbError;
use gdb_mcp_server::session::GdbSession;

fn mock_gdb_path() -> String {
    format!("{}/tests/fixtures/mock-gdb.sh", env!("CARGO_MANIFEST_DIR"))
}

async fn started_session(id: &str) -> GdbSession {
    let session = GdbSession::new(id.to_string(), mock_gdb_path(), None, 5000);
    session.start().await.expect("mock gdb should start");
    session
}

#[tokio::test]
async fn start_reaches_ready_state() {
    let session = started_session("start-1").await;
    assert_eq!(session.state().await, SessionState::Ready);
}

#[tokio::test]
async fn start_with_invalid_path_is_spawn_failed() {
    let session = GdbSession::new("bad-path".into(), "/nonexistent/gdb/path".into(), None, 5000);
    let err = session.start().await.unwrap_err();
    assert!(matches!(err, GdbError::SpawnFailed(_)));
    assert_eq!(session.state().await, SessionState::Error);
}

#[tokio::test]
async fn second_start_is_already_running() {
    let session = started_session("start-2").await;
    let err = session.start().await.unwrap_err();
    assert_eq!(err, GdbError::AlreadyRunning);
}

#[tokio::test]
async fn execute_done_command_returns_raw_text_without_error() {
    let session = started_session("exec-done").await;
    let out = session.execute("print x").await.unwrap();
    assert!(out.contains(r#"value="42""#));
    assert_eq!(session.state().await, SessionState::Ready);
}

#[tokio::test]
async fn execute_error_command_completes_with_command_failed() {
    let session = started_session("exec-error").await;
    let err = session.execute("print undefined_symbol").await.unwrap_err();
    match err {
        GdbError::CommandFailed(msg) => {
            assert!(msg.contains("No symbol"));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
    // The session remains usable after a command failure.
    assert_eq!(session.state().await, SessionState::Ready);
}

#[tokio::test]
async fn continue_couples_running_to_the_following_stopped() {
    let session = started_session("exec-continue").await;
    let out = session.execute("continue").await.unwrap();
    assert!(out.contains("^running"));
    assert!(out.contains("*stopped"));
    // Completion must not fire on the prompt that follows `^running` alone --
    // the accumulated text must also contain the `*stopped` record that
    // followed it, and the session's externally visible state reflects it.
    assert_eq!(session.state().await, SessionState::Stopped);
}

#[tokio::test]
async fn command_after_stopped_is_admitted() {
    let session = started_session("exec-resume").await;
    session.execute("continue").await.unwrap();
    assert_eq!(session.state().await, SessionState::Stopped);
    // Stopped is one of the two states that accept commands.
    let out = session.execute("print x").await.unwrap();
    assert!(out.contains(r#"value="42""#));
}

#[tokio::test]
async fn execute_mi_returns_parsed_records() {
    let session = started_session("exec-mi").await;
    let records = session.execute_mi("print x").await.unwrap();
    assert!(!records.is_empty());
    let has_done = records.iter().any(|r| {
        matches!(
            r,
            gdb_mcp_server::mi::MiRecord::Result {
                class: gdb_mcp_server::mi::ResultClass::Done,
                ..
            }
        )
    });
    assert!(has_done, "expected a Done result among {records:?}");
}

#[tokio::test]
async fn subprocess_exit_during_command_is_command_failed_and_terminates() {
    let session = started_session("exec-crash").await;
    let err = session.execute("crash-session").await.unwrap_err();
    assert!(matches!(err, GdbError::CommandFailed(_)));
    assert_eq!(session.state().await, SessionState::Terminated);
}

#[tokio::test]
async fn terminate_reaches_terminated_state_and_is_idempotent() {
    let session = started_session("terminate-1").await;
    session.terminate().await;
    assert_eq!(session.state().await, SessionState::Terminated);
    session.terminate().await;
    assert_eq!(session.state().await, SessionState::Terminated);
}

#[tokio::test]
async fn execute_after_terminate_is_session_not_ready() {
    let session = started_session("terminate-2").await;
    session.terminate().await;
    let err = session.execute("print x").await.unwrap_err();
    assert_eq!(err, GdbError::SessionNotReady);
}

#[tokio::test]
async fn state_changed_and_ready_events_are_published_on_start() {
    let session = GdbSession::new("events-1".into(), mock_gdb_path(), None, 5000);
    let mut events = session.subscribe();
    session.start().await.unwrap();

    let mut saw_ready = false;
    let mut saw_state_change_to_ready = false;
    while let Ok(event) = events.try_recv() {
        match event {
            gdb_mcp_server::session::SessionEvent::Ready => saw_ready = true,
            gdb_mcp_server::session::SessionEvent::StateChanged {
                new: SessionState::Ready,
                ..
            } => saw_state_change_to_ready = true,
            _ => {}
        }
    }
    assert!(saw_ready, "expected a Ready event");
    assert!(saw_state_change_to_ready, "expected a StateChanged event to Ready");
}
