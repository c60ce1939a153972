//! Integration tests for `GdbMcpServer`'s tool catalogue over an in-process
//! MCP transport (`tokio::io::duplex`). Tool replies here are plain text
//! (not JSON), per `server.rs`'s `text()`/`err_result()` helpers, so
//! assertions match on substrings rather than parsed fields.

use gdb_mcp_server::server::GdbMcpServer;
use rmcp::model::*;
use rmcp::{ClientHandler, ServiceExt};
use serde_json::Value;

#[derive(Default, Clone)]
struct TestClient;

impl ClientHandler for TestClient {}

fn mock_gdb_path() -> String {
    format!("{}/tests/fixtures/mock-gdb.sh", env!("CARGO_MANIFEST_DIR"))
}

async fn setup() -> rmcp::service::RunningService<
    rmcp::service::RoleClient,
    impl rmcp::service::Service<rmcp::service::RoleClient>,
> {
    let (server_transport, client_transport) = tokio::io::duplex(65536);

    let server = GdbMcpServer::new(mock_gdb_path());
    tokio::spawn(async move {
        let service = server.serve(server_transport).await.unwrap();
        let _ = service.waiting().await;
    });

    let client = TestClient::default();
    client.serve(client_transport).await.unwrap()
}

async fn call_tool(
    client: &rmcp::service::RunningService<
        rmcp::service::RoleClient,
        impl rmcp::service::Service<rmcp::service::RoleClient>,
    >,
    name: &str,
    args: Value,
) -> (String, bool) {
    let params = CallToolRequestParams {
        meta: None,
        name: name.to_string().into(),
        arguments: Some(serde_json::from_value(args).unwrap()),
        task: None,
    };
    let request = ClientRequest::CallToolRequest(Request::new(params));
    let response = client.send_request(request).await.unwrap();

    let ServerResult::CallToolResult(result) = response else {
        panic!("expected CallToolResult, got {response:?}");
    };

    let text = result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("");

    (text, result.is_error.unwrap_or(false))
}

#[tokio::test]
async fn gdb_list_sessions_starts_empty() {
    let client = setup().await;
    let (text, is_error) = call_tool(&client, "gdb_list_sessions", serde_json::json!({})).await;
    assert!(!is_error);
    assert_eq!(text, "No active sessions.");
    client.cancel().await.unwrap();
}

#[tokio::test]
async fn gdb_start_then_list_then_terminate() {
    let client = setup().await;

    let (start_text, is_error) =
        call_tool(&client, "gdb_start", serde_json::json!({})).await;
    assert!(!is_error);
    assert!(start_text.contains("Session ID:"));
    let session_id = start_text
        .lines()
        .find_map(|l| l.strip_prefix("Session ID: "))
        .expect("reply should include a session id")
        .to_string();

    let (list_text, _) = call_tool(&client, "gdb_list_sessions", serde_json::json!({})).await;
    assert!(list_text.contains(&session_id));
    assert!(list_text.contains("State: ready"));

    let (term_text, is_error) = call_tool(
        &client,
        "gdb_terminate",
        serde_json::json!({"sessionId": session_id}),
    )
    .await;
    assert!(!is_error);
    assert!(term_text.contains("terminated"));

    let (list_text, _) = call_tool(&client, "gdb_list_sessions", serde_json::json!({})).await;
    assert_eq!(list_text, "No active sessions.");

    client.cancel().await.unwrap();
}

#[tokio::test]
async fn gdb_terminate_unknown_session_reports_no_active_session() {
    let client = setup().await;
    let (text, is_error) = call_tool(
        &client,
        "gdb_terminate",
        serde_json::json!({"sessionId": "nope"}),
    )
    .await;
    assert!(is_error);
    assert!(text.contains("No active GDB session"));
    client.cancel().await.unwrap();
}

#[tokio::test]
async fn gdb_print_on_unknown_session_is_an_error_result() {
    let client = setup().await;
    let (text, is_error) = call_tool(
        &client,
        "gdb_print",
        serde_json::json!({"sessionId": "nope", "expression": "x"}),
    )
    .await;
    assert!(is_error);
    assert!(text.contains("No active GDB session with ID: nope"));
    client.cancel().await.unwrap();
}

#[tokio::test]
async fn gdb_command_round_trips_through_a_real_session() {
    let client = setup().await;

    let (start_text, _) = call_tool(&client, "gdb_start", serde_json::json!({})).await;
    let session_id = start_text
        .lines()
        .find_map(|l| l.strip_prefix("Session ID: "))
        .unwrap()
        .to_string();

    let (out, is_error) = call_tool(
        &client,
        "gdb_command",
        serde_json::json!({"sessionId": session_id, "command": "print x"}),
    )
    .await;
    assert!(!is_error);
    assert!(out.contains(r#"value="42""#));

    call_tool(
        &client,
        "gdb_terminate",
        serde_json::json!({"sessionId": session_id}),
    )
    .await;
    client.cancel().await.unwrap();
}

#[tokio::test]
async fn command_failure_is_prefixed_with_the_failing_action() {
    let client = setup().await;

    let (start_text, _) = call_tool(&client, "gdb_start", serde_json::json!({})).await;
    let session_id = start_text
        .lines()
        .find_map(|l| l.strip_prefix("Session ID: "))
        .unwrap()
        .to_string();

    let (out, is_error) = call_tool(
        &client,
        "gdb_print",
        serde_json::json!({"sessionId": session_id, "expression": "undefined_symbol"}),
    )
    .await;
    assert!(is_error);
    assert!(out.starts_with("Failed to print expression: "));
    assert!(out.contains("No symbol"));

    call_tool(
        &client,
        "gdb_terminate",
        serde_json::json!({"sessionId": session_id}),
    )
    .await;
    client.cancel().await.unwrap();
}

#[tokio::test]
async fn gdb_set_breakpoint_reports_the_location() {
    let client = setup().await;

    let (start_text, _) = call_tool(&client, "gdb_start", serde_json::json!({})).await;
    let session_id = start_text
        .lines()
        .find_map(|l| l.strip_prefix("Session ID: "))
        .unwrap()
        .to_string();

    let (out, is_error) = call_tool(
        &client,
        "gdb_set_breakpoint",
        serde_json::json!({"sessionId": session_id, "location": "main"}),
    )
    .await;
    assert!(!is_error);
    assert!(out.contains("Breakpoint set at: main"));
    assert!(out.contains("Breakpoint 1 at"));

    call_tool(
        &client,
        "gdb_terminate",
        serde_json::json!({"sessionId": session_id}),
    )
    .await;
    client.cancel().await.unwrap();
}
