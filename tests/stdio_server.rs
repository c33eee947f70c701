//! JSON-RPC session over an in-memory stdio pair.

use std::sync::Arc;

use fsgate::audit::MemoryAuditSink;
use fsgate::server::JsonRpcResponse;
use fsgate::{Config, Gateway};
use serde_json::{Value, json};

fn session(input: &[Value]) -> String {
    input
        .iter()
        .map(|v| v.to_string() + "\n")
        .collect::<String>()
}

#[tokio::test]
async fn full_session_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "line one").unwrap();

    let mut config = Config::default();
    config.policy.allowed_directories = vec![dir.path().display().to_string()];
    config.audit.caller = "stdio-test".to_string();
    let audit = MemoryAuditSink::new();
    let gateway = Gateway::with_sink(config, Arc::new(audit.clone()));

    let input = session(&[
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {
            "name": "read_file",
            "arguments": {"filepath": format!("{}/notes.txt", dir.path().display())}
        }}),
        json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {
            "name": "list_files",
            "arguments": {"directory": "/etc"}
        }}),
    ]);

    let mut output = Vec::new();
    gateway
        .stdio_server()
        .run(input.as_bytes(), &mut output)
        .await
        .unwrap();

    let responses: Vec<JsonRpcResponse> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(responses.len(), 4);

    let init = responses[0].result.as_ref().unwrap();
    assert_eq!(init["serverInfo"]["policyMode"], "secure");

    let tools = responses[1].result.as_ref().unwrap()["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 3);

    let read = responses[2].result.as_ref().unwrap();
    assert_eq!(read["content"][0]["text"], "line one");
    assert_eq!(read["isError"], false);

    let list = responses[3].result.as_ref().unwrap();
    assert_eq!(list["isError"], true);

    let records = audit.records();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.caller == "stdio-test"));
}
