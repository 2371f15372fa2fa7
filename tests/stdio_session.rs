//! A full session over an in-memory pipe: framing, dispatch and shutdown.

use serde_json::{json, Value};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use mcp_learning_server::transport::StdioTransportBuilder;
use mcp_learning_server::McpServerBuilder;

#[tokio::test]
async fn session_over_line_delimited_json() {
    let server = McpServerBuilder::new().build().unwrap();
    let transport = StdioTransportBuilder::new()
        .enable_stderr_logging(false)
        .build()
        .unwrap();

    let (client, server_side) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_side);
    let (receiver, sender) = transport.attach(server_read, server_write).await;

    let session = tokio::spawn(async move { server.serve(receiver, sender).await });

    let (client_read, mut client_write) = tokio::io::split(client);
    let input = [
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {
            "protocolVersion": "2025-03-26",
            "capabilities": {},
            "clientInfo": {"name": "pipe", "version": "1.0"}
        }})
        .to_string(),
        json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
        String::new(),
        "{this is not json".to_string(),
        json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {
            "name": "calculate",
            "arguments": {"operation": "multiply", "a": 6, "b": 7}
        }})
        .to_string(),
        json!([
            {"jsonrpc": "2.0", "id": 3, "method": "ping"},
            {"jsonrpc": "2.0", "id": 4, "method": "nonexistent/method"}
        ])
        .to_string(),
        json!({"jsonrpc": "2.0", "id": 5}).to_string(),
    ];
    for line in &input {
        client_write.write_all(line.as_bytes()).await.unwrap();
        client_write.write_all(b"\n").await.unwrap();
    }
    client_write.flush().await.unwrap();

    let mut lines = BufReader::new(client_read).lines();
    let mut responses = Vec::new();
    for _ in 0..5 {
        let line = tokio::time::timeout(Duration::from_secs(5), lines.next_line())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        responses.push(serde_json::from_str::<Value>(&line).unwrap());
    }

    // The parse error is answered by the transport, so it may overtake earlier replies
    let parse_error = responses
        .iter()
        .find(|r| !r.is_array() && r["id"].is_null())
        .unwrap();
    assert_eq!(parse_error["error"]["code"], -32700);

    let initialize = responses.iter().find(|r| r["id"] == 1).unwrap();
    assert_eq!(initialize["result"]["serverInfo"]["name"], "mcp-learning-server");

    let product = responses.iter().find(|r| r["id"] == 2).unwrap();
    assert_eq!(
        product["result"]["content"][0]["text"],
        "Result: 6 multiply 7 = 42"
    );

    let batch = responses.iter().find(|r| r.is_array()).unwrap();
    assert_eq!(batch[0]["id"], 3);
    assert_eq!(batch[1]["error"]["code"], -32601);

    // An id with neither method nor result still gets exactly one reply
    let id_only = responses.iter().find(|r| r["id"] == 5).unwrap();
    assert_eq!(id_only["error"]["code"], -32600);

    // EOF on input ends the session cleanly
    client_write.shutdown().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), session)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
