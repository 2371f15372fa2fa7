//! End-to-end tests of the JSON-RPC surface over the full catalogue.

use serde_json::{json, Value};

use mcp_learning_server::config::{Config, FeatureConfig};
use mcp_learning_server::{JsonRpcRequest, McpServer, McpServerBuilder, PROTOCOL_VERSION};

fn server() -> McpServer {
    McpServerBuilder::new().build().unwrap()
}

async fn call(server: &McpServer, method: &str, params: Value) -> Value {
    let request = JsonRpcRequest::new(json!(1), method, Some(params));
    let response = server.protocol_handler().handle_request(request).await;
    serde_json::to_value(response).unwrap()
}

async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> Value {
    call(server, "tools/call", json!({"name": name, "arguments": arguments})).await
}

fn first_text(response: &Value) -> &str {
    response["result"]["content"][0]["text"].as_str().unwrap()
}

#[tokio::test]
async fn initialize_reports_server_and_capabilities() {
    let server = server();
    let response = call(
        &server,
        "initialize",
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {"name": "probe", "version": "0.1.0"}
        }),
    )
    .await;

    let result = &response["result"];
    assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
    assert_eq!(result["serverInfo"]["name"], "mcp-learning-server");
    assert!(result["capabilities"]["tools"].is_object());
    assert!(result["capabilities"]["resources"].is_object());
    assert!(result["capabilities"]["prompts"].is_object());
    assert!(server.protocol_handler().is_initialized().await);
}

#[tokio::test]
async fn tools_are_listed_in_registration_order() {
    let server = server();
    let first = call(&server, "tools/list", json!({})).await;
    let second = call(&server, "tools/list", json!({})).await;
    assert_eq!(first, second);

    let names: Vec<&str> = first["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap())
        .collect();
    assert_eq!(&names[..3], &["calculate", "text-utils", "greeting"]);

    let calculate = &first["result"]["tools"][0];
    assert_eq!(calculate["inputSchema"]["type"], "object");
    assert_eq!(
        calculate["inputSchema"]["required"],
        json!(["operation", "a", "b"])
    );
}

#[tokio::test]
async fn calculate_adds() {
    let server = server();
    let response = call_tool(&server, "calculate", json!({"operation": "add", "a": 15, "b": 27})).await;

    assert!(first_text(&response).contains("42"));
    assert_ne!(response["result"]["isError"], true);
}

#[tokio::test]
async fn calculate_division_by_zero_is_a_tool_error() {
    let server = server();
    let response =
        call_tool(&server, "calculate", json!({"operation": "divide", "a": 10, "b": 0})).await;

    assert_eq!(response["result"]["isError"], true);
    let text = first_text(&response);
    assert!(text.contains("Division by zero is not allowed"));
    assert!(!text.contains("Infinity"));
    assert!(!text.contains("inf"));
}

#[tokio::test]
async fn invalid_enum_names_allowed_values() {
    let server = server();
    let response =
        call_tool(&server, "calculate", json!({"operation": "frobnicate", "a": 1, "b": 2})).await;

    assert_eq!(response["error"]["code"], -32602);
    let message = response["error"]["message"].as_str().unwrap();
    assert!(message.contains("operation"));
    assert!(message.contains("add, subtract, multiply, divide"));
}

#[tokio::test]
async fn missing_field_is_invalid_params() {
    let server = server();
    let response = call_tool(&server, "calculate", json!({"operation": "add", "a": 1})).await;

    assert_eq!(response["error"]["code"], -32602);
    assert!(response["error"]["message"]
        .as_str()
        .unwrap()
        .contains("'b'"));
}

#[tokio::test]
async fn unknown_tool_is_method_not_found() {
    let server = server();
    let response = call_tool(&server, "teleport", json!({})).await;

    assert_eq!(response["error"]["code"], -32601);
    assert!(response["error"]["message"]
        .as_str()
        .unwrap()
        .contains("teleport"));
}

#[tokio::test]
async fn text_utils_reverses() {
    let server = server();
    let response = call_tool(
        &server,
        "text-utils",
        json!({"operation": "reverse", "text": "MCP is awesome!"}),
    )
    .await;

    assert!(first_text(&response).contains("!emosewa si PCM"));
}

#[tokio::test]
async fn state_changes_are_visible_through_resources() {
    let server = server();

    let response = call_tool(&server, "mark-day-complete", json!({"day": 3, "time_spent": 60})).await;
    assert!(first_text(&response).contains("Progress: 43% (3/7 days)"));

    let response = call(
        &server,
        "resources/read",
        json!({"uri": "progress://learning-status"}),
    )
    .await;
    let contents = &response["result"]["contents"][0];
    assert_eq!(contents["uri"], "progress://learning-status");
    assert_eq!(contents["mimeType"], "application/json");

    let progress: Value = serde_json::from_str(contents["text"].as_str().unwrap()).unwrap();
    assert_eq!(progress["completedDays"], json!([1, 2, 3]));
    assert_eq!(progress["nextMilestone"], "Complete Day 4");
}

#[tokio::test]
async fn resource_reads_are_counted_including_unknown_uris() {
    let server = server();

    call(&server, "resources/read", json!({"uri": "project://info"})).await;
    call(&server, "resources/read", json!({"uri": "project://info"})).await;
    let missing = call(&server, "resources/read", json!({"uri": "nowhere://missing"})).await;
    assert_eq!(missing["error"]["code"], -32602);

    let response = call(
        &server,
        "resources/read",
        json!({"uri": "analytics://resource-usage"}),
    )
    .await;
    let text = response["result"]["contents"][0]["text"].as_str().unwrap();
    let analytics: Value = serde_json::from_str(text).unwrap();

    assert_eq!(analytics["totalAccesses"], 4);
    assert_eq!(analytics["uniqueResources"], 3);
    assert_eq!(analytics["mostAccessedResource"], "project://info");
}

#[tokio::test]
async fn prompts_render_a_single_user_message() {
    let server = server();
    let response = call(
        &server,
        "prompts/get",
        json!({
            "name": "code-review",
            "arguments": {"language": "python", "code": "print('hi')", "complexity": "complex"}
        }),
    )
    .await;

    let result = &response["result"];
    assert_eq!(result["description"], "Code review prompt for python code");
    let messages = result["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
    assert!(messages[0]["content"]["text"]
        .as_str()
        .unwrap()
        .contains("Deep dive into architecture"));
}

#[tokio::test]
async fn prompt_with_bad_arguments_is_invalid_params() {
    let server = server();
    let response = call(
        &server,
        "prompts/get",
        json!({"name": "writing-helper", "arguments": {"style": "shouty"}}),
    )
    .await;

    assert_eq!(response["error"]["code"], -32602);
}

#[tokio::test]
async fn disabled_feature_methods_are_not_found() {
    let mut config = Config::default();
    config.features = FeatureConfig {
        resources: false,
        ..FeatureConfig::default()
    };
    let server = McpServerBuilder::new().config(config).build().unwrap();

    let response = call(&server, "resources/list", json!({})).await;
    assert_eq!(response["error"]["code"], -32601);

    let response = call(&server, "tools/list", json!({})).await;
    assert!(response["result"]["tools"].is_array());
}
