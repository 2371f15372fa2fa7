//! Message validation for MCP protocol compliance.

use crate::error::{McpError, Result};
use crate::protocol::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
use serde::de::DeserializeOwned;
use serde_json::Value;

fn check_version(jsonrpc: &str) -> Result<()> {
    if jsonrpc != JSONRPC_VERSION {
        return Err(McpError::invalid_request(format!(
            "Invalid JSON-RPC version: expected '{}', got '{}'",
            JSONRPC_VERSION, jsonrpc
        )));
    }
    Ok(())
}

/// Validate a JSON-RPC request
pub fn validate_request(request: &JsonRpcRequest) -> Result<()> {
    check_version(&request.jsonrpc)?;

    if request.method.is_empty() {
        return Err(McpError::invalid_request("Method name cannot be empty"));
    }

    // MCP forbids null request ids
    match &request.id {
        Value::Null => Err(McpError::invalid_request("Request ID must not be null")),
        Value::String(s) if s.is_empty() => Err(McpError::invalid_request(
            "Request ID cannot be empty string",
        )),
        Value::String(_) | Value::Number(_) => Ok(()),
        _ => Err(McpError::invalid_request(
            "Request ID must be a string or number",
        )),
    }
}

/// Validate a JSON-RPC notification
pub fn validate_notification(notification: &JsonRpcNotification) -> Result<()> {
    check_version(&notification.jsonrpc)?;

    if notification.method.is_empty() {
        return Err(McpError::invalid_request("Method name cannot be empty"));
    }

    Ok(())
}

/// Validate a JSON-RPC response
pub fn validate_response(response: &JsonRpcResponse) -> Result<()> {
    check_version(&response.jsonrpc)?;

    match (&response.result, &response.error) {
        (Some(_), Some(_)) => Err(McpError::invalid_request(
            "Response cannot have both result and error",
        )),
        (None, None) => Err(McpError::invalid_request(
            "Response must have either result or error",
        )),
        _ => Ok(()),
    }
}

/// Validate MCP method name
pub fn validate_method_name(method: &str) -> Result<()> {
    if method.is_empty() {
        return Err(McpError::invalid_request("Method name cannot be empty"));
    }

    let valid_prefixes = [
        "initialize",
        "ping",
        "notifications/",
        "resources/",
        "prompts/",
        "tools/",
    ];

    if !valid_prefixes
        .iter()
        .any(|prefix| method.starts_with(prefix))
    {
        return Err(McpError::method_not_found(method));
    }

    Ok(())
}

/// Deserialize request params, mapping failures to invalid params
pub fn parse_params<T: DeserializeOwned>(params: Option<&Value>) -> Result<T> {
    let params = params.ok_or_else(|| McpError::invalid_params("Missing params"))?;
    serde_json::from_value(params.clone())
        .map_err(|e| McpError::invalid_params(format!("Invalid params: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ReadResourceParams;
    use serde_json::json;

    #[test]
    fn test_validate_request() {
        let valid = JsonRpcRequest::new(json!(1), "tools/list", None);
        assert!(validate_request(&valid).is_ok());

        let mut wrong_version = valid.clone();
        wrong_version.jsonrpc = "1.0".to_string();
        assert!(validate_request(&wrong_version).is_err());

        let null_id = JsonRpcRequest::new(Value::Null, "tools/list", None);
        assert!(validate_request(&null_id).is_err());

        let empty_method = JsonRpcRequest::new(json!("a"), "", None);
        assert!(validate_request(&empty_method).is_err());
    }

    #[test]
    fn test_validate_response() {
        let ok = JsonRpcResponse::success(json!(1), json!({}));
        assert!(validate_response(&ok).is_ok());

        let mut neither = ok.clone();
        neither.result = None;
        assert!(validate_response(&neither).is_err());
    }

    #[test]
    fn test_validate_method_name() {
        assert!(validate_method_name("initialize").is_ok());
        assert!(validate_method_name("tools/call").is_ok());
        assert!(validate_method_name("notifications/initialized").is_ok());

        let err = validate_method_name("sampling/createMessage").unwrap_err();
        assert_eq!(err.to_json_rpc_code(), crate::error::METHOD_NOT_FOUND);
    }

    #[test]
    fn test_parse_params() {
        let params: ReadResourceParams =
            parse_params(Some(&json!({"uri": "project://info"}))).unwrap();
        assert_eq!(params.uri, "project://info");

        let err = parse_params::<ReadResourceParams>(Some(&json!({}))).unwrap_err();
        assert_eq!(err.to_json_rpc_code(), crate::error::INVALID_PARAMS);

        let err = parse_params::<ReadResourceParams>(None).unwrap_err();
        assert_eq!(err.to_json_rpc_code(), crate::error::INVALID_PARAMS);
    }
}
