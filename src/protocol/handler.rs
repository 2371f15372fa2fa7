//! Protocol message handler for the learning server.
//!
//! Turns JSON-RPC messages into dispatcher requests and registry listings,
//! and dispatch outcomes back into JSON-RPC responses.

use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::capability::{CapabilityKind, DispatchRequest, Dispatcher};
use crate::config::FeatureConfig;
use crate::error::{DispatchError, McpError, Result};
use crate::protocol::{
    validation, AnyJsonRpcMessage, CallToolParams, CallToolResult, GetPromptParams,
    GetPromptResult, Implementation, InitializeRequest, InitializeResult, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, ListPromptsResult, ListResourcesResult, ListToolsResult,
    Prompt, PromptsCapability, ReadResourceParams, ReadResourceResult, Resource,
    ResourcesCapability, ServerCapabilities, Tool, ToolsCapability, PROTOCOL_VERSION,
};

/// Protocol handler for processing MCP messages
#[derive(Clone)]
pub struct ProtocolHandler {
    /// Capability dispatcher
    dispatcher: Arc<Dispatcher>,

    /// Enabled feature groups
    features: FeatureConfig,

    /// Reported in the initialize result
    server_info: Implementation,

    /// Usage instructions for clients
    instructions: Option<String>,

    /// Server initialized flag
    initialized: Arc<RwLock<bool>>,
}

impl ProtocolHandler {
    /// Create a new protocol handler
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        features: FeatureConfig,
        server_info: Implementation,
        instructions: Option<String>,
    ) -> Self {
        Self {
            dispatcher,
            features,
            server_info,
            instructions,
            initialized: Arc::new(RwLock::new(false)),
        }
    }

    /// Whether `initialize` has completed
    pub async fn is_initialized(&self) -> bool {
        *self.initialized.read().await
    }

    /// Handle an incoming message
    pub async fn handle_message(
        &self,
        message: AnyJsonRpcMessage,
    ) -> Result<Option<AnyJsonRpcMessage>> {
        match message {
            AnyJsonRpcMessage::Request(request) => {
                let response = self.handle_request(request).await;
                Ok(Some(AnyJsonRpcMessage::Response(response)))
            }
            AnyJsonRpcMessage::Notification(notification) => {
                self.handle_notification(notification).await?;
                Ok(None)
            }
            AnyJsonRpcMessage::Response(response) => {
                Ok(self.handle_response(response).map(AnyJsonRpcMessage::Response))
            }
            AnyJsonRpcMessage::Batch(batch) => Ok(self.handle_batch(batch).await),
        }
    }

    /// Handle a JSON-RPC request; failures become error responses
    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Handling request: {} (id: {})", request.method, request.id);

        let result = match validation::validate_request(&request)
            .and_then(|_| validation::validate_method_name(&request.method))
        {
            Ok(()) => self.route(&request).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(result) => JsonRpcResponse::success(request.id, result),
            Err(error) => {
                match &error {
                    McpError::Dispatch(DispatchError::Internal(_)) => {
                        error!("Request {} failed: {}", request.method, error)
                    }
                    _ => warn!("Request {} failed: {}", request.method, error),
                }
                JsonRpcResponse::error(request.id, error.into())
            }
        }
    }

    async fn route(&self, request: &JsonRpcRequest) -> Result<Value> {
        let method = request.method.as_str();
        if method != "initialize" && method != "ping" && !self.is_initialized().await {
            warn!("Serving {} before initialize", method);
        }

        match method {
            "initialize" => self.handle_initialize(request).await,
            "ping" => Ok(json!({})),

            "tools/list" if self.features.tools => self.handle_tools_list(),
            "tools/call" if self.features.tools => self.handle_tools_call(request).await,

            "resources/list" if self.features.resources => self.handle_resources_list(),
            "resources/read" if self.features.resources => {
                self.handle_resources_read(request).await
            }

            "prompts/list" if self.features.prompts => self.handle_prompts_list(),
            "prompts/get" if self.features.prompts => self.handle_prompts_get(request).await,

            _ => Err(McpError::method_not_found(method)),
        }
    }

    /// Handle a JSON-RPC notification
    async fn handle_notification(&self, notification: JsonRpcNotification) -> Result<()> {
        debug!("Handling notification: {}", notification.method);

        validation::validate_notification(&notification)?;

        match notification.method.as_str() {
            "notifications/initialized" => {
                info!("Client reported initialization complete");
                Ok(())
            }
            "notifications/cancelled" => {
                // Requests are served one at a time, so there is never one in flight to cancel
                let request_id = notification
                    .params
                    .as_ref()
                    .and_then(|p| p.get("requestId"))
                    .cloned()
                    .unwrap_or(Value::Null);
                debug!("Cancellation received for request {}", request_id);
                Ok(())
            }
            _ => {
                warn!("Unknown notification method: {}", notification.method);
                Ok(())
            }
        }
    }

    /// Responses are only logged; the server issues no requests of its own
    /// Unsolicited responses are dropped. A message that carries an id but
    /// is neither a request nor a well-formed response is answered with
    /// invalid request under that id.
    fn handle_response(&self, response: JsonRpcResponse) -> Option<JsonRpcResponse> {
        match validation::validate_response(&response) {
            Ok(()) => {
                warn!("Ignoring unsolicited response for request {}", response.id);
                None
            }
            Err(e) => {
                warn!("Rejecting message with id {}: {}", response.id, e);
                Some(JsonRpcResponse::error(response.id, e.into()))
            }
        }
    }

    /// Handle a batch of messages element-wise
    async fn handle_batch(&self, batch: Vec<Value>) -> Option<AnyJsonRpcMessage> {
        debug!("Handling batch of {} messages", batch.len());

        if batch.is_empty() {
            let error = McpError::invalid_request("Batch cannot be empty");
            return Some(AnyJsonRpcMessage::Response(JsonRpcResponse::error(
                Value::Null,
                error.into(),
            )));
        }

        let mut responses = Vec::new();
        for item in batch {
            let response = match serde_json::from_value::<AnyJsonRpcMessage>(item) {
                Ok(AnyJsonRpcMessage::Request(request)) => Some(self.handle_request(request).await),
                Ok(AnyJsonRpcMessage::Notification(notification)) => {
                    if let Err(e) = self.handle_notification(notification).await {
                        warn!("Notification in batch rejected: {}", e);
                    }
                    None
                }
                Ok(AnyJsonRpcMessage::Response(response)) => self.handle_response(response),
                Ok(AnyJsonRpcMessage::Batch(_)) => Some(JsonRpcResponse::error(
                    Value::Null,
                    McpError::invalid_request("Nested batches are not allowed").into(),
                )),
                Err(e) => Some(JsonRpcResponse::error(
                    Value::Null,
                    McpError::invalid_request(e.to_string()).into(),
                )),
            };

            if let Some(response) = response {
                match serde_json::to_value(response) {
                    Ok(value) => responses.push(value),
                    Err(e) => error!("Failed to serialize batch response: {}", e),
                }
            }
        }

        if responses.is_empty() {
            None
        } else {
            Some(AnyJsonRpcMessage::Batch(responses))
        }
    }

    /// Capabilities advertised for the enabled features
    pub fn server_capabilities(&self) -> ServerCapabilities {
        ServerCapabilities {
            prompts: self.features.prompts.then(|| PromptsCapability {
                list_changed: Some(false),
            }),
            resources: self.features.resources.then(|| ResourcesCapability {
                subscribe: Some(false),
                list_changed: Some(false),
            }),
            tools: self.features.tools.then(|| ToolsCapability {
                list_changed: Some(false),
            }),
        }
    }

    async fn handle_initialize(&self, request: &JsonRpcRequest) -> Result<Value> {
        let init_request: InitializeRequest = validation::parse_params(request.params.as_ref())?;

        info!(
            "Initializing session for {} v{}",
            init_request.client_info.name, init_request.client_info.version
        );
        if init_request.protocol_version != PROTOCOL_VERSION {
            warn!(
                "Client requested protocol version {}, server supports {}",
                init_request.protocol_version, PROTOCOL_VERSION
            );
        }

        let init_result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: self.server_capabilities(),
            server_info: self.server_info.clone(),
            instructions: self.instructions.clone(),
        };

        *self.initialized.write().await = true;

        Ok(serde_json::to_value(init_result)?)
    }

    fn handle_tools_list(&self) -> Result<Value> {
        let tools: Vec<Tool> = self
            .dispatcher
            .registry()
            .list(CapabilityKind::Tool)
            .map(|record| Tool::from(record.as_ref()))
            .collect();

        debug!("Returning {} tools", tools.len());
        Ok(serde_json::to_value(ListToolsResult { tools })?)
    }

    async fn handle_tools_call(&self, request: &JsonRpcRequest) -> Result<Value> {
        let params: CallToolParams = validation::parse_params(request.params.as_ref())?;
        info!("Calling tool: {}", params.name);

        let dispatch = DispatchRequest::new(CapabilityKind::Tool, params.name, params.arguments);
        let result = match self.dispatcher.dispatch(dispatch).await {
            Ok(output) => CallToolResult::success(output),
            Err(DispatchError::HandlerFailed(message)) => CallToolResult::failure(message),
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::to_value(result)?)
    }

    fn handle_resources_list(&self) -> Result<Value> {
        let resources: Vec<Resource> = self
            .dispatcher
            .registry()
            .list(CapabilityKind::Resource)
            .map(|record| Resource::from(record.as_ref()))
            .collect();

        debug!("Returning {} resources", resources.len());
        Ok(serde_json::to_value(ListResourcesResult { resources })?)
    }

    async fn handle_resources_read(&self, request: &JsonRpcRequest) -> Result<Value> {
        let params: ReadResourceParams = validation::parse_params(request.params.as_ref())?;
        info!("Reading resource: {}", params.uri);

        let output = self
            .dispatcher
            .dispatch(DispatchRequest::resource(params.uri.as_str()))
            .await?;

        Ok(serde_json::to_value(ReadResourceResult::from_output(
            &params.uri,
            output,
        ))?)
    }

    fn handle_prompts_list(&self) -> Result<Value> {
        let prompts: Vec<Prompt> = self
            .dispatcher
            .registry()
            .list(CapabilityKind::Prompt)
            .map(|record| Prompt::from(record.as_ref()))
            .collect();

        debug!("Returning {} prompts", prompts.len());
        Ok(serde_json::to_value(ListPromptsResult { prompts })?)
    }

    async fn handle_prompts_get(&self, request: &JsonRpcRequest) -> Result<Value> {
        let params: GetPromptParams = validation::parse_params(request.params.as_ref())?;
        info!("Getting prompt: {}", params.name);

        let dispatch =
            DispatchRequest::new(CapabilityKind::Prompt, params.name, params.arguments);
        let output = self.dispatcher.dispatch(dispatch).await?;

        Ok(serde_json::to_value(GetPromptResult::from_output(output))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{
        ArgumentShape, CapabilityRecord, FieldSpec, HandlerOutput, HandlerResult, Registry,
        ValidatedArguments,
    };
    use crate::error::HandlerError;
    use std::time::Duration;

    fn echo(args: ValidatedArguments) -> HandlerResult {
        let text = args.required_str("text")?;
        if text.is_empty() {
            return Err(HandlerError::failed("Nothing to echo"));
        }
        Ok(HandlerOutput::text(text))
    }

    fn handler(features: FeatureConfig) -> ProtocolHandler {
        let mut registry = Registry::new();
        let shape = ArgumentShape::from_fields(vec![FieldSpec::string("text")]).unwrap();
        registry
            .register(CapabilityRecord::tool("echo", "Echo text", shape.clone(), echo))
            .unwrap();
        registry
            .register(CapabilityRecord::prompt("echo-prompt", "Echo prompt", shape, echo))
            .unwrap();

        let dispatcher = Dispatcher::new(Arc::new(registry), Duration::from_secs(5));
        ProtocolHandler::new(
            Arc::new(dispatcher),
            features,
            Implementation {
                name: "test-server".to_string(),
                version: "0.0.1".to_string(),
            },
            None,
        )
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest::new(json!(1), method, Some(params))
    }

    #[tokio::test]
    async fn test_initialize_marks_session() {
        let handler = handler(FeatureConfig::default());
        assert!(!handler.is_initialized().await);

        let response = handler
            .handle_request(request(
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {"name": "probe", "version": "1.0"}
                }),
            ))
            .await;

        let result = response.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "test-server");
        assert!(result["capabilities"]["tools"].is_object());
        assert!(handler.is_initialized().await);
    }

    #[tokio::test]
    async fn test_tool_failures_map_to_results_and_errors() {
        let handler = handler(FeatureConfig::default());

        let response = handler
            .handle_request(request("tools/call", json!({"name": "echo", "arguments": {"text": ""}})))
            .await;
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert_eq!(result["content"][0]["text"], "Nothing to echo");

        let response = handler
            .handle_request(request("tools/call", json!({"name": "nope", "arguments": {}})))
            .await;
        assert_eq!(response.error.unwrap().code, crate::error::METHOD_NOT_FOUND);

        let response = handler
            .handle_request(request("tools/call", json!({"name": "echo", "arguments": {}})))
            .await;
        let error = response.error.unwrap();
        assert_eq!(error.code, crate::error::INVALID_PARAMS);
        assert!(error.message.contains("text"));
    }

    #[tokio::test]
    async fn test_prompt_failure_is_internal_error() {
        let handler = handler(FeatureConfig::default());

        let response = handler
            .handle_request(request(
                "prompts/get",
                json!({"name": "echo-prompt", "arguments": {"text": ""}}),
            ))
            .await;
        assert_eq!(response.error.unwrap().code, crate::error::INTERNAL_ERROR);

        let response = handler
            .handle_request(request("prompts/get", json!({"name": "missing"})))
            .await;
        assert_eq!(response.error.unwrap().code, crate::error::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_disabled_feature_is_method_not_found() {
        let features = FeatureConfig {
            tools: false,
            ..FeatureConfig::default()
        };
        let handler = handler(features);

        let response = handler.handle_request(request("tools/list", json!({}))).await;
        assert_eq!(response.error.unwrap().code, crate::error::METHOD_NOT_FOUND);
        assert!(handler.server_capabilities().tools.is_none());
    }

    #[tokio::test]
    async fn test_batch_and_notifications() {
        let handler = handler(FeatureConfig::default());

        let notification = AnyJsonRpcMessage::Notification(JsonRpcNotification::new(
            "notifications/initialized",
            None,
        ));
        assert!(handler.handle_message(notification).await.unwrap().is_none());

        let batch = AnyJsonRpcMessage::Batch(vec![
            json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}),
        ]);
        match handler.handle_message(batch).await.unwrap() {
            Some(AnyJsonRpcMessage::Batch(responses)) => {
                assert_eq!(responses.len(), 2);
                assert_eq!(responses[1]["result"]["tools"][0]["name"], "echo");
            }
            other => panic!("expected batch response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_message_with_only_an_id_is_invalid_request() {
        let handler = handler(FeatureConfig::default());

        let message = crate::protocol::parse_message(r#"{"jsonrpc":"2.0","id":5}"#).unwrap();
        match handler.handle_message(message).await.unwrap() {
            Some(AnyJsonRpcMessage::Response(response)) => {
                assert_eq!(response.id, json!(5));
                assert_eq!(response.error.unwrap().code, crate::error::INVALID_REQUEST);
            }
            other => panic!("expected error response, got {:?}", other),
        }

        let reply = crate::protocol::parse_message(r#"{"jsonrpc":"2.0","id":6,"result":{}}"#).unwrap();
        assert!(handler.handle_message(reply).await.unwrap().is_none());
    }
}
