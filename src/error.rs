//! Error handling for the learning server.
//!
//! Protocol-level failures are carried by [`McpError`] and map onto JSON-RPC
//! error codes. The capability core has its own closed taxonomy:
//! [`ValidationError`] from the schema validator, [`RegistryError`] from
//! registration and lookup, [`HandlerError`] from handlers and
//! [`DispatchError`], which is what every dispatch failure is folded into.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::capability::CapabilityKind;
use crate::utils::format_duration;

/// Result type alias for server operations
pub type Result<T> = std::result::Result<T, McpError>;

/// JSON-RPC parse error
pub const PARSE_ERROR: i32 = -32700;
/// JSON-RPC invalid request
pub const INVALID_REQUEST: i32 = -32600;
/// JSON-RPC method not found
pub const METHOD_NOT_FOUND: i32 = -32601;
/// JSON-RPC invalid params
pub const INVALID_PARAMS: i32 = -32602;
/// JSON-RPC internal error
pub const INTERNAL_ERROR: i32 = -32603;
/// Implementation-defined server error used for handler timeouts
pub const REQUEST_TIMEOUT: i32 = -32001;

/// Main error type for server operations
#[derive(Error, Debug)]
pub enum McpError {
    /// JSON-RPC parse error (-32700)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// JSON-RPC invalid request (-32600)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// JSON-RPC method not found (-32601)
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// JSON-RPC invalid params (-32602)
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// A capability dispatch failed
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// Capability registration failed at startup
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Transport-related errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Transport-specific errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection lost: {0}")]
    ConnectionLost(String),
}

/// Field-level reasons an argument mapping was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("missing required field '{0}'")]
    MissingField(String),

    #[error("field '{field}' must be a {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("field '{field}' has invalid value '{value}', expected one of: {}", join_allowed(.allowed))]
    InvalidEnumValue {
        field: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("field '{field}' must be {}, got {value}", range_text(.min, .max))]
    OutOfRange {
        field: String,
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },

    #[error("arguments must be an object, got {0}")]
    NotAnObject(&'static str),
}

fn join_allowed(allowed: &[String]) -> String {
    allowed.join(", ")
}

fn elapsed(duration: &Duration) -> String {
    format_duration(*duration)
}

fn range_text(min: &Option<f64>, max: &Option<f64>) -> String {
    match (min, max) {
        (Some(min), Some(max)) => format!("between {} and {}", min, max),
        (Some(min), None) => format!("at least {}", min),
        (None, Some(max)) => format!("at most {}", max),
        (None, None) => "a number".to_string(),
    }
}

/// Registration and lookup failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("{kind} '{identifier}' is already registered")]
    DuplicateCapability {
        kind: CapabilityKind,
        identifier: String,
    },

    #[error("{kind} not found: {identifier}")]
    NotFound {
        kind: CapabilityKind,
        identifier: String,
    },

    #[error("invalid {kind} identifier '{identifier}': {reason}")]
    InvalidIdentifier {
        kind: CapabilityKind,
        identifier: String,
        reason: String,
    },

    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),
}

/// Errors a capability handler may signal
#[derive(Error, Debug)]
pub enum HandlerError {
    /// A domain-level failure reported back to the caller verbatim
    #[error("{0}")]
    Failed(String),

    /// Anything the handler did not expect; surfaced as an internal error
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl HandlerError {
    /// Create a domain failure
    pub fn failed(msg: impl Into<String>) -> Self {
        HandlerError::Failed(msg.into())
    }
}

/// The closed set of outcomes a failed dispatch can produce
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    #[error("{kind} not found: {identifier}")]
    NotFound {
        kind: CapabilityKind,
        identifier: String,
    },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] ValidationError),

    #[error("{0}")]
    HandlerFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Request timed out after {}", elapsed(.0))]
    Timeout(Duration),
}

impl DispatchError {
    /// JSON-RPC code for this failure
    pub fn json_rpc_code(&self) -> i32 {
        match self {
            DispatchError::NotFound {
                kind: CapabilityKind::Tool,
                ..
            } => METHOD_NOT_FOUND,
            DispatchError::NotFound { .. } => INVALID_PARAMS,
            DispatchError::InvalidArguments(_) => INVALID_PARAMS,
            DispatchError::HandlerFailed(_) => INTERNAL_ERROR,
            DispatchError::Internal(_) => INTERNAL_ERROR,
            DispatchError::Timeout(_) => REQUEST_TIMEOUT,
        }
    }
}

/// JSON-RPC error response structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl McpError {
    /// Convert to JSON-RPC error code
    pub fn to_json_rpc_code(&self) -> i32 {
        match self {
            McpError::ParseError(_) => PARSE_ERROR,
            McpError::InvalidRequest(_) => INVALID_REQUEST,
            McpError::MethodNotFound(_) => METHOD_NOT_FOUND,
            McpError::InvalidParams(_) => INVALID_PARAMS,
            McpError::Dispatch(e) => e.json_rpc_code(),
            _ => INTERNAL_ERROR,
        }
    }

    /// Convert to JSON-RPC error structure
    pub fn to_json_rpc_error(&self) -> JsonRpcError {
        JsonRpcError {
            code: self.to_json_rpc_code(),
            message: self.to_string(),
            data: None,
        }
    }

    /// Create a parse error
    pub fn parse_error(msg: impl Into<String>) -> Self {
        McpError::ParseError(msg.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        McpError::InvalidRequest(msg.into())
    }

    /// Create a method not found error
    pub fn method_not_found(method: impl Into<String>) -> Self {
        McpError::MethodNotFound(format!("Method '{}' not found", method.into()))
    }

    /// Create an invalid params error
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        McpError::InvalidParams(msg.into())
    }
}
