//! Transport layer for the learning server.
//!
//! A transport owns the wire and exchanges [`TransportMessage`]s with the
//! server over a pair of channels. The only implementation is
//! [`stdio::StdioTransport`].

pub mod stdio;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::protocol::AnyJsonRpcMessage;

pub use stdio::{StdioTransport, StdioTransportBuilder};

/// Transport trait for different communication methods
#[async_trait]
pub trait Transport: Send + Sync {
    /// Start the transport and return message channels
    async fn start(
        &self,
    ) -> Result<(
        mpsc::Receiver<TransportMessage>,
        mpsc::Sender<TransportMessage>,
    )>;

    /// Stop the transport, flushing queued outbound messages
    async fn stop(&self) -> Result<()>;

    /// Get transport information
    fn info(&self) -> TransportInfo;
}

/// Transport message containing the JSON-RPC message and when it was received
#[derive(Debug, Clone)]
pub struct TransportMessage {
    /// The JSON-RPC message
    pub message: AnyJsonRpcMessage,

    /// Timestamp when the message was created
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl TransportMessage {
    /// Create a new transport message
    pub fn new(message: AnyJsonRpcMessage) -> Self {
        Self {
            message,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Transport information
#[derive(Debug, Clone)]
pub struct TransportInfo {
    /// Transport type
    pub transport_type: TransportType,

    /// Transport address/endpoint
    pub address: String,

    /// Maximum message size
    pub max_message_size: Option<usize>,
}

/// Transport type enumeration
#[derive(Debug, Clone, PartialEq)]
pub enum TransportType {
    Stdio,
}
