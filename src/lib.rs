//! # MCP Learning Server
//!
//! A Model Context Protocol server that teaches the protocol by example. It
//! serves a catalogue of demo tools, resources and prompts over
//! newline-delimited JSON-RPC on stdin/stdout.
//!
//! The core is the [`capability`] module: every capability is declared as a
//! record with a typed argument shape, collected in a
//! [`Registry`](capability::Registry), and served by a
//! [`Dispatcher`](capability::Dispatcher) that validates arguments before a
//! handler ever runs.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mcp_learning_server::{Config, McpServer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = McpServer::new(Config::default())?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod capability;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;
pub mod transport;
pub mod utils;

// Re-export main types for convenience
pub use capability::{CapabilityKind, CapabilityRecord, DispatchRequest, Dispatcher, Registry};
pub use config::Config;
pub use error::{DispatchError, McpError, Result};
pub use protocol::{
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ProtocolHandler, JSONRPC_VERSION,
    PROTOCOL_VERSION,
};
pub use server::{McpServer, McpServerBuilder};

/// Default server name
pub const SERVER_NAME: &str = "mcp-learning-server";

/// Server version reported to clients
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
