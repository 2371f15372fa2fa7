//! Learning server assembly.
//!
//! [`McpServer`] builds the catalogue into a [`Registry`], wraps it in a
//! [`Dispatcher`] and a [`ProtocolHandler`], and pumps messages between the
//! handler and a transport until the input ends or the process is
//! interrupted.

pub mod features;

use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, warn};

use crate::capability::{CapabilityKind, Dispatcher, Registry};
use crate::config::Config;
use crate::error::Result;
use crate::protocol::{Implementation, ProtocolHandler};
use crate::server::features::LearningState;
use crate::transport::stdio::write_stderr;
use crate::transport::{StdioTransport, Transport, TransportMessage};

/// Main learning server
pub struct McpServer {
    /// Server configuration
    config: Config,

    /// Capabilities served by this instance
    registry: Arc<Registry>,

    /// Protocol handler
    protocol_handler: Arc<ProtocolHandler>,

    /// Wire transport
    transport: Arc<dyn Transport>,

    /// Server running state
    running: Arc<RwLock<bool>>,
}

impl McpServer {
    /// Create a server on the stdio transport
    pub fn new(config: Config) -> Result<Self> {
        let transport = StdioTransport::new(config.transport.stdio.clone())?
            .with_request_logging(config.logging.enable_request_logging);
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a server on a custom transport
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;

        let state = Arc::new(LearningState::new());
        let mut registry = Registry::new();
        features::register_all(&mut registry, &state, &config.features)?;
        let registry = Arc::new(registry);

        let dispatcher = Dispatcher::new(registry.clone(), config.server.request_timeout())
            .with_observer(state);

        let protocol_handler = Arc::new(ProtocolHandler::new(
            Arc::new(dispatcher),
            config.features.clone(),
            Implementation {
                name: config.server.name.clone(),
                version: config.server.version.clone(),
            },
            config.server.instructions.clone(),
        ));

        Ok(Self {
            config,
            registry,
            protocol_handler,
            transport,
            running: Arc::new(RwLock::new(false)),
        })
    }

    /// Startup banner listing every registered capability
    pub fn banner(&self) -> String {
        let mut lines = vec![
            format!(
                "{} v{} running on stdio",
                self.config.server.name, self.config.server.version
            ),
            "Available capabilities:".to_string(),
        ];

        for kind in CapabilityKind::ALL {
            let names = self.registry.identifiers(kind);
            let listed = if names.is_empty() {
                "(none)".to_string()
            } else {
                names.join(", ")
            };
            lines.push(format!("- {}: {}", kind.plural(), listed));
        }

        lines.join("\n")
    }

    /// Run until the input ends or Ctrl-C is pressed
    pub async fn run(&self) -> Result<()> {
        let (receiver, sender) = self.transport.start().await?;
        *self.running.write().await = true;

        write_stderr(&format!("{}\n", self.banner())).await?;
        info!(
            "Server started with {} tools, {} resources, {} prompts",
            self.registry.len(CapabilityKind::Tool),
            self.registry.len(CapabilityKind::Resource),
            self.registry.len(CapabilityKind::Prompt)
        );

        tokio::select! {
            result = self.serve(receiver, sender) => {
                if let Err(e) = &result {
                    error!("Message loop failed: {}", e);
                }
                info!("Input closed");
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                }
                write_stderr("\nShutting down server...\n").await?;
            }
        }

        self.stop().await
    }

    /// Answer messages from `receiver` on `sender`, one at a time, until
    /// the receiver closes
    pub async fn serve(
        &self,
        mut receiver: mpsc::Receiver<TransportMessage>,
        sender: mpsc::Sender<TransportMessage>,
    ) -> Result<()> {
        while let Some(transport_message) = receiver.recv().await {
            match self
                .protocol_handler
                .handle_message(transport_message.message)
                .await
            {
                Ok(Some(response)) => {
                    if sender.send(TransportMessage::new(response)).await.is_err() {
                        warn!("Transport closed before the response could be sent");
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    error!("Error handling message: {}", e);
                }
            }
        }

        debug!("Message loop ended");
        Ok(())
    }

    /// Stop the transport, flushing pending responses
    pub async fn stop(&self) -> Result<()> {
        *self.running.write().await = false;
        self.transport.stop().await?;
        info!("Server stopped");
        Ok(())
    }

    /// Check if the server is running
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Get server configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Capabilities registered at startup
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Protocol handler, for driving the server without a transport
    pub fn protocol_handler(&self) -> &Arc<ProtocolHandler> {
        &self.protocol_handler
    }
}

/// Server builder for easier configuration
pub struct McpServerBuilder {
    config: Config,
    custom_transport: Option<Arc<dyn Transport>>,
}

impl McpServerBuilder {
    /// Create a new server builder with default configuration
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            custom_transport: None,
        }
    }

    /// Set the server configuration
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set a custom transport
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.custom_transport = Some(transport);
        self
    }

    /// Set the server name
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.server.name = name.into();
        self
    }

    /// Set server instructions
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.config.server.instructions = Some(instructions.into());
        self
    }

    /// Per-request handler timeout in seconds
    pub fn request_timeout(mut self, seconds: u64) -> Self {
        self.config.server.request_timeout = seconds;
        self
    }

    /// Build the server
    pub fn build(self) -> Result<McpServer> {
        match self.custom_transport {
            Some(transport) => McpServer::with_transport(self.config, transport),
            None => McpServer::new(self.config),
        }
    }
}

impl Default for McpServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
