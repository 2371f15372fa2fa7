//! STDIO transport implementation.
//!
//! Newline-delimited JSON-RPC on stdin/stdout. Lines that cannot be parsed,
//! or that exceed the configured maximum length, are answered with a parse
//! error carrying a null id and skipped.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

use crate::config::StdioConfig;
use crate::error::{McpError, Result, TransportError};
use crate::protocol::{parse_message, serialize_message, AnyJsonRpcMessage, JsonRpcResponse};
use crate::transport::{Transport, TransportInfo, TransportMessage, TransportType};
use crate::utils::truncate_string;

/// Capacity of the inbound and outbound message channels
const CHANNEL_CAPACITY: usize = 1000;

/// Longest excerpt of a line included in logs
const LOG_EXCERPT: usize = 512;

/// STDIO transport implementation
pub struct StdioTransport {
    config: StdioConfig,
    request_logging: bool,
    shutdown_sender: Arc<Mutex<Option<watch::Sender<bool>>>>,
    writer_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

#[derive(Clone, Copy)]
struct LoopOptions {
    buffer_size: usize,
    max_line_length: usize,
    enable_stderr_logging: bool,
    request_logging: bool,
}

impl StdioTransport {
    /// Create a new STDIO transport
    pub fn new(config: StdioConfig) -> Result<Self> {
        if config.max_line_length == 0 {
            return Err(McpError::Config(
                "transport.stdio.max_line_length must be positive".to_string(),
            ));
        }

        Ok(Self {
            config,
            request_logging: false,
            shutdown_sender: Arc::new(Mutex::new(None)),
            writer_task: Arc::new(Mutex::new(None)),
        })
    }

    /// Log every inbound and outbound line at debug level
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    fn options(&self) -> LoopOptions {
        LoopOptions {
            buffer_size: self.config.buffer_size,
            max_line_length: self.config.max_line_length,
            enable_stderr_logging: self.config.enable_stderr_logging,
            request_logging: self.request_logging,
        }
    }

    /// Run the transport over an arbitrary reader and writer
    pub async fn attach<R, W>(
        &self,
        reader: R,
        writer: W,
    ) -> (
        mpsc::Receiver<TransportMessage>,
        mpsc::Sender<TransportMessage>,
    )
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (message_tx, message_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (response_tx, response_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        *self.shutdown_sender.lock().await = Some(shutdown_tx);

        let options = self.options();
        let reader_shutdown = shutdown_rx.clone();
        let parse_error_sender = response_tx.clone();
        tokio::spawn(async move {
            Self::handle_input(reader, message_tx, parse_error_sender, reader_shutdown, options)
                .await;
        });

        let writer_handle = tokio::spawn(async move {
            Self::handle_output(writer, response_rx, shutdown_rx, options).await;
        });
        *self.writer_task.lock().await = Some(writer_handle);

        (message_rx, response_tx)
    }

    /// Handle incoming lines
    async fn handle_input<R>(
        reader: R,
        message_sender: mpsc::Sender<TransportMessage>,
        response_sender: mpsc::Sender<TransportMessage>,
        mut shutdown_receiver: watch::Receiver<bool>,
        options: LoopOptions,
    ) where
        R: AsyncRead + Unpin,
    {
        let codec = LinesCodec::new_with_max_length(options.max_line_length);
        let mut lines = FramedRead::with_capacity(reader, codec, options.buffer_size.max(1));
        // FramedRead yields a single None after a decode error before reading on
        let mut recovering = false;

        loop {
            tokio::select! {
                _ = shutdown_receiver.changed() => {
                    debug!("STDIO input handler received shutdown signal");
                    break;
                }

                next = lines.next() => {
                    let failure = match next {
                        Some(Ok(line)) => {
                            recovering = false;
                            if line.trim().is_empty() {
                                continue;
                            }

                            if options.request_logging {
                                debug!("<- {}", truncate_string(&line, LOG_EXCERPT));
                            }

                            match parse_message(&line) {
                                Ok(message) => {
                                    if message_sender.send(TransportMessage::new(message)).await.is_err() {
                                        error!("Protocol handler is gone, stopping input");
                                        break;
                                    }
                                    continue;
                                }
                                Err(e) => e,
                            }
                        }
                        Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                            recovering = true;
                            McpError::parse_error(format!(
                                "Message exceeds maximum line length of {} bytes",
                                options.max_line_length
                            ))
                        }
                        Some(Err(LinesCodecError::Io(e))) => {
                            error!("Error reading from stdin: {}", e);
                            break;
                        }
                        None if recovering => {
                            recovering = false;
                            continue;
                        }
                        None => {
                            info!("EOF reached on stdin");
                            break;
                        }
                    };

                    warn!("Rejected input line: {}", failure);
                    if options.enable_stderr_logging {
                        if let Err(e) = write_stderr(&format!("{}\n", failure)).await {
                            error!("Failed to write to stderr: {}", e);
                        }
                    }

                    let response = JsonRpcResponse::error(Value::Null, failure.into());
                    let message = TransportMessage::new(AnyJsonRpcMessage::Response(response));
                    if response_sender.send(message).await.is_err() {
                        error!("Output handler is gone, stopping input");
                        break;
                    }
                }
            }
        }

        debug!("STDIO input handler stopped");
    }

    /// Handle outgoing messages; queued messages are written before shutting down
    async fn handle_output<W>(
        writer: W,
        mut response_receiver: mpsc::Receiver<TransportMessage>,
        mut shutdown_receiver: watch::Receiver<bool>,
        options: LoopOptions,
    ) where
        W: AsyncWrite + Unpin,
    {
        let mut sink = FramedWrite::new(writer, LinesCodec::new());

        loop {
            tokio::select! {
                biased;

                message = response_receiver.recv() => {
                    let Some(transport_message) = message else {
                        debug!("Response channel closed");
                        break;
                    };

                    match serialize_message(&transport_message.message) {
                        Ok(serialized) => {
                            if options.request_logging {
                                debug!("-> {}", truncate_string(&serialized, LOG_EXCERPT));
                            }
                            // `send` flushes after each line
                            if let Err(e) = sink.send(serialized).await {
                                error!("Failed to write to stdout: {}", e);
                                break;
                            }
                        }
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            if options.enable_stderr_logging {
                                if let Err(write_err) =
                                    write_stderr(&format!("Serialization error: {}\n", e)).await
                                {
                                    error!("Failed to write to stderr: {}", write_err);
                                }
                            }
                        }
                    }
                }

                _ = shutdown_receiver.changed() => {
                    debug!("STDIO output handler received shutdown signal");
                    break;
                }
            }
        }

        debug!("STDIO output handler stopped");
    }
}

/// Write a message to stderr
pub async fn write_stderr(message: &str) -> Result<()> {
    let mut stderr = tokio::io::stderr();
    stderr.write_all(message.as_bytes()).await?;
    stderr.flush().await?;
    Ok(())
}

#[async_trait]
impl Transport for StdioTransport {
    async fn start(
        &self,
    ) -> Result<(
        mpsc::Receiver<TransportMessage>,
        mpsc::Sender<TransportMessage>,
    )> {
        info!("Starting STDIO transport");
        Ok(self.attach(tokio::io::stdin(), tokio::io::stdout()).await)
    }

    async fn stop(&self) -> Result<()> {
        info!("Stopping STDIO transport");

        if let Some(sender) = self.shutdown_sender.lock().await.take() {
            if sender.send(true).is_err() {
                debug!("STDIO handlers already stopped");
            }
        }

        let writer = self.writer_task.lock().await.take();
        if let Some(writer) = writer {
            writer
                .await
                .map_err(|e| TransportError::ConnectionLost(format!("STDIO writer failed: {}", e)))?;
        }

        Ok(())
    }

    fn info(&self) -> TransportInfo {
        TransportInfo {
            transport_type: TransportType::Stdio,
            address: "stdio".to_string(),
            max_message_size: Some(self.config.max_line_length),
        }
    }
}

/// STDIO transport builder for easier configuration
pub struct StdioTransportBuilder {
    config: StdioConfig,
    request_logging: bool,
}

impl StdioTransportBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: StdioConfig::default(),
            request_logging: false,
        }
    }

    /// Set buffer size
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    /// Set the maximum accepted line length
    pub fn max_line_length(mut self, length: usize) -> Self {
        self.config.max_line_length = length;
        self
    }

    /// Enable or disable stderr logging
    pub fn enable_stderr_logging(mut self, enable: bool) -> Self {
        self.config.enable_stderr_logging = enable;
        self
    }

    /// Enable or disable request logging
    pub fn request_logging(mut self, enable: bool) -> Self {
        self.request_logging = enable;
        self
    }

    /// Build the transport
    pub fn build(self) -> Result<StdioTransport> {
        Ok(StdioTransport::new(self.config)?.with_request_logging(self.request_logging))
    }
}

impl Default for StdioTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::JsonRpcRequest;
    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, BufReader};

    fn quiet_transport(max_line_length: usize) -> StdioTransport {
        StdioTransportBuilder::new()
            .max_line_length(max_line_length)
            .enable_stderr_logging(false)
            .build()
            .unwrap()
    }

    async fn read_output_line<R: AsyncRead + Unpin>(lines: &mut tokio::io::Lines<BufReader<R>>) -> Value {
        let line = lines.next_line().await.unwrap().unwrap();
        serde_json::from_str(&line).unwrap()
    }

    #[tokio::test]
    async fn test_stdio_transport_info() {
        let transport = quiet_transport(4096);
        let info = transport.info();

        assert_eq!(info.transport_type, TransportType::Stdio);
        assert_eq!(info.address, "stdio");
        assert_eq!(info.max_message_size, Some(4096));
    }

    #[tokio::test]
    async fn test_stdio_transport_builder() {
        let transport = StdioTransportBuilder::new()
            .buffer_size(4096)
            .enable_stderr_logging(false)
            .request_logging(true)
            .build()
            .unwrap();

        assert_eq!(transport.config.buffer_size, 4096);
        assert!(!transport.config.enable_stderr_logging);
        assert!(transport.request_logging);

        assert!(StdioTransportBuilder::new().max_line_length(0).build().is_err());
    }

    #[tokio::test]
    async fn test_reads_messages_and_reports_parse_errors() {
        let input = tokio_test::io::Builder::new()
            .read(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n")
            .read(b"\n   \n")
            .read(b"{not json}\n")
            .read(b"{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n")
            .build();
        let (output, peer) = tokio::io::duplex(64 * 1024);

        let transport = quiet_transport(4096);
        let (mut incoming, outgoing) = transport.attach(input, output).await;

        match incoming.recv().await.unwrap().message {
            AnyJsonRpcMessage::Request(request) => assert_eq!(request.method, "ping"),
            other => panic!("expected request, got {:?}", other),
        }
        assert!(matches!(
            incoming.recv().await.unwrap().message,
            AnyJsonRpcMessage::Notification(_)
        ));
        // EOF closes the inbound channel
        assert!(incoming.recv().await.is_none());

        let mut lines = BufReader::new(peer).lines();
        let parse_error = read_output_line(&mut lines).await;
        assert_eq!(parse_error["id"], Value::Null);
        assert_eq!(parse_error["error"]["code"], -32700);

        let reply = JsonRpcResponse::success(json!(1), json!({}));
        outgoing
            .send(TransportMessage::new(AnyJsonRpcMessage::Response(reply)))
            .await
            .unwrap();
        let written = read_output_line(&mut lines).await;
        assert_eq!(written, json!({"jsonrpc": "2.0", "id": 1, "result": {}}));

        transport.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_overlong_line_is_skipped() {
        let long_line = format!("{}\n", "x".repeat(200));
        let request = JsonRpcRequest::new(json!(7), "ping", None);
        let short_line = format!("{}\n", serde_json::to_string(&request).unwrap());

        let input = tokio_test::io::Builder::new()
            .read(long_line.as_bytes())
            .read(short_line.as_bytes())
            .build();
        let (output, peer) = tokio::io::duplex(64 * 1024);

        let transport = quiet_transport(128);
        let (mut incoming, _outgoing) = transport.attach(input, output).await;

        match incoming.recv().await.unwrap().message {
            AnyJsonRpcMessage::Request(request) => assert_eq!(request.id, json!(7)),
            other => panic!("expected request, got {:?}", other),
        }

        let mut lines = BufReader::new(peer).lines();
        let parse_error = read_output_line(&mut lines).await;
        assert_eq!(parse_error["error"]["code"], -32700);
        assert!(parse_error["error"]["message"]
            .as_str()
            .unwrap()
            .contains("maximum line length"));
    }

    #[tokio::test]
    async fn test_stop_flushes_queued_output() {
        let input = tokio_test::io::Builder::new().build();
        let (output, peer) = tokio::io::duplex(64 * 1024);

        let transport = quiet_transport(4096);
        let (_incoming, outgoing) = transport.attach(input, output).await;

        for id in 0..3 {
            let reply = JsonRpcResponse::success(json!(id), json!({}));
            outgoing
                .send(TransportMessage::new(AnyJsonRpcMessage::Response(reply)))
                .await
                .unwrap();
        }
        transport.stop().await.unwrap();

        let mut lines = BufReader::new(peer).lines();
        for id in 0..3 {
            assert_eq!(read_output_line(&mut lines).await["id"], json!(id));
        }
    }
}
