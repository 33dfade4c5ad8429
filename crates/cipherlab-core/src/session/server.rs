//! TCP session server.
//!
//! Accepts connections and gives each its own task and [`MessageBuffer`].
//! Every complete JSON message is handed to a [`MessageHandler`] on the
//! blocking pool and the response is written back on the same connection.
//!
//! # Thread Safety
//!
//! The handler is shared via `Arc` across all connection tasks. A connection
//! waits for its own response before reading further, so a slow operation
//! stalls only that connection.

use super::protocol::{MessageBuffer, Response};
use crate::config::ServerConfig;
use crate::{LabError, Result};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::{oneshot, watch};
use tracing::{debug, error, info, warn};

/// Turns one decoded message into one response.
///
/// Called on the blocking thread pool, so implementations may do file or
/// database I/O and CPU-heavy work directly.
pub trait MessageHandler: Send + Sync + 'static {
    fn handle_message(&self, message: Value) -> Response;
}

/// Per-server limits.
#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    pub max_connections: usize,
    pub max_message_size: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            max_connections: ServerConfig::MAX_CONNECTIONS,
            max_message_size: ServerConfig::MAX_MESSAGE_SIZE,
        }
    }
}

/// Handle to a running session server. Dropping shuts down the server.
pub struct ServerHandle {
    pub addr: SocketAddr,
    pub port: u16,
    active_connections: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    conn_shutdown_tx: watch::Sender<bool>,
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl ServerHandle {
    /// Get the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Number of connections currently being served.
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Relaxed)
    }

    /// Shut down the server gracefully.
    ///
    /// Stops accepting new connections and signals all active connection
    /// handlers to close.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = self.conn_shutdown_tx.send(true);
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

/// TCP server speaking bare JSON messages.
pub struct SessionServer;

impl SessionServer {
    /// Start serving on `addr` with default limits.
    pub async fn start<H: MessageHandler>(
        handler: Arc<H>,
        addr: impl ToSocketAddrs,
    ) -> Result<ServerHandle> {
        Self::start_with_options(handler, addr, ServerOptions::default()).await
    }

    /// Start serving on `addr`.
    ///
    /// Binding to port 0 picks a free port; read it back from the handle.
    pub async fn start_with_options<H: MessageHandler>(
        handler: Arc<H>,
        addr: impl ToSocketAddrs,
        options: ServerOptions,
    ) -> Result<ServerHandle> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let port = addr.port();

        info!("Session server listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let (conn_shutdown_tx, conn_shutdown_rx) = watch::channel(false);
        let active_connections = Arc::new(AtomicUsize::new(0));

        let task_handle = tokio::spawn(Self::accept_loop(
            listener,
            handler,
            options,
            shutdown_rx,
            conn_shutdown_rx,
            active_connections.clone(),
        ));

        Ok(ServerHandle {
            addr,
            port,
            active_connections,
            shutdown_tx: Some(shutdown_tx),
            conn_shutdown_tx,
            task_handle: Some(task_handle),
        })
    }

    async fn accept_loop<H: MessageHandler>(
        listener: TcpListener,
        handler: Arc<H>,
        options: ServerOptions,
        mut shutdown_rx: oneshot::Receiver<()>,
        conn_shutdown_rx: watch::Receiver<bool>,
        active_connections: Arc<AtomicUsize>,
    ) {
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("Session server shutting down");
                    break;
                }
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            let current = active_connections.load(Ordering::Relaxed);
                            if current >= options.max_connections {
                                warn!(
                                    "Rejecting connection from {}: at max capacity ({})",
                                    peer_addr,
                                    options.max_connections
                                );
                                continue;
                            }

                            active_connections.fetch_add(1, Ordering::Relaxed);
                            let handler = handler.clone();
                            let conns = active_connections.clone();
                            let mut conn_shutdown = conn_shutdown_rx.clone();

                            tokio::spawn(async move {
                                info!("Client connected: {}", peer_addr);
                                match Self::handle_connection(
                                    stream,
                                    handler,
                                    options.max_message_size,
                                    &mut conn_shutdown,
                                )
                                .await
                                {
                                    Ok(()) => info!("Client disconnected: {}", peer_addr),
                                    Err(e) => debug!("Connection {} ended: {}", peer_addr, e),
                                }
                                conns.fetch_sub(1, Ordering::Relaxed);
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
            }
        }
    }

    async fn handle_connection<H: MessageHandler>(
        mut stream: TcpStream,
        handler: Arc<H>,
        max_message_size: usize,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> Result<()> {
        let (mut reader, mut writer) = stream.split();
        let mut buffer = MessageBuffer::new(max_message_size);
        let mut chunk = vec![0u8; ServerConfig::READ_CHUNK_SIZE];

        loop {
            let n = tokio::select! {
                result = reader.read(&mut chunk) => result?,
                _ = shutdown_rx.changed() => {
                    return Ok(());
                }
            };

            if n == 0 {
                if !buffer.is_empty() {
                    debug!("Discarding {} undecoded bytes on disconnect", buffer.len());
                }
                return Ok(());
            }

            if let Err(e) = buffer.extend(&chunk[..n]) {
                warn!("Closing connection: {}", e);
                return Err(e);
            }

            let Some(message) = buffer.try_take() else {
                continue;
            };

            let handler = handler.clone();
            let response = tokio::task::spawn_blocking(move || handler.handle_message(message))
                .await
                .map_err(|e| LabError::Other(format!("Request handler failed: {}", e)))?;

            let response_bytes = serde_json::to_vec(&response)?;
            writer.write_all(&response_bytes).await?;
            writer.flush().await?;
        }
    }
}
