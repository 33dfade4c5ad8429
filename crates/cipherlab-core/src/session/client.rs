//! TCP client for the session server.
//!
//! # Thread Safety
//!
//! The client uses a tokio `Mutex` to serialize access to the connection, so
//! only one request is in flight at a time and responses match requests by
//! position. A response that arrives after its request timed out is
//! discarded when it shows up.

use super::protocol::{MessageBuffer, RequestKind, Response, WireRequest};
use crate::config::{ClientConfig, ServerConfig};
use crate::{LabError, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

struct Connection {
    stream: TcpStream,
    buffer: MessageBuffer,
    /// Responses still owed to requests that already timed out.
    stale: usize,
}

/// Client for one server connection.
pub struct SessionClient {
    conn: Mutex<Connection>,
    addr: SocketAddr,
    response_timeout: Duration,
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("addr", &self.addr)
            .field("response_timeout", &self.response_timeout)
            .finish_non_exhaustive()
    }
}

impl SessionClient {
    /// Connect to a server, giving up after [`ClientConfig::CONNECT_TIMEOUT`].
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let lost = || LabError::ConnectionLost {
            addr: addr.to_string(),
        };
        let stream = tokio::time::timeout(ClientConfig::CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| lost())?
            .map_err(|_| lost())?;

        debug!("Connected to {}", addr);

        Ok(Self {
            conn: Mutex::new(Connection {
                stream,
                buffer: MessageBuffer::new(ServerConfig::MAX_MESSAGE_SIZE),
                stale: 0,
            }),
            addr,
            response_timeout: ClientConfig::RESPONSE_TIMEOUT,
        })
    }

    /// Override how long [`send_request`](Self::send_request) waits.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Send one request and wait for its response.
    ///
    /// Error responses from the server come back as `Ok` with a failure
    /// status; `Err` means the round trip itself failed.
    pub async fn send_request(&self, request: &WireRequest) -> Result<Response> {
        let request_bytes = serde_json::to_vec(request)?;
        let mut conn = self.conn.lock().await;

        if let Err(e) = conn.stream.write_all(&request_bytes).await {
            debug!("Write to {} failed: {}", self.addr, e);
            return Err(self.lost());
        }

        match tokio::time::timeout(self.response_timeout, self.read_response(&mut conn)).await {
            Ok(result) => result,
            Err(_) => {
                conn.stale += 1;
                Err(LabError::Timeout(self.response_timeout))
            }
        }
    }

    async fn read_response(&self, conn: &mut Connection) -> Result<Response> {
        let mut chunk = vec![0u8; ServerConfig::READ_CHUNK_SIZE];
        loop {
            for document in conn.buffer.drain_documents()? {
                if conn.stale > 0 {
                    conn.stale -= 1;
                    debug!("Discarding late response from {}", self.addr);
                    continue;
                }
                return serde_json::from_value(document).map_err(|e| LabError::Json {
                    message: format!("Failed to parse response: {}", e),
                    source: Some(e),
                });
            }

            let n = conn.stream.read(&mut chunk).await.map_err(|_| self.lost())?;
            if n == 0 {
                return Err(self.lost());
            }
            conn.buffer.extend(&chunk[..n])?;
        }
    }

    fn lost(&self) -> LabError {
        LabError::ConnectionLost {
            addr: self.addr.to_string(),
        }
    }

    async fn call(&self, kind: RequestKind, data: Value) -> Result<Response> {
        let data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.send_request(&WireRequest::new(kind, data)).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Response> {
        self.call(
            RequestKind::Login,
            json!({"username": username, "password": password}),
        )
        .await
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<Response> {
        self.call(
            RequestKind::Register,
            json!({"username": username, "password": password}),
        )
        .await
    }

    pub async fn encrypt(&self, text: &str, keys: [&[u8]; 3]) -> Result<Response> {
        let [k1, k2, k3] = keys.map(|k| STANDARD.encode(k));
        self.call(
            RequestKind::CipherEncrypt,
            json!({"text": text, "key1": k1, "key2": k2, "key3": k3}),
        )
        .await
    }

    pub async fn decrypt(&self, encrypted_text: &str, keys: [&[u8]; 3]) -> Result<Response> {
        let [k1, k2, k3] = keys.map(|k| STANDARD.encode(k));
        self.call(
            RequestKind::CipherDecrypt,
            json!({"encrypted_text": encrypted_text, "key1": k1, "key2": k2, "key3": k3}),
        )
        .await
    }

    /// Solve `equation` on `[a, b]`. `None` leaves the server default.
    pub async fn solve(
        &self,
        equation: &str,
        a: f64,
        b: f64,
        epsilon: Option<f64>,
        max_iterations: Option<u32>,
    ) -> Result<Response> {
        let mut data = json!({"equation": equation, "a": a, "b": b});
        if let Some(epsilon) = epsilon {
            data["epsilon"] = json!(epsilon);
        }
        if let Some(max_iterations) = max_iterations {
            data["max_iterations"] = json!(max_iterations);
        }
        self.call(RequestKind::SolveEquation, data).await
    }

    /// Hide `message` in an encoded image. The response carries a PNG.
    pub async fn hide(&self, image: &[u8], message: &str) -> Result<Response> {
        self.call(
            RequestKind::StegoHide,
            json!({"image": STANDARD.encode(image), "message": message}),
        )
        .await
    }

    pub async fn extract(&self, image: &[u8]) -> Result<Response> {
        self.call(
            RequestKind::StegoExtract,
            json!({"image": STANDARD.encode(image)}),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::server::{MessageHandler, SessionServer};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Replies with the call number; the first call is slow.
    #[derive(Default)]
    struct SlowFirstHandler {
        calls: AtomicUsize,
    }

    impl MessageHandler for SlowFirstHandler {
        fn handle_message(&self, _message: Value) -> Response {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n == 1 {
                std::thread::sleep(Duration::from_millis(300));
            }
            Response::success(Map::new()).with_data("n", n)
        }
    }

    #[tokio::test]
    async fn test_late_response_is_discarded() {
        let mut handle = SessionServer::start(Arc::new(SlowFirstHandler::default()), "127.0.0.1:0")
            .await
            .unwrap();
        let client = SessionClient::connect(handle.addr())
            .await
            .unwrap()
            .with_response_timeout(Duration::from_millis(100));

        let first = client.login("a", "b").await;
        assert!(matches!(first, Err(LabError::Timeout(_))));

        let client = client.with_response_timeout(Duration::from_secs(5));
        let second = client.login("a", "b").await.unwrap();
        assert_eq!(second.data.get("n"), Some(&json!(2)));

        handle.shutdown();
    }

    #[tokio::test]
    async fn test_connect_to_dead_server_returns_connection_lost() {
        let addr: SocketAddr = "127.0.0.1:1".parse().unwrap();
        match SessionClient::connect(addr).await {
            Err(LabError::ConnectionLost { addr }) => assert_eq!(addr, "127.0.0.1:1"),
            other => panic!("expected ConnectionLost, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_going_away_is_connection_lost() {
        let mut handle = SessionServer::start(Arc::new(SlowFirstHandler::default()), "127.0.0.1:0")
            .await
            .unwrap();
        let client = SessionClient::connect(handle.addr()).await.unwrap();
        handle.shutdown();
        drop(handle);

        let result = client.register("a", "b").await;
        assert!(matches!(result, Err(LabError::ConnectionLost { .. })));
    }
}
