//! TCP protocol server exposing the entropy engine.
//!
//! Line-oriented text protocol: the server greets with `ready\n`, then
//! answers fixed-width 3-byte command tokens (`req`, `sta`, `end`).
//! One client is served at a time; a second connection waits in the
//! listen backlog until the active session ends.

mod parser;
mod session;

pub use parser::{Token, TokenParser, TOKEN_LEN};
pub use session::{Session, SessionEnd, BUF_SIZE};

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket};

use crate::engine::EntropyEngine;

/// Default protocol port.
pub const DEFAULT_PORT: u16 = 6666;

/// Errors that can occur while setting up the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),
}

/// Configuration for the protocol server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the listener to.
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], DEFAULT_PORT).into(),
        }
    }
}

impl ServerConfig {
    /// Creates a config with a custom port.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

/// Single-client TCP server over the entropy engine.
pub struct ProtocolServer {
    config: ServerConfig,
    engine: Arc<EntropyEngine>,
}

impl ProtocolServer {
    /// Creates a server serving the given engine.
    pub fn new(config: ServerConfig, engine: Arc<EntropyEngine>) -> Self {
        Self { config, engine }
    }

    /// Binds the listener (address reuse, backlog of one) and serves
    /// forever.
    ///
    /// Setup failures are returned before the accept loop is entered;
    /// once listening, per-session faults are logged and absorbed.
    pub async fn run(self) -> Result<(), ServerError> {
        let socket = match self.config.bind_addr {
            SocketAddr::V4(_) => TcpSocket::new_v4()?,
            SocketAddr::V6(_) => TcpSocket::new_v6()?,
        };
        socket.set_reuseaddr(true)?;
        socket.bind(self.config.bind_addr)?;
        let listener = socket.listen(1)?;
        tracing::info!(addr = %self.config.bind_addr, "entropy server listening");
        self.serve_on(listener).await
    }

    /// Accept loop over an already-bound listener.
    ///
    /// Sessions run to completion one at a time, each with its own
    /// owned state.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), ServerError> {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    continue;
                }
            };
            tracing::info!(%peer, "client connected");

            let mut session = Session::new(stream);
            match session.serve(&self.engine).await {
                Ok(reason) => {
                    tracing::info!(
                        %peer,
                        ?reason,
                        received = session.bytes_received(),
                        sent = session.bytes_sent(),
                        "session ended"
                    );
                }
                Err(e) => {
                    tracing::warn!(%peer, error = %e, "session failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DetectorConfig;
    use crate::engine::RandomEntry;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn spawn_server(engine: Arc<EntropyEngine>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = ProtocolServer::new(ServerConfig::default(), engine);
        tokio::spawn(async move {
            let _ = server.serve_on(listener).await;
        });
        addr
    }

    async fn read_line(stream: &mut TcpStream) -> String {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            let n = stream.read(&mut byte).await.unwrap();
            assert!(n > 0, "connection closed mid-line");
            line.push(byte[0]);
            if byte[0] == b'\n' {
                break;
            }
        }
        String::from_utf8(line).unwrap()
    }

    /// Reads until the peer closes, returning whatever arrived.
    async fn read_to_close(stream: &mut TcpStream) -> Vec<u8> {
        let mut collected = Vec::new();
        let mut buf = [0u8; 256];
        loop {
            match stream.read(&mut buf).await {
                Ok(0) => return collected,
                Ok(n) => collected.extend_from_slice(&buf[..n]),
                Err(_) => return collected,
            }
        }
    }

    fn engine() -> Arc<EntropyEngine> {
        EntropyEngine::new(DetectorConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_greeting_on_connect() {
        let addr = spawn_server(engine()).await;
        let mut client = TcpStream::connect(addr).await.unwrap();
        assert_eq!(read_line(&mut client).await, "ready\n");
    }

    #[tokio::test]
    async fn test_req_pops_oldest_entry() {
        let engine = engine();
        engine.push_entry(RandomEntry { byte: 7, raw: 1234 });
        for counter in 0..4u32 {
            engine.push_entry(RandomEntry::capture(counter));
        }
        assert_eq!(engine.queue_len(), 5);

        let addr = spawn_server(Arc::clone(&engine)).await;
        let mut client = TcpStream::connect(addr).await.unwrap();
        read_line(&mut client).await;

        client.write_all(b"req").await.unwrap();
        assert_eq!(read_line(&mut client).await, "7:1234:5\n");
        assert_eq!(engine.queue_len(), 4);
    }

    #[tokio::test]
    async fn test_req_on_empty_queue_returns_sentinel() {
        let addr = spawn_server(engine()).await;
        let mut client = TcpStream::connect(addr).await.unwrap();
        read_line(&mut client).await;

        client.write_all(b"req").await.unwrap();
        assert_eq!(read_line(&mut client).await, "256:0:0\n");
    }

    #[tokio::test]
    async fn test_sta_returns_diagnostics_line() {
        let addr = spawn_server(engine()).await;
        let mut client = TcpStream::connect(addr).await.unwrap();
        read_line(&mut client).await;

        client.write_all(b"sta").await.unwrap();
        assert_eq!(read_line(&mut client).await, "cpm:0:0:loop:0:0:0:0\n");
    }

    #[tokio::test]
    async fn test_end_closes_without_reply() {
        let addr = spawn_server(engine()).await;
        let mut client = TcpStream::connect(addr).await.unwrap();
        read_line(&mut client).await;

        client.write_all(b"end").await.unwrap();
        assert_eq!(read_to_close(&mut client).await, b"");
    }

    #[tokio::test]
    async fn test_unknown_token_closes_without_reply() {
        let addr = spawn_server(engine()).await;
        let mut client = TcpStream::connect(addr).await.unwrap();
        read_line(&mut client).await;

        client.write_all(b"xyz").await.unwrap();
        assert_eq!(read_to_close(&mut client).await, b"");
    }

    #[tokio::test]
    async fn test_split_token_across_writes() {
        let engine = engine();
        engine.push_entry(RandomEntry::capture(42));

        let addr = spawn_server(Arc::clone(&engine)).await;
        let mut client = TcpStream::connect(addr).await.unwrap();
        read_line(&mut client).await;

        client.write_all(b"re").await.unwrap();
        client.flush().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        client.write_all(b"q").await.unwrap();
        assert_eq!(read_line(&mut client).await, "42:42:1\n");
    }

    #[tokio::test]
    async fn test_next_client_served_after_session_ends() {
        let addr = spawn_server(engine()).await;

        let mut first = TcpStream::connect(addr).await.unwrap();
        read_line(&mut first).await;
        first.write_all(b"end").await.unwrap();
        read_to_close(&mut first).await;

        let mut second = TcpStream::connect(addr).await.unwrap();
        assert_eq!(read_line(&mut second).await, "ready\n");
    }
}
