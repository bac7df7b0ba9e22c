//! Per-connection session state and request dispatch.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::parser::{Token, TokenParser};
use crate::engine::EntropyEngine;

/// Size of the inbound and outbound session buffers.
pub const BUF_SIZE: usize = 2048;

/// Greeting sent to every client on connect.
const GREETING: &[u8] = b"ready\n";

/// How a session came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client closed the connection.
    ClientClosed,
    /// The client sent `end`.
    EndRequested,
    /// The client sent an unknown token.
    ProtocolError,
}

/// State owned by one accepted connection.
///
/// Each connection gets its own session, so a closing client can never
/// bleed state into a newly accepted one.
pub struct Session {
    stream: TcpStream,
    parser: TokenParser,
    bytes_received: u64,
    bytes_sent: u64,
}

impl Session {
    /// Wraps an accepted stream in fresh session state.
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            parser: TokenParser::new(),
            bytes_received: 0,
            bytes_sent: 0,
        }
    }

    /// Runs the session to completion: greets, then reads and answers
    /// tokens until the client disconnects, asks to end, or violates
    /// the protocol.
    pub async fn serve(&mut self, engine: &EntropyEngine) -> std::io::Result<SessionEnd> {
        self.send(GREETING).await?;

        let mut inbound = [0u8; BUF_SIZE];
        loop {
            let received = self.stream.read(&mut inbound).await?;
            if received == 0 {
                return Ok(SessionEnd::ClientClosed);
            }
            self.bytes_received += received as u64;
            self.parser.feed(&inbound[..received]);

            while let Some(token) = self.parser.next_token() {
                match token {
                    Token::Req => {
                        let popped = engine.pop_random();
                        let reply =
                            format!("{}:{}:{}\n", popped.value, popped.raw, popped.available);
                        self.send(reply.as_bytes()).await?;
                    }
                    Token::Sta => {
                        let reply = format!("{}\n", engine.format_stats());
                        self.send(reply.as_bytes()).await?;
                    }
                    Token::End => {
                        tracing::debug!("client requested end");
                        return Ok(SessionEnd::EndRequested);
                    }
                    Token::Unknown(raw) => {
                        tracing::debug!(token = ?raw, "unknown token, closing session");
                        return Ok(SessionEnd::ProtocolError);
                    }
                }
            }
        }
    }

    /// Writes a reply, truncating anything beyond the outbound buffer
    /// size. Replies on this protocol are far below the limit; the
    /// truncation mirrors the fixed buffer on the device.
    async fn send(&mut self, reply: &[u8]) -> std::io::Result<()> {
        let limit = reply.len().min(BUF_SIZE);
        self.stream.write_all(&reply[..limit]).await?;
        self.bytes_sent += limit as u64;
        Ok(())
    }

    /// Total bytes received from the client.
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Total bytes written to the client.
    pub fn bytes_sent(&self) -> u64 {
        self.bytes_sent
    }
}
