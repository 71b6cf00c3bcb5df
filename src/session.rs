use std::io;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time;

use crate::error::ClamdError;

/// A single-use connection to clamd.
///
/// The daemon serves exactly one command per connection, so a session is
/// opened, used for one request/response exchange, and closed. Callers open
/// a fresh session for every call; a session is never pooled or reused.
#[derive(Debug)]
pub struct ClamdSession {
    stream: TcpStream,
    peer: String,
}

impl ClamdSession {
    /// Connect to clamd at `host:port`.
    ///
    /// The attempt is bounded with `tokio::time::timeout` when a timeout is
    /// configured; elapse surfaces as a [`ClamdError::Connection`] with
    /// `TimedOut` kind, like any other connect failure.
    pub async fn connect(
        host: &str,
        port: u16,
        timeout: Option<Duration>,
    ) -> Result<Self, ClamdError> {
        let peer = format!("{host}:{port}");
        let connecting = TcpStream::connect(&peer);
        let connected = match timeout {
            Some(limit) => time::timeout(limit, connecting).await.unwrap_or_else(|_| {
                Err(io::Error::new(io::ErrorKind::TimedOut, "connect timed out"))
            }),
            None => connecting.await,
        };
        let stream = connected.map_err(|source| ClamdError::Connection {
            peer: peer.clone(),
            source,
        })?;
        tracing::debug!(%peer, "connected to clamd");
        Ok(Self { stream, peer })
    }

    /// Send one command as `n<COMMAND>[ <args>]\n` and flush.
    ///
    /// Commands use the newline-terminated "n" form. The daemon also accepts
    /// a null-terminated "z" form, deliberately not used here so arguments
    /// never need embedded-NUL handling.
    pub async fn send_command(&mut self, command: &str, args: &[&str]) -> Result<(), ClamdError> {
        let mut line = format!("n{command}");
        for arg in args {
            line.push(' ');
            line.push_str(arg);
        }
        line.push('\n');
        tracing::debug!(peer = %self.peer, %command, "sending command");
        self.write_all(line.as_bytes()).await
    }

    /// Write one INSTREAM chunk: a 4-byte big-endian length prefix followed
    /// by the payload bytes.
    pub async fn send_chunk(&mut self, chunk: &[u8]) -> Result<(), ClamdError> {
        self.write_all(&(chunk.len() as u32).to_be_bytes()).await?;
        self.write_all(chunk).await
    }

    /// Write the zero-length chunk that terminates an INSTREAM upload.
    pub async fn finish_stream(&mut self) -> Result<(), ClamdError> {
        self.write_all(&0u32.to_be_bytes()).await
    }

    /// Read until the daemon closes its end of the connection, then decode
    /// and trim the reply.
    ///
    /// Read failures and non-UTF-8 reply bytes are both reported as
    /// [`ClamdError::Connection`], distinct from parse errors.
    pub async fn read_response(&mut self) -> Result<String, ClamdError> {
        let mut raw = Vec::new();
        self.stream
            .read_to_end(&mut raw)
            .await
            .map_err(|e| self.connection_error(e))?;
        let text = String::from_utf8(raw).map_err(|e| {
            self.connection_error(io::Error::new(io::ErrorKind::InvalidData, e))
        })?;
        tracing::debug!(peer = %self.peer, bytes = text.len(), "response received");
        Ok(text.trim().to_string())
    }

    /// Close the session, shutting down the write side first and waiting for
    /// the stream to flush. Close failures are discarded so they never
    /// replace the outcome of the exchange; consuming `self` makes a second
    /// close impossible.
    pub async fn close(mut self) {
        let _ = self.stream.shutdown().await;
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), ClamdError> {
        self.stream
            .write_all(bytes)
            .await
            .map_err(|e| self.connection_error(e))?;
        self.stream
            .flush()
            .await
            .map_err(|e| self.connection_error(e))
    }

    fn connection_error(&self, source: io::Error) -> ClamdError {
        ClamdError::Connection {
            peer: self.peer.clone(),
            source,
        }
    }
}
