use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::ClamdError;
use crate::response::{self, ParsedLine};
use crate::session::ClamdSession;
use crate::types::{ScanOutcome, ScanVerdict};

/// Default INSTREAM chunk size in bytes. The chunked upload as a whole must
/// stay below the daemon's StreamMaxLength (clamd.conf) or it is rejected;
/// that limit is a deployment constraint the client does not enforce.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Reply the daemon sends when an INSTREAM upload exceeds StreamMaxLength.
const SIZE_LIMIT_REPLY: &str = "INSTREAM size limit exceeded. ERROR";

/// Client for a clamd daemon reachable over TCP.
///
/// clamd accepts exactly one command per connection, so every call opens a
/// fresh connection, performs one exchange, and closes it before returning,
/// on success and on failure alike. The client holds no connection state;
/// concurrent calls from one instance are independent.
#[derive(Debug, Clone)]
pub struct ClamdClient {
    host: String,
    port: u16,
    timeout: Option<Duration>,
}

impl Default for ClamdClient {
    /// A client for the conventional local daemon at `127.0.0.1:3310`.
    fn default() -> Self {
        Self::new("127.0.0.1", 3310)
    }
}

impl ClamdClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: None,
        }
    }

    /// Like [`ClamdClient::new`], with a connect timeout applied to every
    /// call.
    pub fn with_timeout(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: Some(timeout),
        }
    }

    /// Check the daemon is alive. A healthy daemon replies `PONG`.
    pub async fn ping(&self) -> Result<String, ClamdError> {
        self.basic_command("PING").await
    }

    /// Report the daemon and signature database versions.
    pub async fn version(&self) -> Result<String, ClamdError> {
        self.basic_command("VERSION").await
    }

    /// Reload the signature database.
    pub async fn reload(&self) -> Result<String, ClamdError> {
        self.basic_command("RELOAD").await
    }

    /// Force the daemon to shut down and exit. The reply is usually empty.
    pub async fn shutdown(&self) -> Result<String, ClamdError> {
        self.basic_command("SHUTDOWN").await
    }

    /// Scan a file or directory (recursively, with archive support) on the
    /// daemon's file system. `path` must be absolute: the daemon resolves
    /// paths itself, so relative paths produce server-dependent results.
    pub async fn scan(&self, path: impl AsRef<Path>) -> Result<ScanOutcome, ClamdError> {
        self.file_system_scan("SCAN", path.as_ref()).await
    }

    /// Like [`ClamdClient::scan`], but the daemon does not stop on errors or
    /// detections; all results come back aggregated in one response.
    pub async fn contscan(&self, path: impl AsRef<Path>) -> Result<ScanOutcome, ClamdError> {
        self.file_system_scan("CONTSCAN", path.as_ref()).await
    }

    /// Like [`ClamdClient::contscan`], scanned with multiple daemon threads
    /// (faster on SMP machines).
    pub async fn multiscan(&self, path: impl AsRef<Path>) -> Result<ScanOutcome, ClamdError> {
        self.file_system_scan("MULTISCAN", path.as_ref()).await
    }

    /// Scan an arbitrary byte source by uploading it over the connection in
    /// length-prefixed chunks, without a named path.
    ///
    /// Returns a one-entry outcome keyed by the identifier the daemon
    /// reports (conventionally `"stream"`), or an empty outcome when the
    /// daemon sends no reply at all. Fails with
    /// [`ClamdError::BufferTooLong`] when the upload exceeds the daemon's
    /// StreamMaxLength; source read failures propagate as
    /// [`ClamdError::Io`].
    pub async fn instream(
        &self,
        source: impl AsyncRead + Unpin,
    ) -> Result<ScanOutcome, ClamdError> {
        self.instream_with_chunk_size(source, DEFAULT_CHUNK_SIZE).await
    }

    /// Variant of [`ClamdClient::instream`] with a caller-chosen chunk size.
    pub async fn instream_with_chunk_size(
        &self,
        mut source: impl AsyncRead + Unpin,
        chunk_size: usize,
    ) -> Result<ScanOutcome, ClamdError> {
        let mut session = self.open().await?;
        let result = instream_exchange(&mut session, &mut source, chunk_size).await;
        session.close().await;
        result
    }

    /// Send a no-argument command and return the reply text. A reply
    /// carrying the `ERROR` marker fails with the preceding text as payload.
    async fn basic_command(&self, command: &str) -> Result<String, ClamdError> {
        let mut session = self.open().await?;
        let result = basic_exchange(&mut session, command).await;
        session.close().await;
        result
    }

    /// Send `command` with `path` as its single argument and parse the
    /// daemon's line-per-path response into a [`ScanOutcome`].
    async fn file_system_scan(
        &self,
        command: &str,
        path: &Path,
    ) -> Result<ScanOutcome, ClamdError> {
        let mut session = self.open().await?;
        let result = scan_exchange(&mut session, command, path).await;
        session.close().await;
        result
    }

    async fn open(&self) -> Result<ClamdSession, ClamdError> {
        ClamdSession::connect(&self.host, self.port, self.timeout).await
    }
}

async fn basic_exchange(
    session: &mut ClamdSession,
    command: &str,
) -> Result<String, ClamdError> {
    session.send_command(command, &[]).await?;
    let reply = session.read_response().await?;
    match reply.rsplit_once("ERROR") {
        Some((prefix, _)) => Err(ClamdError::Response(prefix.to_string())),
        None => Ok(reply),
    }
}

async fn scan_exchange(
    session: &mut ClamdSession,
    command: &str,
    path: &Path,
) -> Result<ScanOutcome, ClamdError> {
    let path_arg = path.to_string_lossy();
    session.send_command(command, &[path_arg.as_ref()]).await?;
    let reply = session.read_response().await?;

    let mut outcome = ScanOutcome::new();
    for line in reply.split('\n') {
        if line.is_empty() {
            continue;
        }
        let ParsedLine { path, virus, status } = response::parse_scan_line(line)?;
        outcome.insert(
            path,
            ScanVerdict {
                status,
                detail: virus,
            },
        );
    }
    Ok(outcome)
}

async fn instream_exchange(
    session: &mut ClamdSession,
    source: &mut (impl AsyncRead + Unpin),
    chunk_size: usize,
) -> Result<ScanOutcome, ClamdError> {
    session.send_command("INSTREAM", &[]).await?;

    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut uploaded = 0usize;
    loop {
        // Source read failures are the caller's I/O errors and propagate
        // unwrapped, unlike socket failures.
        let n = source.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        session.send_chunk(&buf[..n]).await?;
        uploaded += n;
    }
    session.finish_stream().await?;
    tracing::debug!(bytes = uploaded, "stream upload finished");

    let reply = session.read_response().await?;
    if reply.is_empty() {
        // The daemon said nothing; report nothing rather than invent a
        // verdict.
        return Ok(ScanOutcome::new());
    }
    if reply == SIZE_LIMIT_REPLY {
        return Err(ClamdError::BufferTooLong(reply));
    }

    let ParsedLine { path, virus, status } = response::parse_scan_line(&reply)?;
    Ok(ScanOutcome::from([(
        path,
        ScanVerdict {
            status,
            detail: virus,
        },
    )]))
}
