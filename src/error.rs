use std::io;
use thiserror::Error;

/// All errors surfaced by the clamd client.
#[derive(Debug, Error)]
pub enum ClamdError {
    /// Transport-level failure: connect, write, or read on the daemon
    /// socket, including connect timeout. Never retried internally.
    #[error("connection error talking to clamd at {peer}: {source}")]
    Connection {
        peer: String,
        #[source]
        source: io::Error,
    },

    /// A response line did not match the `path: [virus ]STATUS` grammar, or
    /// a basic command was answered with an `ERROR` reply. The payload is
    /// the response text preceding the trailing `ERROR` marker.
    #[error("unexpected clamd response: {0:?}")]
    Response(String),

    /// The daemon refused an INSTREAM upload that exceeded its configured
    /// StreamMaxLength. Carries the daemon's message verbatim.
    #[error("{0}")]
    BufferTooLong(String),

    /// Reading from the caller-supplied byte source failed during an
    /// INSTREAM upload. Propagated untouched; distinct from [`Connection`],
    /// which covers the daemon socket.
    ///
    /// [`Connection`]: ClamdError::Connection
    #[error(transparent)]
    Io(#[from] io::Error),
}
