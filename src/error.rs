//! Error types for tally-client.

use thiserror::Error;

/// Main error type for all tally operations.
#[derive(Debug, Error)]
pub enum TallyError {
    /// The remote collection service could not be reached.
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O error on the local record source or the socket.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the connection mid-frame, or the connection was
    /// used after `close`.
    #[error("connection closed")]
    ConnectionClosed,

    /// The acknowledgement byte sequence was not recognized, or the wire
    /// otherwise diverged from the protocol.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server acknowledged a frame with the failure code.
    #[error("rejected by server")]
    Rejected,

    /// The configuration file could not be loaded or failed validation.
    #[error("config error: {0}")]
    Config(String),

    /// Shutdown was requested while a workflow phase was in progress.
    #[error("interrupted by shutdown request")]
    Interrupted,
}

/// Result type alias using TallyError.
pub type Result<T> = std::result::Result<T, TallyError>;
