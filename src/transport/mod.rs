//! Transport module - framed TCP connection handling.
//!
//! Provides the acknowledgement-gated framing over:
//! - TCP sockets (production)
//! - any `AsyncRead + AsyncWrite` stream (tests use in-memory duplex pipes)

mod tcp;

pub use tcp::Connection;
