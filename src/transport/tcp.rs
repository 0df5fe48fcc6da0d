//! Framed connection to the collection service.
//!
//! Every message travels as a 4-byte little-endian length prefix followed
//! by the payload bytes, with 3-byte acknowledgement codes gating the
//! exchange:
//!
//! ```text
//! sender                          receiver
//! ======                          ========
//! [len: u32 LE]   -------------->
//!                 <--------------  "suc" / "err"
//! [payload]       -------------->
//!                 <--------------  "suc" / "err"  (only for acked types)
//! ```
//!
//! The receiver acknowledges both frames unconditionally. Whether the
//! *sender* waits for the payload acknowledgement depends on the message
//! type (batch uploads do, queries and the shutdown notice do not), so
//! [`Connection::send`] takes it as a flag.
//!
//! # Example
//!
//! ```ignore
//! use tally_client::transport::Connection;
//!
//! let mut conn = Connection::connect("127.0.0.1:9999").await?;
//! conn.send(b"hello", true).await?;
//! let reply = conn.receive().await?;
//! conn.close().await;
//! ```

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{Result, TallyError};
use crate::protocol::{decode_len, encode_len, Ack, ACK_SIZE, EXIT_NOTICE, LEN_PREFIX_SIZE};

/// A connection speaking the length-prefixed, acknowledgement-gated
/// protocol.
///
/// Generic over the byte stream so tests can drive it through an
/// in-memory duplex pipe; production code uses the [`TcpStream`] default.
pub struct Connection<S = TcpStream> {
    stream: Option<S>,
}

impl Connection<TcpStream> {
    /// Open a TCP connection to the collection service.
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| TallyError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        tracing::debug!(%addr, "connected to collection service");
        Ok(Self {
            stream: Some(stream),
        })
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    /// Wrap an already-established byte stream.
    pub fn from_stream(stream: S) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    /// True until [`close`](Self::close) has run.
    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Send one framed message.
    ///
    /// Writes the length prefix, consumes the peer's length
    /// acknowledgement, writes the payload in full, and, when
    /// `wait_for_ack` is set, blocks for the payload acknowledgement.
    /// An `"err"` code at either step surfaces as
    /// [`TallyError::Rejected`]; an unrecognized code as
    /// [`TallyError::Protocol`].
    pub async fn send(&mut self, payload: &[u8], wait_for_ack: bool) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(TallyError::ConnectionClosed)?;

        let len = u32::try_from(payload.len()).map_err(|_| {
            TallyError::Protocol(format!(
                "payload of {} bytes does not fit a u32 length prefix",
                payload.len()
            ))
        })?;

        stream.write_all(&encode_len(len)).await?;
        stream.flush().await?;
        expect_ack(stream).await?;

        stream.write_all(payload).await?;
        stream.flush().await?;
        if wait_for_ack {
            expect_ack(stream).await?;
        }

        Ok(())
    }

    /// Receive one framed message, acknowledging each frame.
    ///
    /// Reads the length prefix and acknowledges it, then reads exactly
    /// that many payload bytes and acknowledges again. A zero length
    /// yields an empty payload with no trailing acknowledgement. A peer
    /// that closes mid-frame surfaces as
    /// [`TallyError::ConnectionClosed`].
    pub async fn receive(&mut self) -> Result<Bytes> {
        let stream = self.stream.as_mut().ok_or(TallyError::ConnectionClosed)?;

        let mut prefix = [0u8; LEN_PREFIX_SIZE];
        read_full(stream, &mut prefix).await?;
        let len = decode_len(prefix) as usize;

        stream.write_all(Ack::Ok.encode()).await?;
        stream.flush().await?;

        if len == 0 {
            return Ok(Bytes::new());
        }

        let mut payload = vec![0u8; len];
        read_full(stream, &mut payload).await?;

        stream.write_all(Ack::Ok.encode()).await?;
        stream.flush().await?;

        Ok(Bytes::from(payload))
    }

    /// Best-effort shutdown notice, then release the connection.
    ///
    /// Sends the `"exit"` control frame without waiting for any
    /// acknowledgement and shuts the stream down; write failures are
    /// ignored. Calling `close` again is a no-op, and any later `send`
    /// or `receive` fails with [`TallyError::ConnectionClosed`].
    pub async fn close(&mut self) {
        let Some(mut stream) = self.stream.take() else {
            return;
        };

        let _ = stream.write_all(&encode_len(EXIT_NOTICE.len() as u32)).await;
        let _ = stream.write_all(EXIT_NOTICE).await;
        let _ = stream.flush().await;
        let _ = stream.shutdown().await;
        tracing::debug!("connection closed");
    }
}

/// Read exactly `buf.len()` bytes, reporting an early peer close as
/// [`TallyError::ConnectionClosed`] rather than a raw I/O error.
async fn read_full<S: AsyncRead + Unpin>(stream: &mut S, buf: &mut [u8]) -> Result<()> {
    match stream.read_exact(buf).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(TallyError::ConnectionClosed)
        }
        Err(e) => Err(e.into()),
    }
}

/// Read one acknowledgement code and require it to be the success code.
async fn expect_ack<S: AsyncRead + Unpin>(stream: &mut S) -> Result<()> {
    let mut code = [0u8; ACK_SIZE];
    read_full(stream, &mut code).await?;
    match Ack::decode(&code)? {
        Ack::Ok => Ok(()),
        Ack::Rejected => Err(TallyError::Rejected),
    }
}
