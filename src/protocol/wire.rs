//! Wire framing primitives.
//!
//! Every transmission unit on the wire is a frame:
//!
//! ```text
//! ┌────────────────┬─────────────┐
//! │ Length         │ Payload     │
//! │ 4 bytes        │ L bytes     │
//! │ uint32 LE      │             │
//! └────────────────┴─────────────┘
//! ```
//!
//! TCP is a byte stream, not a message stream; the length prefix recovers
//! message boundaries. A receiver answers each length frame and each
//! payload frame with a fixed 3-byte acknowledgement code, giving the
//! exchange an explicit request/response cadence at the cost of one round
//! trip per frame.

use crate::error::{Result, TallyError};

/// Size of the length prefix in bytes (fixed, exactly 4).
pub const LEN_PREFIX_SIZE: usize = 4;

/// Size of an acknowledgement code in bytes (fixed, exactly 3).
pub const ACK_SIZE: usize = 3;

/// Acknowledgement code for success.
pub const ACK_OK: &[u8; ACK_SIZE] = b"suc";

/// Acknowledgement code for failure.
pub const ACK_FAIL: &[u8; ACK_SIZE] = b"err";

/// Encode a payload length as the 4-byte little-endian prefix.
#[inline]
pub fn encode_len(len: u32) -> [u8; LEN_PREFIX_SIZE] {
    len.to_le_bytes()
}

/// Decode a 4-byte little-endian length prefix.
#[inline]
pub fn decode_len(buf: [u8; LEN_PREFIX_SIZE]) -> u32 {
    u32::from_le_bytes(buf)
}

/// A decoded acknowledgement code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    /// The peer accepted the frame (`suc`).
    Ok,
    /// The peer rejected the frame (`err`).
    Rejected,
}

impl Ack {
    /// Decode a 3-byte acknowledgement.
    ///
    /// Any byte sequence other than `suc` or `err` is a protocol error.
    pub fn decode(buf: &[u8; ACK_SIZE]) -> Result<Self> {
        match buf {
            ACK_OK => Ok(Ack::Ok),
            ACK_FAIL => Ok(Ack::Rejected),
            other => Err(TallyError::Protocol(format!(
                "unrecognized acknowledgement {:?}",
                String::from_utf8_lossy(other)
            ))),
        }
    }

    /// The 3-byte wire form of this acknowledgement.
    pub fn encode(&self) -> &'static [u8; ACK_SIZE] {
        match self {
            Ack::Ok => ACK_OK,
            Ack::Rejected => ACK_FAIL,
        }
    }
}
