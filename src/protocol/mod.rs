//! Protocol module - wire framing and message payloads.
//!
//! This module implements the framed exchange with the collection service:
//! - 4-byte little-endian length prefix encoding/decoding
//! - 3-byte acknowledgement codes (`suc` / `err`)
//! - winners query/reply payloads and the `exit` notice

mod message;
mod wire;

pub use message::{winners_query, WinnersReply, EXIT_NOTICE, WAITING};
pub use wire::{decode_len, encode_len, Ack, ACK_FAIL, ACK_OK, ACK_SIZE, LEN_PREFIX_SIZE};
