//! Control and query messages exchanged with the collection service.
//!
//! Besides batch uploads, the client sends two plain-text payloads:
//!
//! - `winners,<client_id>` asks for the result announcement;
//! - `exit` is the shutdown notice, sent once when a connection is released.
//!
//! The winners response is either the sentinel `waiting` (the draw has not
//! happened yet) or a `,`-joined list of winner ids, where an empty payload
//! means zero winners rather than one empty id.

/// Payload announcing that the client is done with a connection.
pub const EXIT_NOTICE: &[u8] = b"exit";

/// Sentinel response while the draw result is not available yet.
pub const WAITING: &[u8] = b"waiting";

/// Keyword opening a winners query.
const WINNERS_KEYWORD: &str = "winners";

/// Separator in the winners query and the announced id list.
const LIST_SEPARATOR: char = ',';

/// Build the winners query payload for a client.
///
/// # Example
///
/// ```
/// use tally_client::protocol::winners_query;
///
/// assert_eq!(winners_query("3"), b"winners,3".to_vec());
/// ```
pub fn winners_query(client_id: &str) -> Vec<u8> {
    format!("{WINNERS_KEYWORD}{LIST_SEPARATOR}{client_id}").into_bytes()
}

/// A decoded winners response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WinnersReply {
    /// The draw has not been resolved yet; ask again later.
    Waiting,
    /// The announced winner ids (possibly empty).
    Announced(Vec<String>),
}

impl WinnersReply {
    /// Decode a winners response payload.
    ///
    /// An empty or blank payload normalizes to zero announced ids. Any
    /// other non-sentinel payload is split on `,` without filtering, so a
    /// single id comes back as a one-element list.
    pub fn decode(payload: &[u8]) -> Self {
        if payload == WAITING {
            return WinnersReply::Waiting;
        }

        let text = String::from_utf8_lossy(payload);
        if text.trim().is_empty() {
            return WinnersReply::Announced(Vec::new());
        }

        WinnersReply::Announced(text.split(LIST_SEPARATOR).map(str::to_string).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_winners_query_format() {
        assert_eq!(winners_query("1"), b"winners,1".to_vec());
        assert_eq!(winners_query("agency-42"), b"winners,agency-42".to_vec());
    }

    #[test]
    fn test_decode_waiting_sentinel() {
        assert_eq!(WinnersReply::decode(b"waiting"), WinnersReply::Waiting);
    }

    #[test]
    fn test_decode_empty_payload_is_zero_winners() {
        assert_eq!(
            WinnersReply::decode(b""),
            WinnersReply::Announced(Vec::new())
        );
    }

    #[test]
    fn test_decode_blank_payload_is_zero_winners() {
        assert_eq!(
            WinnersReply::decode(b"   "),
            WinnersReply::Announced(Vec::new())
        );
    }

    #[test]
    fn test_decode_single_winner() {
        assert_eq!(
            WinnersReply::decode(b"30904465"),
            WinnersReply::Announced(vec!["30904465".to_string()])
        );
    }

    #[test]
    fn test_decode_winner_list() {
        assert_eq!(
            WinnersReply::decode(b"30904465,24807259,34963649"),
            WinnersReply::Announced(vec![
                "30904465".to_string(),
                "24807259".to_string(),
                "34963649".to_string(),
            ])
        );
    }

    #[test]
    fn test_decode_is_exact_on_sentinel() {
        // Only the exact sentinel means "ask again"; anything else is an
        // announcement.
        let reply = WinnersReply::decode(b"waiting,extra");
        assert_eq!(
            reply,
            WinnersReply::Announced(vec!["waiting".to_string(), "extra".to_string()])
        );
    }
}
