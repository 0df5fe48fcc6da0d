//! Batched reading of the wager record source.
//!
//! [`BatchReader`] pulls the source in bounded chunks and yields
//! [`Batch`]es of whole record lines. A chunk boundary rarely falls on a
//! line boundary, so the reader keeps the unterminated tail of each chunk
//! in a carry buffer and prepends it to the next read. A record line is
//! therefore never split across two batches and never read twice,
//! regardless of the chunk size, and the source only needs to be
//! [`AsyncRead`] (no seeking).
//!
//! Malformed lines (field count other than six) stay in the batch as empty
//! slots: the slot count tracks attempted lines, and the wire encoding
//! keeps one position per attempted line so the peer's accounting matches
//! the client's.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::Result;
use crate::record::{Record, RECORD_SEPARATOR};

/// An ordered group of record slots built from one bounded read.
///
/// Each slot corresponds to one attempted source line; a `None` slot is a
/// line that failed the six-field rule and was dropped from parsing but
/// kept in the count.
#[derive(Debug, Clone)]
pub struct Batch {
    client_id: String,
    slots: Vec<Option<Record>>,
}

impl Batch {
    pub(crate) fn new(client_id: String, slots: Vec<Option<Record>>) -> Self {
        Self { client_id, slots }
    }

    /// The client this batch was read for.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Number of attempted lines (parsed or malformed).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True when the batch holds no slots at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of well-formed records.
    pub fn parsed(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Iterate over the well-formed records in order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    /// Encode the batch payload: record encodings joined by `;`.
    ///
    /// A malformed slot contributes an empty position, so two separators
    /// in a row mark a dropped line. The peer skips empty positions.
    pub fn encode(&self) -> Bytes {
        let capacity = self
            .slots
            .iter()
            .map(|slot| slot.as_ref().map_or(0, Record::encoded_len))
            .sum::<usize>()
            + self.slots.len().saturating_sub(1);

        let mut buf = Vec::with_capacity(capacity);
        for (i, slot) in self.slots.iter().enumerate() {
            if i > 0 {
                buf.push(RECORD_SEPARATOR);
            }
            if let Some(record) = slot {
                record.encode_into(&mut buf);
            }
        }
        Bytes::from(buf)
    }
}

/// Reads a record source in bounded chunks, yielding whole-line batches.
///
/// One call to [`next_batch`](Self::next_batch) performs exactly one read
/// of up to `max_bytes`, mirroring one upload frame per read. When a chunk
/// contains no complete line (a record longer than the budget), the call
/// yields an empty batch and the carry keeps growing until a terminator or
/// end-of-file arrives, so the reader always makes progress.
pub struct BatchReader<R> {
    source: R,
    max_bytes: usize,
    client_id: String,
    /// Unterminated tail of the previous chunk, prepended to the next.
    carry: Vec<u8>,
    exhausted: bool,
}

impl<R: AsyncRead + Unpin> BatchReader<R> {
    /// Create a reader over `source` with a per-read byte budget.
    pub fn new(source: R, max_bytes: usize, client_id: &str) -> Self {
        Self {
            source,
            max_bytes,
            client_id: client_id.to_string(),
            carry: Vec::new(),
            exhausted: false,
        }
    }

    /// Read the next batch.
    ///
    /// Returns `Ok(None)` once the source is exhausted; a genuine I/O
    /// fault surfaces as an error. A final fragment with no line
    /// terminator at end-of-file is discarded, with a warning, because the
    /// collection service only ever receives terminated lines.
    pub async fn next_batch(&mut self) -> Result<Option<Batch>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut chunk = vec![0u8; self.max_bytes];
        let n = self.source.read(&mut chunk).await?;
        if n == 0 {
            self.exhausted = true;
            if !self.carry.is_empty() {
                tracing::warn!(
                    client_id = %self.client_id,
                    bytes = self.carry.len(),
                    "discarding unterminated trailing fragment at end of source"
                );
                self.carry.clear();
            }
            return Ok(None);
        }

        // Short reads may arrive padded with filler; only real bytes count.
        let mut fresh = &chunk[..n];
        while let [head @ .., 0] = fresh {
            fresh = head;
        }

        let mut data = std::mem::take(&mut self.carry);
        data.extend_from_slice(fresh);

        let mut candidates: Vec<&[u8]> = data.split(|&b| b == b'\n').collect();
        match data.last() {
            // Terminated by a newline: the split leaves a final empty
            // fragment that is not a line.
            Some(b'\n') => {
                candidates.pop();
            }
            // A lone trailing carriage return also terminates its line.
            Some(b'\r') => {}
            // No terminator: defer the final fragment to the next read.
            Some(_) => {
                let fragment = candidates.pop().unwrap_or_default();
                self.carry = fragment.to_vec();
            }
            None => {
                candidates.clear();
            }
        }

        let mut slots = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let line = candidate.strip_suffix(b"\r").unwrap_or(candidate);
            let text = String::from_utf8_lossy(line);
            match Record::parse(&text) {
                Some(record) => slots.push(Some(record)),
                None => {
                    tracing::warn!(
                        client_id = %self.client_id,
                        fields = text.split(crate::record::SOURCE_DELIMITER).count(),
                        "dropping malformed record line"
                    );
                    slots.push(None);
                }
            }
        }

        Ok(Some(Batch::new(self.client_id.clone(), slots)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE_A: &str = "1,Santiago Lionel,Lorca,30904465,1999-03-17,7574";
    const LINE_B: &str = "1,Juana,Perez,24807259,1985-11-02,1001";

    async fn read_all(content: &[u8], max_bytes: usize) -> Vec<Record> {
        let mut reader = BatchReader::new(content, max_bytes, "1");
        let mut records = Vec::new();
        // An upper bound on calls keeps a regression from hanging the test.
        for _ in 0..content.len() * 2 + 4 {
            match reader.next_batch().await.unwrap() {
                Some(batch) => records.extend(batch.records().cloned()),
                None => return records,
            }
        }
        panic!("reader did not reach exhaustion");
    }

    #[tokio::test]
    async fn test_two_terminated_lines_one_batch() {
        let content = format!("{LINE_A}\n{LINE_B}\n");
        let mut reader = BatchReader::new(content.as_bytes(), 1024, "1");

        let batch = reader.next_batch().await.unwrap().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.parsed(), 2);
        assert_eq!(batch.client_id(), "1");

        assert!(reader.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_chunk_boundary_invariance() {
        let content = format!("{LINE_A}\nnot a record\n{LINE_B}\r\n1,A,B,C,D,E\n");
        let whole = read_all(content.as_bytes(), content.len()).await;
        assert_eq!(whole.len(), 3);

        for max_bytes in 1..=content.len() {
            let chunked = read_all(content.as_bytes(), max_bytes).await;
            assert_eq!(chunked, whole, "chunk size {max_bytes} changed the parse");
        }
    }

    #[tokio::test]
    async fn test_unterminated_final_line_is_dropped() {
        let content = format!("{LINE_A}\n{LINE_B}");
        let mut reader = BatchReader::new(content.as_bytes(), 1024, "1");

        let batch = reader.next_batch().await.unwrap().unwrap();
        assert_eq!(batch.parsed(), 1);
        assert_eq!(batch.records().next().unwrap().first_name, "Santiago Lionel");

        // The tail can no longer advance, so it is discarded.
        assert!(reader.next_batch().await.unwrap().is_none());
        assert!(reader.next_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_lines_counted_not_parsed() {
        let content = format!("bad line\n{LINE_A}\nx,y\n");
        let mut reader = BatchReader::new(content.as_bytes(), 1024, "1");

        let batch = reader.next_batch().await.unwrap().unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.parsed(), 1);

        let encoded = batch.encode();
        let inner = Record::parse(LINE_A).unwrap().encode();
        let expected = [&b";"[..], inner.as_slice(), &b";"[..]].concat();
        assert_eq!(&encoded[..], expected.as_slice());
    }

    #[tokio::test]
    async fn test_interior_empty_line_is_an_attempted_line() {
        let content = format!("{LINE_A}\n\n{LINE_B}\n");
        let mut reader = BatchReader::new(content.as_bytes(), 1024, "1");

        let batch = reader.next_batch().await.unwrap().unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.parsed(), 2);
    }

    #[tokio::test]
    async fn test_crlf_lines_normalized() {
        let content = format!("{LINE_A}\r\n{LINE_B}\r\n");
        let mut reader = BatchReader::new(content.as_bytes(), 1024, "1");

        let batch = reader.next_batch().await.unwrap().unwrap();
        assert_eq!(batch.parsed(), 2);
        for record in batch.records() {
            assert!(!record.number.ends_with('\r'));
        }
    }

    #[tokio::test]
    async fn test_trailing_nul_padding_stripped() {
        let mut content = format!("{LINE_A}\n").into_bytes();
        content.extend_from_slice(&[0, 0, 0, 0]);

        let records = read_all(&content, content.len()).await;
        assert_eq!(records.len(), 1);

        let records = read_all(&content, 3).await;
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_line_longer_than_budget_still_parses() {
        let long_name = "x".repeat(64);
        let content = format!("1,{long_name},Lorca,30904465,1999-03-17,7574\n");

        let records = read_all(content.as_bytes(), 8).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].first_name, long_name);
    }

    #[tokio::test]
    async fn test_empty_source_is_immediately_exhausted() {
        let mut reader = BatchReader::new(&b""[..], 1024, "1");
        assert!(reader.next_batch().await.unwrap().is_none());
    }

    #[test]
    fn test_empty_batch_encodes_to_empty_payload() {
        let batch = Batch::new("1".to_string(), Vec::new());
        assert!(batch.is_empty());
        assert!(batch.encode().is_empty());
    }

    #[test]
    fn test_single_malformed_slot_encodes_to_empty_payload() {
        let batch = Batch::new("1".to_string(), vec![None]);
        assert_eq!(batch.len(), 1);
        assert!(batch.encode().is_empty());
    }
}
