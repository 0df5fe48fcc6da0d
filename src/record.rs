//! Wager record model and its canonical wire encoding.
//!
//! A record is one submission tied to an owning agency (the client id).
//! Source files carry one record per line, six comma-separated fields:
//!
//! ```text
//! agency,first_name,last_name,document,birthdate,number
//! ```
//!
//! On the wire the same six fields are joined by `|`, and records within a
//! batch are joined by `;`. The three delimiters never overlap, so a
//! payload splits unambiguously.
//!
//! Fields are opaque text: the client validates field *count* only, never
//! content.

/// Field delimiter in source file lines.
pub const SOURCE_DELIMITER: char = ',';

/// Field delimiter in the wire encoding of a record.
pub const FIELD_DELIMITER: u8 = b'|';

/// Separator between record encodings within a batch payload.
pub const RECORD_SEPARATOR: u8 = b';';

/// Number of fields in a well-formed record line.
pub const FIELD_COUNT: usize = 6;

/// A single wager record. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Owning agency (client) identifier.
    pub agency: String,
    /// First name of the submitter.
    pub first_name: String,
    /// Last name of the submitter.
    pub last_name: String,
    /// Document id of the submitter.
    pub document: String,
    /// Birth date, `YYYY-MM-DD` by convention (not validated here).
    pub birthdate: String,
    /// Chosen number.
    pub number: String,
}

impl Record {
    /// Create a record from its six fields.
    pub fn new(
        agency: &str,
        first_name: &str,
        last_name: &str,
        document: &str,
        birthdate: &str,
        number: &str,
    ) -> Self {
        Self {
            agency: agency.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            document: document.to_string(),
            birthdate: birthdate.to_string(),
            number: number.to_string(),
        }
    }

    /// Parse one source line into a record.
    ///
    /// Returns `None` unless splitting the line on [`SOURCE_DELIMITER`]
    /// yields exactly [`FIELD_COUNT`] fields. Malformed lines are dropped
    /// by the caller, never surfaced as errors.
    ///
    /// # Example
    ///
    /// ```
    /// use tally_client::record::Record;
    ///
    /// let record = Record::parse("7,Maria,Gomez,30123456,1990-04-17,7574").unwrap();
    /// assert_eq!(record.agency, "7");
    /// assert_eq!(record.number, "7574");
    /// assert!(Record::parse("too,few,fields").is_none());
    /// ```
    pub fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split(SOURCE_DELIMITER).collect();
        match fields.as_slice() {
            [agency, first_name, last_name, document, birthdate, number] => Some(Self::new(
                agency, first_name, last_name, document, birthdate, number,
            )),
            _ => None,
        }
    }

    /// Encode the record as `field1|field2|...|field6`.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf
    }

    /// Encode the record into an existing buffer.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        for (i, field) in self.fields().into_iter().enumerate() {
            if i > 0 {
                buf.push(FIELD_DELIMITER);
            }
            buf.extend_from_slice(field.as_bytes());
        }
    }

    /// Byte length of the wire encoding.
    pub fn encoded_len(&self) -> usize {
        let field_bytes: usize = self.fields().iter().map(|f| f.len()).sum();
        field_bytes + (FIELD_COUNT - 1)
    }

    /// The six fields in wire order.
    fn fields(&self) -> [&str; FIELD_COUNT] {
        [
            &self.agency,
            &self.first_name,
            &self.last_name,
            &self.document,
            &self.birthdate,
            &self.number,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record::new("1", "Santiago Lionel", "Lorca", "30904465", "1999-03-17", "7574")
    }

    #[test]
    fn test_parse_six_fields_in_order() {
        let record = Record::parse("1,Santiago Lionel,Lorca,30904465,1999-03-17,7574").unwrap();
        assert_eq!(record, sample());
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        assert!(Record::parse("").is_none());
        assert!(Record::parse("only,five,fields,right,here").is_none());
        assert!(Record::parse("a,b,c,d,e,f,g").is_none());
    }

    #[test]
    fn test_parse_keeps_empty_fields() {
        // Empty fields are opaque content, not a structural fault.
        let record = Record::parse("1,,Lorca,,1999-03-17,").unwrap();
        assert_eq!(record.first_name, "");
        assert_eq!(record.document, "");
        assert_eq!(record.number, "");
    }

    #[test]
    fn test_encode_joins_with_pipe() {
        let encoded = sample().encode();
        assert_eq!(
            encoded,
            b"1|Santiago Lionel|Lorca|30904465|1999-03-17|7574".to_vec()
        );
    }

    #[test]
    fn test_encode_roundtrip_on_field_delimiter() {
        let encoded = sample().encode();
        let text = std::str::from_utf8(&encoded).unwrap();
        let fields: Vec<&str> = text.split('|').collect();
        assert_eq!(
            fields,
            vec!["1", "Santiago Lionel", "Lorca", "30904465", "1999-03-17", "7574"]
        );
    }

    #[test]
    fn test_encoded_len_matches_encode() {
        let record = sample();
        assert_eq!(record.encoded_len(), record.encode().len());

        let with_empty = Record::parse("1,,,,,").unwrap();
        assert_eq!(with_empty.encoded_len(), with_empty.encode().len());
        assert_eq!(with_empty.encode(), b"1|||||".to_vec());
    }

    #[test]
    fn test_delimiters_are_distinct() {
        assert_ne!(SOURCE_DELIMITER as u8, FIELD_DELIMITER);
        assert_ne!(FIELD_DELIMITER, RECORD_SEPARATOR);
        assert_ne!(SOURCE_DELIMITER as u8, RECORD_SEPARATOR);
    }
}
