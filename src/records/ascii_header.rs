use std::collections::HashMap;
use std::io::Read;

use nom::{
    IResult, Parser,
    bytes::complete::take_till1,
    character::complete::char,
    combinator::rest,
    sequence::separated_pair,
};

use crate::error::MetopError;
use crate::records::common::{read_fully, GENERIC_HEADER_SIZE};
use crate::records::generic_header::GenericRecordHeader;

/// Width the key column is padded to when encoding.
const KEY_COLUMN_WIDTH: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    pub key: String,
    pub value: String,
}

/// A Main or Secondary Product Header: ordered `KEY = VALUE` entries.
///
/// Keys are case-sensitive and unique within one record.
#[derive(Debug, Clone, Default)]
pub struct AsciiHeaderRecord {
    entries: Vec<HeaderEntry>,
    index: HashMap<String, usize>,
}

fn key_value(line: &str) -> IResult<&str, (&str, &str)> {
    separated_pair(take_till1(|c| c == '='), char('='), rest).parse(line)
}

fn is_blank(line: &str) -> bool {
    line.chars().all(|c| c.is_whitespace() || c == '\0')
}

impl AsciiHeaderRecord {
    /// Parse the body of an ASCII header record.
    ///
    /// Blank lines are skipped; any other line must be `KEY = VALUE`. A line
    /// holding bytes outside ASCII is malformed.
    pub fn parse(body: &[u8]) -> Result<Self, MetopError> {
        let mut record = AsciiHeaderRecord::default();

        for (line_nr, raw) in body.split(|&b| b == b'\n').enumerate() {
            let malformed = || MetopError::MalformedLine {
                line: line_nr + 1,
                content: String::from_utf8_lossy(raw).trim_end_matches('\r').to_string(),
            };
            if !raw.is_ascii() {
                return Err(malformed());
            }
            let line = std::str::from_utf8(raw).map_err(|_| malformed())?.trim_end_matches('\r');
            if is_blank(line) {
                continue;
            }
            let (_, (key, value)) = key_value(line).map_err(|_| malformed())?;
            let key = key.trim();
            if key.is_empty() {
                return Err(malformed());
            }
            record.insert(key, value.trim_matches(|c: char| c.is_whitespace() || c == '\0'))?;
        }

        Ok(record)
    }

    /// Read the body of the record introduced by `header`.
    ///
    /// Consumes exactly `header.record_size - 20` bytes.
    pub fn read<R: Read + ?Sized>(reader: &mut R, header: &GenericRecordHeader) -> Result<Self, MetopError> {
        let body_size = header.body_size()?;
        let body = read_fully(reader, body_size, GENERIC_HEADER_SIZE as u64)?;
        Self::parse(&body)
    }

    /// Build a record from key/value pairs, rejecting duplicate keys.
    pub fn from_pairs<K, V, I>(pairs: I) -> Result<Self, MetopError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut record = AsciiHeaderRecord::default();
        for (key, value) in pairs {
            record.insert(key.as_ref(), value.as_ref())?;
        }
        Ok(record)
    }

    fn insert(&mut self, key: &str, value: &str) -> Result<(), MetopError> {
        if self.index.contains_key(key) {
            return Err(MetopError::DuplicateKey(key.to_string()));
        }
        self.index.insert(key.to_string(), self.entries.len());
        self.entries.push(HeaderEntry {
            key: key.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    pub fn get_string(&self, key: &str) -> Result<&str, MetopError> {
        self.index
            .get(key)
            .map(|&i| self.entries[i].value.as_str())
            .ok_or_else(|| MetopError::MissingKey(key.to_string()))
    }

    pub fn get_int(&self, key: &str) -> Result<i64, MetopError> {
        let value = self.get_string(key)?;
        value.parse::<i64>().map_err(|_| MetopError::NotAnInteger {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    pub fn entries(&self) -> &[HeaderEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encodes the entries as the record body, one `KEY = VALUE` line each.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&format!("{:<width$}= {}\n", entry.key, entry.value, width = KEY_COLUMN_WIDTH));
        }
        out.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_splits_on_first_equals() {
        let (_, (key, value)) = key_value("FORMULA = A=B").unwrap();
        assert_eq!(key, "FORMULA ");
        assert_eq!(value, " A=B");
    }

    #[test]
    fn key_value_rejects_line_without_equals() {
        assert!(key_value("NO SEPARATOR HERE").is_err());
        assert!(key_value("= value only").is_err());
    }
}
