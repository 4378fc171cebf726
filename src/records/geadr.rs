use std::io::Read;

use crate::error::MetopError;
use crate::records::common::{read_fully, check_len, InstrumentGroup, RecordClass, GENERIC_HEADER_SIZE};
use crate::records::generic_header::GenericRecordHeader;

/// Length of the text blob following a GEADR's generic header.
pub const GEADR_TEXT_LEN: usize = 100;

/// Global External Auxiliary Data Record: a fixed-size reference to an
/// external auxiliary file, stored as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeadrRecord {
    pub header: GenericRecordHeader,
    pub text: String,
}

impl GeadrRecord {
    pub const SIZE: usize = GENERIC_HEADER_SIZE + GEADR_TEXT_LEN;

    pub fn new(record_subclass: u8, text: &str) -> Self {
        GeadrRecord {
            header: GenericRecordHeader::new(RecordClass::Geadr, InstrumentGroup::Avhrr3, record_subclass, Self::SIZE as u32),
            text: text.to_string(),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MetopError> {
        check_len(bytes, Self::SIZE)?;
        let header = GenericRecordHeader::from_bytes(bytes)?;
        let raw = &bytes[GENERIC_HEADER_SIZE..Self::SIZE];
        if let Some(position) = raw.iter().position(|b| !b.is_ascii()) {
            return Err(MetopError::NonAsciiText {
                record_class: header.record_class,
                position,
            });
        }
        let text = raw
            .iter()
            .map(|&b| b as char)
            .collect::<String>()
            .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
            .to_string();
        Ok(Self { header, text })
    }

    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self, MetopError> {
        let bytes = read_fully(reader, Self::SIZE, 0)?;
        Self::from_bytes(&bytes)
    }

    /// Encodes the record; text beyond 100 bytes is cut, shorter text is space padded.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(Self::SIZE);
        buffer.extend_from_slice(&self.header.to_bytes());
        let text = self.text.as_bytes();
        let n = text.len().min(GEADR_TEXT_LEN);
        buffer.extend_from_slice(&text[..n]);
        buffer.resize(Self::SIZE, b' ');
        buffer
    }
}
