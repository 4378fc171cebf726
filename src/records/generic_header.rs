use std::io::Read;

use byteorder::{BigEndian, ByteOrder};

use crate::error::MetopError;
use crate::records::common::{read_fully, check_len, EpsTime, InstrumentGroup, RecordClass, GENERIC_HEADER_SIZE};

/// The 20-byte header at the start of every EPS record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenericRecordHeader {
    pub record_class: RecordClass,
    pub instrument_group: InstrumentGroup,
    pub record_subclass: u8,
    pub record_subclass_version: u8,
    /// Total record size in bytes, this header included.
    pub record_size: u32,
    pub start_time: EpsTime,
    pub end_time: EpsTime,
}

impl GenericRecordHeader {
    pub fn new(record_class: RecordClass, instrument_group: InstrumentGroup, record_subclass: u8, record_size: u32) -> Self {
        GenericRecordHeader {
            record_class,
            instrument_group,
            record_subclass,
            record_subclass_version: 0,
            record_size,
            start_time: EpsTime::default(),
            end_time: EpsTime::default(),
        }
    }

    /// Parse a header from the first 20 bytes of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MetopError> {
        check_len(bytes, GENERIC_HEADER_SIZE)?;

        Ok(Self {
            record_class: RecordClass::from_u8(bytes[0])?,
            instrument_group: InstrumentGroup::from_u8(bytes[1])?,
            record_subclass: bytes[2],
            record_subclass_version: bytes[3],
            record_size: BigEndian::read_u32(&bytes[4..8]),
            start_time: EpsTime::from_bytes(&bytes[8..14]),
            end_time: EpsTime::from_bytes(&bytes[14..20]),
        })
    }

    /// Read a header from the current position of `reader`, advancing it by 20 bytes.
    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self, MetopError> {
        let bytes = read_fully(reader, GENERIC_HEADER_SIZE, 0)?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> [u8; GENERIC_HEADER_SIZE] {
        let mut buffer = [0u8; GENERIC_HEADER_SIZE];
        buffer[0] = self.record_class.to_u8();
        buffer[1] = self.instrument_group.to_u8();
        buffer[2] = self.record_subclass;
        buffer[3] = self.record_subclass_version;
        BigEndian::write_u32(&mut buffer[4..8], self.record_size);
        buffer[8..14].copy_from_slice(&self.start_time.to_bytes());
        buffer[14..20].copy_from_slice(&self.end_time.to_bytes());
        buffer
    }

    /// Size of the record body following this header.
    pub fn body_size(&self) -> Result<usize, MetopError> {
        (self.record_size as usize)
            .checked_sub(GENERIC_HEADER_SIZE)
            .ok_or(MetopError::RecordTooSmall {
                record_class: self.record_class,
                size: self.record_size,
                minimum: GENERIC_HEADER_SIZE,
            })
    }
}
