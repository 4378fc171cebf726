use std::io::Read;

use byteorder::{BigEndian, ByteOrder};
use log::debug;

use crate::error::MetopError;
use crate::records::common::{read_fully, check_len, InstrumentGroup, RecordClass, GENERIC_HEADER_SIZE};
use crate::records::generic_header::GenericRecordHeader;

/// Locates another record of the product by class, subclass and absolute offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InternalPointerRecord {
    pub header: GenericRecordHeader,
    pub target_record_class: RecordClass,
    pub target_instrument_group: InstrumentGroup,
    pub target_record_subclass: u8,
    pub target_record_offset: u32,
}

impl InternalPointerRecord {
    /// Encoded size: generic header, three target bytes and a u32 offset.
    pub const SIZE: usize = GENERIC_HEADER_SIZE + 7;

    pub fn new(target_record_class: RecordClass, target_instrument_group: InstrumentGroup, target_record_subclass: u8, target_record_offset: u32) -> Self {
        InternalPointerRecord {
            header: GenericRecordHeader::new(RecordClass::Ipr, InstrumentGroup::Generic, 0, Self::SIZE as u32),
            target_record_class,
            target_instrument_group,
            target_record_subclass,
            target_record_offset,
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MetopError> {
        check_len(bytes, Self::SIZE)?;
        let header = GenericRecordHeader::from_bytes(bytes)?;
        if header.record_class != RecordClass::Ipr {
            return Err(MetopError::BadPointerRecord(header.record_class));
        }

        Ok(Self {
            header,
            target_record_class: RecordClass::from_u8(bytes[20])?,
            target_instrument_group: InstrumentGroup::from_u8(bytes[21])?,
            target_record_subclass: bytes[22],
            target_record_offset: BigEndian::read_u32(&bytes[23..27]),
        })
    }

    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self, MetopError> {
        let bytes = read_fully(reader, Self::SIZE, 0)?;
        Self::from_bytes(&bytes)
    }

    /// Reads pointer records until one targets an MDR.
    ///
    /// The MDR pointer is the last element of the returned list. Running out
    /// of input first is [`MetopError::NoMdrPointerFound`].
    pub fn read_all<R: Read + ?Sized>(reader: &mut R) -> Result<Vec<Self>, MetopError> {
        let mut pointers = Vec::new();
        loop {
            let pointer = match Self::read(reader) {
                Ok(p) => p,
                Err(MetopError::TruncatedStream { .. }) => {
                    return Err(MetopError::NoMdrPointerFound { pointers_read: pointers.len() });
                }
                Err(e) => return Err(e),
            };
            debug!(
                "IPR -> {:?} subclass {} at offset {}",
                pointer.target_record_class, pointer.target_record_subclass, pointer.target_record_offset
            );
            let is_mdr = pointer.target_record_class == RecordClass::Mdr;
            pointers.push(pointer);
            if is_mdr {
                return Ok(pointers);
            }
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buffer = [0u8; Self::SIZE];
        buffer[..GENERIC_HEADER_SIZE].copy_from_slice(&self.header.to_bytes());
        buffer[20] = self.target_record_class.to_u8();
        buffer[21] = self.target_instrument_group.to_u8();
        buffer[22] = self.target_record_subclass;
        BigEndian::write_u32(&mut buffer[23..27], self.target_record_offset);
        buffer
    }
}
