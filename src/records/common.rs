use std::io::{ErrorKind, Read};

use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MetopError;

/// Size of the generic record header present at the start of every record.
pub const GENERIC_HEADER_SIZE: usize = 20;

/// Record classes of the EPS generic product format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordClass {
    Reserved,
    Mphr,
    Sphr,
    Ipr,
    Geadr,
    Giadr,
    Veadr,
    Viadr,
    Mdr,
}

impl RecordClass {
    pub fn from_u8(value: u8) -> Result<Self, MetopError> {
        Ok(match value {
            0 => RecordClass::Reserved,
            1 => RecordClass::Mphr,
            2 => RecordClass::Sphr,
            3 => RecordClass::Ipr,
            4 => RecordClass::Geadr,
            5 => RecordClass::Giadr,
            6 => RecordClass::Veadr,
            7 => RecordClass::Viadr,
            8 => RecordClass::Mdr,
            other => return Err(MetopError::UnknownRecordClass(other)),
        })
    }

    pub fn to_u8(self) -> u8 {
        match self {
            RecordClass::Reserved => 0,
            RecordClass::Mphr => 1,
            RecordClass::Sphr => 2,
            RecordClass::Ipr => 3,
            RecordClass::Geadr => 4,
            RecordClass::Giadr => 5,
            RecordClass::Veadr => 6,
            RecordClass::Viadr => 7,
            RecordClass::Mdr => 8,
        }
    }
}

/// Instrument groups of the EPS generic product format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstrumentGroup {
    Generic,
    AmsuA,
    Ascat,
    Atovs,
    Avhrr3,
    Gome,
    Gras,
    Hirs4,
    Iasi,
    Mhs,
    Sem,
    Adcs,
    Sbuv,
    Dummy,
    Archive,
    IasiL2,
}

impl InstrumentGroup {
    const ALL: [InstrumentGroup; 16] = [
        InstrumentGroup::Generic,
        InstrumentGroup::AmsuA,
        InstrumentGroup::Ascat,
        InstrumentGroup::Atovs,
        InstrumentGroup::Avhrr3,
        InstrumentGroup::Gome,
        InstrumentGroup::Gras,
        InstrumentGroup::Hirs4,
        InstrumentGroup::Iasi,
        InstrumentGroup::Mhs,
        InstrumentGroup::Sem,
        InstrumentGroup::Adcs,
        InstrumentGroup::Sbuv,
        InstrumentGroup::Dummy,
        InstrumentGroup::Archive,
        InstrumentGroup::IasiL2,
    ];

    pub fn from_u8(value: u8) -> Result<Self, MetopError> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or(MetopError::UnknownInstrumentGroup(value))
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Short CDS time code: days since 2000-01-01 and milliseconds of that day.
///
/// The raw pair is kept so that re-encoding a header is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct EpsTime {
    pub day:    u16,
    pub millis: u32,
}

impl EpsTime {
    pub const ENCODED_LEN: usize = 6;

    pub fn new(day: u16, millis: u32) -> Self {
        EpsTime { day, millis }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        EpsTime {
            day:    BigEndian::read_u16(&bytes[0..2]),
            millis: BigEndian::read_u32(&bytes[2..6]),
        }
    }

    pub fn to_bytes(&self) -> [u8; 6] {
        let mut out = [0u8; 6];
        BigEndian::write_u16(&mut out[0..2], self.day);
        BigEndian::write_u32(&mut out[2..6], self.millis);
        out
    }

    // Seconds between Unix epoch and EPS epoch
    const EPOCH_DELTA: i64 = 946_684_800;

    /// Converts to an absolute UTC timestamp.
    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_nanos(
            (self.day as i64) * 86_400 * 1_000_000_000 + (self.millis as i64) * 1_000_000,
        ) + Duration::seconds(EpsTime::EPOCH_DELTA)
    }
}

/// Reads exactly `len` bytes, reporting how many were available on a short read.
///
/// `offset` is only used for the error message.
pub fn read_fully<R: Read + ?Sized>(reader: &mut R, len: usize, offset: u64) -> Result<Vec<u8>, MetopError> {
    let mut buf = vec![0u8; len];
    let mut filled = 0;
    while filled < len {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(MetopError::IOError(e)),
        }
    }
    if filled < len {
        return Err(MetopError::TruncatedStream {
            offset,
            expected: len,
            actual:   filled,
        });
    }
    Ok(buf)
}

/// Checks that `bytes` holds at least `expected` bytes.
pub fn check_len(bytes: &[u8], expected: usize) -> Result<(), MetopError> {
    if bytes.len() < expected {
        return Err(MetopError::TruncatedStream {
            offset:   0,
            expected,
            actual:   bytes.len(),
        });
    }
    Ok(())
}
