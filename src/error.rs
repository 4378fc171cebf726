use thiserror::Error;

use crate::records::common::{InstrumentGroup, RecordClass};

#[derive(Debug, Error)]
pub enum MetopError {
    #[error("Stream truncated at offset {offset}: need {expected} bytes, got {actual}")]
    TruncatedStream {
        offset:   u64,
        expected: usize,
        actual:   usize,
    },

    #[error("Unknown record class byte: {0}")]
    UnknownRecordClass(u8),

    #[error("Unknown instrument group byte: {0}")]
    UnknownInstrumentGroup(u8),

    #[error("Record of class {record_class:?} declares size {size}, smaller than its {minimum} byte minimum")]
    RecordTooSmall {
        record_class: RecordClass,
        size:         u32,
        minimum:      usize,
    },

    #[error("Unsupported product: bad MPHR. RecordClass={record_class:?} InstrumentGroup={instrument_group:?} RecordSubclass={record_subclass}")]
    BadMphr {
        record_class:     RecordClass,
        instrument_group: InstrumentGroup,
        record_subclass:  u8,
    },

    #[error("Unsupported product: bad SPHR. RecordClass={record_class:?} InstrumentGroup={instrument_group:?} RecordSubclass={record_subclass}")]
    BadSphr {
        record_class:     RecordClass,
        instrument_group: InstrumentGroup,
        record_subclass:  u8,
    },

    #[error("Stream truncated inside the main product header: need {expected} bytes, got {actual}")]
    TruncatedMainHeader { expected: usize, actual: usize },

    #[error("Stream truncated inside the secondary product header: need {expected} bytes, got {actual}")]
    TruncatedSecondaryHeader { expected: usize, actual: usize },

    #[error("Unsupported product: expected TOTAL_SPHR = 1, found {0}")]
    UnsupportedSphrCount(i64),

    #[error("Unsupported product: bad SPHR. EARTH_VIEWS_PER_SCANLINE is not 2048. Actual value: {0}")]
    BadProductWidth(i64),

    #[error("Unsupported product: bad SPHR. NAV_SAMPLE_RATE is: {0}")]
    BadNavSampleRate(i64),

    #[error("Expected an internal pointer record, found record class {0:?}")]
    BadPointerRecord(RecordClass),

    #[error("Stream exhausted after {pointers_read} internal pointer records without a pointer to an MDR")]
    NoMdrPointerFound { pointers_read: usize },

    #[error("Bad generic record header in first MDR at offset {offset}: {reason}")]
    BadFirstMdrHeader { offset: u64, reason: String },

    #[error("Bad generic record header in last MDR at offset {offset}: {reason}")]
    BadLastMdrHeader { offset: u64, reason: String },

    #[error("Product height {height} is not positive (file length {file_length}, first MDR at {first_mdr_offset}, MDR size {mdr_size})")]
    InvalidProductHeight {
        height:           i64,
        file_length:      u64,
        first_mdr_offset: u64,
        mdr_size:         u32,
    },

    #[error("Malformed ASCII header line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },

    #[error("Text of {record_class:?} record holds a non-ASCII byte at position {position}")]
    NonAsciiText { record_class: RecordClass, position: usize },

    #[error("Duplicate ASCII header key: {0}")]
    DuplicateKey(String),

    #[error("Missing ASCII header key: {0}")]
    MissingKey(String),

    #[error("Value of {key} is not an integer: {value:?}")]
    NotAnInteger { key: String, value: String },

    #[error("Scan line {scan_line} out of range: product height is {height}")]
    ScanLineOutOfRange { scan_line: usize, height: usize },

    #[error("Channel {channel} does not support {mode} calibration")]
    ChannelNotSupported { channel: String, mode: &'static str },

    #[error("Product has no GIADR radiance record")]
    MissingRadianceCalibration,

    #[error("Channel {requested} is not available: channel 3 state is {state}")]
    Channel3Unavailable { requested: String, state: String },

    #[error("No record was written with id '{0}'")]
    UnknownRecordId(String),

    #[error("Shared stream lock poisoned")]
    StreamPoisoned,

    #[error("Invalid file handling")]
    IOError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification of [`MetopError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad or unknown record class, group or subclass.
    Structural,
    /// Unexpected counts or header values.
    Consistency,
    /// File shorter than the structure it declares.
    Truncation,
    /// Underlying stream failure.
    Io,
    /// Invalid request against a valid product.
    Usage,
}

impl MetopError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MetopError::UnknownRecordClass(_)
            | MetopError::UnknownInstrumentGroup(_)
            | MetopError::RecordTooSmall { .. }
            | MetopError::BadMphr { .. }
            | MetopError::BadSphr { .. }
            | MetopError::BadPointerRecord(_)
            | MetopError::BadFirstMdrHeader { .. }
            | MetopError::BadLastMdrHeader { .. }
            | MetopError::MalformedLine { .. }
            | MetopError::NonAsciiText { .. }
            | MetopError::DuplicateKey(_) => ErrorKind::Structural,
            MetopError::UnsupportedSphrCount(_)
            | MetopError::BadProductWidth(_)
            | MetopError::BadNavSampleRate(_)
            | MetopError::MissingKey(_)
            | MetopError::NotAnInteger { .. } => ErrorKind::Consistency,
            MetopError::TruncatedStream { .. }
            | MetopError::TruncatedMainHeader { .. }
            | MetopError::TruncatedSecondaryHeader { .. }
            | MetopError::NoMdrPointerFound { .. }
            | MetopError::InvalidProductHeight { .. } => ErrorKind::Truncation,
            MetopError::IOError(_) | MetopError::StreamPoisoned => ErrorKind::Io,
            MetopError::ScanLineOutOfRange { .. }
            | MetopError::ChannelNotSupported { .. }
            | MetopError::MissingRadianceCalibration
            | MetopError::Channel3Unavailable { .. }
            | MetopError::UnknownRecordId(_)
            | MetopError::Serialization(_) => ErrorKind::Usage,
        }
    }
}
