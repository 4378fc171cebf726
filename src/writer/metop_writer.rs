//! Record-level writer for EPS products

use std::collections::HashMap;
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};

use byteorder::{BigEndian, WriteBytesExt};

use crate::error::MetopError;
use crate::records::common::GENERIC_HEADER_SIZE;

/// Offset of the target offset field inside an internal pointer record.
const POINTER_TARGET_OFFSET: u64 = GENERIC_HEADER_SIZE as u64 + 3;

/// Writer for EPS records. Records are written back to back with no padding.
/// Tracks record positions and supports patching pointer offsets later.
pub struct MetopWriter<W: Write + Seek> {
    out: W,
    /// Current write offset
    offset: u64,
    /// Maps record IDs (user-provided keys) to their offsets
    record_positions: HashMap<String, u64>,
}

impl MetopWriter<File> {
    /// Creates a writer for the given file path (overwrites existing).
    pub fn create(path: &str) -> Result<Self, MetopError> {
        Ok(MetopWriter::new(File::create(path)?))
    }
}

impl<W: Write + Seek> MetopWriter<W> {
    pub fn new(out: W) -> Self {
        MetopWriter {
            out,
            offset: 0,
            record_positions: HashMap::new(),
        }
    }

    /// Writes one encoded record and returns its starting offset.
    pub fn write_record(&mut self, record_bytes: &[u8]) -> Result<u64, MetopError> {
        self.out.write_all(record_bytes)?;
        let start = self.offset;
        self.offset += record_bytes.len() as u64;
        Ok(start)
    }

    /// Writes a record and remembers its position under `record_id`.
    ///
    /// # Arguments
    /// * `record_bytes` - The encoded record, generic header included
    /// * `record_id` - A unique identifier for this record (e.g. "ipr_mdr", "giadr")
    ///
    /// # Returns
    /// The starting offset of the record
    pub fn write_record_with_id(&mut self, record_bytes: &[u8], record_id: &str) -> Result<u64, MetopError> {
        let start = self.write_record(record_bytes)?;
        self.record_positions.insert(record_id.to_string(), start);
        Ok(start)
    }

    pub fn record_position(&self, record_id: &str) -> Option<u64> {
        self.record_positions.get(record_id).copied()
    }

    /// Overwrites a big-endian u32 at an absolute offset, keeping the write position.
    pub fn update_u32(&mut self, offset: u64, value: u32) -> Result<(), MetopError> {
        self.out.seek(SeekFrom::Start(offset))?;
        self.out.write_u32::<BigEndian>(value)?;
        self.out.seek(SeekFrom::Start(self.offset))?;
        Ok(())
    }

    /// Points the pointer record `pointer_id` at the record `target_id`.
    pub fn update_pointer_target(&mut self, pointer_id: &str, target_id: &str) -> Result<(), MetopError> {
        let pointer_pos = self
            .record_position(pointer_id)
            .ok_or_else(|| MetopError::UnknownRecordId(pointer_id.to_string()))?;
        let target_pos = self
            .record_position(target_id)
            .ok_or_else(|| MetopError::UnknownRecordId(target_id.to_string()))?;
        self.update_u32(pointer_pos + POINTER_TARGET_OFFSET, target_pos as u32)
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Flushes all data and hands back the output.
    pub fn finalize(mut self) -> Result<W, MetopError> {
        self.out.flush()?;
        Ok(self.out)
    }
}
