//! Assembly of complete AVHRR/3 Level-1B products
//!
//! Lays out MPHR, SPHR, the pointer table, GIADR/GEADR records and the MDRs
//! in the order a reader expects, patching pointer offsets once the target
//! records are written.

use std::io::{Cursor, Seek, Write};

use crate::error::MetopError;
use crate::records::ascii_header::AsciiHeaderRecord;
use crate::records::common::{EpsTime, InstrumentGroup, RecordClass, GENERIC_HEADER_SIZE};
use crate::records::geadr::GeadrRecord;
use crate::records::generic_header::GenericRecordHeader;
use crate::records::giadr_radiance::{GiadrRadiance, RadianceConversionCounts};
use crate::records::mdr::{MdrRecord, NavPrecision, PRODUCT_WIDTH};
use crate::records::pointer_record::InternalPointerRecord;
use crate::writer::metop_writer::MetopWriter;

/// Milliseconds covered by one AVHRR scan line (six lines per second).
const SCAN_LINE_MILLIS: u32 = 167;

/// Builder for complete products.
#[derive(Debug, Clone)]
pub struct ProductBuilder {
    precision: NavPrecision,
    start_time: EpsTime,
    main_entries: Vec<(String, String)>,
    secondary_entries: Vec<(String, String)>,
    radiance_counts: Option<RadianceConversionCounts>,
    geadrs: Vec<GeadrRecord>,
    mdrs: Vec<MdrRecord>,
}

impl ProductBuilder {
    pub fn new(product_name: &str, precision: NavPrecision) -> Self {
        ProductBuilder {
            precision,
            start_time: EpsTime::new(0, 0),
            main_entries: vec![
                ("PRODUCT_NAME".to_string(), product_name.to_string()),
                ("TOTAL_SPHR".to_string(), "1".to_string()),
            ],
            secondary_entries: vec![
                ("EARTH_VIEWS_PER_SCANLINE".to_string(), PRODUCT_WIDTH.to_string()),
                ("NAV_SAMPLE_RATE".to_string(), precision.sample_rate().to_string()),
            ],
            radiance_counts: None,
            geadrs: Vec::new(),
            mdrs: Vec::new(),
        }
    }

    pub fn precision(&self) -> NavPrecision {
        self.precision
    }

    pub fn start_time(mut self, start_time: EpsTime) -> Self {
        self.start_time = start_time;
        self
    }

    /// Set or replace a main product header entry.
    ///
    /// `TOTAL_MDR` defaults to the number of scan lines added.
    pub fn main_entry(mut self, key: &str, value: impl ToString) -> Self {
        set_entry(&mut self.main_entries, key, value.to_string());
        self
    }

    /// Set or replace a secondary product header entry.
    pub fn secondary_entry(mut self, key: &str, value: impl ToString) -> Self {
        set_entry(&mut self.secondary_entries, key, value.to_string());
        self
    }

    pub fn radiance_conversion(mut self, counts: RadianceConversionCounts) -> Self {
        self.radiance_counts = Some(counts);
        self
    }

    pub fn geadr(mut self, record_subclass: u8, text: &str) -> Self {
        self.geadrs.push(GeadrRecord::new(record_subclass, text));
        self
    }

    /// A blank scan line timed to follow the scan lines added so far.
    pub fn blank_scan_line(&self) -> MdrRecord {
        let index = self.mdrs.len() as u32;
        let start = self.line_time(index);
        let end = self.line_time(index + 1);
        MdrRecord::new(self.precision, start, end)
    }

    pub fn scan_line(mut self, mdr: MdrRecord) -> Self {
        self.mdrs.push(mdr);
        self
    }

    /// Add `count` blank scan lines, with `configure` applied to each one.
    pub fn scan_lines<F>(mut self, count: usize, mut configure: F) -> Self
    where
        F: FnMut(usize, &mut MdrRecord),
    {
        for i in 0..count {
            let mut mdr = self.blank_scan_line();
            configure(i, &mut mdr);
            self.mdrs.push(mdr);
        }
        self
    }

    fn line_time(&self, index: u32) -> EpsTime {
        let millis = self.start_time.millis as u64 + index as u64 * SCAN_LINE_MILLIS as u64;
        let day = self.start_time.day as u64 + millis / 86_400_000;
        EpsTime::new(day as u16, (millis % 86_400_000) as u32)
    }

    fn header_record(
        &self,
        record_class: RecordClass,
        instrument_group: InstrumentGroup,
        entries: &[(String, String)],
    ) -> Result<Vec<u8>, MetopError> {
        let body = AsciiHeaderRecord::from_pairs(entries.iter().map(|(k, v)| (k, v)))?.to_bytes();
        let mut header =
            GenericRecordHeader::new(record_class, instrument_group, 0, (GENERIC_HEADER_SIZE + body.len()) as u32);
        header.start_time = self.start_time;
        header.end_time = self.line_time(self.mdrs.len() as u32);
        let mut bytes = header.to_bytes().to_vec();
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Write the product through `writer`.
    pub fn write_to<W: Write + Seek>(&self, writer: &mut MetopWriter<W>) -> Result<(), MetopError> {
        let mut main_entries = self.main_entries.clone();
        if !main_entries.iter().any(|(k, _)| k == "TOTAL_MDR") {
            main_entries.push(("TOTAL_MDR".to_string(), self.mdrs.len().to_string()));
        }

        writer.write_record_with_id(
            &self.header_record(RecordClass::Mphr, InstrumentGroup::Generic, &main_entries)?,
            "mphr",
        )?;
        writer.write_record_with_id(
            &self.header_record(RecordClass::Sphr, InstrumentGroup::Avhrr3, &self.secondary_entries)?,
            "sphr",
        )?;

        for (i, geadr) in self.geadrs.iter().enumerate() {
            let ipr = InternalPointerRecord::new(RecordClass::Geadr, InstrumentGroup::Avhrr3, geadr.header.record_subclass, 0);
            writer.write_record_with_id(&ipr.to_bytes(), &format!("ipr_geadr_{}", i))?;
        }
        if self.radiance_counts.is_some() {
            let ipr = InternalPointerRecord::new(RecordClass::Giadr, InstrumentGroup::Avhrr3, 1, 0);
            writer.write_record_with_id(&ipr.to_bytes(), "ipr_giadr")?;
        }
        let ipr = InternalPointerRecord::new(RecordClass::Mdr, InstrumentGroup::Avhrr3, 2, 0);
        writer.write_record_with_id(&ipr.to_bytes(), "ipr_mdr")?;

        for (i, geadr) in self.geadrs.iter().enumerate() {
            let id = format!("geadr_{}", i);
            writer.write_record_with_id(&geadr.to_bytes(), &id)?;
            writer.update_pointer_target(&format!("ipr_geadr_{}", i), &id)?;
        }
        if let Some(counts) = &self.radiance_counts {
            let header = GenericRecordHeader::new(RecordClass::Giadr, InstrumentGroup::Avhrr3, 1, GiadrRadiance::SIZE as u32);
            let mut bytes = header.to_bytes().to_vec();
            bytes.extend_from_slice(&counts.to_bytes());
            writer.write_record_with_id(&bytes, "giadr")?;
            writer.update_pointer_target("ipr_giadr", "giadr")?;
        }

        for (i, mdr) in self.mdrs.iter().enumerate() {
            let bytes = mdr.to_bytes(self.precision);
            if i == 0 {
                writer.write_record_with_id(&bytes, "mdr_0")?;
                writer.update_pointer_target("ipr_mdr", "mdr_0")?;
            } else {
                writer.write_record(&bytes)?;
            }
        }
        Ok(())
    }

    /// Encode the product in memory.
    pub fn build(&self) -> Result<Vec<u8>, MetopError> {
        let mut writer = MetopWriter::new(Cursor::new(Vec::new()));
        self.write_to(&mut writer)?;
        Ok(writer.finalize()?.into_inner())
    }

    /// Write the product to a file at `path`.
    pub fn write_file(&self, path: &str) -> Result<(), MetopError> {
        let mut writer = MetopWriter::create(path)?;
        self.write_to(&mut writer)?;
        writer.finalize()?;
        Ok(())
    }
}

fn set_entry(entries: &mut Vec<(String, String)>, key: &str, value: String) {
    match entries.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value,
        None => entries.push((key.to_string(), value)),
    }
}
