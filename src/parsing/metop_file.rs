use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Seek, SeekFrom};
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use memmap2::Mmap;

use crate::channel::Channel3State;
use crate::config::ReaderConfig;
use crate::error::MetopError;
use crate::parsing::stream::{ByteSource, SharedStream};
use crate::records::{
    ascii_header::AsciiHeaderRecord,
    common::{read_fully, EpsTime, InstrumentGroup, RecordClass},
    geadr::GeadrRecord,
    generic_header::GenericRecordHeader,
    giadr_radiance::GiadrRadiance,
    mdr::{MdrLayout, MdrRecord, NavPrecision, PRODUCT_WIDTH},
    pointer_record::InternalPointerRecord,
};

/// Progress of the header decode pass. Any failure aborts the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    Start,
    MphrRead,
    SphrValidated,
    PointersCollected,
    MdrLocated,
    StructureVerified,
    ChannelClassified,
}

/// A decoded METOP AVHRR/3 Level-1B product.
///
/// Construction runs the whole header decode pass; a value of this type is
/// always fully validated and immutable. Band and tie-point readers borrow
/// it and share its stream.
#[derive(Debug)]
pub struct MetopFile {
    stream: SharedStream,
    config: ReaderConfig,
    main_header: AsciiHeaderRecord,
    secondary_header: AsciiHeaderRecord,
    pointers: Vec<InternalPointerRecord>,
    giadr_radiance: Option<GiadrRadiance>,
    geadr_entries: Option<BTreeMap<u8, String>>,
    first_mdr_offset: u64,
    mdr_size: u32,
    product_height: usize,
    layout: MdrLayout,
    channel_3ab: Channel3State,
    start_time: EpsTime,
    end_time: EpsTime,
}

/// Everything the decode pass learns before the stream becomes shared.
struct DecodedHeader {
    main_header: AsciiHeaderRecord,
    secondary_header: AsciiHeaderRecord,
    pointers: Vec<InternalPointerRecord>,
    giadr_radiance: Option<GiadrRadiance>,
    geadr_entries: Option<BTreeMap<u8, String>>,
    first_mdr_offset: u64,
    mdr_size: u32,
    product_height: usize,
    layout: MdrLayout,
    channel_3ab: Channel3State,
    start_time: EpsTime,
    end_time: EpsTime,
}

fn in_main_header(e: MetopError) -> MetopError {
    match e {
        MetopError::TruncatedStream { expected, actual, .. } => MetopError::TruncatedMainHeader { expected, actual },
        other => other,
    }
}

fn in_secondary_header(e: MetopError) -> MetopError {
    match e {
        MetopError::TruncatedStream { expected, actual, .. } => MetopError::TruncatedSecondaryHeader { expected, actual },
        other => other,
    }
}

fn transition(state: &mut DecodeState, next: DecodeState) {
    debug!("decode state {:?} -> {:?}", state, next);
    *state = next;
}

impl MetopFile {
    /// Memory-map and decode the product at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, MetopError> {
        Self::open_with_config(path, ReaderConfig::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: ReaderConfig) -> Result<Self, MetopError> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_source(Box::new(Cursor::new(mmap)), config)
    }

    /// Decode a product from any seekable source, e.g. an in-memory buffer.
    pub fn from_reader<R: ByteSource + 'static>(reader: R, config: ReaderConfig) -> Result<Self, MetopError> {
        Self::from_source(Box::new(reader), config)
    }

    fn from_source(mut source: Box<dyn ByteSource>, config: ReaderConfig) -> Result<Self, MetopError> {
        let header = Self::read_header(&mut *source)?;
        let stream = SharedStream::new(source)?;

        Ok(MetopFile {
            stream,
            config,
            main_header: header.main_header,
            secondary_header: header.secondary_header,
            pointers: header.pointers,
            giadr_radiance: header.giadr_radiance,
            geadr_entries: header.geadr_entries,
            first_mdr_offset: header.first_mdr_offset,
            mdr_size: header.mdr_size,
            product_height: header.product_height,
            layout: header.layout,
            channel_3ab: header.channel_3ab,
            start_time: header.start_time,
            end_time: header.end_time,
        })
    }

    /// Checks whether `path` starts with an MPHR followed by an AVHRR/3 SPHR.
    pub fn can_open(path: impl AsRef<Path>) -> Result<bool, MetopError> {
        let mut file = File::open(path)?;
        let mphr = match GenericRecordHeader::read(&mut file) {
            Ok(h) => h,
            Err(MetopError::IOError(e)) => return Err(MetopError::IOError(e)),
            Err(_) => return Ok(false),
        };
        if !is_mphr(&mphr) {
            return Ok(false);
        }
        file.seek(SeekFrom::Start(mphr.record_size as u64))?;
        match GenericRecordHeader::read(&mut file) {
            Ok(sphr) => Ok(is_avhrr_sphr(&sphr)),
            Err(MetopError::IOError(e)) => Err(MetopError::IOError(e)),
            Err(_) => Ok(false),
        }
    }

    fn read_header(source: &mut dyn ByteSource) -> Result<DecodedHeader, MetopError> {
        let mut state = DecodeState::Start;

        let mphr = GenericRecordHeader::read(source).map_err(in_main_header)?;
        if !is_mphr(&mphr) {
            return Err(MetopError::BadMphr {
                record_class: mphr.record_class,
                instrument_group: mphr.instrument_group,
                record_subclass: mphr.record_subclass,
            });
        }
        let main_header = AsciiHeaderRecord::read(source, &mphr).map_err(in_main_header)?;
        transition(&mut state, DecodeState::MphrRead);

        let total_sphr = main_header.get_int("TOTAL_SPHR")?;
        if total_sphr != 1 {
            return Err(MetopError::UnsupportedSphrCount(total_sphr));
        }

        let sphr = GenericRecordHeader::read(source).map_err(in_secondary_header)?;
        if !is_avhrr_sphr(&sphr) {
            return Err(MetopError::BadSphr {
                record_class: sphr.record_class,
                instrument_group: sphr.instrument_group,
                record_subclass: sphr.record_subclass,
            });
        }
        let secondary_header = AsciiHeaderRecord::read(source, &sphr).map_err(in_secondary_header)?;

        let width = secondary_header.get_int("EARTH_VIEWS_PER_SCANLINE")?;
        if width != PRODUCT_WIDTH as i64 {
            return Err(MetopError::BadProductWidth(width));
        }
        let precision = NavPrecision::from_sample_rate(secondary_header.get_int("NAV_SAMPLE_RATE")?)?;
        let layout = MdrLayout::new(precision);
        transition(&mut state, DecodeState::SphrValidated);

        let pointers = InternalPointerRecord::read_all(source)?;
        transition(&mut state, DecodeState::PointersCollected);

        let mut giadr_radiance: Option<GiadrRadiance> = None;
        let mut geadr_entries: Option<BTreeMap<u8, String>> = None;
        let mut first_mdr_offset: Option<u64> = None;
        for pointer in &pointers {
            let offset = pointer.target_record_offset as u64;
            match pointer.target_record_class {
                RecordClass::Giadr if pointer.target_record_subclass == 1 => {
                    if giadr_radiance.is_some() {
                        warn!("ignoring additional GIADR radiance record at offset {}", offset);
                        continue;
                    }
                    source.seek(SeekFrom::Start(offset))?;
                    giadr_radiance = Some(GiadrRadiance::read(source)?);
                }
                RecordClass::Geadr => {
                    source.seek(SeekFrom::Start(offset))?;
                    let geadr = GeadrRecord::read(source)?;
                    let entries = geadr_entries.get_or_insert_with(BTreeMap::new);
                    let subclass = geadr.header.record_subclass;
                    if entries.contains_key(&subclass) {
                        warn!("ignoring additional GEADR with subclass {} at offset {}", subclass, offset);
                    } else {
                        entries.insert(subclass, geadr.text);
                    }
                }
                RecordClass::Mdr => {
                    if first_mdr_offset.is_none() {
                        first_mdr_offset = Some(offset);
                    }
                }
                _ => {}
            }
        }
        let first_mdr_offset = first_mdr_offset.ok_or(MetopError::NoMdrPointerFound { pointers_read: pointers.len() })?;
        transition(&mut state, DecodeState::MdrLocated);

        let total_mdr = main_header.get_int("TOTAL_MDR")?;
        let verified = verify_mdrs(source, first_mdr_offset, total_mdr)?;
        transition(&mut state, DecodeState::StructureVerified);

        let first = read_channel3_byte(source, &layout, first_mdr_offset, verified.mdr_size, 0)?;
        let last = read_channel3_byte(source, &layout, first_mdr_offset, verified.mdr_size, verified.product_height - 1)?;
        let channel_3ab = Channel3State::from_bits(first, last);
        if channel_3ab == Channel3State::Ambiguous {
            info!("channel 3A/3B state is ambiguous (first bit {}, last bit {})", first & 1, last & 1);
        }
        transition(&mut state, DecodeState::ChannelClassified);

        Ok(DecodedHeader {
            main_header,
            secondary_header,
            pointers,
            giadr_radiance,
            geadr_entries,
            first_mdr_offset,
            mdr_size: verified.mdr_size,
            product_height: verified.product_height,
            layout,
            channel_3ab,
            start_time: verified.start_time,
            end_time: verified.end_time,
        })
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub(crate) fn stream(&self) -> &SharedStream {
        &self.stream
    }

    pub fn product_name(&self) -> Result<&str, MetopError> {
        self.main_header.get_string("PRODUCT_NAME")
    }

    pub fn main_header(&self) -> &AsciiHeaderRecord {
        &self.main_header
    }

    pub fn secondary_header(&self) -> &AsciiHeaderRecord {
        &self.secondary_header
    }

    /// Pointer records in file order; the last one targets the first MDR.
    pub fn pointers(&self) -> &[InternalPointerRecord] {
        &self.pointers
    }

    pub fn giadr_radiance(&self) -> Option<&GiadrRadiance> {
        self.giadr_radiance.as_ref()
    }

    /// GEADR texts keyed by record subclass, if the product has any.
    pub fn geadr_entries(&self) -> Option<&BTreeMap<u8, String>> {
        self.geadr_entries.as_ref()
    }

    pub fn product_width(&self) -> usize {
        PRODUCT_WIDTH
    }

    pub fn product_height(&self) -> usize {
        self.product_height
    }

    pub fn nav_precision(&self) -> NavPrecision {
        self.layout.precision
    }

    pub fn nav_sample_rate(&self) -> usize {
        self.layout.precision.sample_rate()
    }

    pub fn num_nav_points(&self) -> usize {
        self.layout.precision.num_nav_points()
    }

    pub fn tie_point_subsampling(&self) -> usize {
        self.nav_sample_rate()
    }

    pub fn tie_point_offset_x(&self) -> usize {
        self.layout.precision.tie_point_offset_x()
    }

    pub fn channel_3ab_state(&self) -> Channel3State {
        self.channel_3ab
    }

    pub fn start_time(&self) -> EpsTime {
        self.start_time
    }

    pub fn end_time(&self) -> EpsTime {
        self.end_time
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_time.to_datetime()
    }

    pub fn end_date(&self) -> DateTime<Utc> {
        self.end_time.to_datetime()
    }

    pub fn first_mdr_offset(&self) -> u64 {
        self.first_mdr_offset
    }

    pub fn mdr_size(&self) -> u32 {
        self.mdr_size
    }

    pub fn layout(&self) -> &MdrLayout {
        &self.layout
    }

    pub(crate) fn check_scan_line(&self, scan_line: usize) -> Result<(), MetopError> {
        if scan_line >= self.product_height {
            return Err(MetopError::ScanLineOutOfRange {
                scan_line,
                height: self.product_height,
            });
        }
        Ok(())
    }

    /// Absolute offset of the MDR holding `scan_line`.
    pub fn scan_line_offset(&self, scan_line: usize) -> u64 {
        self.first_mdr_offset + scan_line as u64 * self.mdr_size as u64
    }

    /// Absolute offset of the quality indicator of `scan_line`.
    pub fn flag_offset(&self, scan_line: usize) -> u64 {
        self.scan_line_offset(scan_line) + self.layout.flag_offset() as u64
    }

    /// The frame indicator byte carrying the channel-3 select bit.
    pub fn read_frame_indicator(&self, scan_line: usize) -> Result<u8, MetopError> {
        self.check_scan_line(scan_line)?;
        self.stream
            .read_u8_at(self.scan_line_offset(scan_line) + self.layout.channel3_byte_offset() as u64)
    }

    /// Decode the complete MDR of `scan_line`.
    pub fn read_mdr(&self, scan_line: usize) -> Result<MdrRecord, MetopError> {
        self.check_scan_line(scan_line)?;
        let bytes = self
            .stream
            .read_range(self.scan_line_offset(scan_line), self.mdr_size as usize)?;
        MdrRecord::from_bytes(&bytes, self.layout.precision)
    }

    /// Release the stream. Borrowing readers must be gone by now.
    pub fn close(self) -> Result<(), MetopError> {
        drop(self.stream.into_inner()?);
        Ok(())
    }
}

fn is_mphr(header: &GenericRecordHeader) -> bool {
    header.record_class == RecordClass::Mphr
        && header.instrument_group == InstrumentGroup::Generic
        && header.record_subclass == 0
}

fn is_avhrr_sphr(header: &GenericRecordHeader) -> bool {
    header.record_class == RecordClass::Sphr
        && header.instrument_group == InstrumentGroup::Avhrr3
        && header.record_subclass == 0
}

struct VerifiedMdrs {
    mdr_size: u32,
    product_height: usize,
    start_time: EpsTime,
    end_time: EpsTime,
}

/// Reads the first and last MDR headers and reconciles the declared
/// `TOTAL_MDR` with the stream length. A partial trailing record is dropped.
fn verify_mdrs(source: &mut dyn ByteSource, first_mdr_offset: u64, total_mdr: i64) -> Result<VerifiedMdrs, MetopError> {
    source.seek(SeekFrom::Start(first_mdr_offset))?;
    let first = GenericRecordHeader::read(source).map_err(|e| MetopError::BadFirstMdrHeader {
        offset: first_mdr_offset,
        reason: e.to_string(),
    })?;
    if first.record_class != RecordClass::Mdr {
        return Err(MetopError::BadFirstMdrHeader {
            offset: first_mdr_offset,
            reason: format!("record class is {:?}", first.record_class),
        });
    }
    if first.record_size == 0 {
        return Err(MetopError::BadFirstMdrHeader {
            offset: first_mdr_offset,
            reason: "record size is zero".to_string(),
        });
    }
    let mdr_size = first.record_size;

    let file_length = source.seek(SeekFrom::End(0))?;
    let mut height = total_mdr;
    // A header count too large to address is treated like any other length mismatch.
    let expected_file_size = height
        .checked_mul(mdr_size as i64)
        .and_then(|size| size.checked_add(first_mdr_offset as i64));
    if expected_file_size != Some(file_length as i64) {
        height = (file_length as i64 - first_mdr_offset as i64).div_euclid(mdr_size as i64);
        match expected_file_size {
            Some(expected) => warn!(
                "file length {} differs from expected {}; product height {} -> {}",
                file_length, expected, total_mdr, height
            ),
            None => warn!(
                "TOTAL_MDR {} overflows the addressable file size; product height -> {}",
                total_mdr, height
            ),
        }
    }
    if height <= 0 {
        return Err(MetopError::InvalidProductHeight {
            height,
            file_length,
            first_mdr_offset,
            mdr_size,
        });
    }

    let last_offset = first_mdr_offset + (height as u64 - 1) * mdr_size as u64;
    source.seek(SeekFrom::Start(last_offset))?;
    let last = GenericRecordHeader::read(source).map_err(|e| MetopError::BadLastMdrHeader {
        offset: last_offset,
        reason: e.to_string(),
    })?;
    if last.record_class != RecordClass::Mdr {
        return Err(MetopError::BadLastMdrHeader {
            offset: last_offset,
            reason: format!("record class is {:?}", last.record_class),
        });
    }

    Ok(VerifiedMdrs {
        mdr_size,
        product_height: height as usize,
        start_time: first.start_time,
        end_time: last.end_time,
    })
}

fn read_channel3_byte(
    source: &mut dyn ByteSource,
    layout: &MdrLayout,
    first_mdr_offset: u64,
    mdr_size: u32,
    scan_line: usize,
) -> Result<u8, MetopError> {
    let offset = first_mdr_offset + scan_line as u64 * mdr_size as u64 + layout.channel3_byte_offset() as u64;
    source.seek(SeekFrom::Start(offset))?;
    Ok(read_fully(source, 1, offset)?[0])
}
