use byteorder::{BigEndian, ByteOrder};

use crate::calibration::{CalibrationMode, Calibrator};
use crate::channel::{Channel, Channel3State};
use crate::error::MetopError;
use crate::parsing::metop_file::MetopFile;
use crate::records::mdr::PRODUCT_WIDTH;

/// Flag word bits produced by the flag band.
///
/// Bits 0 to 6 mirror quality indicator bits 25 to 31; bit 7 is set when
/// any scan line quality bit is raised.
pub mod flags {
    pub const INSTRUMENT_STATUS_CHANGED: u16 = 1 << 0;
    pub const FIRST_GOOD_TIME_AFTER_CLOCK_UPDATE: u16 = 1 << 1;
    pub const NO_EARTH_LOCATION: u16 = 1 << 2;
    pub const INSUFFICIENT_CALIBRATION: u16 = 1 << 3;
    pub const DATA_GAP: u16 = 1 << 4;
    pub const TIME_SEQUENCE_ERROR: u16 = 1 << 5;
    pub const DO_NOT_USE: u16 = 1 << 6;
    pub const SCAN_LINE_QUALITY: u16 = 1 << 7;

    /// Flag names in bit order.
    pub const NAMES: [&str; 8] = [
        "INSTRUMENT_STATUS_CHANGED",
        "FIRST_GOOD_TIME_AFTER_CLOCK_UPDATE",
        "NO_EARTH_LOCATION",
        "INSUFFICIENT_CALIBRATION",
        "DATA_GAP",
        "TIME_SEQUENCE_ERROR",
        "DO_NOT_USE",
        "SCAN_LINE_QUALITY",
    ];

    /// Fold the two per-scan-line quality words into one flag word.
    pub fn fold(quality_indicator: u32, scan_line_quality: u32) -> u16 {
        let mut word = ((quality_indicator >> 25) & 0x7f) as u16;
        if scan_line_quality != 0 {
            word |= SCAN_LINE_QUALITY;
        }
        word
    }
}

/// What a band reader produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandKind {
    Radiance(Channel),
    /// Channels 1, 2 and 3A.
    Reflectance(Channel),
    /// Channels 3B, 4 and 5.
    Temperature(Channel),
    Flags,
    Cloud,
}

impl BandKind {
    pub fn name(&self) -> String {
        match self {
            BandKind::Radiance(ch) => format!("radiance_{}", ch),
            BandKind::Reflectance(ch) => format!("reflec_{}", ch),
            BandKind::Temperature(ch) => format!("temp_{}", ch),
            BandKind::Flags => "flags".to_string(),
            BandKind::Cloud => "cloudFlag".to_string(),
        }
    }
}

/// One scan line (or several, concatenated) of band samples.
#[derive(Debug, Clone, PartialEq)]
pub enum BandSamples {
    Float32(Vec<f32>),
    UInt16(Vec<u16>),
}

impl BandSamples {
    pub fn len(&self) -> usize {
        match self {
            BandSamples::Float32(v) => v.len(),
            BandSamples::UInt16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            BandSamples::Float32(v) => Some(v),
            BandSamples::UInt16(_) => None,
        }
    }

    pub fn as_u16(&self) -> Option<&[u16]> {
        match self {
            BandSamples::UInt16(v) => Some(v),
            BandSamples::Float32(_) => None,
        }
    }

    fn extend(&mut self, other: BandSamples) {
        match (self, other) {
            (BandSamples::Float32(a), BandSamples::Float32(b)) => a.extend(b),
            (BandSamples::UInt16(a), BandSamples::UInt16(b)) => a.extend(b),
            _ => {}
        }
    }
}

/// A per-scan-line sample source.
///
/// Every implementation performs exactly one locked seek+read on the
/// product stream per scan line, so readers may be used from several
/// threads at once.
pub trait ScanLineSource: Send + Sync {
    fn band_name(&self) -> String;

    fn unit(&self) -> &'static str;

    /// Read the `PRODUCT_WIDTH` samples of one scan line.
    fn read_scan_line(&self, scan_line: usize) -> Result<BandSamples, MetopError>;

    /// Number of scan lines this source can serve.
    fn scan_line_count(&self) -> usize;

    /// An empty buffer of this source's sample type.
    fn empty_samples(&self) -> BandSamples {
        BandSamples::Float32(Vec::new())
    }

    /// Read `count` consecutive scan lines starting at `first`, row-major.
    ///
    /// The whole range is checked before any line is read.
    fn read_scan_lines(&self, first: usize, count: usize) -> Result<BandSamples, MetopError> {
        let height = self.scan_line_count();
        if !first.checked_add(count).is_some_and(|end| end <= height) {
            return Err(MetopError::ScanLineOutOfRange {
                scan_line: first.max(height),
                height,
            });
        }
        let mut out = self.empty_samples();
        for scan_line in first..first + count {
            out.extend(self.read_scan_line(scan_line)?);
        }
        Ok(out)
    }
}

/// Radiance samples of one channel, optionally calibrated further.
#[derive(Debug)]
pub struct RadianceBandReader<'a> {
    file: &'a MetopFile,
    channel: Channel,
    calibrator: Calibrator,
}

impl<'a> RadianceBandReader<'a> {
    pub fn new(file: &'a MetopFile, channel: Channel, calibrator: Calibrator) -> Self {
        RadianceBandReader { file, channel, calibrator }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    /// Raw radiance counts of one scan line.
    pub fn read_counts(&self, scan_line: usize) -> Result<Vec<i16>, MetopError> {
        self.file.check_scan_line(scan_line)?;
        let offset = self.file.scan_line_offset(scan_line) + self.file.layout().radiance_offset(self.channel) as u64;
        let bytes = self.file.stream().read_range(offset, PRODUCT_WIDTH * 2)?;
        let mut counts = vec![0i16; PRODUCT_WIDTH];
        BigEndian::read_i16_into(&bytes, &mut counts);
        Ok(counts)
    }
}

impl ScanLineSource for RadianceBandReader<'_> {
    fn band_name(&self) -> String {
        match self.calibrator.mode() {
            CalibrationMode::Radiance => BandKind::Radiance(self.channel).name(),
            CalibrationMode::Reflectance => BandKind::Reflectance(self.channel).name(),
            CalibrationMode::Temperature => BandKind::Temperature(self.channel).name(),
        }
    }

    fn unit(&self) -> &'static str {
        self.calibrator.unit(self.channel)
    }

    fn scan_line_count(&self) -> usize {
        self.file.product_height()
    }

    fn read_scan_line(&self, scan_line: usize) -> Result<BandSamples, MetopError> {
        let scale = self.channel.radiance_scale();
        let samples = self
            .read_counts(scan_line)?
            .into_iter()
            .map(|count| self.calibrator.calibrate(count as f32 * scale))
            .collect();
        Ok(BandSamples::Float32(samples))
    }
}

/// Per-pixel quality flags; see [`flags`] for the bit layout.
#[derive(Debug)]
pub struct FlagBandReader<'a> {
    file: &'a MetopFile,
}

impl<'a> FlagBandReader<'a> {
    pub fn new(file: &'a MetopFile) -> Self {
        FlagBandReader { file }
    }
}

impl ScanLineSource for FlagBandReader<'_> {
    fn band_name(&self) -> String {
        BandKind::Flags.name()
    }

    fn unit(&self) -> &'static str {
        ""
    }

    fn scan_line_count(&self) -> usize {
        self.file.product_height()
    }

    fn empty_samples(&self) -> BandSamples {
        BandSamples::UInt16(Vec::new())
    }

    fn read_scan_line(&self, scan_line: usize) -> Result<BandSamples, MetopError> {
        self.file.check_scan_line(scan_line)?;
        let bytes = self.file.stream().read_range(self.file.flag_offset(scan_line), 8)?;
        let word = flags::fold(BigEndian::read_u32(&bytes[0..4]), BigEndian::read_u32(&bytes[4..8]));
        Ok(BandSamples::UInt16(vec![word; PRODUCT_WIDTH]))
    }
}

/// Raw per-pixel cloud information words.
#[derive(Debug)]
pub struct CloudBandReader<'a> {
    file: &'a MetopFile,
}

impl<'a> CloudBandReader<'a> {
    pub fn new(file: &'a MetopFile) -> Self {
        CloudBandReader { file }
    }
}

impl ScanLineSource for CloudBandReader<'_> {
    fn band_name(&self) -> String {
        BandKind::Cloud.name()
    }

    fn unit(&self) -> &'static str {
        ""
    }

    fn scan_line_count(&self) -> usize {
        self.file.product_height()
    }

    fn empty_samples(&self) -> BandSamples {
        BandSamples::UInt16(Vec::new())
    }

    fn read_scan_line(&self, scan_line: usize) -> Result<BandSamples, MetopError> {
        self.file.check_scan_line(scan_line)?;
        let offset = self.file.scan_line_offset(scan_line) + self.file.layout().cloud_information_offset() as u64;
        let bytes = self.file.stream().read_range(offset, PRODUCT_WIDTH * 2)?;
        let mut words = vec![0u16; PRODUCT_WIDTH];
        BigEndian::read_u16_into(&bytes, &mut words);
        Ok(BandSamples::UInt16(words))
    }
}

impl MetopFile {
    /// Create a reader for one band of this product.
    ///
    /// # Arguments
    /// * `kind` - Band to read, including the calibration mode for radiance bands
    ///
    /// # Returns
    /// A reader borrowing this product, or an error when the product cannot
    /// serve the band (wrong channel-3 mode, missing GIADR, or a channel
    /// without coefficients for the requested calibration).
    pub fn band_reader(&self, kind: BandKind) -> Result<Box<dyn ScanLineSource + '_>, MetopError> {
        let (channel, mode) = match kind {
            BandKind::Flags => return Ok(Box::new(FlagBandReader::new(self))),
            BandKind::Cloud => return Ok(Box::new(CloudBandReader::new(self))),
            BandKind::Radiance(ch) => (ch, CalibrationMode::Radiance),
            BandKind::Reflectance(ch) => (ch, CalibrationMode::Reflectance),
            BandKind::Temperature(ch) => (ch, CalibrationMode::Temperature),
        };

        let state = self.channel_3ab_state();
        let rejected_ambiguous = state == Channel3State::Ambiguous
            && self.config().reject_ambiguous_channel3
            && matches!(channel, Channel::Ch3a | Channel::Ch3b);
        if !state.serves(channel) || rejected_ambiguous {
            return Err(MetopError::Channel3Unavailable {
                requested: channel.to_string(),
                state: state.to_string(),
            });
        }

        let calibrator = Calibrator::for_channel(
            mode,
            channel,
            self.giadr_radiance(),
            self.config().earth_sun_distance_ratio,
        )?;
        Ok(Box::new(RadianceBandReader::new(self, channel, calibrator)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_maps_quality_bits() {
        assert_eq!(flags::fold(0, 0), 0);
        assert_eq!(flags::fold(1 << 31, 0), flags::DO_NOT_USE);
        assert_eq!(flags::fold(1 << 25, 0), flags::INSTRUMENT_STATUS_CHANGED);
        assert_eq!(flags::fold(0x00ff_ffff, 0), 0);
        assert_eq!(flags::fold(0, 4), flags::SCAN_LINE_QUALITY);
    }
}
