use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::error::MetopError;
use crate::records::common::{check_len, EpsTime, InstrumentGroup, RecordClass, GENERIC_HEADER_SIZE};
use crate::records::generic_header::GenericRecordHeader;

/// Earth views per scan line.
pub const PRODUCT_WIDTH: usize = 2048;
/// Number of radiance slots in an MDR (channels 1, 2, 3A/3B, 4, 5).
pub const RADIANCE_SLOTS: usize = 5;

const SCENE_RADIANCE_OFFSET: usize = 22;
const TIE_POINT_OFFSET: usize = 20556;
const FLAG_OFFSET: usize = 22204;
const CLOUD_INFORMATION_OFFSET: usize = 22484;
const FRAME_INDICATOR_OFFSET: usize = 26580;
const HIGH_PRECISION_MDR_SIZE: usize = 26660;
/// Bytes saved after the tie points by low-precision products.
const TIE_POINT_DIFFERENCE: usize = 832;

/// Tie-point density, selected by the SPHR `NAV_SAMPLE_RATE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavPrecision {
    /// Sample rate 40, 51 tie points per scan line.
    Low,
    /// Sample rate 20, 103 tie points per scan line.
    High,
}

impl NavPrecision {
    pub fn from_sample_rate(rate: i64) -> Result<Self, MetopError> {
        match rate {
            40 => Ok(NavPrecision::Low),
            20 => Ok(NavPrecision::High),
            other => Err(MetopError::BadNavSampleRate(other)),
        }
    }

    pub fn sample_rate(self) -> usize {
        match self {
            NavPrecision::Low => 40,
            NavPrecision::High => 20,
        }
    }

    pub fn num_nav_points(self) -> usize {
        match self {
            NavPrecision::Low => 51,
            NavPrecision::High => 103,
        }
    }

    /// Pixel index of the first tie point in a scan line.
    pub fn tie_point_offset_x(self) -> usize {
        match self {
            NavPrecision::Low => 24,
            NavPrecision::High => 4,
        }
    }
}

/// Byte offsets of the fields inside one MDR, relative to the record start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MdrLayout {
    pub precision: NavPrecision,
}

impl MdrLayout {
    pub fn new(precision: NavPrecision) -> Self {
        MdrLayout { precision }
    }

    fn shift(&self) -> usize {
        match self.precision {
            NavPrecision::Low => TIE_POINT_DIFFERENCE,
            NavPrecision::High => 0,
        }
    }

    pub fn radiance_offset(&self, channel: Channel) -> usize {
        SCENE_RADIANCE_OFFSET + channel.mdr_slot() * PRODUCT_WIDTH * 2
    }

    /// Start of the angular relations; the earth locations follow directly.
    pub fn tie_point_offset(&self) -> usize {
        TIE_POINT_OFFSET
    }

    /// Bytes of angles plus lat/lon per scan line.
    pub fn tie_point_len(&self) -> usize {
        self.precision.num_nav_points() * (4 * 2 + 2 * 4)
    }

    /// Start of the quality indicator, followed by the scan line quality.
    pub fn flag_offset(&self) -> usize {
        FLAG_OFFSET - self.shift()
    }

    pub fn cloud_information_offset(&self) -> usize {
        CLOUD_INFORMATION_OFFSET - self.shift()
    }

    pub fn frame_indicator_offset(&self) -> usize {
        FRAME_INDICATOR_OFFSET - self.shift()
    }

    /// The byte of the frame indicator whose bit 0 selects channel 3A.
    pub fn channel3_byte_offset(&self) -> usize {
        self.frame_indicator_offset() + 1
    }

    pub fn record_size(&self) -> usize {
        HIGH_PRECISION_MDR_SIZE - self.shift()
    }
}

/// One decoded Main Data Record (one scan line).
#[derive(Debug, Clone, PartialEq)]
pub struct MdrRecord {
    pub header: GenericRecordHeader,
    /// Five slots of `PRODUCT_WIDTH` raw radiance counts.
    pub scene_radiances: Vec<i16>,
    /// `num_nav_points` groups of SZA, VZA, SAA, VAA in 1e-2 degrees.
    pub angular_relations: Vec<i16>,
    /// `num_nav_points` pairs of lat, lon in 1e-4 degrees.
    pub earth_locations: Vec<i32>,
    pub quality_indicator: u32,
    pub scan_line_quality: u32,
    pub cloud_information: Vec<u16>,
    pub frame_indicator: u32,
}

impl MdrRecord {
    /// An all-zero scan line for the given precision and time span.
    pub fn new(precision: NavPrecision, start_time: EpsTime, end_time: EpsTime) -> Self {
        let layout = MdrLayout::new(precision);
        let n = precision.num_nav_points();
        let mut header = GenericRecordHeader::new(RecordClass::Mdr, InstrumentGroup::Avhrr3, 2, layout.record_size() as u32);
        header.start_time = start_time;
        header.end_time = end_time;
        MdrRecord {
            header,
            scene_radiances: vec![0; RADIANCE_SLOTS * PRODUCT_WIDTH],
            angular_relations: vec![0; 4 * n],
            earth_locations: vec![0; 2 * n],
            quality_indicator: 0,
            scan_line_quality: 0,
            cloud_information: vec![0; PRODUCT_WIDTH],
            frame_indicator: 0,
        }
    }

    pub fn radiances(&self, channel: Channel) -> &[i16] {
        let start = channel.mdr_slot() * PRODUCT_WIDTH;
        &self.scene_radiances[start..start + PRODUCT_WIDTH]
    }

    pub fn radiances_mut(&mut self, channel: Channel) -> &mut [i16] {
        let start = channel.mdr_slot() * PRODUCT_WIDTH;
        &mut self.scene_radiances[start..start + PRODUCT_WIDTH]
    }

    /// Set or clear the channel-3A select bit of the frame indicator.
    pub fn set_channel3a(&mut self, selected: bool) {
        const CHANNEL3A_BIT: u32 = 1 << 16;
        if selected {
            self.frame_indicator |= CHANNEL3A_BIT;
        } else {
            self.frame_indicator &= !CHANNEL3A_BIT;
        }
    }

    pub fn from_bytes(bytes: &[u8], precision: NavPrecision) -> Result<Self, MetopError> {
        let layout = MdrLayout::new(precision);
        check_len(bytes, layout.record_size())?;
        let header = GenericRecordHeader::from_bytes(bytes)?;
        let n = precision.num_nav_points();

        let mut record = MdrRecord::new(precision, header.start_time, header.end_time);
        record.header = header;

        let radiance_start = layout.radiance_offset(Channel::Ch1);
        BigEndian::read_i16_into(
            &bytes[radiance_start..radiance_start + RADIANCE_SLOTS * PRODUCT_WIDTH * 2],
            &mut record.scene_radiances,
        );
        let angles_start = layout.tie_point_offset();
        let lat_lon_start = angles_start + 8 * n;
        BigEndian::read_i16_into(&bytes[angles_start..lat_lon_start], &mut record.angular_relations);
        BigEndian::read_i32_into(&bytes[lat_lon_start..lat_lon_start + 8 * n], &mut record.earth_locations);

        let flags = layout.flag_offset();
        record.quality_indicator = BigEndian::read_u32(&bytes[flags..flags + 4]);
        record.scan_line_quality = BigEndian::read_u32(&bytes[flags + 4..flags + 8]);

        let cloud = layout.cloud_information_offset();
        BigEndian::read_u16_into(&bytes[cloud..cloud + PRODUCT_WIDTH * 2], &mut record.cloud_information);

        let frame = layout.frame_indicator_offset();
        record.frame_indicator = BigEndian::read_u32(&bytes[frame..frame + 4]);

        Ok(record)
    }

    /// Encodes the record, zero-filling every byte no field covers.
    ///
    /// The output length is the header's `record_size`, or the layout size if larger.
    pub fn to_bytes(&self, precision: NavPrecision) -> Vec<u8> {
        let layout = MdrLayout::new(precision);
        let n = precision.num_nav_points();
        let len = (self.header.record_size as usize).max(layout.record_size());
        let mut buffer = vec![0u8; len];

        buffer[..GENERIC_HEADER_SIZE].copy_from_slice(&self.header.to_bytes());

        let radiance_start = layout.radiance_offset(Channel::Ch1);
        BigEndian::write_i16_into(
            &self.scene_radiances,
            &mut buffer[radiance_start..radiance_start + RADIANCE_SLOTS * PRODUCT_WIDTH * 2],
        );
        let angles_start = layout.tie_point_offset();
        let lat_lon_start = angles_start + 8 * n;
        BigEndian::write_i16_into(&self.angular_relations, &mut buffer[angles_start..lat_lon_start]);
        BigEndian::write_i32_into(&self.earth_locations, &mut buffer[lat_lon_start..lat_lon_start + 8 * n]);

        let flags = layout.flag_offset();
        BigEndian::write_u32(&mut buffer[flags..flags + 4], self.quality_indicator);
        BigEndian::write_u32(&mut buffer[flags + 4..flags + 8], self.scan_line_quality);

        let cloud = layout.cloud_information_offset();
        BigEndian::write_u16_into(&self.cloud_information, &mut buffer[cloud..cloud + PRODUCT_WIDTH * 2]);

        let frame = layout.frame_indicator_offset();
        BigEndian::write_u32(&mut buffer[frame..frame + 4], self.frame_indicator);

        buffer
    }
}
