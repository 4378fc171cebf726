use std::io::Read;

use byteorder::{BigEndian, ByteOrder};

use crate::channel::Channel;
use crate::error::MetopError;
use crate::records::common::{read_fully, check_len, GENERIC_HEADER_SIZE};
use crate::records::generic_header::GenericRecordHeader;

/// Scale factors of IR temperature coefficients 1 to 6.
pub const IR_TEMPERATURE_COEFFICIENT_SCALES: [f64; 6] = [1e-2, 1e-5, 1e-8, 1e-11, 1e-14, 1e-17];
pub const SOLAR_IRRADIANCE_SCALE: f32 = 1e-1;
pub const EQUIVALENT_WIDTH_SCALE: f32 = 1e-3;
/// Central wavenumber scales for channels 3B, 4 and 5.
pub const CENTRAL_WAVENUMBER_SCALES: [f32; 3] = [1e-2, 1e-3, 1e-3];
pub const CONSTANT1_SCALE: f32 = 1e-5;
pub const CONSTANT2_SLOPE_SCALE: f32 = 1e-6;

/// Number of internal target PRT coefficient sets.
pub const PRT_COUNT: usize = 4;

/// Raw integer content of a GIADR radiance record body, before scaling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RadianceConversionCounts {
    pub ramp_calibration_coefficient: i16,
    pub year_recent_calibration: u16,
    pub day_recent_calibration: u16,
    pub primary_calibration_algorithm_id: u16,
    pub primary_calibration_algorithm_option: i16,
    pub secondary_calibration_algorithm_id: u16,
    pub secondary_calibration_algorithm_option: i16,
    /// Per PRT set, coefficients 1 to 6.
    pub ir_temperature_coefficients: [[i16; 6]; PRT_COUNT],
    pub solar_filtered_irradiance: [i16; 3],
    pub equivalent_filter_width: [i16; 3],
    pub central_wavenumber: [i32; 3],
    pub constant1: [i32; 3],
    pub constant2_slope: [i32; 3],
}

impl RadianceConversionCounts {
    pub const SIZE: usize = 110;

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MetopError> {
        check_len(bytes, Self::SIZE)?;

        let mut counts = RadianceConversionCounts {
            ramp_calibration_coefficient: BigEndian::read_i16(&bytes[0..2]),
            year_recent_calibration: BigEndian::read_u16(&bytes[2..4]),
            day_recent_calibration: BigEndian::read_u16(&bytes[4..6]),
            primary_calibration_algorithm_id: BigEndian::read_u16(&bytes[6..8]),
            primary_calibration_algorithm_option: BigEndian::read_i16(&bytes[8..10]),
            secondary_calibration_algorithm_id: BigEndian::read_u16(&bytes[10..12]),
            secondary_calibration_algorithm_option: BigEndian::read_i16(&bytes[12..14]),
            ..Default::default()
        };

        let mut offset = 14;
        for set in counts.ir_temperature_coefficients.iter_mut() {
            for coefficient in set.iter_mut() {
                *coefficient = BigEndian::read_i16(&bytes[offset..offset + 2]);
                offset += 2;
            }
        }
        for i in 0..3 {
            counts.solar_filtered_irradiance[i] = BigEndian::read_i16(&bytes[offset..offset + 2]);
            counts.equivalent_filter_width[i] = BigEndian::read_i16(&bytes[offset + 2..offset + 4]);
            offset += 4;
        }
        for i in 0..3 {
            counts.central_wavenumber[i] = BigEndian::read_i32(&bytes[offset..offset + 4]);
            counts.constant1[i] = BigEndian::read_i32(&bytes[offset + 4..offset + 8]);
            counts.constant2_slope[i] = BigEndian::read_i32(&bytes[offset + 8..offset + 12]);
            offset += 12;
        }
        debug_assert_eq!(offset, Self::SIZE);

        Ok(counts)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = vec![0u8; Self::SIZE];
        BigEndian::write_i16(&mut buffer[0..2], self.ramp_calibration_coefficient);
        BigEndian::write_u16(&mut buffer[2..4], self.year_recent_calibration);
        BigEndian::write_u16(&mut buffer[4..6], self.day_recent_calibration);
        BigEndian::write_u16(&mut buffer[6..8], self.primary_calibration_algorithm_id);
        BigEndian::write_i16(&mut buffer[8..10], self.primary_calibration_algorithm_option);
        BigEndian::write_u16(&mut buffer[10..12], self.secondary_calibration_algorithm_id);
        BigEndian::write_i16(&mut buffer[12..14], self.secondary_calibration_algorithm_option);

        let mut offset = 14;
        for set in &self.ir_temperature_coefficients {
            for &coefficient in set {
                BigEndian::write_i16(&mut buffer[offset..offset + 2], coefficient);
                offset += 2;
            }
        }
        for i in 0..3 {
            BigEndian::write_i16(&mut buffer[offset..offset + 2], self.solar_filtered_irradiance[i]);
            BigEndian::write_i16(&mut buffer[offset + 2..offset + 4], self.equivalent_filter_width[i]);
            offset += 4;
        }
        for i in 0..3 {
            BigEndian::write_i32(&mut buffer[offset..offset + 4], self.central_wavenumber[i]);
            BigEndian::write_i32(&mut buffer[offset + 4..offset + 8], self.constant1[i]);
            BigEndian::write_i32(&mut buffer[offset + 8..offset + 12], self.constant2_slope[i]);
            offset += 12;
        }
        buffer
    }
}

/// Global Internal Auxiliary Data Record holding radiance conversion coefficients.
///
/// Solar fields are indexed by channels 1, 2 and 3A; thermal fields by
/// channels 3B, 4 and 5. Use the per-channel accessors rather than the
/// arrays when the channel is known.
#[derive(Debug, Clone, PartialEq)]
pub struct GiadrRadiance {
    pub header: GenericRecordHeader,
    pub ramp_calibration_coefficient: i16,
    pub year_recent_calibration: u16,
    pub day_recent_calibration: u16,
    pub primary_calibration_algorithm_id: u16,
    pub primary_calibration_algorithm_option: i16,
    pub secondary_calibration_algorithm_id: u16,
    pub secondary_calibration_algorithm_option: i16,
    pub ir_temperature_coefficients: [[f64; 6]; PRT_COUNT],
    pub solar_filtered_irradiance: [f32; 3],
    pub equivalent_filter_width: [f32; 3],
    pub central_wavenumbers: [f32; 3],
    pub radiance_constant1: [f32; 3],
    pub radiance_constant2_slope: [f32; 3],
}

impl GiadrRadiance {
    pub const SIZE: usize = GENERIC_HEADER_SIZE + RadianceConversionCounts::SIZE;

    /// Apply the format's scale factors to raw counts.
    pub fn from_counts(header: GenericRecordHeader, counts: &RadianceConversionCounts) -> Self {
        let mut ir_temperature_coefficients = [[0.0f64; 6]; PRT_COUNT];
        for (set, raw_set) in ir_temperature_coefficients.iter_mut().zip(&counts.ir_temperature_coefficients) {
            for k in 0..6 {
                set[k] = raw_set[k] as f64 * IR_TEMPERATURE_COEFFICIENT_SCALES[k];
            }
        }

        GiadrRadiance {
            header,
            ramp_calibration_coefficient: counts.ramp_calibration_coefficient,
            year_recent_calibration: counts.year_recent_calibration,
            day_recent_calibration: counts.day_recent_calibration,
            primary_calibration_algorithm_id: counts.primary_calibration_algorithm_id,
            primary_calibration_algorithm_option: counts.primary_calibration_algorithm_option,
            secondary_calibration_algorithm_id: counts.secondary_calibration_algorithm_id,
            secondary_calibration_algorithm_option: counts.secondary_calibration_algorithm_option,
            ir_temperature_coefficients,
            solar_filtered_irradiance: counts.solar_filtered_irradiance.map(|v| v as f32 * SOLAR_IRRADIANCE_SCALE),
            equivalent_filter_width: counts.equivalent_filter_width.map(|v| v as f32 * EQUIVALENT_WIDTH_SCALE),
            central_wavenumbers: [
                counts.central_wavenumber[0] as f32 * CENTRAL_WAVENUMBER_SCALES[0],
                counts.central_wavenumber[1] as f32 * CENTRAL_WAVENUMBER_SCALES[1],
                counts.central_wavenumber[2] as f32 * CENTRAL_WAVENUMBER_SCALES[2],
            ],
            radiance_constant1: counts.constant1.map(|v| v as f32 * CONSTANT1_SCALE),
            radiance_constant2_slope: counts.constant2_slope.map(|v| v as f32 * CONSTANT2_SLOPE_SCALE),
        }
    }

    /// Parse a full record, generic header included.
    ///
    /// The header is only checked for structural validity; the caller has
    /// already located this record through the pointer table.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MetopError> {
        check_len(bytes, Self::SIZE)?;
        let header = GenericRecordHeader::from_bytes(bytes)?;
        let counts = RadianceConversionCounts::from_bytes(&bytes[GENERIC_HEADER_SIZE..])?;
        Ok(Self::from_counts(header, &counts))
    }

    pub fn read<R: Read + ?Sized>(reader: &mut R) -> Result<Self, MetopError> {
        let bytes = read_fully(reader, Self::SIZE, 0)?;
        Self::from_bytes(&bytes)
    }

    fn solar(channel: Channel) -> Result<usize, MetopError> {
        channel.solar_index().ok_or_else(|| MetopError::ChannelNotSupported {
            channel: channel.to_string(),
            mode: "reflectance",
        })
    }

    fn thermal(channel: Channel) -> Result<usize, MetopError> {
        channel.thermal_index().ok_or_else(|| MetopError::ChannelNotSupported {
            channel: channel.to_string(),
            mode: "temperature",
        })
    }

    pub fn solar_irradiance(&self, channel: Channel) -> Result<f32, MetopError> {
        Ok(self.solar_filtered_irradiance[Self::solar(channel)?])
    }

    pub fn equivalent_width(&self, channel: Channel) -> Result<f32, MetopError> {
        Ok(self.equivalent_filter_width[Self::solar(channel)?])
    }

    pub fn central_wavenumber(&self, channel: Channel) -> Result<f32, MetopError> {
        Ok(self.central_wavenumbers[Self::thermal(channel)?])
    }

    pub fn constant1(&self, channel: Channel) -> Result<f32, MetopError> {
        Ok(self.radiance_constant1[Self::thermal(channel)?])
    }

    pub fn constant2_slope(&self, channel: Channel) -> Result<f32, MetopError> {
        Ok(self.radiance_constant2_slope[Self::thermal(channel)?])
    }

    /// Internal target temperature in K from a PRT count, using that PRT's
    /// polynomial `c1 + c2*x + ... + c6*x^5`.
    pub fn internal_target_temperature(&self, prt: usize, count: f64) -> Option<f64> {
        let coefficients = self.ir_temperature_coefficients.get(prt)?;
        Some(coefficients.iter().rev().fold(0.0, |acc, &c| acc * count + c))
    }
}
