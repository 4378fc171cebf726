#![allow(dead_code)]

use std::io::Cursor;

use byteorder::{BigEndian, ByteOrder};
use metop_avhrr::config::ReaderConfig;
use metop_avhrr::error::MetopError;
use metop_avhrr::parsing::metop_file::MetopFile;
use metop_avhrr::records::common::EpsTime;
use metop_avhrr::records::giadr_radiance::RadianceConversionCounts;
use metop_avhrr::records::mdr::NavPrecision;
use metop_avhrr::writer::ProductBuilder;

pub const PRODUCT_NAME: &str = "AVHR_xxx_1B_M02_20100101000000Z_20100101001500Z_N_O_20100101010000Z";

pub fn radiance_counts() -> RadianceConversionCounts {
    RadianceConversionCounts {
        ramp_calibration_coefficient: 3,
        year_recent_calibration: 2009,
        day_recent_calibration: 312,
        primary_calibration_algorithm_id: 1,
        primary_calibration_algorithm_option: 0,
        secondary_calibration_algorithm_id: 2,
        secondary_calibration_algorithm_option: -1,
        ir_temperature_coefficients: [
            [27615, 1230, -2405, 4211, -1500, 72],
            [27620, 1231, -2400, 4200, -1490, 71],
            [27610, 1229, -2410, 4190, -1510, 73],
            [27605, 1232, -2395, 4222, -1480, 70],
        ],
        solar_filtered_irradiance: [1399, 2321, 54],
        equivalent_filter_width: [84, 229, 199],
        central_wavenumber: [268_500, 928_000, 837_000],
        constant1: [184_000, 45_000, 61_000],
        constant2_slope: [998_000, 999_100, 999_300],
    }
}

/// A product with `lines` blank scan lines, all in channel 3A or all in 3B.
pub fn builder(precision: NavPrecision, lines: usize, ch3a: bool) -> ProductBuilder {
    ProductBuilder::new(PRODUCT_NAME, precision)
        .start_time(EpsTime::new(3653, 0))
        .radiance_conversion(radiance_counts())
        .scan_lines(lines, |_, mdr| mdr.set_channel3a(ch3a))
}

pub fn open(bytes: Vec<u8>) -> Result<MetopFile, MetopError> {
    MetopFile::from_reader(Cursor::new(bytes), ReaderConfig::default())
}

pub fn open_with(bytes: Vec<u8>, config: ReaderConfig) -> Result<MetopFile, MetopError> {
    MetopFile::from_reader(Cursor::new(bytes), config)
}

/// Size of the record starting at `offset`, from its generic header.
pub fn record_size_at(bytes: &[u8], offset: usize) -> usize {
    BigEndian::read_u32(&bytes[offset + 4..offset + 8]) as usize
}
