use std::io::{Cursor, Seek};

use chrono::{TimeZone, Utc};
use metop_avhrr::channel::Channel;
use metop_avhrr::error::{ErrorKind, MetopError};
use metop_avhrr::records::ascii_header::AsciiHeaderRecord;
use metop_avhrr::records::common::{EpsTime, InstrumentGroup, RecordClass};
use metop_avhrr::records::geadr::GeadrRecord;
use metop_avhrr::records::generic_header::GenericRecordHeader;
use metop_avhrr::records::giadr_radiance::{GiadrRadiance, RadianceConversionCounts};
use metop_avhrr::records::mdr::{MdrLayout, MdrRecord, NavPrecision};
use metop_avhrr::records::pointer_record::InternalPointerRecord;

mod common;

#[test]
fn generic_header_reencodes_exactly() -> Result<(), MetopError> {
    let bytes: [u8; 20] = [
        8, 4, 2, 3, 0x00, 0x00, 0x68, 0x24, 0x0e, 0x45, 0x01, 0x02, 0x03, 0x04, 0x0e, 0x45, 0x01, 0x02, 0x03, 0xa7,
    ];
    let header = GenericRecordHeader::from_bytes(&bytes)?;
    assert_eq!(header.record_class, RecordClass::Mdr);
    assert_eq!(header.instrument_group, InstrumentGroup::Avhrr3);
    assert_eq!(header.record_subclass, 2);
    assert_eq!(header.record_subclass_version, 3);
    assert_eq!(header.record_size, 26660);
    assert_eq!(header.start_time, EpsTime::new(0x0e45, 0x0102_0304));
    assert_eq!(header.to_bytes(), bytes);
    Ok(())
}

#[test]
fn every_valid_generic_header_reencodes() -> Result<(), MetopError> {
    let times = [EpsTime::new(0, 0), EpsTime::new(u16::MAX, u32::MAX), EpsTime::new(3653, 43_200_000)];
    for class in 0u8..=8 {
        for group in 0u8..=15 {
            for (subclass, version, size) in [(0u8, 0u8, 0u32), (u8::MAX, u8::MAX, u32::MAX), (2, 3, 26660)] {
                for (start, end) in times.iter().zip(times.iter().rev()) {
                    let mut bytes = [0u8; 20];
                    bytes[0] = class;
                    bytes[1] = group;
                    bytes[2] = subclass;
                    bytes[3] = version;
                    bytes[4..8].copy_from_slice(&size.to_be_bytes());
                    bytes[8..14].copy_from_slice(&start.to_bytes());
                    bytes[14..20].copy_from_slice(&end.to_bytes());

                    let header = GenericRecordHeader::from_bytes(&bytes)?;
                    assert_eq!(header.record_class, RecordClass::from_u8(class)?);
                    assert_eq!(header.instrument_group, InstrumentGroup::from_u8(group)?);
                    assert_eq!(header.record_subclass, subclass);
                    assert_eq!(header.record_subclass_version, version);
                    assert_eq!(header.record_size, size);
                    assert_eq!(header.start_time, *start);
                    assert_eq!(header.end_time, *end);
                    assert_eq!(header.to_bytes(), bytes);
                }
            }
        }
    }
    Ok(())
}

#[test]
fn generic_header_rejects_unknown_enumerations() {
    let mut bytes = GenericRecordHeader::new(RecordClass::Mphr, InstrumentGroup::Generic, 0, 20).to_bytes();
    bytes[0] = 9;
    assert!(matches!(GenericRecordHeader::from_bytes(&bytes), Err(MetopError::UnknownRecordClass(9))));

    bytes[0] = 1;
    bytes[1] = 16;
    assert!(matches!(GenericRecordHeader::from_bytes(&bytes), Err(MetopError::UnknownInstrumentGroup(16))));
}

#[test]
fn generic_header_read_reports_truncation() {
    let mut cursor = Cursor::new(vec![1u8, 0, 0, 0, 0, 0]);
    match GenericRecordHeader::read(&mut cursor) {
        Err(e @ MetopError::TruncatedStream { expected: 20, actual: 6, .. }) => {
            assert_eq!(e.kind(), ErrorKind::Truncation)
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn eps_time_converts_to_utc() {
    let time = EpsTime::new(1, 3_600_000);
    assert_eq!(time.to_datetime(), Utc.with_ymd_and_hms(2000, 1, 2, 1, 0, 0).unwrap());
    assert_eq!(EpsTime::new(0, 0).to_datetime(), Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap());
}

#[test]
fn ascii_header_parses_key_value_lines() -> Result<(), MetopError> {
    let body = b"PRODUCT_NAME                  = AVHR_xxx_1B\nTOTAL_SPHR                    =  1\n\nSPACECRAFT_ID = M02\r\n\0\0\0";
    let record = AsciiHeaderRecord::parse(body)?;
    assert_eq!(record.len(), 3);
    assert_eq!(record.get_string("PRODUCT_NAME")?, "AVHR_xxx_1B");
    assert_eq!(record.get_int("TOTAL_SPHR")?, 1);
    assert_eq!(record.get_string("SPACECRAFT_ID")?, "M02");
    let keys: Vec<&str> = record.entries().iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, ["PRODUCT_NAME", "TOTAL_SPHR", "SPACECRAFT_ID"]);
    Ok(())
}

#[test]
fn ascii_header_typed_lookup_errors() -> Result<(), MetopError> {
    let record = AsciiHeaderRecord::parse(b"SPACECRAFT_ID = M02\n")?;
    assert!(matches!(record.get_string("TOTAL_MDR"), Err(MetopError::MissingKey(k)) if k == "TOTAL_MDR"));
    assert!(matches!(record.get_int("TOTAL_MDR"), Err(MetopError::MissingKey(_))));
    match record.get_int("SPACECRAFT_ID") {
        Err(MetopError::NotAnInteger { key, value }) => {
            assert_eq!(key, "SPACECRAFT_ID");
            assert_eq!(value, "M02");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    Ok(())
}

#[test]
fn ascii_header_rejects_duplicates_and_malformed_lines() {
    let duplicate = AsciiHeaderRecord::parse(b"A = 1\nB = 2\nA = 3\n");
    assert!(matches!(duplicate, Err(MetopError::DuplicateKey(k)) if k == "A"));

    let malformed = AsciiHeaderRecord::parse(b"A = 1\nJUNK\n");
    assert!(matches!(malformed, Err(MetopError::MalformedLine { line: 2, .. })));

    let empty_key = AsciiHeaderRecord::parse(b"   = 1\n");
    assert!(matches!(empty_key, Err(MetopError::MalformedLine { line: 1, .. })));
}

#[test]
fn ascii_header_read_consumes_declared_body() -> Result<(), MetopError> {
    let record = AsciiHeaderRecord::from_pairs([("TOTAL_SPHR", "1"), ("TOTAL_MDR", "1080")])?;
    let body = record.to_bytes();
    let mut data = body.clone();
    data.extend_from_slice(b"NEXT RECORD");
    let mut cursor = Cursor::new(data);

    let header = GenericRecordHeader::new(RecordClass::Mphr, InstrumentGroup::Generic, 1, (20 + body.len()) as u32);
    let decoded = AsciiHeaderRecord::read(&mut cursor, &header)?;
    assert_eq!(cursor.stream_position()?, body.len() as u64);
    assert_eq!(decoded.get_int("TOTAL_MDR")?, 1080);
    assert_eq!(decoded.entries(), record.entries());
    Ok(())
}

#[test]
fn ascii_header_read_rejects_size_below_generic_header() {
    let header = GenericRecordHeader::new(RecordClass::Sphr, InstrumentGroup::Avhrr3, 0, 12);
    let mut cursor = Cursor::new(b"TOTAL_MDR = 1\n".to_vec());
    match AsciiHeaderRecord::read(&mut cursor, &header) {
        Err(e @ MetopError::RecordTooSmall { size: 12, minimum: 20, .. }) => assert_eq!(e.kind(), ErrorKind::Structural),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(cursor.position(), 0);
}

#[test]
fn ascii_header_rejects_non_ascii_bytes() {
    let result = AsciiHeaderRecord::parse(b"TOTAL_SPHR = 1\nPRODUCT_NAME = AVHR\xff\xfe_1B\n");
    match result {
        Err(MetopError::MalformedLine { line, content }) => {
            assert_eq!(line, 2);
            assert!(content.starts_with("PRODUCT_NAME = AVHR"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert!(matches!(
        AsciiHeaderRecord::parse("INSTRUMENT_ID = AVH\u{e9}\n".as_bytes()),
        Err(MetopError::MalformedLine { line: 1, .. })
    ));
}

#[test]
fn pointer_sequence_stops_at_mdr_pointer() -> Result<(), MetopError> {
    let mut data = Vec::new();
    data.extend_from_slice(&InternalPointerRecord::new(RecordClass::Giadr, InstrumentGroup::Avhrr3, 1, 500).to_bytes());
    data.extend_from_slice(&InternalPointerRecord::new(RecordClass::Mdr, InstrumentGroup::Avhrr3, 2, 630).to_bytes());
    data.extend_from_slice(&InternalPointerRecord::new(RecordClass::Mdr, InstrumentGroup::Avhrr3, 2, 999).to_bytes());
    let mut cursor = Cursor::new(data);

    let pointers = InternalPointerRecord::read_all(&mut cursor)?;
    assert_eq!(pointers.len(), 2);
    assert_eq!(pointers[0].target_record_class, RecordClass::Giadr);
    assert_eq!(pointers[0].target_record_subclass, 1);
    assert_eq!(pointers[0].target_record_offset, 500);
    assert_eq!(pointers[1].target_record_class, RecordClass::Mdr);
    assert_eq!(pointers[1].target_record_offset, 630);
    assert_eq!(cursor.stream_position()?, 2 * InternalPointerRecord::SIZE as u64);
    Ok(())
}

#[test]
fn pointer_sequence_without_mdr_pointer_fails() {
    let mut data = Vec::new();
    data.extend_from_slice(&InternalPointerRecord::new(RecordClass::Geadr, InstrumentGroup::Avhrr3, 3, 400).to_bytes());
    data.extend_from_slice(&InternalPointerRecord::new(RecordClass::Giadr, InstrumentGroup::Avhrr3, 1, 500).to_bytes());
    let result = InternalPointerRecord::read_all(&mut Cursor::new(data));
    assert!(matches!(result, Err(MetopError::NoMdrPointerFound { pointers_read: 2 })));

    let empty = InternalPointerRecord::read_all(&mut Cursor::new(Vec::new()));
    assert!(matches!(empty, Err(MetopError::NoMdrPointerFound { pointers_read: 0 })));
}

#[test]
fn pointer_record_requires_ipr_class() {
    let mut bytes = InternalPointerRecord::new(RecordClass::Mdr, InstrumentGroup::Avhrr3, 2, 630).to_bytes();
    bytes[0] = RecordClass::Geadr.to_u8();
    assert!(matches!(
        InternalPointerRecord::from_bytes(&bytes),
        Err(MetopError::BadPointerRecord(RecordClass::Geadr))
    ));
}

fn giadr_from(counts: &RadianceConversionCounts) -> Result<GiadrRadiance, MetopError> {
    let header = GenericRecordHeader::new(RecordClass::Giadr, InstrumentGroup::Avhrr3, 1, GiadrRadiance::SIZE as u32);
    let mut bytes = header.to_bytes().to_vec();
    bytes.extend_from_slice(&counts.to_bytes());
    GiadrRadiance::read(&mut Cursor::new(bytes))
}

#[test]
fn giadr_ir_temperature_coefficients_are_scaled() -> Result<(), MetopError> {
    let counts = common::radiance_counts();
    let giadr = giadr_from(&counts)?;
    let scales = [1e-2, 1e-5, 1e-8, 1e-11, 1e-14, 1e-17];
    for prt in 0..4 {
        for k in 0..6 {
            let expected = counts.ir_temperature_coefficients[prt][k] as f64 * scales[k];
            assert_eq!(giadr.ir_temperature_coefficients[prt][k], expected, "set {} coefficient {}", prt, k + 1);
        }
    }
    Ok(())
}

#[test]
fn giadr_solar_fields_are_scaled() -> Result<(), MetopError> {
    let counts = common::radiance_counts();
    let giadr = giadr_from(&counts)?;
    for (i, channel) in [Channel::Ch1, Channel::Ch2, Channel::Ch3a].into_iter().enumerate() {
        assert_eq!(giadr.solar_irradiance(channel)?, counts.solar_filtered_irradiance[i] as f32 * 1e-1f32);
        assert_eq!(giadr.equivalent_width(channel)?, counts.equivalent_filter_width[i] as f32 * 1e-3f32);
    }
    assert!((giadr.solar_irradiance(Channel::Ch1)? - 139.9).abs() < 1e-4);
    assert!((giadr.equivalent_width(Channel::Ch2)? - 0.229).abs() < 1e-6);
    Ok(())
}

#[test]
fn giadr_thermal_fields_are_scaled() -> Result<(), MetopError> {
    let counts = common::radiance_counts();
    let giadr = giadr_from(&counts)?;
    assert_eq!(giadr.central_wavenumber(Channel::Ch3b)?, counts.central_wavenumber[0] as f32 * 1e-2f32);
    assert_eq!(giadr.central_wavenumber(Channel::Ch4)?, counts.central_wavenumber[1] as f32 * 1e-3f32);
    assert_eq!(giadr.central_wavenumber(Channel::Ch5)?, counts.central_wavenumber[2] as f32 * 1e-3f32);
    for (i, channel) in [Channel::Ch3b, Channel::Ch4, Channel::Ch5].into_iter().enumerate() {
        assert_eq!(giadr.constant1(channel)?, counts.constant1[i] as f32 * 1e-5f32);
        assert_eq!(giadr.constant2_slope(channel)?, counts.constant2_slope[i] as f32 * 1e-6f32);
    }
    assert!((giadr.central_wavenumber(Channel::Ch3b)? - 2685.0).abs() < 1e-2);
    assert!((giadr.central_wavenumber(Channel::Ch4)? - 928.0).abs() < 1e-3);
    Ok(())
}

#[test]
fn giadr_header_fields_are_kept_raw() -> Result<(), MetopError> {
    let counts = common::radiance_counts();
    let giadr = giadr_from(&counts)?;
    assert_eq!(giadr.ramp_calibration_coefficient, 3);
    assert_eq!(giadr.year_recent_calibration, 2009);
    assert_eq!(giadr.day_recent_calibration, 312);
    assert_eq!(giadr.primary_calibration_algorithm_id, 1);
    assert_eq!(giadr.secondary_calibration_algorithm_id, 2);
    assert_eq!(giadr.secondary_calibration_algorithm_option, -1);
    assert_eq!(RadianceConversionCounts::from_bytes(&counts.to_bytes())?, counts);
    Ok(())
}

#[test]
fn giadr_rejects_wrong_channel_type() -> Result<(), MetopError> {
    let giadr = giadr_from(&common::radiance_counts())?;
    assert!(matches!(
        giadr.solar_irradiance(Channel::Ch4),
        Err(MetopError::ChannelNotSupported { mode: "reflectance", .. })
    ));
    assert!(matches!(
        giadr.central_wavenumber(Channel::Ch1),
        Err(MetopError::ChannelNotSupported { mode: "temperature", .. })
    ));
    Ok(())
}

#[test]
fn internal_target_temperature_evaluates_polynomial() -> Result<(), MetopError> {
    let giadr = giadr_from(&common::radiance_counts())?;
    let c = giadr.ir_temperature_coefficients[1];
    let x = 400.0f64;
    let expected = c[0] + c[1] * x + c[2] * x.powi(2) + c[3] * x.powi(3) + c[4] * x.powi(4) + c[5] * x.powi(5);
    let actual = giadr.internal_target_temperature(1, x).unwrap();
    assert!((actual - expected).abs() < 1e-9);
    assert!(giadr.internal_target_temperature(4, x).is_none());
    Ok(())
}

#[test]
fn geadr_text_is_padded_and_trimmed() -> Result<(), MetopError> {
    let record = GeadrRecord::new(3, "AVHR_xxx_AUX_BRIGHT");
    let bytes = record.to_bytes();
    assert_eq!(bytes.len(), GeadrRecord::SIZE);
    assert_eq!(bytes[GeadrRecord::SIZE - 1], b' ');

    let decoded = GeadrRecord::read(&mut Cursor::new(bytes))?;
    assert_eq!(decoded.header.record_class, RecordClass::Geadr);
    assert_eq!(decoded.header.record_subclass, 3);
    assert_eq!(decoded.text, "AVHR_xxx_AUX_BRIGHT");
    Ok(())
}

#[test]
fn geadr_text_must_be_ascii() {
    let mut bytes = GeadrRecord::new(4, "AVHR_xxx_AUX_PRT").to_bytes();
    bytes[20 + 5] = 0xc3;
    match GeadrRecord::from_bytes(&bytes) {
        Err(e @ MetopError::NonAsciiText { record_class: RecordClass::Geadr, position: 5 }) => {
            assert_eq!(e.kind(), ErrorKind::Structural)
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn mdr_layout_shifts_low_precision_offsets() {
    let high = MdrLayout::new(NavPrecision::High);
    let low = MdrLayout::new(NavPrecision::Low);
    assert_eq!(high.record_size(), 26660);
    assert_eq!(low.record_size(), 25828);
    assert_eq!(high.radiance_offset(Channel::Ch4), low.radiance_offset(Channel::Ch4));
    assert_eq!(high.radiance_offset(Channel::Ch3a), high.radiance_offset(Channel::Ch3b));
    assert_eq!(high.tie_point_offset(), low.tie_point_offset());
    assert_eq!(high.flag_offset(), 22204);
    assert_eq!(low.flag_offset(), 22204 - 832);
    assert_eq!(high.cloud_information_offset(), 22484);
    assert_eq!(high.channel3_byte_offset(), 26581);
    assert_eq!(low.channel3_byte_offset(), 26581 - 832);
    assert_eq!(high.tie_point_len(), 103 * 16);
    assert_eq!(low.tie_point_len(), 51 * 16);
}

#[test]
fn mdr_channel3_bit_lands_in_frame_indicator_byte() -> Result<(), MetopError> {
    let mut mdr = MdrRecord::new(NavPrecision::Low, EpsTime::new(1, 0), EpsTime::new(1, 167));
    mdr.set_channel3a(true);
    mdr.radiances_mut(Channel::Ch4)[7] = -1234;
    mdr.quality_indicator = 0x8000_0001;
    let bytes = mdr.to_bytes(NavPrecision::Low);
    let layout = MdrLayout::new(NavPrecision::Low);
    assert_eq!(bytes.len(), 25828);
    assert_eq!(bytes[layout.channel3_byte_offset()] & 1, 1);

    let decoded = MdrRecord::from_bytes(&bytes, NavPrecision::Low)?;
    assert_eq!(decoded.radiances(Channel::Ch4)[7], -1234);
    assert_eq!(decoded.quality_indicator, 0x8000_0001);
    assert_eq!(decoded, mdr);

    mdr.set_channel3a(false);
    assert_eq!(mdr.to_bytes(NavPrecision::Low)[layout.channel3_byte_offset()] & 1, 0);
    Ok(())
}
