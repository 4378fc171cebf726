use metop_avhrr::api::tie_points::{ANGLE_SCALE, LAT_LON_SCALE, TIE_POINT_NAMES};
use metop_avhrr::error::MetopError;
use metop_avhrr::records::mdr::{MdrRecord, NavPrecision};
use metop_avhrr::writer::ProductBuilder;

mod common;
use common::{open, PRODUCT_NAME};

fn fill_geometry(y: usize, mdr: &mut MdrRecord) {
    mdr.set_channel3a(true);
    for (i, point) in mdr.angular_relations.chunks_exact_mut(4).enumerate() {
        for (k, angle) in point.iter_mut().enumerate() {
            *angle = (y * 1000 + i * 10 + k) as i16;
        }
    }
    for (i, point) in mdr.earth_locations.chunks_exact_mut(2).enumerate() {
        point[0] = (y * 100_000 + i * 100) as i32;
        point[1] = -((i * 1000) as i32);
    }
}

#[test]
fn tie_points_follow_nav_density() -> Result<(), MetopError> {
    for (precision, n, offset_x) in [(NavPrecision::Low, 51, 24), (NavPrecision::High, 103, 4)] {
        let bytes = ProductBuilder::new(PRODUCT_NAME, precision)
            .scan_lines(3, fill_geometry)
            .build()?;
        let file = open(bytes)?;
        let data = file.tie_point_data()?;

        assert_eq!(data.num_nav_points, n);
        assert_eq!(data.height, 3);
        assert_eq!(data.offset_x, offset_x);
        assert_eq!(data.subsampling, precision.sample_rate());
        for grid in data.grids() {
            assert_eq!(grid.len(), 3 * n);
        }

        let last = n - 1;
        assert_eq!(data.sun_zenith[2 * n + last], (2000 + last * 10) as f32 * ANGLE_SCALE);
        assert_eq!(data.view_zenith[n + 1], (1000 + 10 + 1) as f32 * ANGLE_SCALE);
        assert_eq!(data.sun_azimuth[0], 2.0 * ANGLE_SCALE);
        assert_eq!(data.view_azimuth[last], (last * 10 + 3) as f32 * ANGLE_SCALE);
        assert_eq!(data.latitude[n + 5], (100_000 + 500) as f32 * LAT_LON_SCALE);
        assert_eq!(data.longitude[2 * n + 7], -7000.0 * LAT_LON_SCALE);
    }
    Ok(())
}

#[test]
fn tie_point_grids_are_addressable_by_name() -> Result<(), MetopError> {
    let bytes = ProductBuilder::new(PRODUCT_NAME, NavPrecision::Low)
        .scan_lines(2, fill_geometry)
        .build()?;
    let data = open(bytes)?.tie_point_data()?;

    assert_eq!(TIE_POINT_NAMES[4], "latitude");
    assert_eq!(data.grid("latitude"), Some(&data.latitude[..]));
    assert!(data.grid("altitude").is_none());
    assert_eq!(data.value("longitude", 3, 1), Some(-3000.0 * LAT_LON_SCALE));
    assert_eq!(data.value("sun_zenith", 51, 0), None);
    assert_eq!(data.value("sun_zenith", 0, 2), None);
    Ok(())
}
