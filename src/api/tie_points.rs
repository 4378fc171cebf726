use byteorder::{BigEndian, ByteOrder};
use serde::{Deserialize, Serialize};

use crate::error::MetopError;
use crate::parsing::metop_file::MetopFile;

/// Scale of the angular relations, degrees per count.
pub const ANGLE_SCALE: f32 = 1e-2;
/// Scale of latitude and longitude, degrees per count.
pub const LAT_LON_SCALE: f32 = 1e-4;

/// Tie-point grid names, in the order of [`TiePointData::grids`].
pub const TIE_POINT_NAMES: [&str; 6] = [
    "sun_zenith",
    "view_zenith",
    "sun_azimuth",
    "view_azimuth",
    "latitude",
    "longitude",
];

/// All tie-point grids of a product, in degrees.
///
/// Each grid is row-major with `num_nav_points` columns and
/// `product_height` rows. Column `i` sits at pixel
/// `offset_x + i * subsampling`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TiePointData {
    pub num_nav_points: usize,
    pub height: usize,
    pub subsampling: usize,
    pub offset_x: usize,
    pub sun_zenith: Vec<f32>,
    pub view_zenith: Vec<f32>,
    pub sun_azimuth: Vec<f32>,
    pub view_azimuth: Vec<f32>,
    pub latitude: Vec<f32>,
    pub longitude: Vec<f32>,
}

impl TiePointData {
    /// The six grids in [`TIE_POINT_NAMES`] order.
    pub fn grids(&self) -> [&[f32]; 6] {
        [
            &self.sun_zenith,
            &self.view_zenith,
            &self.sun_azimuth,
            &self.view_azimuth,
            &self.latitude,
            &self.longitude,
        ]
    }

    pub fn grid(&self, name: &str) -> Option<&[f32]> {
        let index = TIE_POINT_NAMES.iter().position(|n| *n == name)?;
        Some(self.grids()[index])
    }

    /// Value of grid `name` at tie-point column `x` of `scan_line`.
    pub fn value(&self, name: &str, x: usize, scan_line: usize) -> Option<f32> {
        if x >= self.num_nav_points || scan_line >= self.height {
            return None;
        }
        self.grid(name).map(|g| g[scan_line * self.num_nav_points + x])
    }
}

impl MetopFile {
    /// Decode the tie points of every scan line.
    pub fn tie_point_data(&self) -> Result<TiePointData, MetopError> {
        let n = self.num_nav_points();
        let height = self.product_height();
        let total = n * height;
        let mut data = TiePointData {
            num_nav_points: n,
            height,
            subsampling: self.tie_point_subsampling(),
            offset_x: self.tie_point_offset_x(),
            sun_zenith: Vec::with_capacity(total),
            view_zenith: Vec::with_capacity(total),
            sun_azimuth: Vec::with_capacity(total),
            view_azimuth: Vec::with_capacity(total),
            latitude: Vec::with_capacity(total),
            longitude: Vec::with_capacity(total),
        };

        let mut angles = vec![0i16; 4 * n];
        let mut lat_lon = vec![0i32; 2 * n];
        for scan_line in 0..height {
            let offset = self.scan_line_offset(scan_line) + self.layout().tie_point_offset() as u64;
            let bytes = self.stream().read_range(offset, self.layout().tie_point_len())?;
            BigEndian::read_i16_into(&bytes[..8 * n], &mut angles);
            BigEndian::read_i32_into(&bytes[8 * n..], &mut lat_lon);

            for point in angles.chunks_exact(4) {
                data.sun_zenith.push(point[0] as f32 * ANGLE_SCALE);
                data.view_zenith.push(point[1] as f32 * ANGLE_SCALE);
                data.sun_azimuth.push(point[2] as f32 * ANGLE_SCALE);
                data.view_azimuth.push(point[3] as f32 * ANGLE_SCALE);
            }
            for point in lat_lon.chunks_exact(2) {
                data.latitude.push(point[0] as f32 * LAT_LON_SCALE);
                data.longitude.push(point[1] as f32 * LAT_LON_SCALE);
            }
        }
        Ok(data)
    }
}
