pub mod records;
pub mod error;
pub mod channel;
pub mod config;
pub mod calibration;
pub mod metadata;
pub mod writer;

pub mod parsing {
    pub mod stream;
    pub mod metop_file;
}

pub mod api {
    pub mod band;
    pub mod tie_points;
}
