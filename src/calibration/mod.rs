pub mod reflectance;
pub mod temperature;

pub use reflectance::ReflectanceCalibrator;
pub use temperature::TemperatureCalibrator;

use crate::channel::Channel;
use crate::error::MetopError;
use crate::records::giadr_radiance::GiadrRadiance;

/// How raw scene radiances are turned into output samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationMode {
    Radiance,
    Reflectance,
    Temperature,
}

impl CalibrationMode {
    pub fn name(self) -> &'static str {
        match self {
            CalibrationMode::Radiance => "radiance",
            CalibrationMode::Reflectance => "reflectance",
            CalibrationMode::Temperature => "temperature",
        }
    }
}

/// A ready-to-apply calibration for one channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Calibrator {
    Radiance,
    Reflectance(ReflectanceCalibrator),
    Temperature(TemperatureCalibrator),
}

impl Calibrator {
    /// Build the calibrator for `channel` in `mode` from the GIADR coefficients.
    pub fn for_channel(
        mode: CalibrationMode,
        channel: Channel,
        giadr: Option<&GiadrRadiance>,
        earth_sun_distance_ratio: f32,
    ) -> Result<Self, MetopError> {
        match mode {
            CalibrationMode::Radiance => Ok(Calibrator::Radiance),
            CalibrationMode::Reflectance => {
                let giadr = giadr.ok_or(MetopError::MissingRadianceCalibration)?;
                Ok(Calibrator::Reflectance(ReflectanceCalibrator::new(
                    giadr.equivalent_width(channel)?,
                    giadr.solar_irradiance(channel)?,
                    earth_sun_distance_ratio,
                )))
            }
            CalibrationMode::Temperature => {
                let giadr = giadr.ok_or(MetopError::MissingRadianceCalibration)?;
                Ok(Calibrator::Temperature(TemperatureCalibrator::new(
                    giadr.constant1(channel)?,
                    giadr.constant2_slope(channel)?,
                    giadr.central_wavenumber(channel)?,
                )))
            }
        }
    }

    pub fn mode(&self) -> CalibrationMode {
        match self {
            Calibrator::Radiance => CalibrationMode::Radiance,
            Calibrator::Reflectance(_) => CalibrationMode::Reflectance,
            Calibrator::Temperature(_) => CalibrationMode::Temperature,
        }
    }

    pub fn calibrate(&self, radiance: f32) -> f32 {
        match self {
            Calibrator::Radiance => radiance,
            Calibrator::Reflectance(c) => c.calibrate(radiance),
            Calibrator::Temperature(c) => c.calibrate(radiance),
        }
    }

    pub fn unit(&self, channel: Channel) -> &'static str {
        match self {
            Calibrator::Radiance => channel.radiance_unit(),
            Calibrator::Reflectance(_) => "%",
            Calibrator::Temperature(_) => "K",
        }
    }
}
