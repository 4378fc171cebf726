use std::f64::consts::PI;

/// Converts visible/near-IR radiance to reflectance factor in percent:
/// `100 * PI * L * w * d^2 / F`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReflectanceCalibrator {
    conversion_factor: f64,
}

impl ReflectanceCalibrator {
    /// `equivalent_width` is the channel's equivalent filter width,
    /// `solar_irradiance` its solar filtered irradiance, and
    /// `earth_sun_distance_ratio` the earth-sun distance in AU.
    pub fn new(equivalent_width: f32, solar_irradiance: f32, earth_sun_distance_ratio: f32) -> Self {
        let d = earth_sun_distance_ratio as f64;
        let conversion_factor = if solar_irradiance == 0.0 {
            f64::NAN
        } else {
            PI * 100.0 * equivalent_width as f64 * d * d / solar_irradiance as f64
        };
        ReflectanceCalibrator { conversion_factor }
    }

    pub fn calibrate(&self, radiance: f32) -> f32 {
        (radiance as f64 * self.conversion_factor) as f32
    }
}
