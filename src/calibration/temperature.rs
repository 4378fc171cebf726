/// First radiation constant, mW/(m^2 sr cm^-4).
pub const C1: f64 = 1.1910427e-5;
/// Second radiation constant, K cm.
pub const C2: f64 = 1.4387752;

/// Converts thermal IR radiance to brightness temperature by inverting
/// Planck's law at the channel's central wavenumber, then applying the
/// band correction `T = (T* - A) / B`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureCalibrator {
    c1_nu3: f64,
    c2_nu: f64,
    constant1: f64,
    constant2_slope: f64,
}

impl TemperatureCalibrator {
    pub fn new(constant1: f32, constant2_slope: f32, central_wavenumber: f32) -> Self {
        let nu = central_wavenumber as f64;
        TemperatureCalibrator {
            c1_nu3: C1 * nu * nu * nu,
            c2_nu: C2 * nu,
            constant1: constant1 as f64,
            constant2_slope: constant2_slope as f64,
        }
    }

    /// Brightness temperature in K; NaN for non-positive radiance.
    pub fn calibrate(&self, radiance: f32) -> f32 {
        if radiance <= 0.0 || self.constant2_slope == 0.0 {
            return f32::NAN;
        }
        let t_star = self.c2_nu / (1.0 + self.c1_nu3 / radiance as f64).ln();
        ((t_star - self.constant1) / self.constant2_slope) as f32
    }

    /// Radiance in mW/(m^2 sr cm^-1) for brightness temperature `t`.
    pub fn radiance(&self, t: f32) -> f32 {
        let t_star = self.constant1 + self.constant2_slope * t as f64;
        (self.c1_nu3 / ((self.c2_nu / t_star).exp() - 1.0)) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radiance_inverts_calibrate() {
        let calibrator = TemperatureCalibrator::new(0.45, 0.9991, 928.0);
        for t in [220.0f32, 260.0, 300.0] {
            let back = calibrator.calibrate(calibrator.radiance(t));
            assert!((back - t).abs() < 1e-3, "{} -> {}", t, back);
        }
    }

    #[test]
    fn non_positive_radiance_is_nan() {
        let calibrator = TemperatureCalibrator::new(1.84, 0.998, 2685.0);
        assert!(calibrator.calibrate(0.0).is_nan());
        assert!(calibrator.calibrate(-1.5).is_nan());
    }
}
