use serde::{Deserialize, Serialize};

use crate::error::MetopError;

/// Reader settings that change calibrated output or product acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Earth-sun distance in AU used by reflectance calibration.
    ///
    /// Products carry no usable value for this, so it defaults to 1.0.
    /// Reflectances are therefore not corrected for the seasonal
    /// earth-sun distance.
    pub earth_sun_distance_ratio: f32,
    /// Refuse channel 3A/3B band readers when the channel-3 state is ambiguous.
    pub reject_ambiguous_channel3: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        ReaderConfig {
            earth_sun_distance_ratio: 1.0,
            reject_ambiguous_channel3: false,
        }
    }
}

impl ReaderConfig {
    /// Save the configuration to a JSON file
    pub fn save_to_file(&self, path: &str) -> Result<(), MetopError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| MetopError::Serialization(format!("JSON serialization failed: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a configuration from a JSON file; absent fields take their defaults.
    pub fn load_from_file(path: &str) -> Result<Self, MetopError> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| MetopError::Serialization(format!("JSON deserialization failed: {}", e)))
    }
}
