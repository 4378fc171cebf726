//! Product metadata export
//!
//! Flattens the decoded header records of a [`MetopFile`] into a tree of
//! named elements and attributes that can be serialized to JSON and handed
//! to downstream consumers without re-reading the product.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::{Channel, Channel3State};
use crate::error::MetopError;
use crate::parsing::metop_file::MetopFile;
use crate::records::ascii_header::AsciiHeaderRecord;
use crate::records::giadr_radiance::GiadrRadiance;

/// One named value with an optional physical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataAttribute {
    pub name: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub unit: Option<String>,
}

impl MetadataAttribute {
    pub fn new(name: impl Into<String>, value: impl ToString) -> Self {
        MetadataAttribute {
            name: name.into(),
            value: value.to_string(),
            unit: None,
        }
    }

    pub fn with_unit(name: impl Into<String>, value: impl ToString, unit: &str) -> Self {
        MetadataAttribute {
            name: name.into(),
            value: value.to_string(),
            unit: Some(unit.to_string()),
        }
    }
}

/// A named group of attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataElement {
    pub name: String,
    pub attributes: Vec<MetadataAttribute>,
}

impl MetadataElement {
    pub fn new(name: impl Into<String>) -> Self {
        MetadataElement {
            name: name.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&MetadataAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    fn from_ascii_header(name: &str, record: &AsciiHeaderRecord) -> Self {
        MetadataElement {
            name: name.to_string(),
            attributes: record
                .entries()
                .iter()
                .map(|e| MetadataAttribute::new(e.key.clone(), &e.value))
                .collect(),
        }
    }

    fn from_giadr(giadr: &GiadrRadiance) -> Self {
        let mut element = MetadataElement::new("RADIANCE_CONVERSION");
        let attrs = &mut element.attributes;
        attrs.push(MetadataAttribute::new("RAMP_CALIBRATION_COEFFICIENT", giadr.ramp_calibration_coefficient));
        attrs.push(MetadataAttribute::with_unit("YEAR_RECENT_CALIBRATION", giadr.year_recent_calibration, "years"));
        attrs.push(MetadataAttribute::with_unit("DAY_RECENT_CALIBRATION", giadr.day_recent_calibration, "days"));
        attrs.push(MetadataAttribute::new("PRIMARY_CALIBRATION_ALGORITHM_ID", giadr.primary_calibration_algorithm_id));
        attrs.push(MetadataAttribute::new(
            "PRIMARY_CALIBRATION_ALGORITHM_OPTION",
            giadr.primary_calibration_algorithm_option,
        ));
        attrs.push(MetadataAttribute::new(
            "SECONDARY_CALIBRATION_ALGORITHM_ID",
            giadr.secondary_calibration_algorithm_id,
        ));
        attrs.push(MetadataAttribute::new(
            "SECONDARY_CALIBRATION_ALGORITHM_OPTION",
            giadr.secondary_calibration_algorithm_option,
        ));

        const COEFFICIENT_UNITS: [&str; 6] = ["K", "K/cnt", "K/cnt^2", "K/cnt^3", "K/cnt^4", "K/cnt^5"];
        for (prt, set) in giadr.ir_temperature_coefficients.iter().enumerate() {
            for (k, coefficient) in set.iter().enumerate() {
                attrs.push(MetadataAttribute::with_unit(
                    format!("IR_TEMPERATURE{}_COEFFICIENT{}", prt + 1, k + 1),
                    *coefficient as f32,
                    COEFFICIENT_UNITS[k],
                ));
            }
        }

        for channel in Channel::ALL {
            let prefix = format!("CH{}_", channel.name().to_uppercase());
            if let Some(i) = channel.solar_index() {
                attrs.push(MetadataAttribute::with_unit(
                    format!("{}SOLAR_FILTERED_IRRADIANCE", prefix),
                    giadr.solar_filtered_irradiance[i],
                    "W/m^2",
                ));
                attrs.push(MetadataAttribute::with_unit(
                    format!("{}EQUIVALENT_FILTER_WIDTH", prefix),
                    giadr.equivalent_filter_width[i],
                    "µm",
                ));
            }
        }
        for channel in Channel::ALL {
            let prefix = format!("CH{}_", channel.name().to_uppercase());
            if let Some(i) = channel.thermal_index() {
                attrs.push(MetadataAttribute::with_unit(
                    format!("{}CENTRAL_WAVE_NUMBER", prefix),
                    giadr.central_wavenumbers[i],
                    "cm^-1",
                ));
                attrs.push(MetadataAttribute::with_unit(
                    format!("{}CONSTANT1", prefix),
                    giadr.radiance_constant1[i],
                    "K",
                ));
                attrs.push(MetadataAttribute::with_unit(
                    format!("{}CONSTANT2_SLOPE", prefix),
                    giadr.radiance_constant2_slope[i],
                    "K/K",
                ));
            }
        }
        element
    }
}

/// Header records and derived values of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub product_name: String,
    pub product_width: usize,
    pub product_height: usize,
    pub num_nav_points: usize,
    pub nav_sample_rate: usize,
    pub tie_point_offset_x: usize,
    pub channel_3ab_state: Channel3State,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// MAIN_PRODUCT_HEADER, SECONDARY_PRODUCT_HEADER, then GEADR and
    /// RADIANCE_CONVERSION when the product carries them.
    pub elements: Vec<MetadataElement>,
}

impl ProductMetadata {
    pub fn from_file(file: &MetopFile) -> Result<Self, MetopError> {
        let mut elements = vec![
            MetadataElement::from_ascii_header("MAIN_PRODUCT_HEADER", file.main_header()),
            MetadataElement::from_ascii_header("SECONDARY_PRODUCT_HEADER", file.secondary_header()),
        ];
        if let Some(geadr) = file.geadr_entries() {
            let mut element = MetadataElement::new("GEADR");
            element.attributes = geadr
                .iter()
                .map(|(subclass, text)| MetadataAttribute::new(subclass.to_string(), text))
                .collect();
            elements.push(element);
        }
        if let Some(giadr) = file.giadr_radiance() {
            elements.push(MetadataElement::from_giadr(giadr));
        }

        Ok(ProductMetadata {
            product_name: file.product_name()?.to_string(),
            product_width: file.product_width(),
            product_height: file.product_height(),
            num_nav_points: file.num_nav_points(),
            nav_sample_rate: file.nav_sample_rate(),
            tie_point_offset_x: file.tie_point_offset_x(),
            channel_3ab_state: file.channel_3ab_state(),
            start_time: file.start_date(),
            end_time: file.end_date(),
            elements,
        })
    }

    pub fn element(&self, name: &str) -> Option<&MetadataElement> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Save the metadata to a JSON file
    pub fn save_to_file(&self, path: &str) -> Result<(), MetopError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| MetopError::Serialization(format!("JSON serialization failed: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load metadata from a JSON file
    pub fn load_from_file(path: &str) -> Result<Self, MetopError> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json)
            .map_err(|e| MetopError::Serialization(format!("JSON deserialization failed: {}", e)))
    }
}
