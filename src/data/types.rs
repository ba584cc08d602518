//! Data types for soil and climate readings
//!
//! This module defines the core data structures used throughout the project.

use serde::{Deserialize, Serialize};

/// Column names of the raw readings, in the order the pipeline consumes them.
pub const RAW_COLUMNS: [&str; 7] = [
    "N",
    "P",
    "K",
    "temperature",
    "humidity",
    "ph",
    "rainfall",
];

/// Column holding the crop name in training data.
pub const LABEL_COLUMN: &str = "label";

/// A single set of soil and climate readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SoilSample {
    /// Nitrogen content in soil
    #[serde(rename = "N")]
    pub nitrogen: f64,
    /// Phosphorus content in soil
    #[serde(rename = "P")]
    pub phosphorus: f64,
    /// Potassium content in soil
    #[serde(rename = "K")]
    pub potassium: f64,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Soil pH value
    pub ph: f64,
    /// Rainfall in mm
    pub rainfall: f64,
}

impl SoilSample {
    /// Raw readings in [`RAW_COLUMNS`] order.
    pub fn values(&self) -> [f64; 7] {
        [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }
}

/// A training row: readings plus the crop that was grown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledSample {
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "P")]
    pub phosphorus: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
    /// Crop name, e.g. "rice"
    pub label: String,
}

impl LabeledSample {
    /// The readings without the label.
    pub fn sample(&self) -> SoilSample {
        SoilSample {
            nitrogen: self.nitrogen,
            phosphorus: self.phosphorus,
            potassium: self.potassium,
            temperature: self.temperature,
            humidity: self.humidity,
            ph: self.ph,
            rainfall: self.rainfall,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_order_matches_columns() {
        let sample = SoilSample {
            nitrogen: 90.0,
            phosphorus: 42.0,
            potassium: 43.0,
            temperature: 20.8,
            humidity: 82.0,
            ph: 6.5,
            rainfall: 202.9,
        };

        let values = sample.values();
        assert_eq!(values.len(), RAW_COLUMNS.len());
        assert_eq!(values[0], 90.0);
        assert_eq!(values[6], 202.9);
    }

    #[test]
    fn test_labeled_sample_strips_label() {
        let row = LabeledSample {
            nitrogen: 1.0,
            phosphorus: 2.0,
            potassium: 3.0,
            temperature: 4.0,
            humidity: 5.0,
            ph: 6.0,
            rainfall: 7.0,
            label: "rice".to_string(),
        };

        let sample = row.sample();
        assert_eq!(sample.values(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }
}
