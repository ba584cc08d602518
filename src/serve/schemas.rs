//! Request and response schemas for the HTTP facade
//!
//! Bounds checking lives here so invalid readings and oversized batches are
//! rejected before they ever reach the pipeline.

use crate::data::types::SoilSample;
use crate::models::trainer::Prediction;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Largest accepted batch
pub const MAX_BATCH_SIZE: usize = 100;

/// Request validation failures
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Batch must contain between 1 and 100 predictions, got {0}")]
    BatchSize(usize),
}

fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    // NaN fails the comparison and is rejected with the same error
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// One prediction request.
///
/// Example: `{"N": 90, "P": 42, "K": 43, "temperature": 20.87,
/// "humidity": 82.0, "ph": 6.5, "rainfall": 202.9}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Nitrogen content in soil (0-200)
    #[serde(rename = "N")]
    pub nitrogen: f64,
    /// Phosphorus content in soil (0-200)
    #[serde(rename = "P")]
    pub phosphorus: f64,
    /// Potassium content in soil (0-250)
    #[serde(rename = "K")]
    pub potassium: f64,
    /// Temperature in Celsius (0-50)
    pub temperature: f64,
    /// Relative humidity percentage (0-100)
    pub humidity: f64,
    /// pH value of soil (0-14)
    pub ph: f64,
    /// Rainfall in mm (0-400)
    pub rainfall: f64,
}

impl PredictRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_range("N", self.nitrogen, 0.0, 200.0)?;
        check_range("P", self.phosphorus, 0.0, 200.0)?;
        check_range("K", self.potassium, 0.0, 250.0)?;
        check_range("temperature", self.temperature, 0.0, 50.0)?;
        check_range("humidity", self.humidity, 0.0, 100.0)?;
        check_range("ph", self.ph, 0.0, 14.0)?;
        check_range("rainfall", self.rainfall, 0.0, 400.0)?;
        Ok(())
    }

    pub fn to_sample(&self) -> SoilSample {
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

/// A batch of 1-100 prediction requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictRequest {
    pub predictions: Vec<PredictRequest>,
}

impl BatchPredictRequest {
    /// Size check first: an oversized batch never reaches per-item
    /// validation, let alone the pipeline.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.predictions.is_empty() || self.predictions.len() > MAX_BATCH_SIZE {
            return Err(ValidationError::BatchSize(self.predictions.len()));
        }
        for request in &self.predictions {
            request.validate()?;
        }
        Ok(())
    }
}

/// One prediction result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predicted_crop: String,
    pub confidence: f64,
    pub all_probabilities: BTreeMap<String, f64>,
}

impl From<Prediction> for PredictResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            predicted_crop: prediction.crop,
            confidence: prediction.confidence,
            all_probabilities: prediction.probabilities,
        }
    }
}

/// One item of a batch response; failed items carry their error in place so
/// the rest of the batch still comes back.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BatchItem {
    Success(PredictResponse),
    Failure { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchPredictResponse {
    pub predictions: Vec<BatchItem>,
    pub total_predictions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub model_loaded: bool,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelInfoResponse {
    pub model_name: String,
    pub model_version: String,
    pub features: Vec<String>,
    pub supported_crops: Vec<String>,
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureImportanceResponse {
    pub feature_importance: Vec<FeatureImportance>,
}
