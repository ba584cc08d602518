//! Data processing pipeline: feature engineering, encoding, scaling, splitting

use super::encoder::LabelEncoder;
use super::scaler::StandardScaler;
use crate::data::types::{LabeledSample, SoilSample};
use crate::features::engineering::FeatureEngineer;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Version tag written into the persisted processor state. Bumped whenever
/// the feature derivation or column order changes incompatibly.
pub const PROCESSOR_SCHEMA_VERSION: u32 = 1;

/// Errors from the processing pipeline
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("At least two samples are required to split, got {0}")]
    TooFewSamples(usize),

    #[error("Test fraction must be in (0, 1), got {0}")]
    InvalidTestSize(f64),

    #[error("{0} has not been fitted or loaded")]
    NotFitted(&'static str),

    #[error("Unknown crop name: {0}")]
    UnknownCrop(String),

    #[error("Expected {expected} feature values, found {found}")]
    FeatureCount { expected: usize, found: usize },

    #[error("Processor persistence failed: {0}")]
    Persistence(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Scaled feature matrices and encoded labels for one training run.
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub x_train: Vec<Vec<f64>>,
    pub x_test: Vec<Vec<f64>>,
    pub y_train: Vec<usize>,
    pub y_test: Vec<usize>,
}

/// Serialized form of the fitted processors, persisted as one unit.
#[derive(Debug, Serialize, Deserialize)]
struct ProcessorState {
    schema_version: u32,
    crops: Vec<String>,
    scaler: StandardScaler,
    feature_columns: Vec<String>,
}

/// Orchestrates feature engineering, label encoding, scaling and splitting.
///
/// The 13-column feature order is fixed at construction and persisted with
/// the fitted state so training-time and serving-time assembly can never
/// drift apart.
#[derive(Debug)]
pub struct DataProcessor {
    engineer: FeatureEngineer,
    encoder: LabelEncoder,
    scaler: StandardScaler,
    feature_columns: Vec<String>,
}

impl Default for DataProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProcessor {
    pub fn new() -> Self {
        Self {
            engineer: FeatureEngineer::new(),
            encoder: LabelEncoder::new(),
            scaler: StandardScaler::new(),
            feature_columns: FeatureEngineer::feature_names(),
        }
    }

    /// Engineer, encode, split and scale training rows.
    ///
    /// The split is a seeded shuffle, reproducible for a fixed seed and
    /// input. The scaler is fitted on the training partition only; the test
    /// partition never influences the fitted state.
    pub fn prepare_training_data(
        &mut self,
        rows: &[LabeledSample],
        test_size: f64,
        seed: u64,
    ) -> Result<PreparedData, ProcessError> {
        if rows.is_empty() {
            return Err(ProcessError::EmptyDataset);
        }
        if rows.len() < 2 {
            return Err(ProcessError::TooFewSamples(rows.len()));
        }
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(ProcessError::InvalidTestSize(test_size));
        }

        info!("Preparing training data for {} rows", rows.len());

        let samples: Vec<SoilSample> = rows.iter().map(|r| r.sample()).collect();
        let features = self.engineer.engineer_all(&samples);

        let labels: Vec<String> = rows.iter().map(|r| r.label.clone()).collect();
        self.encoder.fit(&labels);
        let encoded: Vec<usize> = labels
            .iter()
            .map(|label| self.encoder.encode(label))
            .collect::<Result<_, _>>()?;

        let mut indices: Vec<usize> = (0..rows.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let test_count = ((rows.len() as f64) * test_size).round() as usize;
        let test_count = test_count.clamp(1, rows.len() - 1);
        let (test_idx, train_idx) = indices.split_at(test_count);

        let x_train_raw: Vec<Vec<f64>> = train_idx.iter().map(|&i| features[i].clone()).collect();
        let x_test_raw: Vec<Vec<f64>> = test_idx.iter().map(|&i| features[i].clone()).collect();

        self.scaler.fit(&x_train_raw)?;

        let prepared = PreparedData {
            x_train: self.scaler.transform(&x_train_raw)?,
            x_test: self.scaler.transform(&x_test_raw)?,
            y_train: train_idx.iter().map(|&i| encoded[i]).collect(),
            y_test: test_idx.iter().map(|&i| encoded[i]).collect(),
        };

        info!(
            "Prepared {} training and {} test samples across {} crops",
            prepared.x_train.len(),
            prepared.x_test.len(),
            self.encoder.len()
        );

        Ok(prepared)
    }

    /// Engineer and scale one sample for prediction.
    ///
    /// Fails with [`ProcessError::NotFitted`] before any scaler state has
    /// been fitted or loaded.
    pub fn prepare_prediction_data(&self, sample: &SoilSample) -> Result<Vec<f64>, ProcessError> {
        if !self.scaler.is_fitted() {
            return Err(ProcessError::NotFitted("scaler"));
        }

        let row = self.engineer.engineer(sample);
        self.scaler.transform_row(&row)
    }

    /// Decode a class index to its crop name; out-of-range indices map to the
    /// "unknown" sentinel.
    pub fn decode_prediction(&self, index: usize) -> String {
        self.encoder.decode(index)
    }

    /// Known crop names in class-index order. Empty before fitting/loading.
    pub fn all_crops(&self) -> Vec<String> {
        self.encoder.classes().to_vec()
    }

    pub fn num_crops(&self) -> usize {
        self.encoder.len()
    }

    /// The fixed 13-column feature order.
    pub fn feature_columns(&self) -> &[String] {
        &self.feature_columns
    }

    pub fn is_fitted(&self) -> bool {
        self.encoder.is_fitted() && self.scaler.is_fitted()
    }

    /// How many engineered samples fell outside every rainfall bucket.
    pub fn out_of_range_count(&self) -> u64 {
        self.engineer.out_of_range_count()
    }

    /// Persist the fitted encoder, scaler and column order as one unit.
    pub fn save(&self, path: &Path) -> Result<(), ProcessError> {
        if !self.is_fitted() {
            return Err(ProcessError::NotFitted("processor"));
        }

        let state = ProcessorState {
            schema_version: PROCESSOR_SCHEMA_VERSION,
            crops: self.encoder.classes().to_vec(),
            scaler: self.scaler.clone(),
            feature_columns: self.feature_columns.clone(),
        };

        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &state)?;
        info!("Processors saved to {}", path.display());
        Ok(())
    }

    /// Restore a processor from a persisted state.
    ///
    /// Returns a fully initialized processor or an error; the column order
    /// and schema version are validated against this build before anything
    /// is accepted.
    pub fn load(path: &Path) -> Result<Self, ProcessError> {
        let file = File::open(path).map_err(|e| {
            ProcessError::Persistence(format!("cannot open {}: {e}", path.display()))
        })?;
        let state: ProcessorState = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ProcessError::Persistence(format!("corrupt {}: {e}", path.display())))?;

        if state.schema_version != PROCESSOR_SCHEMA_VERSION {
            return Err(ProcessError::Persistence(format!(
                "unsupported processor schema version {} (expected {})",
                state.schema_version, PROCESSOR_SCHEMA_VERSION
            )));
        }

        let expected = FeatureEngineer::feature_names();
        if state.feature_columns != expected {
            return Err(ProcessError::Persistence(
                "persisted feature columns do not match this build".to_string(),
            ));
        }

        if !state.scaler.is_fitted() || state.crops.is_empty() {
            return Err(ProcessError::Persistence(
                "persisted processor state is not fitted".to_string(),
            ));
        }

        info!("Processors loaded from {}", path.display());

        Ok(Self {
            engineer: FeatureEngineer::new(),
            encoder: LabelEncoder::from_classes(state.crops),
            scaler: state.scaler,
            feature_columns: state.feature_columns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(n: f64, rainfall: f64, label: &str) -> LabeledSample {
        LabeledSample {
            nitrogen: n,
            phosphorus: 40.0,
            potassium: 40.0,
            temperature: 22.0,
            humidity: 80.0,
            ph: 6.5,
            rainfall,
            label: label.to_string(),
        }
    }

    fn training_rows() -> Vec<LabeledSample> {
        let mut rows = Vec::new();
        for i in 0..20 {
            rows.push(labeled(80.0 + i as f64, 180.0 + i as f64, "rice"));
            rows.push(labeled(20.0 + i as f64, 60.0 + i as f64, "maize"));
        }
        rows
    }

    #[test]
    fn test_split_is_reproducible() {
        let rows = training_rows();

        let mut a = DataProcessor::new();
        let mut b = DataProcessor::new();
        let pa = a.prepare_training_data(&rows, 0.25, 42).unwrap();
        let pb = b.prepare_training_data(&rows, 0.25, 42).unwrap();

        assert_eq!(pa.x_train, pb.x_train);
        assert_eq!(pa.y_test, pb.y_test);

        let mut c = DataProcessor::new();
        let pc = c.prepare_training_data(&rows, 0.25, 7).unwrap();
        assert_ne!(pa.x_test, pc.x_test);
    }

    #[test]
    fn test_split_sizes() {
        let rows = training_rows();
        let mut processor = DataProcessor::new();
        let prepared = processor.prepare_training_data(&rows, 0.25, 42).unwrap();

        assert_eq!(prepared.x_test.len(), 10);
        assert_eq!(prepared.x_train.len(), 30);
        assert_eq!(prepared.y_train.len(), 30);
    }

    #[test]
    fn test_scaler_fitted_on_train_partition_only() {
        let rows = training_rows();
        let mut processor = DataProcessor::new();
        let prepared = processor.prepare_training_data(&rows, 0.25, 42).unwrap();

        // Training columns are standardized; with leakage into the fit the
        // training mean would drift away from zero.
        for j in 0..prepared.x_train[0].len() {
            let mean: f64 = prepared.x_train.iter().map(|r| r[j]).sum::<f64>()
                / prepared.x_train.len() as f64;
            assert!(mean.abs() < 1e-9, "column {j} mean {mean}");
        }
    }

    #[test]
    fn test_prediction_before_fit_fails() {
        let processor = DataProcessor::new();
        let sample = labeled(50.0, 100.0, "rice").sample();

        assert!(matches!(
            processor.prepare_prediction_data(&sample),
            Err(ProcessError::NotFitted(_))
        ));
    }

    #[test]
    fn test_empty_input_fails() {
        let mut processor = DataProcessor::new();
        assert!(matches!(
            processor.prepare_training_data(&[], 0.2, 42),
            Err(ProcessError::EmptyDataset)
        ));
    }

    #[test]
    fn test_single_row_cannot_split() {
        let mut processor = DataProcessor::new();
        let rows = vec![labeled(50.0, 100.0, "rice")];
        assert!(matches!(
            processor.prepare_training_data(&rows, 0.2, 42),
            Err(ProcessError::TooFewSamples(1))
        ));
    }

    #[test]
    fn test_invalid_test_size_fails() {
        let mut processor = DataProcessor::new();
        let rows = training_rows();
        assert!(matches!(
            processor.prepare_training_data(&rows, 1.0, 42),
            Err(ProcessError::InvalidTestSize(_))
        ));
    }

    #[test]
    fn test_decode_unknown_sentinel() {
        let mut processor = DataProcessor::new();
        processor
            .prepare_training_data(&training_rows(), 0.2, 42)
            .unwrap();

        assert_eq!(processor.decode_prediction(0), "maize");
        assert_eq!(processor.decode_prediction(99), "unknown");
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processors.json");

        let mut processor = DataProcessor::new();
        processor
            .prepare_training_data(&training_rows(), 0.2, 42)
            .unwrap();
        processor.save(&path).unwrap();

        let restored = DataProcessor::load(&path).unwrap();
        assert_eq!(restored.all_crops(), processor.all_crops());

        let sample = labeled(55.0, 120.0, "rice").sample();
        assert_eq!(
            restored.prepare_prediction_data(&sample).unwrap(),
            processor.prepare_prediction_data(&sample).unwrap()
        );
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = DataProcessor::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ProcessError::Persistence(_)));
    }

    #[test]
    fn test_save_before_fit_fails() {
        let dir = tempfile::tempdir().unwrap();
        let processor = DataProcessor::new();
        assert!(matches!(
            processor.save(&dir.path().join("processors.json")),
            Err(ProcessError::NotFitted(_))
        ));
    }
}
