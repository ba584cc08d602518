//! Model training, prediction and artifact persistence
//!
//! [`ModelTrainer`] owns the classifier and its fitted [`DataProcessor`] and
//! keeps the two consistent: they are trained together, saved together and
//! loaded together. The persisted artifact is a directory of three
//! co-located JSON blobs (ensemble, processors, metrics).

use crate::data::loader::load_training_csv;
use crate::data::types::SoilSample;
use crate::models::gbm::{GbmClassifier, GbmParams, ModelError};
use crate::models::metrics::{accuracy, classification_report, ClassMetrics, ModelMetrics};
use crate::processing::processor::DataProcessor;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::{info, warn};

/// Classifier blob inside the artifact directory
pub const MODEL_FILE: &str = "model.json";
/// Encoder/scaler/column-order blob
pub const PROCESSORS_FILE: &str = "processors.json";
/// Evaluation metrics blob
pub const METRICS_FILE: &str = "metrics.json";

/// Settings for one training run
#[derive(Debug, Clone)]
pub struct TrainingOptions {
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the train/test shuffle
    pub seed: u64,
    /// Classifier hyperparameters
    pub params: GbmParams,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            params: GbmParams::default(),
        }
    }
}

/// Outcome of a training run: headline metrics plus the per-class report.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub metrics: ModelMetrics,
    pub class_report: BTreeMap<String, ClassMetrics>,
}

/// One prediction: the recommended crop, its probability, and the full
/// distribution over every known crop.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub crop: String,
    pub confidence: f64,
    pub probabilities: BTreeMap<String, f64>,
}

/// Trains, evaluates, predicts and persists the full pipeline.
#[derive(Debug)]
pub struct ModelTrainer {
    model: Option<GbmClassifier>,
    processor: DataProcessor,
    metrics: Option<ModelMetrics>,
}

impl Default for ModelTrainer {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelTrainer {
    pub fn new() -> Self {
        Self {
            model: None,
            processor: DataProcessor::new(),
            metrics: None,
        }
    }

    /// Train a fresh classifier from a training CSV.
    ///
    /// Replaces any previously held classifier; training is never
    /// incremental.
    pub fn train(
        &mut self,
        data_path: &Path,
        options: &TrainingOptions,
    ) -> Result<TrainingReport, ModelError> {
        info!("Starting model training from {}", data_path.display());

        let rows = load_training_csv(data_path)?;
        let prepared = self
            .processor
            .prepare_training_data(&rows, options.test_size, options.seed)?;

        let mut model = GbmClassifier::with_params(options.params.clone());
        model.fit(
            &prepared.x_train,
            &prepared.y_train,
            self.processor.num_crops(),
        )?;

        let train_pred = model.predict(&prepared.x_train)?;
        let test_pred = model.predict(&prepared.x_test)?;

        let metrics = ModelMetrics {
            train_accuracy: accuracy(&prepared.y_train, &train_pred),
            test_accuracy: accuracy(&prepared.y_test, &test_pred),
            train_samples: prepared.x_train.len(),
            test_samples: prepared.x_test.len(),
            feature_count: self.processor.feature_columns().len(),
            class_count: self.processor.num_crops(),
        };

        let class_report =
            classification_report(&prepared.y_test, &test_pred, &self.processor.all_crops());

        info!(
            "Training completed - test accuracy: {:.4}, train accuracy: {:.4}",
            metrics.test_accuracy, metrics.train_accuracy
        );

        self.model = Some(model);
        self.metrics = Some(metrics.clone());

        Ok(TrainingReport {
            metrics,
            class_report,
        })
    }

    /// Predict the best crop for one sample.
    pub fn predict(&self, sample: &SoilSample) -> Result<Prediction, ModelError> {
        let model = self.model.as_ref().ok_or(ModelError::NotTrained)?;

        let features = self.processor.prepare_prediction_data(sample)?;
        let probs = model.predict_proba_one(&features)?;

        let mut best = 0;
        for (i, p) in probs.iter().enumerate() {
            if *p > probs[best] {
                best = i;
            }
        }

        let probabilities: BTreeMap<String, f64> = probs
            .iter()
            .enumerate()
            .map(|(i, &p)| (self.processor.decode_prediction(i), p))
            .collect();

        Ok(Prediction {
            crop: self.processor.decode_prediction(best),
            confidence: probs[best],
            probabilities,
        })
    }

    /// Predict every sample independently, preserving input order.
    ///
    /// One malformed sample never aborts the rest; each item carries its own
    /// result.
    pub fn predict_batch(&self, samples: &[SoilSample]) -> Vec<Result<Prediction, ModelError>> {
        samples.iter().map(|sample| self.predict(sample)).collect()
    }

    /// Importance score per feature name, in the training column order.
    pub fn feature_importance(&self) -> Result<Vec<(String, f64)>, ModelError> {
        let model = self.model.as_ref().ok_or(ModelError::NotTrained)?;
        let scores = model.feature_importances()?;

        Ok(self
            .processor
            .feature_columns()
            .iter()
            .cloned()
            .zip(scores)
            .collect())
    }

    /// Persist classifier, processors and metrics into `dir` as one unit.
    pub fn save(&self, dir: &Path) -> Result<(), ModelError> {
        let model = self.model.as_ref().ok_or(ModelError::NotTrained)?;

        std::fs::create_dir_all(dir)
            .map_err(|e| ModelError::Persistence(format!("cannot create {}: {e}", dir.display())))?;

        let model_path = dir.join(MODEL_FILE);
        let file = File::create(&model_path).map_err(|e| {
            ModelError::Persistence(format!("cannot create {}: {e}", model_path.display()))
        })?;
        serde_json::to_writer(BufWriter::new(file), model)
            .map_err(|e| ModelError::Persistence(format!("cannot write classifier: {e}")))?;

        self.processor.save(&dir.join(PROCESSORS_FILE))?;

        if let Some(metrics) = &self.metrics {
            let metrics_path = dir.join(METRICS_FILE);
            let file = File::create(&metrics_path).map_err(|e| {
                ModelError::Persistence(format!("cannot create {}: {e}", metrics_path.display()))
            })?;
            serde_json::to_writer_pretty(BufWriter::new(file), metrics)
                .map_err(|e| ModelError::Persistence(format!("cannot write metrics: {e}")))?;
        }

        info!("Model artifact saved to {}", dir.display());
        Ok(())
    }

    /// Restore a trainer from a persisted artifact directory.
    ///
    /// Returns a fully ready trainer or an error; a half-loaded state is
    /// never observable. Missing metrics degrade to a warning, a corrupt
    /// metrics blob is fatal.
    pub fn load(dir: &Path) -> Result<Self, ModelError> {
        let model_path = dir.join(MODEL_FILE);
        let file = File::open(&model_path).map_err(|e| {
            ModelError::Persistence(format!("cannot open {}: {e}", model_path.display()))
        })?;
        let model: GbmClassifier = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ModelError::Persistence(format!("corrupt {}: {e}", model_path.display())))?;

        if !model.is_trained() {
            return Err(ModelError::Persistence(
                "persisted classifier is not trained".to_string(),
            ));
        }

        let processor = DataProcessor::load(&dir.join(PROCESSORS_FILE))?;

        if model.n_features() != processor.feature_columns().len() {
            return Err(ModelError::Persistence(format!(
                "classifier expects {} features but processors describe {}",
                model.n_features(),
                processor.feature_columns().len()
            )));
        }
        if model.n_classes() != processor.num_crops() {
            return Err(ModelError::Persistence(format!(
                "classifier has {} classes but processors know {} crops",
                model.n_classes(),
                processor.num_crops()
            )));
        }

        let metrics_path = dir.join(METRICS_FILE);
        let metrics = match File::open(&metrics_path) {
            Ok(file) => Some(serde_json::from_reader(BufReader::new(file)).map_err(|e| {
                ModelError::Persistence(format!("corrupt {}: {e}", metrics_path.display()))
            })?),
            Err(_) => {
                warn!("Model metrics not found at {}", metrics_path.display());
                None
            }
        };

        info!("Model artifact loaded from {}", dir.display());

        Ok(Self {
            model: Some(model),
            processor,
            metrics,
        })
    }

    /// True once a classifier is trained or loaded.
    pub fn is_ready(&self) -> bool {
        self.model.is_some() && self.processor.is_fitted()
    }

    /// Metrics of the last training run, when available.
    pub fn metrics(&self) -> Option<&ModelMetrics> {
        self.metrics.as_ref()
    }

    /// The owned data processor.
    pub fn processor(&self) -> &DataProcessor {
        &self.processor
    }
}
