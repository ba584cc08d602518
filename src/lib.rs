//! Crop Recommendation Pipeline and Service
//!
//! This library trains a gradient-boosted classifier that recommends a crop
//! from soil and climate readings, persists the trained pipeline as one
//! artifact, and serves predictions over HTTP.
//!
//! # Modules
//!
//! - [`data`] - Sample types and CSV ingestion for training data
//! - [`features`] - Composite/interaction feature engineering
//! - [`processing`] - Label encoding, scaling, splitting and persistence
//! - [`models`] - The boosted ensemble, metrics and the training orchestrator
//! - [`serve`] - HTTP schemas, shared-model handle and routes
//!
//! # Example
//!
//! ```rust,no_run
//! use crop_recommender::data::SoilSample;
//! use crop_recommender::models::{ModelTrainer, TrainingOptions};
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     // 1. Train from a CSV of labeled readings
//!     let mut trainer = ModelTrainer::new();
//!     let report = trainer.train(Path::new("data/crops.csv"), &TrainingOptions::default())?;
//!     println!("Test accuracy: {:.4}", report.metrics.test_accuracy);
//!
//!     // 2. Persist the whole pipeline
//!     trainer.save(Path::new("models"))?;
//!
//!     // 3. Predict for fresh readings
//!     let sample = SoilSample {
//!         nitrogen: 90.0,
//!         phosphorus: 42.0,
//!         potassium: 43.0,
//!         temperature: 20.88,
//!         humidity: 82.0,
//!         ph: 6.5,
//!         rainfall: 202.9,
//!     };
//!     let prediction = trainer.predict(&sample)?;
//!     println!("{} ({:.1}%)", prediction.crop, prediction.confidence * 100.0);
//!
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod features;
pub mod models;
pub mod processing;
pub mod serve;

// Re-export commonly used items at the crate level
pub use data::{LabeledSample, SoilSample};
pub use features::FeatureEngineer;
pub use models::{GbmClassifier, GbmParams, ModelError, ModelTrainer, Prediction, TrainingOptions};
pub use processing::{DataProcessor, ProcessError};
pub use serve::{AppState, ModelHandle, RetrainConfig};
