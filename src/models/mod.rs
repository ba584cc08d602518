//! Machine learning models module
//!
//! This module provides:
//! - A natively implemented multiclass gradient boosting classifier
//! - The regression tree it boosts over
//! - Evaluation metrics and the training/persistence orchestrator

pub mod gbm;
pub mod metrics;
pub mod trainer;
pub mod tree;

pub use gbm::{GbmClassifier, GbmParams, ModelError};
pub use metrics::{accuracy, classification_report, ClassMetrics, ModelMetrics};
pub use trainer::{
    ModelTrainer, Prediction, TrainingOptions, TrainingReport, METRICS_FILE, MODEL_FILE,
    PROCESSORS_FILE,
};
pub use tree::{RegressionTree, TreeParams};
