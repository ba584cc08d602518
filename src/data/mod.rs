//! Data module for loading and describing soil/climate readings
//!
//! This module provides:
//! - Core types for raw and labeled samples
//! - CSV ingestion for training data with header validation

pub mod loader;
pub mod types;

pub use loader::{load_training_csv, DataError};
pub use types::{LabeledSample, SoilSample, LABEL_COLUMN, RAW_COLUMNS};
