//! Training data ingestion
//!
//! Loads labeled soil/climate readings from a CSV file with columns
//! `N, P, K, temperature, humidity, ph, rainfall, label`.

use crate::data::types::{LabeledSample, LABEL_COLUMN, RAW_COLUMNS};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors that can occur while loading training data
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Failed to open {path}: {source}")]
    Open { path: String, source: csv::Error },

    #[error("CSV parsing failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required column missing from training data: {0}")]
    MissingColumn(String),

    #[error("Training file {0} contains no samples")]
    Empty(String),
}

/// Load labeled training rows from a CSV file.
///
/// Every column in [`RAW_COLUMNS`] plus [`LABEL_COLUMN`] must be present in
/// the header; a missing column is a fatal [`DataError::MissingColumn`].
/// Extra columns are ignored.
pub fn load_training_csv(path: &Path) -> Result<Vec<LabeledSample>, DataError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| DataError::Open {
        path: path.display().to_string(),
        source,
    })?;

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();

    for required in RAW_COLUMNS.iter().chain(std::iter::once(&LABEL_COLUMN)) {
        if !headers.iter().any(|h| h == required) {
            return Err(DataError::MissingColumn(required.to_string()));
        }
    }

    let mut rows = Vec::new();
    for record in reader.deserialize::<LabeledSample>() {
        rows.push(record?);
    }

    if rows.is_empty() {
        return Err(DataError::Empty(path.display().to_string()));
    }

    info!("Loaded {} samples from {}", rows.len(), path.display());

    Ok(rows)
}
