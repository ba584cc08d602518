//! Feature engineering for the crop classifier
//!
//! This module derives composite and interaction features from raw
//! soil/climate readings. Every derivation is a pure function of one sample;
//! engineering a batch row by row produces exactly the same values as
//! engineering each sample alone.

use crate::data::types::{SoilSample, RAW_COLUMNS};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

/// Names of the derived columns, in the order they are appended to the raw
/// readings.
pub const ENGINEERED_COLUMNS: [&str; 6] = [
    "NPK",
    "THI",
    "rainfall_level",
    "ph_category",
    "temp_rain_interaction",
    "ph_rain_interaction",
];

/// Number of columns in an engineered feature row.
pub const FEATURE_COUNT: usize = RAW_COLUMNS.len() + ENGINEERED_COLUMNS.len();

/// Derives composite features from raw readings.
///
/// Rainfall is bucketed into four ordered levels with right-inclusive
/// boundaries at 50, 100, 200 and 400 mm. A reading outside `(0, 400]` has no
/// bucket; the value is filled with `0.0` and the occurrence is counted so
/// out-of-distribution inputs stay visible to operators.
#[derive(Debug, Default)]
pub struct FeatureEngineer {
    out_of_range: AtomicU64,
}

impl FeatureEngineer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full 13-column feature order: raw readings first, derived columns
    /// after. Training and serving both rely on this order.
    pub fn feature_names() -> Vec<String> {
        RAW_COLUMNS
            .iter()
            .chain(ENGINEERED_COLUMNS.iter())
            .map(|name| name.to_string())
            .collect()
    }

    /// Engineer one sample into a feature row in [`Self::feature_names`] order.
    pub fn engineer(&self, sample: &SoilSample) -> Vec<f64> {
        let mut row = Vec::with_capacity(FEATURE_COUNT);
        row.extend_from_slice(&sample.values());

        let npk = (sample.nitrogen + sample.phosphorus + sample.potassium) / 3.0;
        let thi = sample.temperature * sample.humidity / 100.0;

        let rainfall_level = match Self::rainfall_level(sample.rainfall) {
            Some(level) => level,
            None => {
                self.out_of_range.fetch_add(1, Ordering::Relaxed);
                warn!(
                    rainfall = sample.rainfall,
                    "rainfall outside (0, 400], filling level with 0"
                );
                0.0
            }
        };

        row.push(npk);
        row.push(thi);
        row.push(rainfall_level);
        row.push(Self::ph_category(sample.ph));
        row.push(sample.temperature * sample.rainfall);
        row.push(sample.ph * sample.rainfall);

        row
    }

    /// Engineer a batch of samples, one row per sample, input order preserved.
    pub fn engineer_all(&self, samples: &[SoilSample]) -> Vec<Vec<f64>> {
        samples.iter().map(|s| self.engineer(s)).collect()
    }

    /// How many samples fell outside every rainfall bucket so far.
    pub fn out_of_range_count(&self) -> u64 {
        self.out_of_range.load(Ordering::Relaxed)
    }

    /// Bucket rainfall into levels 0-3 with bins (0,50], (50,100], (100,200],
    /// (200,400]. Values outside the range have no bucket.
    fn rainfall_level(rainfall: f64) -> Option<f64> {
        if rainfall > 0.0 && rainfall <= 50.0 {
            Some(0.0)
        } else if rainfall > 50.0 && rainfall <= 100.0 {
            Some(1.0)
        } else if rainfall > 100.0 && rainfall <= 200.0 {
            Some(2.0)
        } else if rainfall > 200.0 && rainfall <= 400.0 {
            Some(3.0)
        } else {
            None
        }
    }

    /// 0 = acidic (< 5.5), 1 = neutral (5.5..=7.5), 2 = alkaline (> 7.5)
    fn ph_category(ph: f64) -> f64 {
        if ph < 5.5 {
            0.0
        } else if ph <= 7.5 {
            1.0
        } else {
            2.0
        }
    }
}
