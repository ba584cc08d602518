//! Feature engineering module
//!
//! This module provides:
//! - Composite and interaction features derived from raw readings
//! - The canonical 13-column feature order shared by training and serving

pub mod engineering;

pub use engineering::{FeatureEngineer, ENGINEERED_COLUMNS, FEATURE_COUNT};
