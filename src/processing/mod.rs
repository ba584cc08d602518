//! Data processing module
//!
//! This module provides:
//! - Label encoding between crop names and class indices
//! - Standard scaling fitted on training features only
//! - The processing pipeline that ties engineering, encoding, scaling and
//!   splitting together, with persistence of the fitted state

pub mod encoder;
pub mod processor;
pub mod scaler;

pub use encoder::{LabelEncoder, UNKNOWN_CROP};
pub use processor::{DataProcessor, PreparedData, ProcessError, PROCESSOR_SCHEMA_VERSION};
pub use scaler::StandardScaler;
