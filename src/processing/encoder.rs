//! Crop label encoding

use super::processor::ProcessError;
use serde::{Deserialize, Serialize};

/// Sentinel returned when decoding an index no crop maps to.
pub const UNKNOWN_CROP: &str = "unknown";

/// Bijective mapping between crop names and contiguous indices `0..C-1`.
///
/// Fitted once from the training label set; the class order is the sorted
/// order of the distinct names, so the mapping is stable for a given dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an encoder from a persisted class list, preserving its order.
    pub fn from_classes(classes: Vec<String>) -> Self {
        Self { classes }
    }

    /// Fit the mapping from observed labels. Replaces any previous state.
    pub fn fit(&mut self, labels: &[String]) {
        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();
        self.classes = classes;
    }

    /// Encode a crop name. Unknown names are an error: the mapping is fixed
    /// at fit time.
    pub fn encode(&self, name: &str) -> Result<usize, ProcessError> {
        self.classes
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| ProcessError::UnknownCrop(name.to_string()))
    }

    /// Decode an index back to a crop name. Out-of-range indices yield the
    /// [`UNKNOWN_CROP`] sentinel rather than failing.
    pub fn decode(&self, index: usize) -> String {
        self.classes
            .get(index)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_CROP.to_string())
    }

    /// Crop names in index order. Empty before fitting.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn is_fitted(&self) -> bool {
        !self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted() -> LabelEncoder {
        let mut encoder = LabelEncoder::new();
        encoder.fit(&[
            "rice".to_string(),
            "maize".to_string(),
            "rice".to_string(),
            "chickpea".to_string(),
        ]);
        encoder
    }

    #[test]
    fn test_classes_are_sorted_and_unique() {
        let encoder = fitted();
        assert_eq!(encoder.classes(), &["chickpea", "maize", "rice"]);
        assert_eq!(encoder.len(), 3);
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let encoder = fitted();
        for name in encoder.classes().to_vec() {
            let index = encoder.encode(&name).unwrap();
            assert_eq!(encoder.decode(index), name);
        }
    }

    #[test]
    fn test_unknown_name_is_error() {
        let encoder = fitted();
        assert!(matches!(
            encoder.encode("durian"),
            Err(ProcessError::UnknownCrop(_))
        ));
    }

    #[test]
    fn test_out_of_range_decode_is_sentinel() {
        let encoder = fitted();
        assert_eq!(encoder.decode(3), UNKNOWN_CROP);
        assert_eq!(encoder.decode(usize::MAX), UNKNOWN_CROP);
    }
}
