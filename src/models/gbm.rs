//! Gradient-boosted crop classifier
//!
//! A natively implemented multiclass gradient boosting machine: one
//! regression tree per class per round, fit to softmax pseudo-residuals.
//! Training is reproducible for a fixed seed; class probabilities come from
//! the softmax over accumulated scores.

use crate::data::loader::DataError;
use crate::models::tree::{RegressionTree, TreeParams};
use crate::processing::processor::ProcessError;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Errors that can occur with the model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Model not trained or loaded")]
    NotTrained,

    #[error("Artifact persistence failed: {0}")]
    Persistence(String),

    #[error("Data processing failed: {0}")]
    Process(#[from] ProcessError),

    #[error("Data loading failed: {0}")]
    Data(#[from] DataError),
}

/// GBM hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbmParams {
    /// Number of boosting rounds
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples required in a leaf node
    pub min_samples_leaf: usize,
    /// Row subsample ratio per round
    pub subsample: f64,
    /// Seed for subsampling
    pub seed: u64,
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 6,
            min_samples_split: 2,
            min_samples_leaf: 1,
            subsample: 1.0,
            seed: 42,
        }
    }
}

/// Multiclass gradient boosting classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbmClassifier {
    params: GbmParams,
    n_classes: usize,
    n_features: usize,
    /// Log class priors, the starting score of every sample
    init_scores: Vec<f64>,
    /// One tree per class for every boosting round
    rounds: Vec<Vec<RegressionTree>>,
}

impl GbmClassifier {
    /// Create a new classifier with default parameters
    pub fn new() -> Self {
        Self::with_params(GbmParams::default())
    }

    /// Create a new classifier with custom parameters
    pub fn with_params(params: GbmParams) -> Self {
        Self {
            params,
            n_classes: 0,
            n_features: 0,
            init_scores: Vec::new(),
            rounds: Vec::new(),
        }
    }

    /// Train the ensemble on scaled features and encoded labels.
    ///
    /// Replaces any previously trained state. Class trees within one round
    /// are independent and fit in parallel.
    pub fn fit(&mut self, x: &[Vec<f64>], y: &[usize], n_classes: usize) -> Result<(), ModelError> {
        if x.is_empty() {
            return Err(ModelError::InvalidData("Empty dataset".to_string()));
        }
        if x.len() != y.len() {
            return Err(ModelError::InvalidData(format!(
                "{} feature rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        if n_classes < 2 {
            return Err(ModelError::InvalidData(
                "At least two classes are required".to_string(),
            ));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(ModelError::InvalidData(format!(
                "Class index {bad} out of range for {n_classes} classes"
            )));
        }

        let n = x.len();
        let n_features = x[0].len();

        info!(
            "Training GBM classifier with {} samples, {} features, {} classes",
            n, n_features, n_classes
        );

        let mut counts = vec![0usize; n_classes];
        for &c in y {
            counts[c] += 1;
        }
        let init_scores: Vec<f64> = counts
            .iter()
            .map(|&c| ((c as f64 / n as f64).max(1e-12)).ln())
            .collect();

        let mut scores: Vec<Vec<f64>> = vec![init_scores.clone(); n];
        let mut rng = ChaCha8Rng::seed_from_u64(self.params.seed);

        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            min_samples_leaf: self.params.min_samples_leaf,
        };

        let mut rounds = Vec::with_capacity(self.params.n_estimators);

        for _ in 0..self.params.n_estimators {
            let probs: Vec<Vec<f64>> = scores.iter().map(|s| softmax(s)).collect();

            let indices: Vec<usize> = if self.params.subsample < 1.0 {
                let keep = ((n as f64) * self.params.subsample).ceil() as usize;
                let mut idx: Vec<usize> = (0..n).collect();
                idx.shuffle(&mut rng);
                idx.truncate(keep.clamp(1, n));
                idx
            } else {
                (0..n).collect()
            };

            // pseudo-residuals: one-hot label minus predicted probability
            let residuals: Vec<Vec<f64>> = (0..n_classes)
                .map(|k| {
                    (0..n)
                        .map(|i| {
                            let target = if y[i] == k { 1.0 } else { 0.0 };
                            target - probs[i][k]
                        })
                        .collect()
                })
                .collect();

            let trees: Vec<RegressionTree> = residuals
                .par_iter()
                .map(|residual| {
                    let mut tree = RegressionTree::new(tree_params.clone());
                    tree.fit(x, residual, &indices);
                    tree
                })
                .collect();

            for (i, row) in x.iter().enumerate() {
                for (k, tree) in trees.iter().enumerate() {
                    scores[i][k] += self.params.learning_rate * tree.predict_one(row);
                }
            }

            rounds.push(trees);
        }

        self.n_classes = n_classes;
        self.n_features = n_features;
        self.init_scores = init_scores;
        self.rounds = rounds;

        info!("GBM training completed with {} rounds", self.rounds.len());

        Ok(())
    }

    /// Class probability distribution for one feature row.
    pub fn predict_proba_one(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        if self.rounds.is_empty() {
            return Err(ModelError::NotTrained);
        }
        if row.len() != self.n_features {
            return Err(ModelError::InvalidData(format!(
                "Expected {} feature values, found {}",
                self.n_features,
                row.len()
            )));
        }

        let mut scores = self.init_scores.clone();
        for trees in &self.rounds {
            for (k, tree) in trees.iter().enumerate() {
                scores[k] += self.params.learning_rate * tree.predict_one(row);
            }
        }

        Ok(softmax(&scores))
    }

    /// Class probability distributions for a batch of rows.
    pub fn predict_proba(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ModelError> {
        x.iter().map(|row| self.predict_proba_one(row)).collect()
    }

    /// Most likely class for one row.
    pub fn predict_one(&self, row: &[f64]) -> Result<usize, ModelError> {
        let probs = self.predict_proba_one(row)?;
        Ok(argmax(&probs))
    }

    /// Most likely class per row.
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<usize>, ModelError> {
        x.iter().map(|row| self.predict_one(row)).collect()
    }

    /// Split-gain feature importances over every tree in the ensemble,
    /// normalized to sum to one, in the training column order.
    pub fn feature_importances(&self) -> Result<Vec<f64>, ModelError> {
        if self.rounds.is_empty() {
            return Err(ModelError::NotTrained);
        }

        let mut totals = vec![0.0; self.n_features];
        for trees in &self.rounds {
            for tree in trees {
                for (j, gain) in tree.importances().iter().enumerate() {
                    totals[j] += gain;
                }
            }
        }

        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            for total in &mut totals {
                *total /= sum;
            }
        }

        Ok(totals)
    }

    pub fn is_trained(&self) -> bool {
        !self.rounds.is_empty()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn params(&self) -> &GbmParams {
        &self.params
    }
}

impl Default for GbmClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.iter().map(|e| e / sum).collect()
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three well-separated clusters in two dimensions.
    fn cluster_data() -> (Vec<Vec<f64>>, Vec<usize>) {
        let centers = [(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)];
        let mut x = Vec::new();
        let mut y = Vec::new();

        for (class, &(cx, cy)) in centers.iter().enumerate() {
            for i in 0..30 {
                let dx = (i % 5) as f64 * 0.2;
                let dy = (i / 5) as f64 * 0.2;
                x.push(vec![cx + dx, cy + dy]);
                y.push(class);
            }
        }

        (x, y)
    }

    fn small_params() -> GbmParams {
        GbmParams {
            n_estimators: 20,
            max_depth: 3,
            ..GbmParams::default()
        }
    }

    #[test]
    fn test_fit_separates_clusters() {
        let (x, y) = cluster_data();
        let mut model = GbmClassifier::with_params(small_params());
        model.fit(&x, &y, 3).unwrap();

        let predictions = model.predict(&x).unwrap();
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| p == t)
            .count();
        assert!(correct as f64 / y.len() as f64 > 0.95);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, y) = cluster_data();
        let mut model = GbmClassifier::with_params(small_params());
        model.fit(&x, &y, 3).unwrap();

        for row in x.iter().take(10) {
            let probs = model.predict_proba_one(row).unwrap();
            assert_eq!(probs.len(), 3);
            let sum: f64 = probs.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
            assert!(probs.iter().all(|p| *p >= 0.0 && *p <= 1.0));
        }
    }

    #[test]
    fn test_training_is_reproducible() {
        let (x, y) = cluster_data();
        let params = GbmParams {
            subsample: 0.8,
            ..small_params()
        };

        let mut a = GbmClassifier::with_params(params.clone());
        let mut b = GbmClassifier::with_params(params);
        a.fit(&x, &y, 3).unwrap();
        b.fit(&x, &y, 3).unwrap();

        for row in x.iter().take(5) {
            assert_eq!(
                a.predict_proba_one(row).unwrap(),
                b.predict_proba_one(row).unwrap()
            );
        }
    }

    #[test]
    fn test_untrained_model_fails() {
        let model = GbmClassifier::new();
        assert!(matches!(
            model.predict_proba_one(&[0.0, 0.0]),
            Err(ModelError::NotTrained)
        ));
        assert!(matches!(
            model.feature_importances(),
            Err(ModelError::NotTrained)
        ));
    }

    #[test]
    fn test_feature_width_mismatch_fails() {
        let (x, y) = cluster_data();
        let mut model = GbmClassifier::with_params(small_params());
        model.fit(&x, &y, 3).unwrap();

        assert!(matches!(
            model.predict_proba_one(&[1.0]),
            Err(ModelError::InvalidData(_))
        ));
    }

    #[test]
    fn test_importances_normalized() {
        let (x, y) = cluster_data();
        let mut model = GbmClassifier::with_params(small_params());
        model.fit(&x, &y, 3).unwrap();

        let importances = model.feature_importances().unwrap();
        assert_eq!(importances.len(), 2);
        let sum: f64 = importances.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_labels_rejected() {
        let (x, _) = cluster_data();
        let bad_labels = vec![5usize; x.len()];

        let mut model = GbmClassifier::with_params(small_params());
        assert!(matches!(
            model.fit(&x, &bad_labels, 3),
            Err(ModelError::InvalidData(_))
        ));
    }

    #[test]
    fn test_refit_replaces_previous_model() {
        let (x, y) = cluster_data();
        let mut model = GbmClassifier::with_params(small_params());
        model.fit(&x, &y, 3).unwrap();

        // retrain with labels rotated; predictions must follow the new fit
        let rotated: Vec<usize> = y.iter().map(|&c| (c + 1) % 3).collect();
        model.fit(&x, &rotated, 3).unwrap();

        let predictions = model.predict(&x).unwrap();
        let correct = predictions
            .iter()
            .zip(rotated.iter())
            .filter(|(p, t)| p == t)
            .count();
        assert!(correct as f64 / rotated.len() as f64 > 0.95);
    }
}
