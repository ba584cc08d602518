//! Evaluation metrics for the crop classifier
//!
//! Multiclass accuracy plus a per-class precision/recall/F1 report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Headline numbers describing one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub train_samples: usize,
    pub test_samples: usize,
    pub feature_count: usize,
    pub class_count: usize,
}

/// Per-class precision, recall, F1 and support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Fraction of predictions matching the true class.
pub fn accuracy(y_true: &[usize], y_pred: &[usize]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }

    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();

    correct as f64 / y_true.len() as f64
}

/// Per-class report keyed by class name, one-vs-rest counts per class.
pub fn classification_report(
    y_true: &[usize],
    y_pred: &[usize],
    class_names: &[String],
) -> BTreeMap<String, ClassMetrics> {
    let mut report = BTreeMap::new();

    for (class, name) in class_names.iter().enumerate() {
        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut fn_ = 0usize;

        for (t, p) in y_true.iter().zip(y_pred.iter()) {
            match (*t == class, *p == class) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => {}
            }
        }

        let precision = if tp + fp == 0 {
            0.0
        } else {
            tp as f64 / (tp + fp) as f64
        };
        let recall = if tp + fn_ == 0 {
            0.0
        } else {
            tp as f64 / (tp + fn_) as f64
        };
        let f1_score = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        report.insert(
            name.clone(),
            ClassMetrics {
                precision,
                recall,
                f1_score,
                support: tp + fn_,
            },
        );
    }

    report
}
