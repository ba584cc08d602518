//! Feature scaling

use super::processor::ProcessError;
use serde::{Deserialize, Serialize};

/// Per-column standardization to zero mean and unit variance.
///
/// Fitted once on training features and applied identically at train and
/// serve time. Columns with near-zero spread are only centered, never
/// divided.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

const MIN_STD: f64 = 1e-10;

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit column means and standard deviations. Replaces any previous state.
    pub fn fit(&mut self, rows: &[Vec<f64>]) -> Result<(), ProcessError> {
        if rows.is_empty() {
            return Err(ProcessError::EmptyDataset);
        }

        let n_cols = rows[0].len();
        let n = rows.len() as f64;

        let mut means = vec![0.0; n_cols];
        for row in rows {
            for (j, value) in row.iter().enumerate() {
                means[j] += value;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        let mut stds = vec![0.0; n_cols];
        for row in rows {
            for (j, value) in row.iter().enumerate() {
                stds[j] += (value - means[j]).powi(2);
            }
        }
        for std in &mut stds {
            *std = (*std / n).sqrt();
        }

        self.means = means;
        self.stds = stds;
        Ok(())
    }

    /// Scale one row with the fitted state.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, ProcessError> {
        if !self.is_fitted() {
            return Err(ProcessError::NotFitted("scaler"));
        }
        if row.len() != self.means.len() {
            return Err(ProcessError::FeatureCount {
                expected: self.means.len(),
                found: row.len(),
            });
        }

        Ok(row
            .iter()
            .enumerate()
            .map(|(j, value)| {
                let centered = value - self.means[j];
                if self.stds[j] > MIN_STD {
                    centered / self.stds[j]
                } else {
                    centered
                }
            })
            .collect())
    }

    /// Scale a batch of rows.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ProcessError> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }

    pub fn is_fitted(&self) -> bool {
        !self.means.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_transform_standardizes() {
        let rows = vec![vec![1.0, 10.0], vec![2.0, 20.0], vec![3.0, 30.0]];
        let mut scaler = StandardScaler::new();
        scaler.fit(&rows).unwrap();

        let scaled = scaler.transform(&rows).unwrap();

        for j in 0..2 {
            let mean: f64 = scaled.iter().map(|r| r[j]).sum::<f64>() / 3.0;
            let var: f64 = scaled.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / 3.0;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_transform_is_deterministic() {
        let rows = vec![vec![1.0, 4.0], vec![5.0, 8.0]];
        let mut scaler = StandardScaler::new();
        scaler.fit(&rows).unwrap();

        let once = scaler.transform_row(&[2.0, 6.0]).unwrap();
        let twice = scaler.transform_row(&[2.0, 6.0]).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_constant_column_is_only_centered() {
        let rows = vec![vec![5.0], vec![5.0], vec![5.0]];
        let mut scaler = StandardScaler::new();
        scaler.fit(&rows).unwrap();

        let scaled = scaler.transform_row(&[5.0]).unwrap();
        assert_eq!(scaled, vec![0.0]);
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let scaler = StandardScaler::new();
        assert!(matches!(
            scaler.transform_row(&[1.0]),
            Err(ProcessError::NotFitted(_))
        ));
    }

    #[test]
    fn test_width_mismatch_fails() {
        let mut scaler = StandardScaler::new();
        scaler.fit(&[vec![1.0, 2.0]]).unwrap();

        assert!(matches!(
            scaler.transform_row(&[1.0]),
            Err(ProcessError::FeatureCount {
                expected: 2,
                found: 1
            })
        ));
    }
}
