//! Ordinary least squares with an intercept.

use serde::Serialize;

use super::linalg::solve;
use crate::error::{AnalysisError, Result};

/// A fitted linear model `y = intercept + Σ coefficients[j] * x[j]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    /// Fit by solving the normal equations on mean-centred data.
    ///
    /// Centring removes the intercept from the system and keeps it well
    /// conditioned for features on very different scales.
    pub fn fit(x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        if x.is_empty() || x.len() != y.len() {
            return Err(AnalysisError::InsufficientTrainingData {
                required: 1,
                actual: x.len().min(y.len()),
            });
        }
        let n = x.len() as f64;
        let p = x[0].len();

        let x_mean: Vec<f64> = (0..p)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n)
            .collect();
        let y_mean = y.iter().sum::<f64>() / n;

        let mut xtx = vec![vec![0.0; p]; p];
        let mut xty = vec![0.0; p];
        for (row, &target) in x.iter().zip(y) {
            let centred: Vec<f64> = row.iter().zip(&x_mean).map(|(v, m)| v - m).collect();
            let dy = target - y_mean;
            for i in 0..p {
                xty[i] += centred[i] * dy;
                for k in 0..p {
                    xtx[i][k] += centred[i] * centred[k];
                }
            }
        }

        let coefficients = if p == 0 { Vec::new() } else { solve(xtx, xty)? };
        let intercept = y_mean
            - coefficients
                .iter()
                .zip(&x_mean)
                .map(|(b, m)| b * m)
                .sum::<f64>();

        Ok(LinearModel {
            coefficients,
            intercept,
        })
    }

    pub fn predict_one(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(b, v)| b * v)
                .sum::<f64>()
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter().map(|row| self.predict_one(row)).collect()
    }
}
