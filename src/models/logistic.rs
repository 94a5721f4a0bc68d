//! L2-regularized binary logistic regression fitted by Newton's method.

use log::warn;
use serde::Serialize;

use super::linalg::solve;
use crate::error::{AnalysisError, Result};

/// Solver settings. Objective: `C * Σ log_loss + ½‖w‖²` (intercept unpenalized).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticConfig {
    /// Inverse regularization strength.
    pub c: f64,
    /// Iteration cap.
    pub max_iter: usize,
    /// Convergence threshold on the largest Newton step component.
    pub tol: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-8,
        }
    }
}

/// A fitted logistic model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Newton iterations used.
    pub n_iter: usize,
    pub converged: bool,
}

pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow.
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

/// Dot product of `row` with the weights, plus the trailing intercept.
fn linear_term(params: &[f64], row: &[f64]) -> f64 {
    let p = row.len();
    params[p] + row.iter().zip(params).map(|(x, w)| x * w).sum::<f64>()
}

fn objective(params: &[f64], x: &[Vec<f64>], y: &[u8], c: f64) -> f64 {
    let p = params.len() - 1;
    let loss: f64 = x
        .iter()
        .zip(y)
        .map(|(row, &label)| {
            let z = linear_term(params, row);
            softplus(z) - f64::from(label) * z
        })
        .sum();
    let penalty: f64 = params[..p].iter().map(|w| w * w).sum::<f64>() / 2.0;
    c * loss + penalty
}

impl LogisticModel {
    pub fn fit(x: &[Vec<f64>], y: &[u8], config: &LogisticConfig) -> Result<Self> {
        if x.is_empty() || x.len() != y.len() {
            return Err(AnalysisError::InsufficientTrainingData {
                required: 1,
                actual: x.len().min(y.len()),
            });
        }
        let p = x[0].len();
        // weights followed by the intercept
        let mut params = vec![0.0; p + 1];
        let mut current = objective(&params, x, y, config.c);
        let mut converged = false;
        let mut n_iter = 0;

        while n_iter < config.max_iter {
            n_iter += 1;

            let mut grad = vec![0.0; p + 1];
            let mut hess = vec![vec![0.0; p + 1]; p + 1];
            for (row, &label) in x.iter().zip(y) {
                let prob = sigmoid(linear_term(&params, row));
                let residual = config.c * (prob - f64::from(label));
                let weight = config.c * prob * (1.0 - prob);
                let aug = |i: usize| if i < p { row[i] } else { 1.0 };
                for i in 0..=p {
                    grad[i] += residual * aug(i);
                    for k in 0..=p {
                        hess[i][k] += weight * aug(i) * aug(k);
                    }
                }
            }
            for i in 0..p {
                grad[i] += params[i];
                hess[i][i] += 1.0;
            }

            let step = solve(hess, grad)?;

            // Backtrack until the objective stops increasing.
            let mut t = 1.0;
            let mut candidate: Vec<f64>;
            loop {
                candidate = params.iter().zip(&step).map(|(w, s)| w - t * s).collect();
                let value = objective(&candidate, x, y, config.c);
                if value <= current || t < 1e-10 {
                    current = value;
                    break;
                }
                t /= 2.0;
            }
            params = candidate;

            let largest = step.iter().fold(0.0_f64, |m, s| m.max((t * s).abs()));
            if largest < config.tol {
                converged = true;
                break;
            }
        }

        if !converged {
            warn!(
                "Logistic regression did not converge in {} iterations",
                config.max_iter
            );
        }

        let intercept = params[p];
        params.truncate(p);
        Ok(LogisticModel {
            coefficients: params,
            intercept,
            n_iter,
            converged,
        })
    }

    pub fn decision_function(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(w, v)| w * v)
                .sum::<f64>()
    }

    /// Probability of the positive class.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        sigmoid(self.decision_function(row))
    }

    /// Class 1 when the decision function is strictly positive.
    pub fn predict(&self, row: &[f64]) -> u8 {
        u8::from(self.decision_function(row) > 0.0)
    }
}
