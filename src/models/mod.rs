//! Predictive models trained over the merged market table.
//!
//! Architecture:
//! ```text
//!   merged / scored Table
//!        │  validity mask, copy features out
//!        ▼
//!   ┌──────────┐
//!   │  split    │  seeded 80/20 (stratified for the classifier)
//!   └──────────┘
//!        │
//!        ├──────────────────────┐
//!        ▼                      ▼
//!   ┌──────────┐          ┌──────────┐
//!   │  linear   │          │ logistic  │
//!   └──────────┘          └──────────┘
//!        │                      │
//!        ▼                      ▼
//!   GdpPredictor           MarketClassifier   → metrics → *TrainingResult
//! ```

use std::collections::BTreeMap;

use crate::columns;
use crate::error::{AnalysisError, Result};

pub mod classifier;
pub mod gdp;
pub mod linalg;
pub mod linear;
pub mod logistic;
pub mod metrics;
pub mod split;

/// Named feature values for a single prediction.
pub type FeatureRow = BTreeMap<String, f64>;

/// Split and guard settings shared by both trainers.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    /// Feature columns, in coefficient order.
    pub features: Vec<String>,
    /// Share of valid rows held out for evaluation.
    pub test_fraction: f64,
    /// Seed of the split shuffle.
    pub seed: u64,
    /// Fewer valid rows than this and training is skipped.
    pub min_rows: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            features: columns::MODEL_FEATURES.iter().map(|f| f.to_string()).collect(),
            test_fraction: 0.2,
            seed: 42,
            min_rows: 10,
        }
    }
}

impl TrainerConfig {
    pub fn feature_names(&self) -> Vec<&str> {
        self.features.iter().map(String::as_str).collect()
    }

    /// Fail with `InsufficientTrainingData` below the row guard.
    fn check_rows(&self, actual: usize) -> Result<()> {
        if actual < self.min_rows {
            return Err(AnalysisError::InsufficientTrainingData {
                required: self.min_rows,
                actual,
            });
        }
        Ok(())
    }

    /// Order the values of `input` by the configured features.
    fn feature_vector(&self, input: &FeatureRow) -> Result<Vec<f64>> {
        self.features
            .iter()
            .map(|f| {
                input
                    .get(f)
                    .copied()
                    .ok_or_else(|| AnalysisError::MissingFeature(f.clone()))
            })
            .collect()
    }
}

/// Gather the rows at `positions`.
fn take<T: Clone>(values: &[T], positions: &[usize]) -> Vec<T> {
    positions.iter().map(|&i| values[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_features_are_the_four_model_columns() {
        let config = TrainerConfig::default();
        assert_eq!(config.feature_names(), columns::MODEL_FEATURES.to_vec());
        assert_eq!(config.min_rows, 10);
    }

    #[test]
    fn feature_vector_requires_every_feature() {
        let config = TrainerConfig::default();
        let mut input: FeatureRow = columns::MODEL_FEATURES
            .iter()
            .enumerate()
            .map(|(i, f)| (f.to_string(), i as f64))
            .collect();
        assert_eq!(config.feature_vector(&input).unwrap(), vec![0.0, 1.0, 2.0, 3.0]);

        input.remove(columns::BIRTHRATE);
        assert_eq!(
            config.feature_vector(&input),
            Err(AnalysisError::MissingFeature(columns::BIRTHRATE.to_string()))
        );
    }

    #[test]
    fn row_guard_rejects_small_samples() {
        let config = TrainerConfig::default();
        assert!(config.check_rows(10).is_ok());
        assert_eq!(
            config.check_rows(9),
            Err(AnalysisError::InsufficientTrainingData {
                required: 10,
                actual: 9
            })
        );
    }
}
