use log::{info, warn};
use serde::Serialize;

use super::linear::LinearModel;
use super::metrics::r2_score;
use super::split::shuffle_split;
use super::{take, FeatureRow, TrainerConfig};
use crate::columns;
use crate::data::filter::{complete_rows, feature_matrix, missing_columns};
use crate::data::model::Table;
use crate::error::{AnalysisError, Result};

/// Evaluation of one GDP predictor fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionResult {
    /// R² on the held-out rows.
    pub r2_score: f64,
    /// (feature, coefficient) in feature order.
    pub coefficients: Vec<(String, f64)>,
    pub intercept: f64,
    pub x_test: Vec<Vec<f64>>,
    pub y_test: Vec<f64>,
    pub y_pred: Vec<f64>,
    pub n_train: usize,
}

/// Linear regression of GDP per capita on development indicators.
#[derive(Debug, Clone)]
pub struct GdpPredictor {
    config: TrainerConfig,
    target: String,
    model: Option<LinearModel>,
}

impl Default for GdpPredictor {
    fn default() -> Self {
        Self::new(TrainerConfig::default())
    }
}

impl GdpPredictor {
    pub fn new(config: TrainerConfig) -> Self {
        Self {
            config,
            target: columns::GDP_PER_CAPITA.to_string(),
            model: None,
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Train, logging and swallowing data-quality failures.
    pub fn train(&mut self, table: &Table) -> Option<RegressionResult> {
        match self.try_train(table) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("GDP predictor not trained: {e}");
                None
            }
        }
    }

    /// Fit on 80% of the complete rows and evaluate on the rest.
    pub fn try_train(&mut self, table: &Table) -> Result<RegressionResult> {
        let features = self.config.feature_names();
        let mut required = features.clone();
        required.push(self.target.as_str());

        let missing = missing_columns(table, &required);
        if !missing.is_empty() {
            return Err(AnalysisError::MissingInputData(format!(
                "missing columns: {missing:?}"
            )));
        }

        let rows = complete_rows(table, &required);
        self.config.check_rows(rows.len())?;

        let x = feature_matrix(table, &rows, &features);
        let y: Vec<f64> = rows
            .iter()
            .map(|&i| table.numeric(i, &self.target).unwrap_or(f64::NAN))
            .collect();

        let split = shuffle_split(rows.len(), self.config.test_fraction, self.config.seed);
        let (x_train, y_train) = (take(&x, &split.train), take(&y, &split.train));
        let (x_test, y_test) = (take(&x, &split.test), take(&y, &split.test));

        let model = LinearModel::fit(&x_train, &y_train)?;
        let y_pred = model.predict(&x_test);
        let r2 = r2_score(&y_test, &y_pred);
        info!(
            "GDP predictor trained on {} rows, R² = {r2:.3} on {} held out",
            x_train.len(),
            x_test.len()
        );

        let result = RegressionResult {
            r2_score: r2,
            coefficients: self
                .config
                .features
                .iter()
                .cloned()
                .zip(model.coefficients.iter().copied())
                .collect(),
            intercept: model.intercept,
            x_test,
            y_test,
            y_pred,
            n_train: x_train.len(),
        };
        self.model = Some(model);
        Ok(result)
    }

    /// Predict GDP per capita for one set of named features.
    pub fn predict(&self, features: &FeatureRow) -> Result<f64> {
        let model = self.model.as_ref().ok_or(AnalysisError::ModelNotTrained)?;
        let row = self.config.feature_vector(features)?;
        Ok(model.predict_one(&row))
    }
}
