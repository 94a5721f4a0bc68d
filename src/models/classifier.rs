use log::{info, warn};
use serde::Serialize;

use super::logistic::{LogisticConfig, LogisticModel};
use super::metrics::{accuracy, auc, confusion_matrix, roc_curve, ClassificationReport};
use super::split::stratified_split;
use super::{take, FeatureRow, TrainerConfig};
use crate::columns;
use crate::data::filter::{complete_rows, feature_matrix, missing_columns};
use crate::data::model::Table;
use crate::error::{AnalysisError, Result};

/// Evaluation of one market classifier fit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub accuracy: f64,
    /// `[actual][predicted]`, label order 0 (low MOS), 1 (high MOS).
    pub confusion_matrix: [[usize; 2]; 2],
    pub report: ClassificationReport,
    /// Text rendering of `report`.
    pub classification_report: String,
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    pub roc_auc: f64,
    pub coefficients: Vec<(String, f64)>,
    pub intercept: f64,
    /// Median MOS used as the label threshold.
    pub median_mos: f64,
    pub y_test: Vec<u8>,
    pub y_pred: Vec<u8>,
    pub y_prob: Vec<f64>,
}

/// Median of the defined values; `None` when there are none.
pub fn median(values: &[Option<f64>]) -> Option<f64> {
    let mut defined: Vec<f64> = values.iter().flatten().copied().collect();
    if defined.is_empty() {
        return None;
    }
    defined.sort_by(f64::total_cmp);
    let mid = defined.len() / 2;
    Some(if defined.len() % 2 == 0 {
        (defined[mid - 1] + defined[mid]) / 2.0
    } else {
        defined[mid]
    })
}

/// Label 1 for a score at or above `threshold`; undefined scores are 0.
pub fn high_potential_labels(scores: &[Option<f64>], threshold: f64) -> Vec<u8> {
    scores
        .iter()
        .map(|s| u8::from(s.is_some_and(|s| s >= threshold)))
        .collect()
}

/// Logistic regression separating high- from low-MOS markets.
#[derive(Debug, Clone, Default)]
pub struct MarketClassifier {
    config: TrainerConfig,
    solver: LogisticConfig,
    model: Option<LogisticModel>,
}

impl MarketClassifier {
    pub fn new(config: TrainerConfig, solver: LogisticConfig) -> Self {
        Self {
            config,
            solver,
            model: None,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Train, logging and swallowing data-quality failures.
    pub fn train(&mut self, table: &Table) -> Option<ClassificationResult> {
        match self.try_train(table) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!("Market classifier not trained: {e}");
                None
            }
        }
    }

    /// Label rows against the median MOS, fit on a stratified 80% and
    /// evaluate on the rest.
    pub fn try_train(&mut self, table: &Table) -> Result<ClassificationResult> {
        if !table.has_column(columns::MOS) {
            return Err(AnalysisError::MissingInputData(
                "MOS not calculated, cannot train classifier".to_string(),
            ));
        }
        let features = self.config.feature_names();
        let missing = missing_columns(table, &features);
        if !missing.is_empty() {
            return Err(AnalysisError::MissingInputData(format!(
                "missing columns: {missing:?}"
            )));
        }

        let scores = table.numeric_column(columns::MOS);
        let median_mos = median(&scores).ok_or_else(|| {
            AnalysisError::MissingInputData("no market has a defined MOS".to_string())
        })?;
        let labels = high_potential_labels(&scores, median_mos);

        let rows = complete_rows(table, &features);
        self.config.check_rows(rows.len())?;

        let x = feature_matrix(table, &rows, &features);
        let y: Vec<u8> = rows.iter().map(|&i| labels[i]).collect();

        let split = stratified_split(&y, self.config.test_fraction, self.config.seed);
        let (x_train, y_train) = (take(&x, &split.train), take(&y, &split.train));
        let (x_test, y_test) = (take(&x, &split.test), take(&y, &split.test));

        let model = LogisticModel::fit(&x_train, &y_train, &self.solver)?;
        let y_pred: Vec<u8> = x_test.iter().map(|row| model.predict(row)).collect();
        let y_prob: Vec<f64> = x_test.iter().map(|row| model.predict_proba(row)).collect();

        let roc = roc_curve(&y_test, &y_prob);
        let roc_auc = auc(&roc.fpr, &roc.tpr);
        let report = ClassificationReport::new(&y_test, &y_pred);
        let acc = accuracy(&y_test, &y_pred);
        info!(
            "Market classifier trained on {} rows ({} iterations), accuracy = {acc:.3}, AUC = {roc_auc:.3}",
            x_train.len(),
            model.n_iter
        );

        let result = ClassificationResult {
            accuracy: acc,
            confusion_matrix: confusion_matrix(&y_test, &y_pred),
            classification_report: report.to_string(),
            report,
            fpr: roc.fpr,
            tpr: roc.tpr,
            roc_auc,
            coefficients: self
                .config
                .features
                .iter()
                .cloned()
                .zip(model.coefficients.iter().copied())
                .collect(),
            intercept: model.intercept,
            median_mos,
            y_test,
            y_pred,
            y_prob,
        };
        self.model = Some(model);
        Ok(result)
    }

    /// Probability that a market with these features is high-potential.
    pub fn predict_probability(&self, features: &FeatureRow) -> Result<f64> {
        let model = self.model.as_ref().ok_or(AnalysisError::ModelNotTrained)?;
        let row = self.config.feature_vector(features)?;
        Ok(model.predict_proba(&row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{CellValue, Record};

    /// Markets whose MOS rises with literacy and phones.
    fn scored_table(n: usize) -> Table {
        let rows = (0..n)
            .map(|i| {
                let lit = 30.0 + (i * 37 % 70) as f64;
                let phones = 10.0 + (i * 53 % 97) as f64 * 8.0;
                let birth = 8.0 + (i * 7 % 40) as f64;
                let infant = 2.0 + (i * 29 % 90) as f64;
                let mos = (lit / 100.0 + phones / 800.0) / 2.0;
                let mut r = Record::new();
                r.insert(columns::COUNTRY_TERRITORY.to_string(), CellValue::String(format!("C{i}")));
                r.insert(columns::LITERACY.to_string(), lit.into());
                r.insert(columns::PHONES.to_string(), phones.into());
                r.insert(columns::BIRTHRATE.to_string(), birth.into());
                r.insert(columns::INFANT_MORTALITY.to_string(), infant.into());
                r.insert(columns::MOS.to_string(), mos.into());
                r
            })
            .collect();
        Table::from_rows(rows)
    }

    fn features(lit: f64, phones: f64) -> FeatureRow {
        [
            (columns::LITERACY, lit),
            (columns::PHONES, phones),
            (columns::BIRTHRATE, 20.0),
            (columns::INFANT_MORTALITY, 40.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    #[test]
    fn median_of_defined_values() {
        assert_eq!(median(&[Some(3.0), None, Some(1.0), Some(2.0)]), Some(2.0));
        assert_eq!(median(&[Some(4.0), Some(1.0), Some(2.0), Some(3.0)]), Some(2.5));
        assert_eq!(median(&[None]), None);
    }

    #[test]
    fn labels_include_the_median() {
        let labels = high_potential_labels(&[Some(0.2), Some(0.5), None, Some(0.9)], 0.5);
        assert_eq!(labels, vec![0, 1, 0, 1]);
    }

    #[test]
    fn requires_scores() {
        let mut table = scored_table(20);
        for row in &mut table.rows {
            row.remove(columns::MOS);
        }
        table.column_names.retain(|c| c != columns::MOS);
        let mut classifier = MarketClassifier::default();
        assert!(classifier.train(&table).is_none());
        assert!(!classifier.is_trained());
    }

    #[test]
    fn predicting_before_training_fails() {
        assert_eq!(
            MarketClassifier::default().predict_probability(&features(90.0, 500.0)),
            Err(AnalysisError::ModelNotTrained)
        );
    }

    #[test]
    fn too_few_rows_gives_no_result() {
        let mut table = scored_table(12);
        for i in 0..3 {
            table.rows[i].insert(columns::INFANT_MORTALITY.to_string(), CellValue::Null);
        }
        let mut classifier = MarketClassifier::default();
        assert!(matches!(
            classifier.try_train(&table),
            Err(AnalysisError::InsufficientTrainingData { required: 10, actual: 9 })
        ));
    }

    #[test]
    fn trains_and_evaluates() {
        let mut classifier = MarketClassifier::default();
        let result = classifier.train(&scored_table(60)).unwrap();

        assert_eq!(result.y_test.len(), 12);
        // stratified: the held-out rows keep the roughly even label split
        let positives = result.y_test.iter().filter(|&&l| l == 1).count();
        assert!((5..=7).contains(&positives));

        let cm = result.confusion_matrix;
        assert_eq!(cm[0][0] + cm[0][1] + cm[1][0] + cm[1][1], 12);
        let correct = (cm[0][0] + cm[1][1]) as f64 / 12.0;
        assert!((result.accuracy - correct).abs() < 1e-12);
        assert!(result.accuracy >= 0.75);
        assert!(result.roc_auc >= 0.8);
        assert_eq!(result.fpr.len(), result.tpr.len());
        assert!(result.classification_report.contains("weighted avg"));
        assert!(result.y_prob.iter().all(|p| (0.0..=1.0).contains(p)));

        let high = classifier.predict_probability(&features(99.0, 780.0)).unwrap();
        let low = classifier.predict_probability(&features(31.0, 20.0)).unwrap();
        assert!(high > 0.5);
        assert!(low < 0.5);
    }

    #[test]
    fn training_is_reproducible() {
        let table = scored_table(40);
        let a = MarketClassifier::default().train(&table).unwrap();
        let b = MarketClassifier::default().train(&table).unwrap();
        assert_eq!(a.y_test, b.y_test);
        assert_eq!(a.y_prob, b.y_prob);
    }
}
