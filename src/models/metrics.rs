//! Evaluation metrics for the regression and classification models.

use std::fmt;

use log::warn;
use serde::Serialize;

/// Coefficient of determination.
///
/// NaN for fewer than two samples. A constant target scores 1.0 when it is
/// predicted exactly, otherwise 0.0.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.len() < 2 {
        warn!("R² is not well-defined with fewer than two samples");
        return f64::NAN;
    }
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Fraction of exact label matches.
pub fn accuracy(actual: &[u8], predicted: &[u8]) -> f64 {
    if actual.is_empty() {
        return f64::NAN;
    }
    let hits = actual.iter().zip(predicted).filter(|(a, p)| a == p).count();
    hits as f64 / actual.len() as f64
}

/// 2×2 confusion matrix: `m[actual][predicted]`, label order 0, 1.
pub fn confusion_matrix(actual: &[u8], predicted: &[u8]) -> [[usize; 2]; 2] {
    let mut m = [[0usize; 2]; 2];
    for (&a, &p) in actual.iter().zip(predicted) {
        m[usize::from(a.min(1))][usize::from(p.min(1))] += 1;
    }
    m
}

// ---------------------------------------------------------------------------
// Classification report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class precision/recall/F1 with accuracy and averages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    /// Indexed by label (0, 1).
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn safe_div(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

impl ClassificationReport {
    pub fn new(actual: &[u8], predicted: &[u8]) -> Self {
        let m = confusion_matrix(actual, predicted);
        let classes: Vec<ClassMetrics> = (0..2)
            .map(|c| {
                let tp = m[c][c] as f64;
                let predicted_c = (m[0][c] + m[1][c]) as f64;
                let support = m[c][0] + m[c][1];
                let precision = safe_div(tp, predicted_c);
                let recall = safe_div(tp, support as f64);
                ClassMetrics {
                    precision,
                    recall,
                    f1: safe_div(2.0 * precision * recall, precision + recall),
                    support,
                }
            })
            .collect();

        let total: usize = classes.iter().map(|c| c.support).sum();
        let avg = |weight: &dyn Fn(&ClassMetrics) -> f64, norm: f64| ClassMetrics {
            precision: safe_div(classes.iter().map(|c| weight(c) * c.precision).sum(), norm),
            recall: safe_div(classes.iter().map(|c| weight(c) * c.recall).sum(), norm),
            f1: safe_div(classes.iter().map(|c| weight(c) * c.f1).sum(), norm),
            support: total,
        };
        let macro_avg = avg(&|_| 1.0, classes.len() as f64);
        let weighted_avg = avg(&|c| c.support as f64, total as f64);

        ClassificationReport {
            accuracy: accuracy(actual, predicted),
            classes,
            macro_avg,
            weighted_avg,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const W: usize = 12;
        writeln!(
            f,
            "{:>W$}  {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for (label, c) in self.classes.iter().enumerate() {
            writeln!(
                f,
                "{:>W$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>W$}  {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.macro_avg.support
        )?;
        for (name, c) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>W$}  {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, c.precision, c.recall, c.f1, c.support
            )?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ROC
// ---------------------------------------------------------------------------

/// Receiver operating characteristic points, starting at (0, 0).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RocCurve {
    pub fpr: Vec<f64>,
    pub tpr: Vec<f64>,
    /// Decreasing score thresholds; the first is +∞.
    pub thresholds: Vec<f64>,
}

/// ROC curve of `scores` against binary `labels`.
///
/// One point per distinct score; points lying on a straight segment between
/// their neighbours are dropped. With no positives (or no negatives) the
/// corresponding rate is NaN.
pub fn roc_curve(labels: &[u8], scores: &[f64]) -> RocCurve {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    // cumulative true/false positives at each distinct threshold
    let mut tps: Vec<f64> = Vec::new();
    let mut fps: Vec<f64> = Vec::new();
    let mut thresholds: Vec<f64> = Vec::new();
    let (mut tp, mut fp) = (0.0, 0.0);
    for (k, &i) in order.iter().enumerate() {
        if labels[i] == 1 {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_value = order
            .get(k + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_value {
            tps.push(tp);
            fps.push(fp);
            thresholds.push(scores[i]);
        }
    }

    if tps.len() > 2 {
        let last = tps.len() - 1;
        let keep: Vec<usize> = (0..tps.len())
            .filter(|&i| {
                i == 0
                    || i == last
                    || fps[i + 1] - 2.0 * fps[i] + fps[i - 1] != 0.0
                    || tps[i + 1] - 2.0 * tps[i] + tps[i - 1] != 0.0
            })
            .collect();
        tps = keep.iter().map(|&i| tps[i]).collect();
        fps = keep.iter().map(|&i| fps[i]).collect();
        thresholds = keep.iter().map(|&i| thresholds[i]).collect();
    }

    tps.insert(0, 0.0);
    fps.insert(0, 0.0);
    thresholds.insert(0, f64::INFINITY);

    let normalise = |v: &[f64], what: &str| -> Vec<f64> {
        let total = v.last().copied().unwrap_or(0.0);
        if total <= 0.0 {
            warn!("No {what} samples in y_true, rate is undefined");
            vec![f64::NAN; v.len()]
        } else {
            v.iter().map(|x| x / total).collect()
        }
    };

    RocCurve {
        fpr: normalise(&fps, "negative"),
        tpr: normalise(&tps, "positive"),
        thresholds,
    }
}

/// Area under a curve by the trapezoidal rule.
pub fn auc(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[1] + ys[0]) / 2.0)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn r2_perfect_and_mean_predictions() {
        let actual = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(r2_score(&actual, &actual), 1.0);
        assert_eq!(r2_score(&actual, &[2.5; 4]), 0.0);
        assert!(r2_score(&[1.0], &[1.0]).is_nan());
        assert_eq!(r2_score(&[2.0, 2.0], &[2.0, 2.0]), 1.0);
        assert_eq!(r2_score(&[2.0, 2.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn confusion_rows_are_actual() {
        let actual: [u8; 5] = [0, 0, 1, 1, 1];
        let predicted: [u8; 5] = [0, 1, 1, 1, 0];
        assert_eq!(confusion_matrix(&actual, &predicted), [[1, 1], [1, 2]]);
        assert!((accuracy(&actual, &predicted) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn report_metrics_and_layout() {
        let actual: [u8; 6] = [0, 0, 0, 1, 1, 1];
        let predicted: [u8; 6] = [0, 0, 1, 1, 1, 1];
        let report = ClassificationReport::new(&actual, &predicted);
        assert!((report.classes[0].precision - 1.0).abs() < 1e-12);
        assert!((report.classes[0].recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.classes[1].precision - 0.75).abs() < 1e-12);
        assert_eq!(report.classes[1].support, 3);
        assert_eq!(report.weighted_avg.support, 6);

        let text = report.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            format!("{}precision    recall  f1-score   support", " ".repeat(14))
        );
        assert_eq!(
            lines[2],
            format!("{:>12}{:>11}{:>10}{:>10}{:>10}", "0", "1.00", "0.67", "0.80", "3")
        );
        assert_eq!(
            lines[5],
            format!("{:>12}{:>31}{:>10}", "accuracy", "0.83", "6")
        );
        assert!(lines[7].starts_with("weighted avg"));
    }

    #[test]
    fn zero_predictions_give_zero_precision() {
        let report = ClassificationReport::new(&[0, 1], &[0, 0]);
        assert_eq!(report.classes[1].precision, 0.0);
        assert_eq!(report.classes[1].f1, 0.0);
    }

    #[test]
    fn perfect_ranking_has_unit_auc() {
        let roc = roc_curve(&[0, 0, 1, 1], &[0.1, 0.4, 0.35, 0.8]);
        assert_eq!(roc.fpr, vec![0.0, 0.0, 0.5, 0.5, 1.0]);
        assert_eq!(roc.tpr, vec![0.0, 0.5, 0.5, 1.0, 1.0]);
        assert_eq!(roc.thresholds[0], f64::INFINITY);
        assert!((auc(&roc.fpr, &roc.tpr) - 0.75).abs() < 1e-12);

        let perfect = roc_curve(&[0, 0, 1, 1], &[0.1, 0.2, 0.8, 0.9]);
        assert!((auc(&perfect.fpr, &perfect.tpr) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn collinear_points_are_dropped() {
        // the middle positive sits on the straight run from 1/3 to 1
        let roc = roc_curve(&[1, 1, 1, 0], &[0.9, 0.8, 0.7, 0.1]);
        assert_eq!(roc.tpr, vec![0.0, 1.0 / 3.0, 1.0, 1.0]);
        assert_eq!(roc.fpr, vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(roc.thresholds[1..], [0.9, 0.7, 0.1]);
    }

    #[test]
    fn tied_scores_share_a_point() {
        let roc = roc_curve(&[0, 1], &[0.5, 0.5]);
        assert_eq!(roc.fpr, vec![0.0, 1.0]);
        assert_eq!(roc.tpr, vec![0.0, 1.0]);
        assert!((auc(&roc.fpr, &roc.tpr) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn missing_class_gives_nan_rate() {
        let roc = roc_curve(&[1, 1], &[0.3, 0.6]);
        assert!(roc.fpr.iter().all(|v| v.is_nan()));
    }
}
