use std::cmp::Ordering;
use std::collections::BTreeMap;

use log::{info, warn};
use serde::Serialize;

use crate::columns;
use crate::data::filter::missing_columns;
use crate::data::model::{CellValue, Table};
use crate::error::{AnalysisError, Result};

// ---------------------------------------------------------------------------
// Min-max normalization
// ---------------------------------------------------------------------------

/// Observed (or caller supplied) range of one feature column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureBounds {
    pub min: f64,
    pub max: f64,
}

impl FeatureBounds {
    /// Bounds of the defined values; `None` when every value is missing.
    pub fn fit(values: &[Option<f64>]) -> Option<Self> {
        values.iter().flatten().fold(None, |acc, &v| {
            Some(match acc {
                None => FeatureBounds { min: v, max: v },
                Some(b) => FeatureBounds {
                    min: b.min.min(v),
                    max: b.max.max(v),
                },
            })
        })
    }

    /// Map `value` onto [0, 1]. A degenerate range maps everything to 1.0.
    pub fn scale(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range.abs() < f64::EPSILON {
            1.0
        } else {
            (value - self.min) / range
        }
    }
}

/// One normalized column and the bounds used to produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledColumn {
    pub feature: String,
    pub bounds: Option<FeatureBounds>,
    pub values: Vec<Option<f64>>,
}

/// Min-max scale a column of `table`. Pure: the table is only read.
///
/// With `bounds == None` the bounds are fitted on the column itself.
pub fn min_max_scale(table: &Table, column: &str, bounds: Option<FeatureBounds>) -> ScaledColumn {
    let raw = table.numeric_column(column);
    let bounds = bounds.or_else(|| FeatureBounds::fit(&raw));
    let values = raw
        .iter()
        .map(|v| match (v, bounds) {
            (Some(v), Some(b)) => Some(b.scale(*v)),
            _ => None,
        })
        .collect();
    ScaledColumn {
        feature: column.to_string(),
        bounds,
        values,
    }
}

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Weights of the Market Opportunity Score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MosWeights {
    pub gdp: f64,
    pub literacy: f64,
    pub phones: f64,
    pub birthrate: f64,
}

impl Default for MosWeights {
    fn default() -> Self {
        Self {
            gdp: 0.4,
            literacy: 0.2,
            phones: 0.2,
            birthrate: 0.2,
        }
    }
}

impl MosWeights {
    /// (feature column, weight) pairs in score order.
    pub fn terms(&self) -> [(&'static str, f64); 4] {
        [
            (columns::GDP_PER_CAPITA, self.gdp),
            (columns::LITERACY, self.literacy),
            (columns::PHONES, self.phones),
            (columns::BIRTHRATE, self.birthrate),
        ]
    }
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Descending by score; an undefined score ranks below every defined one.
pub fn compare_scores(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Row order by descending score. Stable: ties keep their input order.
pub fn ranking(scores: &[Option<f64>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| compare_scores(scores[a], scores[b]));
    order
}

// ---------------------------------------------------------------------------
// OpportunityScorer
// ---------------------------------------------------------------------------

/// Scores computed over a table snapshot, not yet written anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct MosScores {
    pub scaled: Vec<ScaledColumn>,
    pub scores: Vec<Option<f64>>,
}

impl MosScores {
    /// Bounds used per feature (features with no defined value are absent).
    pub fn bounds(&self) -> BTreeMap<String, FeatureBounds> {
        self.scaled
            .iter()
            .filter_map(|c| c.bounds.map(|b| (c.feature.clone(), b)))
            .collect()
    }
}

/// Outcome of scoring a table in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub bounds: BTreeMap<String, FeatureBounds>,
    pub scored: usize,
    pub unscored: usize,
}

/// Computes the Market Opportunity Score (MOS) over a merged table.
#[derive(Debug, Clone, Default)]
pub struct OpportunityScorer {
    weights: MosWeights,
    fixed_bounds: BTreeMap<String, FeatureBounds>,
}

impl OpportunityScorer {
    pub fn new(weights: MosWeights) -> Self {
        Self {
            weights,
            fixed_bounds: BTreeMap::new(),
        }
    }

    /// Scale the given features against fixed bounds instead of the bounds
    /// observed in each table.
    pub fn with_bounds(mut self, bounds: BTreeMap<String, FeatureBounds>) -> Self {
        self.fixed_bounds = bounds;
        self
    }

    pub fn weights(&self) -> &MosWeights {
        &self.weights
    }

    /// Compute scaled features and scores without touching the table.
    pub fn compute(&self, table: &Table) -> Result<MosScores> {
        let terms = self.weights.terms();
        let features: Vec<&str> = terms.iter().map(|(f, _)| *f).collect();
        let missing = missing_columns(table, &features);
        if !missing.is_empty() {
            return Err(AnalysisError::MissingInputData(format!(
                "missing MOS features: {missing:?}"
            )));
        }

        let scaled: Vec<ScaledColumn> = features
            .iter()
            .map(|f| min_max_scale(table, f, self.fixed_bounds.get(*f).copied()))
            .collect();

        let scores = (0..table.len())
            .map(|row| {
                scaled
                    .iter()
                    .zip(terms.iter())
                    .try_fold(0.0, |acc, (col, (_, w))| col.values[row].map(|v| acc + w * v))
            })
            .collect();

        Ok(MosScores { scaled, scores })
    }

    /// Score `table` in place and sort it by descending score.
    ///
    /// All derived columns (`<feature>_scaled`, `MOS`) are computed before the
    /// first one is written; on error the table is left exactly as it was.
    pub fn apply(&self, table: &mut Table) -> Result<ScoreSummary> {
        let computed = match self.compute(table) {
            Ok(c) => c,
            Err(e) => {
                warn!("{e}");
                return Err(e);
            }
        };

        for col in &computed.scaled {
            let name = format!("{}{}", col.feature, columns::SCALED_SUFFIX);
            table.set_column(&name, col.values.iter().map(|v| CellValue::from(*v)).collect());
        }
        table.set_column(
            columns::MOS,
            computed.scores.iter().map(|v| CellValue::from(*v)).collect(),
        );
        table.reorder(&ranking(&computed.scores));

        let scored = computed.scores.iter().flatten().count();
        let summary = ScoreSummary {
            bounds: computed.bounds(),
            scored,
            unscored: computed.scores.len() - scored,
        };
        info!(
            "Scored {} markets ({} without complete MOS inputs)",
            summary.scored, summary.unscored
        );
        Ok(summary)
    }
}
