use serde::Serialize;

use super::scorer::compare_scores;
use crate::columns;
use crate::data::model::Table;

/// Placeholder for absent text fields.
pub const UNKNOWN: &str = "Unknown";

/// A ranked market, flattened for reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationRecord {
    pub country: String,
    pub mos_score: f64,
    pub population: u64,
    pub gdp_per_capita: f64,
    pub literacy: f64,
    pub birthrate: f64,
    pub region: String,
    pub continent: String,
}

impl RecommendationRecord {
    /// Project one table row, defaulting every absent field.
    pub fn from_row(table: &Table, row: usize) -> Self {
        let text = |col: &str| table.text(row, col).unwrap_or(UNKNOWN).to_string();
        let number = |col: &str| table.numeric(row, col).unwrap_or(0.0);

        let country = table
            .text(row, columns::COUNTRY_TERRITORY)
            .or_else(|| table.text(row, columns::COUNTRY))
            .unwrap_or(UNKNOWN)
            .to_string();

        RecommendationRecord {
            country,
            mos_score: number(columns::MOS),
            population: number(columns::POPULATION_2022).max(0.0).round() as u64,
            gdp_per_capita: number(columns::GDP_PER_CAPITA),
            literacy: number(columns::LITERACY),
            birthrate: number(columns::BIRTHRATE),
            region: text(columns::REGION),
            continent: text(columns::CONTINENT),
        }
    }
}

/// The `top_n` rows with the highest defined score.
///
/// Reads the score column directly, so the table's current row order does not
/// matter. Without a score column the first `top_n` rows are returned.
pub fn top_markets(table: &Table, top_n: usize) -> Vec<RecommendationRecord> {
    if table.is_empty() || top_n == 0 {
        return Vec::new();
    }

    let rows: Vec<usize> = if table.has_column(columns::MOS) {
        let mut scored: Vec<(usize, f64)> = (0..table.len())
            .filter_map(|i| table.numeric(i, columns::MOS).map(|s| (i, s)))
            .collect();
        scored.sort_by(|a, b| compare_scores(Some(a.1), Some(b.1)));
        scored.into_iter().take(top_n).map(|(i, _)| i).collect()
    } else {
        (0..table.len().min(top_n)).collect()
    };

    rows.into_iter()
        .map(|i| RecommendationRecord::from_row(table, i))
        .collect()
}
