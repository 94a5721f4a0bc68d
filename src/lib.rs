//! Export market finder.
//!
//! Merges country statistics from independently sourced tables by fuzzy name
//! matching, ranks markets by a weighted Market Opportunity Score and fits two
//! small models (GDP regression, high-potential classifier) over the result.

pub mod analysis;
pub mod analyzer;
pub mod columns;
pub mod data;
pub mod error;
pub mod models;

pub use analysis::recommend::RecommendationRecord;
pub use analyzer::MarketAnalyzer;
pub use data::model::{CellValue, Datasets, Record, Table};
pub use error::{AnalysisError, Result};
pub use models::classifier::{ClassificationResult, MarketClassifier};
pub use models::gdp::{GdpPredictor, RegressionResult};
