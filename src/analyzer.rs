use log::warn;

use crate::analysis::recommend::{top_markets, RecommendationRecord};
use crate::analysis::resolver::EntityResolver;
use crate::analysis::scorer::{OpportunityScorer, ScoreSummary};
use crate::columns;
use crate::data::model::{Datasets, Table};

// ---------------------------------------------------------------------------
// Analyzer state
// ---------------------------------------------------------------------------

/// One pipeline run over a snapshot of the loaded datasets.
///
/// Owns the merged market table and augments it in place; trainers borrow it
/// read-only through [`MarketAnalyzer::merged_data`].
pub struct MarketAnalyzer {
    /// Merged table (None when no dataset was supplied at all).
    merged: Option<Table>,

    scorer: OpportunityScorer,

    /// Last diagnostic from resolution or scoring.
    status_message: Option<String>,
}

impl MarketAnalyzer {
    /// Resolve `population` against `countries` with default settings.
    pub fn new(data: &Datasets) -> Self {
        Self::with_components(data, &EntityResolver::default(), OpportunityScorer::default())
    }

    pub fn with_components(
        data: &Datasets,
        resolver: &EntityResolver,
        scorer: OpportunityScorer,
    ) -> Self {
        let mut status_message = None;
        let merged = if data.is_empty() {
            status_message = Some("no datasets loaded".to_string());
            warn!("No datasets loaded, nothing to analyze");
            None
        } else {
            let population = data.get(columns::POPULATION);
            let countries = data.get(columns::COUNTRIES);
            if population.map_or(true, Table::is_empty) || countries.map_or(true, Table::is_empty) {
                let msg = "population or country dataset missing, tables not merged";
                warn!("{msg}");
                status_message = Some(msg.to_string());
            }
            Some(resolver.resolve(population, countries))
        };

        Self {
            merged,
            scorer,
            status_message,
        }
    }

    /// The merged (and, once scored, sorted) table.
    pub fn merged_data(&self) -> Option<&Table> {
        self.merged.as_ref()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn is_scored(&self) -> bool {
        self.merged
            .as_ref()
            .is_some_and(|t| t.has_column(columns::MOS))
    }

    /// Score the merged table in place. `None` when there is nothing to score
    /// or a required column is missing; the table is then left unchanged.
    pub fn calculate_mos(&mut self) -> Option<ScoreSummary> {
        let table = self.merged.as_mut().filter(|t| !t.is_empty())?;
        match self.scorer.apply(table) {
            Ok(summary) => {
                self.status_message = None;
                Some(summary)
            }
            Err(e) => {
                self.status_message = Some(e.to_string());
                None
            }
        }
    }

    /// Top `top_n` markets by MOS, scoring first if needed.
    pub fn market_recommendations(&mut self, top_n: usize) -> Vec<RecommendationRecord> {
        if self.merged.as_ref().map_or(true, Table::is_empty) {
            return Vec::new();
        }
        if !self.is_scored() {
            self.calculate_mos();
        }
        self.merged
            .as_ref()
            .map(|t| top_markets(t, top_n))
            .unwrap_or_default()
    }
}
