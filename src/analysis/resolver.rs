use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, info};

use super::fuzzy;
use crate::columns;
use crate::data::model::{CellValue, Record, Table};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How many rows of the right table may join the same left key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Every accepted right row joins its best left key, even when another
    /// right row already matched the same key.
    #[default]
    OneToMany,
    /// Each left key keeps only its highest-scoring right row.
    OneToOne,
}

/// Key columns, acceptance threshold and match policy of the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// Key column of the left (population) table.
    pub left_key: String,
    /// Key column of the right (country statistics) table.
    pub right_key: String,
    /// Matches must score strictly above this value (0–100).
    pub threshold: f64,
    pub policy: MatchPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            left_key: columns::COUNTRY_TERRITORY.to_string(),
            right_key: columns::COUNTRY.to_string(),
            threshold: 80.0,
            policy: MatchPolicy::OneToMany,
        }
    }
}

impl ResolverConfig {
    /// Whether a similarity score is a confident match.
    pub fn accepts(&self, score: f64) -> bool {
        score > self.threshold
    }
}

// ---------------------------------------------------------------------------
// EntityResolver
// ---------------------------------------------------------------------------

/// An accepted right-row → left-key match.
#[derive(Debug, Clone, PartialEq)]
struct KeyMatch {
    right_row: usize,
    key: String,
    score: f64,
}

/// Fuzzy-joins two country tables on their name columns.
#[derive(Debug, Clone, Default)]
pub struct EntityResolver {
    config: ResolverConfig,
}

impl EntityResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Inner-join `left` and `right` on fuzzy-matched country names.
    ///
    /// When one side is absent or empty the other is returned unmerged; two
    /// empty sides give an empty table. Neither input is modified.
    pub fn resolve(&self, left: Option<&Table>, right: Option<&Table>) -> Table {
        let left = left.filter(|t| !t.is_empty());
        let right = right.filter(|t| !t.is_empty());

        let (left, right) = match (left, right) {
            (Some(l), Some(r)) => (l, r),
            (Some(only), None) | (None, Some(only)) => {
                info!("Only one dataset available, skipping country resolution");
                return only.clone();
            }
            (None, None) => {
                info!("No datasets to resolve");
                return Table::default();
            }
        };

        let matches = self.match_rows(left, right);
        let merged = self.join(left, right, &matches);
        info!(
            "Resolved {} merged rows ({} of {} country rows matched)",
            merged.len(),
            matches.len(),
            right.len()
        );
        merged
    }

    /// Best accepted left key for every right row with a non-blank name.
    fn match_rows(&self, left: &Table, right: &Table) -> Vec<KeyMatch> {
        let choices: Vec<&str> = (0..left.len())
            .filter_map(|i| left.text(i, &self.config.left_key))
            .collect();

        let mut matches = Vec::new();
        for row in 0..right.len() {
            let Some(name) = right.text(row, &self.config.right_key) else {
                debug!("Row {row}: blank country name, skipped");
                continue;
            };
            let Some(best) = fuzzy::extract_one(name, choices.iter().copied()) else {
                continue;
            };
            if self.config.accepts(best.score) {
                matches.push(KeyMatch {
                    right_row: row,
                    key: best.choice.to_string(),
                    score: best.score,
                });
            } else {
                debug!(
                    "No confident match for '{name}' (best '{}' at {:.1})",
                    best.choice, best.score
                );
            }
        }

        match self.config.policy {
            MatchPolicy::OneToMany => matches,
            MatchPolicy::OneToOne => keep_best_per_key(matches),
        }
    }

    /// Relational inner join of the matched rows. Output follows left row
    /// order, then right row order.
    fn join(&self, left: &Table, right: &Table, matches: &[KeyMatch]) -> Table {
        let left_key = self.config.left_key.as_str();
        let right_key = self.config.right_key.as_str();

        let mut by_key: HashMap<&str, Vec<usize>> = HashMap::new();
        for m in matches {
            by_key.entry(m.key.as_str()).or_default().push(m.right_row);
        }

        // Overlapping column names get pandas-style suffixes.
        let right_cols: BTreeSet<&str> = right.column_names.iter().map(String::as_str).collect();
        let left_cols: BTreeSet<&str> = left.column_names.iter().map(String::as_str).collect();
        let left_names: Vec<(&str, String)> = left
            .column_names
            .iter()
            .map(|c| (c.as_str(), suffixed(c, right_cols.contains(c.as_str()), "_x")))
            .collect();
        let right_names: Vec<(&str, String)> = right
            .column_names
            .iter()
            .map(|c| (c.as_str(), suffixed(c, left_cols.contains(c.as_str()), "_y")))
            .collect();

        let mut rows = Vec::new();
        for l in 0..left.len() {
            let Some(key) = left.text(l, left_key) else {
                continue;
            };
            let Some(right_rows) = by_key.get(key) else {
                continue;
            };
            for &r in right_rows {
                let mut merged = Record::new();
                copy_cells(&mut merged, &left.rows[l], &left_names, left_key);
                copy_cells(&mut merged, &right.rows[r], &right_names, right_key);
                rows.push(merged);
            }
        }

        let column_names = left_names
            .into_iter()
            .chain(right_names)
            .map(|(_, name)| name)
            .collect();
        Table::new(column_names, rows)
    }
}

fn suffixed(column: &str, overlaps: bool, suffix: &str) -> String {
    if overlaps {
        format!("{column}{suffix}")
    } else {
        column.to_string()
    }
}

/// Copy a source row under its output column names; the key cell is trimmed.
fn copy_cells(dst: &mut Record, src: &Record, names: &[(&str, String)], key_column: &str) {
    for (source, target) in names {
        let Some(value) = src.get(*source) else {
            continue;
        };
        let value = match value {
            CellValue::String(s) if *source == key_column => CellValue::String(s.trim().to_string()),
            other => other.clone(),
        };
        dst.insert(target.clone(), value);
    }
}

/// One match per key: the highest score, earlier right row on ties.
fn keep_best_per_key(matches: Vec<KeyMatch>) -> Vec<KeyMatch> {
    let mut best: BTreeMap<String, KeyMatch> = BTreeMap::new();
    for m in matches {
        match best.get(&m.key) {
            Some(current) if current.score >= m.score => {
                debug!("Dropping duplicate match of row {} to '{}'", m.right_row, m.key);
            }
            _ => {
                best.insert(m.key.clone(), m);
            }
        }
    }
    let mut kept: Vec<KeyMatch> = best.into_values().collect();
    kept.sort_by_key(|m| m.right_row);
    kept
}
