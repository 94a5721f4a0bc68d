use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a country table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes found in the source CSVs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        CellValue::Float(v)
    }
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        CellValue::Integer(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        CellValue::String(v.to_string())
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CellValue::Null, Into::into)
    }
}

impl CellValue {
    /// Interpret the cell as a number. NaN and non-numeric cells are missing.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_finite() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Borrow the text of a string cell.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(v) => v.is_nan(),
            _ => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one row of a table
// ---------------------------------------------------------------------------

/// One row: column_name → value. Absent keys read as missing.
pub type Record = BTreeMap<String, CellValue>;

// ---------------------------------------------------------------------------
// Table – a named dataset or the merged market table
// ---------------------------------------------------------------------------

/// Named tables handed over by the loader: dataset_name → table.
pub type Datasets = BTreeMap<String, Table>;

/// A row-oriented table with an ordered column list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    /// Column names in display order.
    pub column_names: Vec<String>,
    /// All rows.
    pub rows: Vec<Record>,
}

impl Table {
    /// Build a table with an explicit column order (CSV header order, merge order).
    pub fn new(column_names: Vec<String>, rows: Vec<Record>) -> Self {
        Table { column_names, rows }
    }

    /// Build a table whose columns are the sorted union of the row keys.
    pub fn from_rows(rows: Vec<Record>) -> Self {
        let columns: BTreeSet<String> = rows.iter().flat_map(|r| r.keys().cloned()).collect();
        Table {
            column_names: columns.into_iter().collect(),
            rows,
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Cell at (row, column), if present.
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Numeric cell at (row, column); missing, null and text cells give `None`.
    pub fn numeric(&self, row: usize, column: &str) -> Option<f64> {
        self.value(row, column).and_then(CellValue::as_f64)
    }

    /// Trimmed, non-blank text at (row, column).
    pub fn text(&self, row: usize, column: &str) -> Option<&str> {
        self.value(row, column)
            .and_then(CellValue::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// A whole column read as numbers.
    pub fn numeric_column(&self, column: &str) -> Vec<Option<f64>> {
        (0..self.len()).map(|i| self.numeric(i, column)).collect()
    }

    /// Overwrite (or append) a column. `values` must have one entry per row.
    pub fn set_column(&mut self, column: &str, values: Vec<CellValue>) {
        debug_assert_eq!(values.len(), self.rows.len());
        if !self.has_column(column) {
            self.column_names.push(column.to_string());
        }
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(column.to_string(), value);
        }
    }

    /// Rearrange rows into the given order. `order` must be a permutation.
    pub fn reorder(&mut self, order: &[usize]) {
        let mut taken: Vec<Option<Record>> = self.rows.drain(..).map(Some).collect();
        self.rows = order.iter().filter_map(|&i| taken[i].take()).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, CellValue)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn nan_and_text_are_not_numeric() {
        assert_eq!(CellValue::Float(f64::NAN).as_f64(), None);
        assert_eq!(CellValue::from("12").as_f64(), None);
        assert_eq!(CellValue::Integer(12).as_f64(), Some(12.0));
        assert!(CellValue::Float(f64::NAN).is_null());
    }

    #[test]
    fn text_is_trimmed_and_blank_is_missing() {
        let table = Table::from_rows(vec![
            row(&[("Country", CellValue::from("  Chad "))]),
            row(&[("Country", CellValue::from("   "))]),
        ]);
        assert_eq!(table.text(0, "Country"), Some("Chad"));
        assert_eq!(table.text(1, "Country"), None);
        assert_eq!(table.text(2, "Country"), None);
    }

    #[test]
    fn set_column_appends_once() {
        let mut table = Table::from_rows(vec![row(&[("a", 1i64.into())]), row(&[])]);
        table.set_column("b", vec![1.0.into(), CellValue::Null]);
        table.set_column("b", vec![2.0.into(), 3.0.into()]);
        assert_eq!(table.column_names, vec!["a", "b"]);
        assert_eq!(table.numeric_column("b"), vec![Some(2.0), Some(3.0)]);
    }

    #[test]
    fn reorder_permutes_rows() {
        let mut table = Table::from_rows(
            (0..3i64).map(|i| row(&[("i", i.into())])).collect(),
        );
        table.reorder(&[2, 0, 1]);
        assert_eq!(table.numeric_column("i"), vec![Some(2.0), Some(0.0), Some(1.0)]);
    }
}
