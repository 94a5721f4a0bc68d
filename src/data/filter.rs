use super::model::Table;

// ---------------------------------------------------------------------------
// Validity masks: which rows carry every requested numeric value
// ---------------------------------------------------------------------------

/// Columns from `required` that the table does not have at all.
pub fn missing_columns<'a>(table: &Table, required: &[&'a str]) -> Vec<&'a str> {
    required
        .iter()
        .copied()
        .filter(|col| !table.has_column(col))
        .collect()
}

/// Return indices of rows whose value in every column of `columns` is numeric.
///
/// A row fails the mask when:
/// * The row has no entry for one of the columns
/// * The entry is null, NaN or text
pub fn complete_rows(table: &Table, columns: &[&str]) -> Vec<usize> {
    (0..table.len())
        .filter(|&i| columns.iter().all(|col| table.numeric(i, col).is_some()))
        .collect()
}

/// Numeric feature matrix (one `Vec` per row) for the given row indices.
/// Rows must have passed [`complete_rows`] for the same columns.
pub fn feature_matrix(table: &Table, rows: &[usize], columns: &[&str]) -> Vec<Vec<f64>> {
    rows.iter()
        .map(|&i| {
            columns
                .iter()
                .map(|col| table.numeric(i, col).unwrap_or(f64::NAN))
                .collect()
        })
        .collect()
}
