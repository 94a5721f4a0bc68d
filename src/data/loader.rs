use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use log::{info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Datasets, Record, Table};
use crate::columns;

/// File name of the population table inside the data directory.
pub const POPULATION_FILE: &str = "world_population.csv";
/// File name of the country statistics table.
pub const COUNTRIES_FILE: &str = "countries of the world.csv";
/// File name of the combined export table.
pub const EXPORTS_FILE: &str = "combined_exportmap_dataset.csv";

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load every known dataset from `dir`.
///
/// A dataset that cannot be read is logged and left out of the mapping; the
/// analyzer degrades to whatever is present.
pub fn load_all_datasets(dir: &Path) -> Datasets {
    info!("Loading datasets from {}", dir.display());
    let mut data = Datasets::new();

    match load_file(&dir.join(POPULATION_FILE)) {
        Ok(table) => {
            info!("Loaded population data: {} countries", table.len());
            data.insert(columns::POPULATION.to_string(), table);
        }
        Err(e) => warn!("Error loading population data: {e:#}"),
    }

    match load_file(&dir.join(COUNTRIES_FILE)) {
        Ok(mut table) => {
            clean_numeric_columns(&mut table, &columns::COUNTRY_NUMERIC_COLUMNS);
            info!("Loaded country data: {} countries", table.len());
            data.insert(columns::COUNTRIES.to_string(), table);
        }
        Err(e) => warn!("Error loading country data: {e:#}"),
    }

    match load_file(&dir.join(EXPORTS_FILE)) {
        Ok(table) => {
            info!("Loaded export data: {} records", table.len());
            data.insert(columns::EXPORTS.to_string(), table);
        }
        Err(e) => warn!("Error loading export data: {e:#}"),
    }

    data
}

/// Load a single table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one country per line
/// * `.json`    – `[{ "Country": "...", "Birthrate": 9.1, ... }, ...]`
/// * `.parquet` – flat scalar columns (strings, ints, floats, bools)
pub fn load_file(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Convert the listed columns to floats, accepting a decimal comma
/// (`"0,5"` → `0.5`). Unparsable cells become null; absent columns are skipped.
pub fn clean_numeric_columns(table: &mut Table, numeric_columns: &[&str]) {
    for &col in numeric_columns {
        if !table.has_column(col) {
            continue;
        }
        for row in &mut table.rows {
            if let Some(cell) = row.get_mut(col) {
                *cell = to_numeric(cell);
            }
        }
    }
}

fn to_numeric(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::Float(v) => CellValue::Float(*v),
        CellValue::Integer(i) => CellValue::Float(*i as f64),
        CellValue::String(s) => s
            .trim()
            .replace(',', ".")
            .parse::<f64>()
            .map_or(CellValue::Null, CellValue::Float),
        CellValue::Bool(_) | CellValue::Null => CellValue::Null,
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Country": "Germany", "GDP ($ per capita)": 27600, "Region": "WESTERN EUROPE" },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let row: Record = obj
            .iter()
            .map(|(key, val)| (key.trim().to_string(), json_to_cell(val)))
            .collect();
        rows.push(row);
    }

    Ok(Table::from_rows(rows))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names (surrounding whitespace is
/// stripped), then one record per country. Cell types are guessed per cell.
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let row: Record = headers
            .iter()
            .zip(record.iter())
            .map(|(col, value)| (col.clone(), guess_cell_type(value)))
            .collect();
        rows.push(row);
    }

    Ok(Table::new(headers, rows))
}

fn guess_cell_type(s: &str) -> CellValue {
    if s.trim().is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one flat scalar column per statistic.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().trim().to_string())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        for row in 0..batch.num_rows() {
            let mut record = BTreeMap::new();
            for (col_idx, col_name) in headers.iter().enumerate() {
                let value = extract_cell_value(batch.column(col_idx), row);
                record.insert(col_name.clone(), value);
            }
            rows.push(record);
        }
    }

    Ok(Table::new(headers, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell_value(col: &ArrayRef, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float32 => CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64),
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        other => CellValue::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) {
        let mut f = File::create(dir.join(name)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn csv_headers_are_trimmed_and_cells_typed() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "t.csv",
            "Country ,Region,Birthrate,Pop\nChad ,AFRICA,\"45,73\",17\nPeru,,22.1,33\n",
        );
        let table = load_file(&dir.path().join("t.csv")).unwrap();
        assert_eq!(table.column_names, vec!["Country", "Region", "Birthrate", "Pop"]);
        assert_eq!(table.value(0, "Country"), Some(&CellValue::from("Chad ")));
        assert_eq!(table.value(0, "Birthrate"), Some(&CellValue::from("45,73")));
        assert_eq!(table.value(1, "Region"), Some(&CellValue::Null));
        assert_eq!(table.numeric(1, "Birthrate"), Some(22.1));
        assert_eq!(table.value(1, "Pop"), Some(&CellValue::Integer(33)));
    }

    #[test]
    fn numeric_cleanup_accepts_decimal_comma() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "t.csv",
            "Country,Birthrate,Literacy (%)\nChad,\"45,73\",n/a\nPeru,22,\n",
        );
        let mut table = load_file(&dir.path().join("t.csv")).unwrap();
        clean_numeric_columns(&mut table, &["Birthrate", "Literacy (%)", "Absent"]);
        assert_eq!(table.numeric(0, "Birthrate"), Some(45.73));
        assert_eq!(table.value(1, "Birthrate"), Some(&CellValue::Float(22.0)));
        assert_eq!(table.value(0, "Literacy (%)"), Some(&CellValue::Null));
        assert!(!table.has_column("Absent"));
    }

    #[test]
    fn json_records_load() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "t.json",
            r#"[{"Country": "Chad", "Birthrate": 45.7, "Rank": 3}, {"Country": null}]"#,
        );
        let table = load_file(&dir.path().join("t.json")).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.numeric(0, "Birthrate"), Some(45.7));
        assert_eq!(table.value(0, "Rank"), Some(&CellValue::Integer(3)));
        assert_eq!(table.value(1, "Country"), Some(&CellValue::Null));
        assert_eq!(table.value(1, "Rank"), None);
    }

    #[test]
    fn json_must_be_an_array() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "t.json", r#"{"Country": "Chad"}"#);
        assert!(load_file(&dir.path().join("t.json")).is_err());
    }

    #[test]
    fn parquet_flat_columns_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.parquet");
        let schema = Arc::new(Schema::new(vec![
            Field::new("Country/Territory", DataType::Utf8, true),
            Field::new("2022 Population", DataType::Int64, false),
            Field::new("Growth Rate", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("Chad"), None])),
                Arc::new(Int64Array::from(vec![17_723_315, 34_049_588])),
                Arc::new(Float64Array::from(vec![Some(1.03), None])),
            ],
        )
        .unwrap();
        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.column_names[0], "Country/Territory");
        assert_eq!(table.text(0, "Country/Territory"), Some("Chad"));
        assert_eq!(table.value(1, "Country/Territory"), Some(&CellValue::Null));
        assert_eq!(table.numeric(1, "2022 Population"), Some(34_049_588.0));
        assert_eq!(table.numeric(1, "Growth Rate"), None);
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        assert!(load_file(Path::new("countries.xlsx")).is_err());
    }

    #[test]
    fn missing_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            COUNTRIES_FILE,
            "Country,GDP ($ per capita)\nChad,\"1200,5\"\n",
        );
        let data = load_all_datasets(dir.path());
        assert_eq!(data.len(), 1);
        let countries = &data[columns::COUNTRIES];
        assert_eq!(countries.numeric(0, columns::GDP_PER_CAPITA), Some(1200.5));
    }
}
