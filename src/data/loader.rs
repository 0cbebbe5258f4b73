use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type, UInt16Type,
    UInt32Type, UInt64Type, UInt8Type,
};
use arrow::util::display::array_value_to_string;
use calamine::{open_workbook_from_rs, Data, ExcelDateTime, Reader, Xlsx};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Column, Dataset, Value};
use crate::error::LoadError;

// ---------------------------------------------------------------------------
// File formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Json,
    Parquet,
}

impl FileFormat {
    /// Resolve the format from a file name's extension (case-insensitive).
    pub fn from_file_name(name: &str) -> Result<Self, LoadError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" => Ok(FileFormat::Xlsx),
            "json" => Ok(FileFormat::Json),
            "parquet" => Ok(FileFormat::Parquet),
            "" => Err(LoadError::UnsupportedType(format!("'{name}' has no extension"))),
            other => Err(LoadError::UnsupportedType(format!(".{other}"))),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileFormat::Csv => "CSV",
            FileFormat::Xlsx => "XLSX",
            FileFormat::Json => "JSON",
            FileFormat::Parquet => "Parquet",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Parse raw file bytes of a known format into a [`Dataset`].
pub fn load_bytes(format: FileFormat, bytes: &[u8]) -> Result<Dataset, LoadError> {
    let parsed = match format {
        FileFormat::Csv => load_csv(bytes),
        FileFormat::Xlsx => load_xlsx(bytes),
        FileFormat::Json => load_json(bytes),
        FileFormat::Parquet => load_parquet(bytes),
    };
    parsed.map_err(|reason| LoadError::Parse { format, reason })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Header row with column names, one record per row.
fn load_csv(bytes: &[u8]) -> Result<Dataset> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, cells) in columns.iter_mut().enumerate() {
            cells.push(guess_value_type(record.get(col_idx).unwrap_or("")));
        }
    }

    Dataset::from_columns(
        headers
            .into_iter()
            .zip(columns)
            .map(|(name, values)| Column::new(name, values))
            .collect(),
    )
}

fn guess_value_type(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Integer(i);
    }
    // `f64::from_str` also takes "nan", "inf" and "infinity", which are words here.
    if s.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(f) = s.parse::<f64>() {
            return Value::Float(f);
        }
    }
    match s {
        "true" | "True" | "TRUE" => Value::Bool(true),
        "false" | "False" | "FALSE" => Value::Bool(false),
        _ => Value::String(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Accepted layouts:
///
/// ```json
/// [{ "region": "north", "revenue": 10.5 }, ...]          // records
/// { "region": ["north", ...], "revenue": [10.5, ...] }   // columns as arrays
/// { "region": {"0": "north"}, "revenue": {"0": 10.5} }   // columns keyed by row
/// ```
fn load_json(bytes: &[u8]) -> Result<Dataset> {
    let root: JsonValue = serde_json::from_slice(bytes).context("parsing JSON")?;

    match root {
        JsonValue::Array(records) => json_records(&records),
        JsonValue::Object(columns) => {
            let mut out = Vec::with_capacity(columns.len());
            for (name, cells) in columns {
                let values = match cells {
                    JsonValue::Array(items) => items.iter().map(json_to_value).collect(),
                    JsonValue::Object(by_row) => by_row.values().map(json_to_value).collect(),
                    other => bail!("column '{name}' must be an array or object, got {other}"),
                };
                out.push(Column::new(name, values));
            }
            Dataset::from_columns(out)
        }
        _ => bail!("Expected a JSON array of records or an object of columns"),
    }
}

fn json_records(records: &[JsonValue]) -> Result<Dataset> {
    // Column order is the order of first appearance across all records.
    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let values = records
                .iter()
                .map(|rec| rec.get(&name).map(json_to_value).unwrap_or(Value::Null))
                .collect();
            Column::new(name, values)
        })
        .collect();

    Dataset::from_columns(columns)
}

fn json_to_value(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// XLSX loader
// ---------------------------------------------------------------------------

/// First worksheet; first row holds the headers.
fn load_xlsx(bytes: &[u8]) -> Result<Dataset> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).context("opening workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Dataset::from_columns(Vec::new());
    };

    let headers: Vec<String> = header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Data::String(s) => s.clone(),
            Data::Empty => format!("unnamed: {i}"),
            other => other.to_string(),
        })
        .collect();

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); headers.len()];
    for row in rows {
        for (col_idx, cells) in columns.iter_mut().enumerate() {
            cells.push(row.get(col_idx).map(cell_to_value).unwrap_or(Value::Null));
        }
    }

    Dataset::from_columns(
        headers
            .into_iter()
            .zip(columns)
            .map(|(name, values)| Column::new(name, values))
            .collect(),
    )
}

fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::Integer(*i),
        Data::Float(f) => Value::Float(*f),
        Data::String(s) => Value::String(s.clone()),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) if dt.is_datetime() => excel_date(dt),
        Data::DateTime(dt) => Value::Float(dt.as_f64()),
        Data::DateTimeIso(s) => Value::Date(s.clone()),
        Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(_) | Data::Empty => Value::Null,
    }
}

/// Serial dates become text in the same shape Arrow prints dates and
/// timestamps; whole-day serials drop the time part.
fn excel_date(dt: &ExcelDateTime) -> Value {
    let pattern = if dt.as_f64().fract() == 0.0 {
        "%Y-%m-%d"
    } else {
        "%Y-%m-%dT%H:%M:%S"
    };
    match dt.as_datetime() {
        Some(at) => Value::Date(at.format(pattern).to_string()),
        None => Value::Float(dt.as_f64()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Every column is read; works with files written by Pandas and Polars.
fn load_parquet(bytes: &[u8]) -> Result<Dataset> {
    let data = bytes::Bytes::copy_from_slice(bytes);
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(data).context("reading parquet metadata")?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<Vec<Value>> = vec![Vec::new(); names.len()];

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, cells) in columns.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            for row in 0..batch.num_rows() {
                cells.push(
                    extract_value(array, row)
                        .with_context(|| format!("column '{}', row {row}", names[col_idx]))?,
                );
            }
        }
    }

    Dataset::from_columns(
        names
            .into_iter()
            .zip(columns)
            .map(|(name, values)| Column::new(name, values))
            .collect(),
    )
}

// -- Arrow helpers --

macro_rules! primitive {
    ($col:expr, $row:expr, $ty:ty, $variant:ident, $conv:ty) => {
        $col.as_primitive_opt::<$ty>()
            .map(|a| Value::$variant(a.value($row) as $conv))
    };
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_value(col: &Arc<dyn Array>, row: usize) -> Result<Value> {
    if col.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => col
            .as_string_opt::<i32>()
            .map(|s| Value::String(s.value(row).to_string())),
        DataType::LargeUtf8 => col
            .as_string_opt::<i64>()
            .map(|s| Value::String(s.value(row).to_string())),
        DataType::Boolean => col.as_boolean_opt().map(|b| Value::Bool(b.value(row))),
        DataType::Int8 => primitive!(col, row, Int8Type, Integer, i64),
        DataType::Int16 => primitive!(col, row, Int16Type, Integer, i64),
        DataType::Int32 => primitive!(col, row, Int32Type, Integer, i64),
        DataType::Int64 => primitive!(col, row, Int64Type, Integer, i64),
        DataType::UInt8 => primitive!(col, row, UInt8Type, Integer, i64),
        DataType::UInt16 => primitive!(col, row, UInt16Type, Integer, i64),
        DataType::UInt32 => primitive!(col, row, UInt32Type, Integer, i64),
        DataType::UInt64 => primitive!(col, row, UInt64Type, Float, f64),
        DataType::Float32 => primitive!(col, row, Float32Type, Float, f64),
        DataType::Float64 => primitive!(col, row, Float64Type, Float, f64),
        DataType::Date32 | DataType::Date64 | DataType::Timestamp(_, _) => Some(Value::Date(
            array_value_to_string(col.as_ref(), row).context("formatting date")?,
        )),
        _ => Some(Value::String(
            array_value_to_string(col.as_ref(), row).context("formatting value")?,
        )),
    };
    value.with_context(|| format!("unexpected array layout for {:?}", col.data_type()))
}
