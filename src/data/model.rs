use std::fmt;

use serde_json::{Map, Number, Value as JsonValue};

// ---------------------------------------------------------------------------
// Value – a single cell of the dataset
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring common DataFrame dtypes.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text for simplicity.
    Date(String),
    Null,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Interpret the value as an `f64` for plotting and statistics.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) if v.is_finite() => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// JSON form used when the dataset is handed to the text-generation model.
    /// Non-finite floats have no JSON representation and become `null`.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::String(s) | Value::Date(s) => JsonValue::String(s.clone()),
            Value::Integer(i) => JsonValue::Number((*i).into()),
            Value::Float(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Null => JsonValue::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// True when every non-null value is numeric (and at least one exists).
    pub fn is_numeric(&self) -> bool {
        let mut seen = false;
        for v in &self.values {
            match v {
                Value::Null => {}
                Value::Integer(_) | Value::Float(_) => seen = true,
                _ => return false,
            }
        }
        seen
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// Column-oriented table. Names are lowercased on construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Dataset {
    /// Build a dataset, lowercasing every column name.
    ///
    /// Fails if the columns do not all have the same length.
    pub fn from_columns(columns: Vec<Column>) -> anyhow::Result<Self> {
        let n_rows = columns.first().map(|c| c.values.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.values.len() != n_rows) {
            anyhow::bail!(
                "column '{}' has {} values but expected {n_rows}",
                bad.name,
                bad.values.len()
            );
        }
        let columns = columns
            .into_iter()
            .map(|c| Column {
                name: c.name.to_lowercase(),
                values: c.values,
            })
            .collect();
        Ok(Self { columns, n_rows })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// First column with the given name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// The first `n` rows, cell by cell, for the preview table.
    pub fn head(&self, n: usize) -> Vec<Vec<&Value>> {
        (0..self.n_rows.min(n))
            .map(|row| self.columns.iter().map(|c| &c.values[row]).collect())
            .collect()
    }

    /// Column-oriented JSON: `{column: {row_index: value}}`.
    pub fn to_column_dict(&self) -> JsonValue {
        let mut root = Map::new();
        for col in &self.columns {
            let cells: Map<String, JsonValue> = col
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.to_json()))
                .collect();
            root.insert(col.name.clone(), JsonValue::Object(cells));
        }
        JsonValue::Object(root)
    }
}
