//! Loosely-typed input records
//!
//! Rows arrive either as JSON objects (`{"data": [...]}` requests, queue
//! payloads) or as CSV lines. Both are lifted into a [`RecordSet`] before the
//! [`SnapshotNormalizer`](crate::SnapshotNormalizer) coerces them into ticks.

use crate::error::Result;
use crate::tick::RawTick;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Read;

/// A single untyped field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// Coerce to a float. Unparseable values and NaN yield `None`.
    ///
    /// Infinities are kept; they are handled by sanitization downstream.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            FieldValue::Int(v) => *v as f64,
            FieldValue::Float(v) => *v,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
            FieldValue::Null | FieldValue::Bool(_) => return None,
        };
        if value.is_nan() { None } else { Some(value) }
    }

    /// Coerce to an integer millisecond timestamp
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            FieldValue::Float(v) if v.is_finite() && v.fract() == 0.0 => Some(*v as i64),
            FieldValue::Text(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite() && v.fract() == 0.0)
                        .map(|v| v as i64)
                })
            }
            _ => None,
        }
    }

    /// Coerce to text (symbols may arrive as numbers in loose CSVs)
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Int(v) => Some(v.to_string()),
            FieldValue::Float(v) if !v.is_nan() => Some(v.to_string()),
            FieldValue::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null),
            },
            Value::String(s) => FieldValue::Text(s),
            // Nested structures never coerce to a scalar
            Value::Array(_) | Value::Object(_) => FieldValue::Null,
        }
    }
}

/// One input row: field name -> value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: HashMap<String, FieldValue>,
}

static NULL: FieldValue = FieldValue::Null;

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, returning `self` for chaining
    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }

    /// Get a field; absent fields read as `Null`
    pub fn get(&self, name: &str) -> &FieldValue {
        self.fields.get(name).unwrap_or(&NULL)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl From<&RawTick> for RawRecord {
    fn from(tick: &RawTick) -> Self {
        RawRecord::new()
            .with("timestamp", FieldValue::Int(tick.timestamp))
            .with("symbol", FieldValue::Text(tick.symbol.clone()))
            .with("bid_price", FieldValue::Float(tick.bid_price))
            .with("bid_qty", FieldValue::Float(tick.bid_qty))
            .with("ask_price", FieldValue::Float(tick.ask_price))
            .with("ask_qty", FieldValue::Float(tick.ask_qty))
    }
}

/// An ordered set of records plus the columns the set exposes
///
/// For JSON input the columns are the union of all row keys (a column exists
/// if any row carries it). For CSV input they are the header fields.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<RawRecord>,
}

impl RecordSet {
    /// Build from explicit columns and rows
    pub fn new(columns: Vec<String>, rows: Vec<RawRecord>) -> Self {
        Self { columns, rows }
    }

    /// Build from JSON rows. Non-object rows become empty records.
    pub fn from_json_rows(rows: Vec<Value>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut records = Vec::with_capacity(rows.len());

        for row in rows {
            let mut record = RawRecord::new();
            if let Value::Object(map) = row {
                for (key, value) in map {
                    if !columns.contains(&key) {
                        columns.push(key.clone());
                    }
                    record.insert(key, FieldValue::from(value));
                }
            }
            records.push(record);
        }

        Self {
            columns,
            rows: records,
        }
    }

    /// Build from CSV text with a header line. Empty cells read as `Null`.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();

        for result in reader.records() {
            let line = result?;
            let mut record = RawRecord::new();
            for (name, cell) in columns.iter().zip(line.iter()) {
                let value = if cell.is_empty() {
                    FieldValue::Null
                } else {
                    FieldValue::Text(cell.to_string())
                };
                record.insert(name.clone(), value);
            }
            rows.push(record);
        }

        log::debug!("Parsed {} CSV rows with columns {:?}", rows.len(), columns);
        Ok(Self { columns, rows })
    }

    /// Build from already-typed ticks
    pub fn from_ticks(ticks: &[RawTick]) -> Self {
        let columns = crate::normalizer::REQUIRED_FIELDS
            .iter()
            .map(|c| c.to_string())
            .collect();
        Self {
            columns,
            rows: ticks.iter().map(RawRecord::from).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn rows(&self) -> &[RawRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
