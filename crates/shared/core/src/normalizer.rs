//! Snapshot normalizer - validates and coerces raw rows into typed ticks

use crate::error::{Error, Result};
use crate::records::{RawRecord, RecordSet};
use crate::tick::{RawTick, TickGroup};

/// Fields every input record set must expose
pub const REQUIRED_FIELDS: [&str; 6] = [
    "timestamp",
    "symbol",
    "bid_qty",
    "bid_price",
    "ask_price",
    "ask_qty",
];

/// Facts about the raw input, reported alongside predictions
///
/// Computed over the input as received (before rows are dropped), so
/// `total_rows` counts rejected rows too.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TickSummary {
    pub total_rows: usize,
    /// First symbol encountered in input order
    pub symbol: Option<String>,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
}

/// Output of the normalizer: timestamp groups in ascending order
#[derive(Debug, Clone)]
pub struct NormalizedTicks {
    pub groups: Vec<TickGroup>,
    pub summary: TickSummary,
    /// Rows dropped because a field failed coercion
    pub dropped: usize,
}

impl NormalizedTicks {
    /// Number of rows that survived coercion
    pub fn row_count(&self) -> usize {
        self.groups.iter().map(TickGroup::len).sum()
    }

    /// Number of order book snapshots (one per distinct timestamp)
    pub fn frame_count(&self) -> usize {
        self.groups.len()
    }
}

/// Validates record sets and coerces them into ordered tick groups
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotNormalizer;

impl SnapshotNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Fail with [`Error::Schema`] if any required field is absent
    pub fn validate_schema(&self, records: &RecordSet) -> Result<()> {
        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|field| !records.has_column(field))
            .map(|field| field.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::Schema { missing })
        }
    }

    /// Coerce, drop, sort and group
    ///
    /// Rows whose numeric fields, timestamp or symbol fail coercion are
    /// dropped. Rows are stably sorted by timestamp (ties keep arrival order)
    /// and grouped by timestamp.
    pub fn normalize(&self, records: &RecordSet) -> Result<NormalizedTicks> {
        if records.is_empty() {
            return Err(Error::EmptyInput("no records provided".to_string()));
        }
        self.validate_schema(records)?;

        let summary = summarize(records);
        let mut ticks: Vec<RawTick> = records.rows().iter().filter_map(coerce).collect();
        let dropped = records.len() - ticks.len();

        if ticks.is_empty() {
            return Err(Error::EmptyInput(format!(
                "all {} rows failed coercion",
                records.len()
            )));
        }
        if dropped > 0 {
            log::debug!("Dropped {} of {} rows during coercion", dropped, records.len());
        }

        // Vec::sort_by_key is stable
        ticks.sort_by_key(|t| t.timestamp);

        let mut groups: Vec<TickGroup> = Vec::new();
        for tick in ticks {
            match groups.last_mut() {
                Some(group) if group.timestamp == tick.timestamp => group.ticks.push(tick),
                _ => {
                    let mut group = TickGroup::new(tick.timestamp);
                    group.ticks.push(tick);
                    groups.push(group);
                }
            }
        }

        Ok(NormalizedTicks {
            groups,
            summary,
            dropped,
        })
    }
}

fn coerce(record: &RawRecord) -> Option<RawTick> {
    Some(RawTick {
        timestamp: record.get("timestamp").as_timestamp()?,
        symbol: record.get("symbol").as_text()?,
        bid_price: record.get("bid_price").as_f64()?,
        bid_qty: record.get("bid_qty").as_f64()?,
        ask_price: record.get("ask_price").as_f64()?,
        ask_qty: record.get("ask_qty").as_f64()?,
    })
}

fn summarize(records: &RecordSet) -> TickSummary {
    let symbol = records
        .rows()
        .iter()
        .find_map(|r| r.get("symbol").as_text());

    let timestamps = records
        .rows()
        .iter()
        .filter_map(|r| r.get("timestamp").as_timestamp());
    let (first, last) = timestamps.fold((None, None), |(min, max): (Option<i64>, Option<i64>), ts| {
        (
            Some(min.map_or(ts, |m| m.min(ts))),
            Some(max.map_or(ts, |m| m.max(ts))),
        )
    });

    TickSummary {
        total_rows: records.len(),
        symbol,
        first_timestamp: first,
        last_timestamp: last,
    }
}
