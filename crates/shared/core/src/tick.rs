use serde::{Deserialize, Serialize};

/// One validated order book row
///
/// A row carries one bid level and one ask level observed at `timestamp`.
/// Several rows sharing a timestamp form one snapshot (see [`TickGroup`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTick {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub symbol: String,
    pub bid_price: f64,
    pub bid_qty: f64,
    pub ask_price: f64,
    pub ask_qty: f64,
}

impl RawTick {
    pub fn new(
        timestamp: i64,
        symbol: impl Into<String>,
        bid_price: f64,
        bid_qty: f64,
        ask_price: f64,
        ask_qty: f64,
    ) -> Self {
        Self {
            timestamp,
            symbol: symbol.into(),
            bid_price,
            bid_qty,
            ask_price,
            ask_qty,
        }
    }

    /// Bid level carried by this row
    pub fn bid(&self) -> (f64, f64) {
        (self.bid_price, self.bid_qty)
    }

    /// Ask level carried by this row
    pub fn ask(&self) -> (f64, f64) {
        (self.ask_price, self.ask_qty)
    }
}

/// All rows sharing one timestamp, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub struct TickGroup {
    pub timestamp: i64,
    pub ticks: Vec<RawTick>,
}

impl TickGroup {
    pub fn new(timestamp: i64) -> Self {
        Self {
            timestamp,
            ticks: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }
}
