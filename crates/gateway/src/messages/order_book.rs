//! Inbound order-book payload
//!
//! The shape of a Binance `/api/v3/depth` response:
//! `{"lastUpdateId": 1, "bids": [["50000.00", "1.5"], ...], "asks": [...]}`.
//! Levels are ranked by the producer and kept in the order received.

use crate::error::GatewayError;
use lobcast_core::RawTick;
use serde::{Deserialize, Serialize};

/// One price or quantity as sent by the producer
///
/// Exchanges send decimal strings; hand-written payloads often use numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LevelValue {
    Number(f64),
    Text(String),
}

impl LevelValue {
    pub fn parse(&self) -> Result<f64, GatewayError> {
        match self {
            LevelValue::Number(n) => Ok(*n),
            LevelValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| GatewayError::Decode(format!("invalid level value: {:?}", s))),
        }
    }
}

impl From<&str> for LevelValue {
    fn from(s: &str) -> Self {
        LevelValue::Text(s.to_string())
    }
}

impl From<f64> for LevelValue {
    fn from(n: f64) -> Self {
        LevelValue::Number(n)
    }
}

/// Order-book snapshot pushed onto the inbound queue
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderBookPayload {
    #[serde(
        rename = "lastUpdateId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_update_id: Option<u64>,
    /// `[price, quantity]` pairs, best first
    #[serde(default)]
    pub bids: Vec<[LevelValue; 2]>,
    #[serde(default)]
    pub asks: Vec<[LevelValue; 2]>,
}

impl OrderBookPayload {
    pub fn new(bids: Vec<[LevelValue; 2]>, asks: Vec<[LevelValue; 2]>) -> Self {
        Self {
            last_update_id: None,
            bids,
            asks,
        }
    }

    /// Decode a queue message
    pub fn from_json(payload: &str) -> Result<Self, GatewayError> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn to_json(&self) -> Result<String, GatewayError> {
        serde_json::to_string(self).map_err(|e| GatewayError::Serialization(e.to_string()))
    }

    /// Number of rows the snapshot expands into
    pub fn depth(&self) -> usize {
        self.bids.len().max(self.asks.len())
    }

    /// Expand into one row per level, all sharing `timestamp` and `symbol`
    ///
    /// Row `i` carries bid level `i` and ask level `i`; a side without that
    /// level contributes `(0.0, 0.0)`.
    pub fn to_ticks(&self, symbol: &str, timestamp: i64) -> Result<Vec<RawTick>, GatewayError> {
        let bids = parse_levels(&self.bids)?;
        let asks = parse_levels(&self.asks)?;

        Ok((0..self.depth())
            .map(|i| {
                let (bid_price, bid_qty) = bids.get(i).copied().unwrap_or((0.0, 0.0));
                let (ask_price, ask_qty) = asks.get(i).copied().unwrap_or((0.0, 0.0));
                RawTick::new(timestamp, symbol, bid_price, bid_qty, ask_price, ask_qty)
            })
            .collect())
    }
}

fn parse_levels(levels: &[[LevelValue; 2]]) -> Result<Vec<(f64, f64)>, GatewayError> {
    levels
        .iter()
        .map(|[price, qty]| Ok((price.parse()?, qty.parse()?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_binance_depth() {
        let json = r#"{"lastUpdateId":1027024,"bids":[["4.00000000","431.00000000"]],"asks":[["4.00000200","12.00000000"]]}"#;
        let payload = OrderBookPayload::from_json(json).unwrap();

        assert_eq!(payload.last_update_id, Some(1027024));
        assert_eq!(payload.bids.len(), 1);
        assert_eq!(payload.asks[0][0].parse().unwrap(), 4.000002);
    }

    #[test]
    fn test_missing_sides_are_empty() {
        let payload = OrderBookPayload::from_json("{}").unwrap();
        assert_eq!(payload.depth(), 0);
        assert!(payload.to_ticks("BTCUSDT", 0).unwrap().is_empty());
    }

    #[test]
    fn test_numbers_accepted() {
        let payload = OrderBookPayload::from_json(r#"{"bids":[[50000, 1.5]],"asks":[]}"#).unwrap();
        let ticks = payload.to_ticks("BTCUSDT", 7).unwrap();
        assert_eq!(ticks[0].bid_price, 50000.0);
        assert_eq!(ticks[0].bid_qty, 1.5);
    }

    #[test]
    fn test_to_ticks_pads_short_side() {
        let payload = OrderBookPayload::new(
            vec![["50000".into(), "1.5".into()], ["49999".into(), "2.0".into()]],
            vec![["50001".into(), "2.0".into()]],
        );
        let ticks = payload.to_ticks("BTCUSDT", 1_700_000_000_000).unwrap();

        assert_eq!(ticks.len(), 2);
        assert!(ticks.iter().all(|t| t.timestamp == 1_700_000_000_000));
        assert!(ticks.iter().all(|t| t.symbol == "BTCUSDT"));
        assert_eq!(ticks[0].bid(), (50000.0, 1.5));
        assert_eq!(ticks[0].ask(), (50001.0, 2.0));
        assert_eq!(ticks[1].bid(), (49999.0, 2.0));
        assert_eq!(ticks[1].ask(), (0.0, 0.0));
    }

    #[test]
    fn test_unparsable_level_is_decode_error() {
        let payload = OrderBookPayload::from_json(r#"{"bids":[["abc","1"]]}"#).unwrap();
        assert!(matches!(
            payload.to_ticks("BTCUSDT", 0),
            Err(GatewayError::Decode(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_decode_error() {
        assert!(matches!(
            OrderBookPayload::from_json("not json"),
            Err(GatewayError::Decode(_))
        ));
        assert!(OrderBookPayload::from_json(r#"{"bids":[["1"]]}"#).is_err());
    }
}
