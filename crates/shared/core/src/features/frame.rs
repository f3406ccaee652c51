use super::VALUES_PER_LEVEL;
use crate::tick::TickGroup;

/// One timestamp's order book, fixed to `depth` levels per side
///
/// Levels keep the order in which the feed delivered them; nothing is
/// re-sorted by price. Missing levels are `(0.0, 0.0)`.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBookFrame {
    pub timestamp: i64,
    bids: Vec<(f32, f32)>,
    asks: Vec<(f32, f32)>,
}

impl OrderBookFrame {
    /// Build from explicit levels, padding with zeros / truncating to `depth`
    pub fn from_levels(
        timestamp: i64,
        bids: impl IntoIterator<Item = (f64, f64)>,
        asks: impl IntoIterator<Item = (f64, f64)>,
        depth: usize,
    ) -> Self {
        Self {
            timestamp,
            bids: fit_side(bids, depth),
            asks: fit_side(asks, depth),
        }
    }

    /// Build from a timestamp group
    ///
    /// At most `2 * depth` rows are considered; each row contributes its bid
    /// level to the bid side and its ask level to the ask side.
    pub fn from_group(group: &TickGroup, depth: usize) -> Self {
        let rows = &group.ticks[..group.ticks.len().min(2 * depth)];
        Self::from_levels(
            group.timestamp,
            rows.iter().map(|t| t.bid()),
            rows.iter().map(|t| t.ask()),
            depth,
        )
    }

    pub fn depth(&self) -> usize {
        self.bids.len()
    }

    pub fn bids(&self) -> &[(f32, f32)] {
        &self.bids
    }

    pub fn asks(&self) -> &[(f32, f32)] {
        &self.asks
    }

    /// Flatten level-major: bid price, bid qty, ask price, ask qty per level
    ///
    /// The inference engine expects exactly this layout.
    pub fn to_feature_vector(&self) -> FeatureVector {
        let mut values = Vec::with_capacity(self.depth() * VALUES_PER_LEVEL);
        for (&(bid_price, bid_qty), &(ask_price, ask_qty)) in self.bids.iter().zip(&self.asks) {
            values.extend_from_slice(&[bid_price, bid_qty, ask_price, ask_qty]);
        }
        FeatureVector(values)
    }
}

fn fit_side(levels: impl IntoIterator<Item = (f64, f64)>, depth: usize) -> Vec<(f32, f32)> {
    let mut side: Vec<(f32, f32)> = levels
        .into_iter()
        .take(depth)
        .map(|(price, qty)| (price as f32, qty as f32))
        .collect();
    side.resize(depth, (0.0, 0.0));
    side
}

/// Flattened frame of length `4 * depth`
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// `[bid_price, bid_qty, ask_price, ask_qty]` for a 0-based level
    pub fn level(&self, index: usize) -> Option<&[f32]> {
        let start = index.checked_mul(VALUES_PER_LEVEL)?;
        self.0.get(start..start.checked_add(VALUES_PER_LEVEL)?)
    }
}

impl From<FeatureVector> for Vec<f32> {
    fn from(vector: FeatureVector) -> Self {
        vector.0
    }
}
