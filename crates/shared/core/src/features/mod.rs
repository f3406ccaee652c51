//! Feature engineering: frames, normalization and windows

mod batch;
mod frame;
mod sanitize;
mod window;

pub use batch::{ColumnStats, NormalizedBatch};
pub use frame::{FeatureVector, OrderBookFrame};
pub use sanitize::{NEG_INF_SENTINEL, POS_INF_SENTINEL, STD_FLOOR};
pub use window::{WindowBatch, WindowBuilder};

/// Price levels retained per side
pub const DEFAULT_DEPTH: usize = 10;

/// Values per level in a feature vector: bid price, bid qty, ask price, ask qty
pub const VALUES_PER_LEVEL: usize = 4;

/// Stacked feature vectors, one row per frame
pub type FeatureMatrix = ndarray::Array2<f32>;
