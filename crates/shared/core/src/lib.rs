//! Lobcast Core Domain
//!
//! Pure domain logic for turning raw limit-order-book snapshots into
//! fixed-shape model inputs. This crate contains no async and no network I/O,
//! and is 100% unit testable.
//!
//! ## Flow
//!
//! ```text
//! RecordSet (JSON rows / CSV)
//!         │
//!   SnapshotNormalizer ── coerce, drop bad rows, stable sort, group by timestamp
//!         │
//!     TickGroup[]
//!         │
//!    WindowBuilder ────── frame (pad/truncate to depth), flatten level-major,
//!         │               sanitize, z-score per column, sanitize, slide
//!         │
//!     WindowBatch [windows, window_length, 4·depth]
//! ```

pub mod error;
pub mod features;
pub mod model;
pub mod normalizer;
pub mod prediction;
pub mod records;
pub mod tick;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use features::{
    ColumnStats, DEFAULT_DEPTH, FeatureMatrix, FeatureVector, NormalizedBatch, OrderBookFrame,
    WindowBatch, WindowBuilder,
};
pub use model::ModelSpec;
pub use normalizer::{NormalizedTicks, REQUIRED_FIELDS, SnapshotNormalizer, TickSummary};
pub use prediction::{CLASS_NAMES, NUM_CLASSES, PredictionResult};
pub use records::{FieldValue, RawRecord, RecordSet};
pub use tick::{RawTick, TickGroup};
