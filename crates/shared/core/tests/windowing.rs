//! Snapshot-to-window integration tests
//!
//! Drive whole record sets through SnapshotNormalizer and WindowBuilder the
//! way the pipelines do, and check the invariants every model input holds.

use lobcast_core::{
    FieldValue, NormalizedBatch, OrderBookFrame, RawRecord, RawTick, RecordSet,
    SnapshotNormalizer, TickGroup, WindowBuilder,
};
use ndarray::array;
use serde_json::json;

fn book_rows(frames: usize, levels: usize) -> RecordSet {
    let mut ticks = Vec::with_capacity(frames * levels);
    for f in 0..frames {
        for l in 0..levels {
            let drift = (f as f64 * 0.37).sin() * 20.0;
            ticks.push(RawTick::new(
                1_700_000_000_000 + f as i64,
                "BTCUSDT",
                50_000.0 + drift - l as f64,
                1.0 + (f % 7) as f64 * 0.25,
                50_001.0 + drift + l as f64,
                2.0 + (l % 3) as f64 * 0.1,
            ));
        }
    }
    RecordSet::from_ticks(&ticks)
}

#[test]
fn test_every_window_has_model_shape() {
    let normalizer = SnapshotNormalizer::new();
    let builder = WindowBuilder::new(10).unwrap();

    let ticks = normalizer.normalize(&book_rows(300, 3)).unwrap();
    assert_eq!(ticks.frame_count(), 300);

    let batch = builder.normalize(&ticks.groups).unwrap();
    for length in [1, 5, 128, 300, 384] {
        let windows = builder.windows(&batch, length).unwrap();
        let expected = if length <= 300 { 300 - length + 1 } else { 1 };
        assert_eq!(windows.shape(), (expected, length, 40), "length {}", length);
        for window in windows.iter() {
            assert_eq!(window.dim(), (length, 40));
        }
    }
}

#[test]
fn test_infinite_inputs_never_reach_the_model() {
    let rows = vec![
        json!({"timestamp": 1, "symbol": "BTCUSDT", "bid_price": "inf", "bid_qty": 1.0, "ask_price": 10.0, "ask_qty": 1.0}),
        json!({"timestamp": 2, "symbol": "BTCUSDT", "bid_price": 5.0, "bid_qty": "-inf", "ask_price": 11.0, "ask_qty": 1.0}),
        json!({"timestamp": 3, "symbol": "BTCUSDT", "bid_price": 6.0, "bid_qty": 2.0, "ask_price": 12.0, "ask_qty": 1.0}),
    ];
    let ticks = SnapshotNormalizer::new()
        .normalize(&RecordSet::from_json_rows(rows))
        .unwrap();
    let windows = WindowBuilder::new(10).unwrap().build(&ticks.groups, 2).unwrap();

    assert_eq!(windows.shape(), (2, 2, 40));
    assert!(windows.as_array().iter().all(|v| v.is_finite()));
}

#[test]
fn test_non_finite_matrix_is_sanitized() {
    let matrix = array![
        [f32::NAN, 1.0, f32::INFINITY],
        [2.0, f32::NEG_INFINITY, 3.0],
        [f32::MAX, f32::MIN, 0.0],
    ];
    let batch = NormalizedBatch::from_matrix(matrix);
    assert!(batch.matrix().iter().all(|v| v.is_finite()));
    assert!(batch.stats().std.iter().all(|s| *s > 0.0));
}

#[test]
fn test_empty_book_is_all_zeros() {
    let frame = OrderBookFrame::from_levels(42, Vec::new(), Vec::new(), 10);
    let vector = frame.to_feature_vector();
    assert_eq!(vector.len(), 40);
    assert!(vector.as_slice().iter().all(|v| *v == 0.0));

    let from_group = OrderBookFrame::from_group(&TickGroup::new(42), 10);
    assert_eq!(from_group.to_feature_vector(), vector);
}

#[test]
fn test_short_input_single_zero_tailed_window() {
    let ticks = SnapshotNormalizer::new()
        .normalize(&book_rows(50, 2))
        .unwrap();
    let windows = WindowBuilder::new(10).unwrap().build(&ticks.groups, 128).unwrap();

    assert_eq!(windows.shape(), (1, 128, 40));
    assert_eq!(windows.padded_rows(), 78);

    let window = windows.window(0).unwrap();
    // Frames vary, so at least one normalized value in the data prefix is non-zero
    assert!(window.outer_iter().take(50).flatten().any(|v| *v != 0.0));
    assert!(window.outer_iter().skip(50).flatten().all(|v| *v == 0.0));
}

#[test]
fn test_two_level_snapshot_flattens_level_major() {
    // bids [["50000","1.5"], ["49999","2.0"]], asks [["50001","2.0"], ["50002","1.8"]]
    let text = |s: &str| FieldValue::Text(s.to_string());
    let level = |bp: &str, bq: &str, ap: &str, aq: &str| {
        RawRecord::new()
            .with("timestamp", FieldValue::Int(1_700_000_000_000))
            .with("symbol", text("BTCUSDT"))
            .with("bid_price", text(bp))
            .with("bid_qty", text(bq))
            .with("ask_price", text(ap))
            .with("ask_qty", text(aq))
    };
    let columns = ["timestamp", "symbol", "bid_price", "bid_qty", "ask_price", "ask_qty"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    let records = RecordSet::new(
        columns,
        vec![
            level("50000", "1.5", "50001", "2.0"),
            level("49999", "2.0", "50002", "1.8"),
        ],
    );

    let builder = WindowBuilder::new(10).unwrap();
    let ticks = SnapshotNormalizer::new().normalize(&records).unwrap();
    assert_eq!(ticks.frame_count(), 1);

    let frames = builder.frames(&ticks.groups);
    let vector = frames[0].to_feature_vector();
    assert_eq!(vector.len(), 40);
    assert_eq!(vector.level(0).unwrap(), &[50000.0, 1.5, 50001.0, 2.0]);
    assert_eq!(vector.level(1).unwrap(), &[49999.0, 2.0, 50002.0, 1.8]);
    for l in 2..10 {
        assert_eq!(vector.level(l).unwrap(), &[0.0; 4]);
    }

    // A single frame normalizes to zeros: every column has zero spread
    let windows = builder.build(&ticks.groups, 128).unwrap();
    assert_eq!(windows.shape(), (1, 128, 40));
    assert!(windows.as_array().iter().all(|v| *v == 0.0));
}
