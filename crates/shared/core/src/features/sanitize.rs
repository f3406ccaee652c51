//! Non-finite value handling
//!
//! Two passes with different sentinels. Before normalization infinities are
//! clamped to ±1e6 so they still carry sign and magnitude into the column
//! statistics; after normalization any non-finite value becomes 0. The
//! inference engine was fitted against exactly these values, so the two
//! passes must stay distinct.

use ndarray::Array2;

/// Replacement for +inf before normalization
pub const POS_INF_SENTINEL: f32 = 1e6;

/// Replacement for -inf before normalization
pub const NEG_INF_SENTINEL: f32 = -1e6;

/// Standard deviations below this are replaced by 1.0
pub const STD_FLOOR: f32 = 1e-8;

/// NaN -> 0, +inf -> 1e6, -inf -> -1e6
pub(crate) fn sanitize_raw(matrix: &mut Array2<f32>) {
    replace_non_finite(matrix, 0.0, POS_INF_SENTINEL, NEG_INF_SENTINEL);
}

/// NaN -> 0, ±inf -> 0
pub(crate) fn sanitize_normalized(matrix: &mut Array2<f32>) {
    replace_non_finite(matrix, 0.0, 0.0, 0.0);
}

fn replace_non_finite(matrix: &mut Array2<f32>, nan: f32, pos_inf: f32, neg_inf: f32) {
    matrix.mapv_inplace(|v| {
        if v.is_nan() {
            nan
        } else if v == f32::INFINITY {
            pos_inf
        } else if v == f32::NEG_INFINITY {
            neg_inf
        } else {
            v
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_raw_pass_sentinels() {
        let mut m = array![[f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 2.5]];
        sanitize_raw(&mut m);
        assert_eq!(m, array![[0.0, 1e6, -1e6, 2.5]]);
    }

    #[test]
    fn test_normalized_pass_sentinels() {
        let mut m = array![[f32::NAN, f32::INFINITY, f32::NEG_INFINITY, -0.5]];
        sanitize_normalized(&mut m);
        assert_eq!(m, array![[0.0, 0.0, 0.0, -0.5]]);
    }
}
