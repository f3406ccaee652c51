use super::sanitize::{STD_FLOOR, sanitize_normalized, sanitize_raw};
use super::{FeatureMatrix, FeatureVector};
use crate::error::{Error, Result};
use ndarray::{Array1, Array2, Axis};

/// Column-wise statistics used for z-scoring one batch
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub mean: Array1<f32>,
    /// Population standard deviation, already floored
    pub std: Array1<f32>,
}

impl ColumnStats {
    /// One pass over the whole matrix
    ///
    /// Accumulates in f64 to keep large price columns stable, then narrows.
    /// Any std below [`STD_FLOOR`] becomes 1.0.
    fn compute(matrix: &FeatureMatrix) -> Self {
        let rows = matrix.nrows() as f64;
        let mut mean = Array1::<f32>::zeros(matrix.ncols());
        let mut std = Array1::<f32>::ones(matrix.ncols());

        for (j, column) in matrix.axis_iter(Axis(1)).enumerate() {
            let m = column.iter().map(|&v| v as f64).sum::<f64>() / rows;
            let var = column
                .iter()
                .map(|&v| {
                    let d = v as f64 - m;
                    d * d
                })
                .sum::<f64>()
                / rows;
            let s = var.sqrt() as f32;

            mean[j] = m as f32;
            std[j] = if s < STD_FLOOR || !s.is_finite() { 1.0 } else { s };
        }

        Self { mean, std }
    }
}

/// All frames of one input, z-scored with shared batch-level statistics
///
/// Statistics are computed once per batch; every window cut from the batch
/// shares them regardless of window length.
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    matrix: FeatureMatrix,
    stats: ColumnStats,
}

impl NormalizedBatch {
    /// Stack, sanitize, normalize, sanitize again
    pub fn from_vectors(vectors: &[FeatureVector]) -> Result<Self> {
        let width = match vectors.first() {
            Some(v) => v.len(),
            None => return Err(Error::EmptyInput("no frames to normalize".to_string())),
        };
        if let Some(bad) = vectors.iter().find(|v| v.len() != width) {
            return Err(Error::InvalidConfig(format!(
                "feature vectors of mixed width: {} and {}",
                width,
                bad.len()
            )));
        }

        let flat: Vec<f32> = vectors.iter().flat_map(|v| v.as_slice().iter().copied()).collect();
        let matrix = Array2::from_shape_vec((vectors.len(), width), flat)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;

        Ok(Self::from_matrix(matrix))
    }

    /// Normalize an already stacked matrix
    pub fn from_matrix(mut matrix: FeatureMatrix) -> Self {
        sanitize_raw(&mut matrix);

        let stats = ColumnStats::compute(&matrix);
        matrix -= &stats.mean;
        matrix /= &stats.std;

        sanitize_normalized(&mut matrix);

        Self { matrix, stats }
    }

    pub fn matrix(&self) -> &FeatureMatrix {
        &self.matrix
    }

    pub fn stats(&self) -> &ColumnStats {
        &self.stats
    }

    /// Number of frames
    pub fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    /// Feature width (4 · depth)
    pub fn width(&self) -> usize {
        self.matrix.ncols()
    }
}
