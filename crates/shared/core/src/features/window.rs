use super::batch::NormalizedBatch;
use super::frame::{FeatureVector, OrderBookFrame};
use super::{DEFAULT_DEPTH, VALUES_PER_LEVEL};
use crate::error::{Error, Result};
use crate::tick::TickGroup;
use ndarray::{Array3, ArrayView2, Axis, s};

/// Builds fixed-shape model inputs from timestamp groups
///
/// ```text
/// groups ─► frames (depth) ─► feature vectors (4·depth) ─► NormalizedBatch
///                                                            │ stride-1 slide
///                                                            ▼
///                                            WindowBatch [n, window_length, 4·depth]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBuilder {
    depth: usize,
}

impl Default for WindowBuilder {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
        }
    }
}

impl WindowBuilder {
    /// Create a builder retaining `depth` levels per side
    pub fn new(depth: usize) -> Result<Self> {
        if depth == 0 {
            return Err(Error::InvalidConfig("depth must be at least 1".to_string()));
        }
        if depth.checked_mul(VALUES_PER_LEVEL).is_none() {
            return Err(Error::InvalidConfig(format!("depth {} is out of range", depth)));
        }
        Ok(Self { depth })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Width of every feature vector and window row
    pub fn feature_width(&self) -> usize {
        self.depth * VALUES_PER_LEVEL
    }

    /// One fixed-depth frame per group
    pub fn frames(&self, groups: &[TickGroup]) -> Vec<OrderBookFrame> {
        groups
            .iter()
            .map(|g| OrderBookFrame::from_group(g, self.depth))
            .collect()
    }

    /// Frame, flatten and normalize all groups as one batch
    pub fn normalize(&self, groups: &[TickGroup]) -> Result<NormalizedBatch> {
        if groups.is_empty() {
            return Err(Error::EmptyInput("no snapshots to window".to_string()));
        }
        let vectors: Vec<FeatureVector> = self
            .frames(groups)
            .iter()
            .map(OrderBookFrame::to_feature_vector)
            .collect();
        NormalizedBatch::from_vectors(&vectors)
    }

    /// Slide a window of `window_length` rows over a batch with stride 1
    ///
    /// A batch shorter than the window yields exactly one window with the
    /// available rows copied into its prefix and zeros after.
    pub fn windows(&self, batch: &NormalizedBatch, window_length: usize) -> Result<WindowBatch> {
        if window_length == 0 {
            return Err(Error::InvalidConfig(
                "window length must be at least 1".to_string(),
            ));
        }
        let rows = batch.rows();
        if rows == 0 {
            return Err(Error::EmptyInput("empty normalized batch".to_string()));
        }
        let width = batch.width();
        let matrix = batch.matrix();

        if rows < window_length {
            let mut windows = Array3::<f32>::zeros((1, window_length, width));
            windows
                .slice_mut(s![0, ..rows, ..])
                .assign(&matrix.slice(s![.., ..]));
            return Ok(WindowBatch {
                windows,
                padded_rows: window_length - rows,
            });
        }

        let count = rows - window_length + 1;
        let mut windows = Array3::<f32>::zeros((count, window_length, width));
        for (i, mut window) in windows.axis_iter_mut(Axis(0)).enumerate() {
            window.assign(&matrix.slice(s![i..i + window_length, ..]));
        }

        Ok(WindowBatch {
            windows,
            padded_rows: 0,
        })
    }

    /// Full build for a single window length
    pub fn build(&self, groups: &[TickGroup], window_length: usize) -> Result<WindowBatch> {
        let batch = self.normalize(groups)?;
        self.windows(&batch, window_length)
    }
}

/// Windows of identical shape `[window_length, width]`
#[derive(Debug, Clone)]
pub struct WindowBatch {
    windows: Array3<f32>,
    /// Zero rows appended to the single fallback window (0 otherwise)
    padded_rows: usize,
}

impl WindowBatch {
    /// Number of windows
    pub fn len(&self) -> usize {
        self.windows.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn window_length(&self) -> usize {
        self.windows.len_of(Axis(1))
    }

    pub fn width(&self) -> usize {
        self.windows.len_of(Axis(2))
    }

    /// `(windows, window_length, width)`
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.len(), self.window_length(), self.width())
    }

    /// Whether this batch is the zero-padded single-window fallback
    pub fn is_padded(&self) -> bool {
        self.padded_rows > 0
    }

    pub fn padded_rows(&self) -> usize {
        self.padded_rows
    }

    pub fn window(&self, index: usize) -> Option<ArrayView2<'_, f32>> {
        (index < self.len()).then(|| self.windows.index_axis(Axis(0), index))
    }

    pub fn iter(&self) -> impl Iterator<Item = ArrayView2<'_, f32>> {
        self.windows.axis_iter(Axis(0))
    }

    pub fn as_array(&self) -> &Array3<f32> {
        &self.windows
    }

    /// Nested `[window][row][feature]` form for JSON transport
    pub fn to_nested(&self) -> Vec<Vec<Vec<f32>>> {
        self.iter()
            .map(|w| w.outer_iter().map(|row| row.to_vec()).collect())
            .collect()
    }
}
