//! Class predictions produced by an inference engine

use serde::{Deserialize, Serialize};

/// Mid-price movement classes: 0 = Up, 1 = Stationary, 2 = Down
pub const NUM_CLASSES: usize = 3;

pub const CLASS_NAMES: [&str; NUM_CLASSES] = ["Up", "Stationary", "Down"];

/// Class predicted when a row carries no usable probability
pub const FALLBACK_CLASS: usize = 1;

/// Fill value for NaN probabilities
pub const NAN_PROBABILITY: f32 = 0.33;

/// Per-model inference output, one entry per window in window order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predictions: Vec<usize>,
    pub probabilities: Vec<Vec<f32>>,
}

impl PredictionResult {
    /// Turn raw class scores into predictions
    ///
    /// Row-wise softmax, argmax (lowest index wins ties, NaN never wins),
    /// then non-finite probabilities are replaced: NaN -> 0.33, +inf -> 1.0,
    /// -inf -> 0.0.
    pub fn from_logits(logits: &[Vec<f32>]) -> Self {
        let mut predictions = Vec::with_capacity(logits.len());
        let mut probabilities = Vec::with_capacity(logits.len());

        for row in logits {
            let probs = softmax(row);
            predictions.push(argmax(&probs).unwrap_or(FALLBACK_CLASS));
            probabilities.push(probs.into_iter().map(sanitize_probability).collect());
        }

        Self {
            predictions,
            probabilities,
        }
    }

    /// Number of windows covered
    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }

    /// Name of the predicted class for window `index`
    pub fn class_name(&self, index: usize) -> Option<&'static str> {
        self.predictions
            .get(index)
            .and_then(|&class| CLASS_NAMES.get(class).copied())
    }
}

/// Max-shifted softmax
///
/// Non-finite inputs propagate to NaN outputs, which the caller sanitizes.
pub fn softmax(row: &[f32]) -> Vec<f32> {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = row.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

fn sanitize_probability(p: f32) -> f32 {
    if p.is_nan() {
        NAN_PROBABILITY
    } else if p == f32::INFINITY {
        1.0
    } else if p == f32::NEG_INFINITY {
        0.0
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_softmax_large_logits_stable() {
        let probs = softmax(&[1000.0, 1000.0, -1000.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!(probs.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_from_logits() {
        let result = PredictionResult::from_logits(&[vec![0.1, 3.0, 0.2], vec![5.0, 1.0, 1.0]]);

        assert_eq!(result.predictions, vec![1, 0]);
        assert_eq!(result.len(), 2);
        assert_eq!(result.class_name(0), Some("Stationary"));
        assert_eq!(result.class_name(1), Some("Up"));
        for row in &result.probabilities {
            assert_eq!(row.len(), NUM_CLASSES);
            assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_ties_resolve_to_lowest_index() {
        let result = PredictionResult::from_logits(&[vec![2.0, 2.0, 2.0]]);
        assert_eq!(result.predictions, vec![0]);
    }

    #[test]
    fn test_non_finite_logits_fall_back() {
        let result = PredictionResult::from_logits(&[vec![f32::NAN, 1.0, 2.0]]);

        assert_eq!(result.predictions, vec![FALLBACK_CLASS]);
        assert_eq!(result.probabilities[0], vec![0.33, 0.33, 0.33]);
    }
}
