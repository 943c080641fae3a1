use ndarray::{Array2, ArrayView2, Axis};

use super::{Loss, LossFn, loss_fn::check_shapes};
use crate::{MlErr, Result};

const EPS: f32 = 1e-7;

/// Softmax followed by categorical cross-entropy, averaged over the batch.
///
/// The model's predictions are taken as raw logits and the labels as one-hot (or any
/// probability distribution per row).
#[derive(Debug, Default, Clone, Copy)]
pub struct CrossEntropy;

impl CrossEntropy {
    /// Returns a new `CrossEntropy`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for CrossEntropy {
    fn compute(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Loss> {
        check_shapes(&y_pred, &y)?;
        if y.ncols() < 2 {
            return Err(MlErr::InvalidInput(
                "cross entropy needs at least two classes",
            ));
        }

        let probs = softmax(y_pred);
        let rows = y.nrows() as f32;

        let total: f32 = probs
            .iter()
            .zip(y.iter())
            .map(|(&p, &t)| -t * p.max(EPS).ln())
            .sum();

        let seed = (&probs - &y) / rows;
        Loss::new(total / rows, seed)
    }
}

/// Row-wise softmax, shifted by each row's maximum.
pub fn softmax(logits: ArrayView2<f32>) -> Array2<f32> {
    let mut out = logits.to_owned();

    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.fold(f32::NEG_INFINITY, |acc, &z| acc.max(z));
        row.mapv_inplace(|z| (z - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|e| e / sum);
    }

    out
}
