use ndarray::{ArrayView1, ArrayView2};

use crate::{MlErr, Result};

/// Computes the fraction of samples a model got right.
///
/// Multi-column labels are compared by the index of their largest value, single-column labels
/// are binary and a prediction counts as positive from `0.5` up.
///
/// # Arguments
/// * `y_pred` - The model's predictions.
/// * `y` - The expected outputs.
///
/// # Returns
/// The accuracy, in `[0, 1]`, or an error if the shapes don't match or there are no samples.
pub fn accuracy(y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<f32> {
    if y_pred.dim() != y.dim() {
        return Err(MlErr::SizeMismatch {
            what: "predictions and labels",
            got: y_pred.len(),
            expected: y.len(),
        });
    }

    if y.is_empty() {
        return Err(MlErr::InvalidInput("can't compute the accuracy of an empty batch"));
    }

    let hits = if y.ncols() == 1 {
        y_pred
            .iter()
            .zip(y.iter())
            .filter(|&(&p, &t)| (p >= 0.5) == (t >= 0.5))
            .count()
    } else {
        y_pred
            .rows()
            .into_iter()
            .zip(y.rows())
            .filter(|(p, t)| argmax(*p) == argmax(*t))
            .count()
    };

    Ok(hits as f32 / y.nrows() as f32)
}

fn argmax(row: ArrayView1<f32>) -> usize {
    row.iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(best, max), (i, &v)| {
            if v > max { (i, v) } else { (best, max) }
        })
        .0
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn argmax_accuracy() {
        let y_pred = array![[0.1, 0.9], [0.8, 0.2], [0.3, 0.7], [2.0, -1.0]];
        let y = array![[0.0, 1.0], [0.0, 1.0], [0.0, 1.0], [1.0, 0.0]];
        assert_eq!(accuracy(y_pred.view(), y.view()).unwrap(), 0.75);
    }

    #[test]
    fn binary_accuracy() {
        let y_pred = array![[0.7], [0.2], [0.5], [0.49]];
        let y = array![[1.0], [0.0], [0.0], [0.0]];
        assert_eq!(accuracy(y_pred.view(), y.view()).unwrap(), 0.75);
    }

    #[test]
    fn empty_batches_are_rejected() {
        let empty = ndarray::Array2::<f32>::zeros((0, 2));
        assert!(accuracy(empty.view(), empty.view()).is_err());
    }
}
