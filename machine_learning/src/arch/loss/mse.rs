use ndarray::ArrayView2;

use super::{Loss, LossFn, loss_fn::check_shapes};
use crate::Result;

/// Mean squared error loss function.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mse;

impl Mse {
    /// Returns a new `Mse`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for Mse {
    fn compute(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Loss> {
        check_shapes(&y_pred, &y)?;

        let diff = &y_pred - &y;
        let value = diff.mapv(|x| x.powi(2)).mean().unwrap_or_default();
        let seed = diff * (2.0 / y_pred.len() as f32);
        Loss::new(value, seed)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn mse_value_and_seed() {
        let y_pred = array![[1.0, 2.0], [3.0, 4.0]];
        let y = array![[1.0, 0.0], [3.0, 2.0]];

        let loss = Mse.compute(y_pred.view(), y.view()).unwrap();
        assert_eq!(loss.value(), 2.0);
        assert_eq!(loss.seed(), array![[0.0, 1.0], [0.0, 1.0]]);
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let y_pred = array![[1.0, 2.0]];
        let y = array![[1.0]];
        assert!(Mse.compute(y_pred.view(), y.view()).is_err());
    }
}
