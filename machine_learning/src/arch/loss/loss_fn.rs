use ndarray::{Array2, ArrayView2};

use crate::{MlErr, Result, arch::Model};

/// The scalar result of a loss function together with the gradient seed it propagates.
#[derive(Debug, Clone)]
pub struct Loss {
    value: f32,
    seed: Array2<f32>,
}

impl Loss {
    /// Creates a new `Loss`.
    ///
    /// # Arguments
    /// * `value` - The reduced loss value.
    /// * `seed` - The gradient of the loss with respect to the predictions.
    ///
    /// # Returns
    /// A new `Loss` or an error if `value` isn't finite.
    pub fn new(value: f32, seed: Array2<f32>) -> Result<Self> {
        if !value.is_finite() {
            return Err(MlErr::NonFinite { what: "loss" });
        }

        Ok(Self { value, seed })
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn seed(&self) -> ArrayView2<'_, f32> {
        self.seed.view()
    }

    /// Propagates this loss back through `model`, accumulating its parameter gradients.
    ///
    /// # Arguments
    /// * `model` - The model whose last forward pass produced the predictions of this loss.
    pub fn backward<M: Model + ?Sized>(&self, model: &mut M) -> Result<()> {
        model.backward(self.seed.view())
    }
}

/// A loss function, measures how far a model's predictions are from the expected outputs.
pub trait LossFn {
    /// Computes the loss of a batch.
    ///
    /// # Arguments
    /// * `y_pred` - The model's predictions.
    /// * `y` - The expected outputs.
    ///
    /// # Returns
    /// The loss or an error if the shapes don't match.
    fn compute(&self, y_pred: ArrayView2<f32>, y: ArrayView2<f32>) -> Result<Loss>;
}

pub(super) fn check_shapes(y_pred: &ArrayView2<f32>, y: &ArrayView2<f32>) -> Result<()> {
    if y_pred.dim() != y.dim() {
        return Err(MlErr::SizeMismatch {
            what: "predictions and labels",
            got: y_pred.len(),
            expected: y.len(),
        });
    }

    if y.is_empty() {
        return Err(MlErr::InvalidInput("can't compute the loss of an empty batch"));
    }

    Ok(())
}
