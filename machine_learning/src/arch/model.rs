use ndarray::{Array2, ArrayView2};

use super::Parameters;
use crate::Result;

/// Whether a forward pass is part of training or of inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
}

/// A differentiable model with explicit forward and backward passes.
pub trait Model {
    /// Makes a forward pass through the model, caching whatever the backward pass needs.
    ///
    /// # Arguments
    /// * `x` - The input batch, one sample per row.
    /// * `mode` - Whether training-only behavior (e.g. dropout) is active.
    ///
    /// # Returns
    /// The predictions for the batch.
    fn forward(&mut self, x: ArrayView2<f32>, mode: Mode) -> Result<Array2<f32>>;

    /// Propagates `d`, the gradient of the loss with respect to the last forward pass' output,
    /// back through the model. The parameter gradients are **accumulated**, not overwritten.
    ///
    /// # Arguments
    /// * `d` - The loss gradient seed.
    fn backward(&mut self, d: ArrayView2<f32>) -> Result<()>;

    /// Drops every cache left by previous forward passes.
    fn reset(&mut self);

    /// Returns the model's learnable parameters.
    fn params(&self) -> &Parameters;

    fn params_mut(&mut self) -> &mut Parameters;
}
